use crate::namespaces::NamespaceLookup;

/// An expanded name: a local name plus an optional namespace URI and the
/// prefix it was originally spelled with.
///
/// Two names are equal, and hash equally, iff their local name and
/// namespace URI match — the prefix is display-only, per XPath's notion of
/// an expanded QName.
#[derive(Debug, Clone, Eq)]
pub struct Name {
    local: String,
    namespace: Option<String>,
    prefix: Option<String>,
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.local.hash(state);
        self.namespace.hash(state);
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.namespace == other.namespace
    }
}

impl Name {
    /// Build a name directly from its parts.
    pub fn new(local: impl Into<String>, namespace: Option<String>, prefix: Option<String>) -> Self {
        Name {
            local: local.into(),
            namespace,
            prefix,
        }
    }

    /// Resolve `prefix:local` against a namespace lookup, failing if the
    /// prefix isn't bound.
    pub fn prefixed(prefix: &str, local: &str, namespaces: &impl NamespaceLookup) -> Option<Self> {
        let namespace = namespaces.by_prefix(prefix)?;
        Some(Name {
            local: local.to_string(),
            namespace: Some(namespace.to_string()),
            prefix: Some(prefix.to_string()),
        })
    }

    /// A bare NCName with no namespace, before default-namespace resolution.
    pub fn unprefixed(local: &str) -> Self {
        Name {
            local: local.to_string(),
            namespace: None,
            prefix: None,
        }
    }

    /// `Q{uri}local`.
    pub fn uri_qualified(uri: &str, local: &str) -> Self {
        Name {
            local: local.to_string(),
            namespace: if uri.is_empty() {
                None
            } else {
                Some(uri.to_string())
            },
            prefix: None,
        }
    }

    /// Apply a default namespace if this name has none yet.
    pub fn with_default_namespace(mut self, uri: Option<&str>) -> Self {
        if self.namespace.is_none() {
            if let Some(uri) = uri {
                self.namespace = Some(uri.to_string());
            }
        }
        self
    }

    /// The namespace prefix this name was written with, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Render back to `prefix:local` (or just `local` when unprefixed).
    pub fn to_full_name(&self) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", self.local),
            _ => self.local.clone(),
        }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "Q{{{ns}}}{}", self.local)
        } else {
            write!(f, "{}", self.local)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Namespaces;

    #[test]
    fn unprefixed_names_ignore_prefix_in_equality() {
        let a = Name::new("foo", Some("urn:x".to_string()), Some("a".to_string()));
        let b = Name::new("foo", Some("urn:x".to_string()), Some("b".to_string()));
        assert_eq!(a, b);
    }

    #[test]
    fn prefixed_resolves_via_lookup() {
        let namespaces = Namespaces::default();
        let name = Name::prefixed("xs", "string", &namespaces).unwrap();
        assert_eq!(name.namespace(), Some(crate::XS_NAMESPACE));
    }
}
