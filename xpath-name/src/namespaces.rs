use ahash::{HashMap, HashMapExt};

/// The `fn:` function namespace.
pub const FN_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions";
/// The XML Schema namespace, used for `xs:` atomic types.
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
/// The `math:` namespace (XPath 3.0+).
pub const MATH_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions/math";
/// The `map:` namespace (XPath 3.1).
pub const MAP_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions/map";
/// The `array:` namespace (XPath 3.1).
pub const ARRAY_NAMESPACE: &str = "http://www.w3.org/2005/xpath-functions/array";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const STATIC_NAMESPACES: [(&str, &str); 5] = [
    ("xs", XS_NAMESPACE),
    ("fn", FN_NAMESPACE),
    ("math", MATH_NAMESPACE),
    ("map", MAP_NAMESPACE),
    ("array", ARRAY_NAMESPACE),
];

/// The static namespace context: a prefix-to-URI map plus the default
/// element and function namespaces, as described in spec.md's "static
/// context" glossary entry.
#[derive(Debug, Clone)]
pub struct Namespaces {
    bindings: HashMap<String, String>,
    default_element_namespace: String,
    default_function_namespace: String,
}

impl Namespaces {
    /// Build a namespace context from explicit bindings plus the two
    /// default namespaces.
    pub fn new(
        bindings: HashMap<String, String>,
        default_element_namespace: impl Into<String>,
        default_function_namespace: impl Into<String>,
    ) -> Self {
        Self {
            bindings,
            default_element_namespace: default_element_namespace.into(),
            default_function_namespace: default_function_namespace.into(),
        }
    }

    /// Add (or override) prefix bindings. An empty prefix sets the default
    /// element namespace.
    pub fn add(&mut self, pairs: &[(&str, &str)]) {
        for (prefix, uri) in pairs {
            if prefix.is_empty() {
                self.default_element_namespace = uri.to_string();
            } else {
                self.bindings.insert(prefix.to_string(), uri.to_string());
            }
        }
    }

    /// Look up a bound prefix.
    pub fn by_prefix(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// The default namespace for unprefixed element name tests.
    pub fn default_element_namespace(&self) -> &str {
        &self.default_element_namespace
    }

    /// The default namespace for unprefixed function calls (`fn:` unless
    /// overridden).
    pub fn default_function_namespace(&self) -> &str {
        &self.default_function_namespace
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert("xml".to_string(), XML_NAMESPACE.to_string());
        for (prefix, uri) in STATIC_NAMESPACES {
            bindings.insert(prefix.to_string(), uri.to_string());
        }
        Self::new(bindings, "", FN_NAMESPACE)
    }
}

/// Anything that can resolve a namespace prefix, so callers can pass either
/// an owned [`Namespaces`] or a borrowed reference.
pub trait NamespaceLookup {
    /// Resolve a bound prefix to its namespace URI.
    fn by_prefix(&self, prefix: &str) -> Option<&str>;
}

impl NamespaceLookup for Namespaces {
    fn by_prefix(&self, prefix: &str) -> Option<&str> {
        Namespaces::by_prefix(self, prefix)
    }
}

impl<T: NamespaceLookup> NamespaceLookup for &T {
    fn by_prefix(&self, prefix: &str) -> Option<&str> {
        (**self).by_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_namespaces_bind_xs_and_fn() {
        let namespaces = Namespaces::default();
        assert_eq!(namespaces.by_prefix("xs"), Some(XS_NAMESPACE));
        assert_eq!(namespaces.by_prefix("fn"), Some(FN_NAMESPACE));
        assert_eq!(namespaces.by_prefix("nope"), None);
    }

    #[test]
    fn add_empty_prefix_sets_default_element_namespace() {
        let mut namespaces = Namespaces::default();
        namespaces.add(&[("", "urn:default")]);
        assert_eq!(namespaces.default_element_namespace(), "urn:default");
    }
}
