use xpath_lexer::Version;
use xpath_name::Namespaces;

/// The static context the parser resolves names against: the XPath version
/// (which also drives the lexer's reserved-word set) and the in-scope
/// namespace bindings (spec.md's "static context" glossary entry).
#[derive(Debug, Clone)]
pub struct StaticContext {
    version: Version,
    namespaces: Namespaces,
    /// Whether `namespace::` axis steps are accepted by the parser
    /// (spec.md §6 "Configuration options" `enable-namespace-axis`,
    /// default `false` for 2.0+).
    enable_namespace_axis: bool,
}

impl StaticContext {
    pub fn new(version: Version, namespaces: Namespaces) -> Self {
        Self {
            version,
            namespaces,
            enable_namespace_axis: version == Version::V1_0,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut Namespaces {
        &mut self.namespaces
    }

    pub fn enable_namespace_axis(&self) -> bool {
        self.enable_namespace_axis
    }

    pub fn set_enable_namespace_axis(&mut self, enabled: bool) {
        self.enable_namespace_axis = enabled;
    }
}

impl Default for StaticContext {
    fn default() -> Self {
        Self::new(Version::default(), Namespaces::default())
    }
}
