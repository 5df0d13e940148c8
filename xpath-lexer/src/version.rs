/// The XPath language version selected when a lexer or parser is
/// constructed. Reserved-word classification and grammar acceptance both
/// depend only on this value, fixed at construction time (spec.md
/// invariant iii).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    V1_0,
    V2_0,
    V3_0,
    V3_1,
}

impl Version {
    /// Is this version at least `other`?
    pub fn at_least(&self, other: Version) -> bool {
        *self >= other
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V1_0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Version::V1_0 => "1.0",
            Version::V2_0 => "2.0",
            Version::V3_0 => "3.0",
            Version::V3_1 => "3.1",
        };
        write!(f, "{s}")
    }
}
