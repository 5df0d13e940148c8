use xpath_name::Name;

/// The thirteen XPath axes (spec.md §4.6 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Ancestor,
    AncestorOrSelf,
    Attribute,
    Child,
    Descendant,
    DescendantOrSelf,
    Following,
    FollowingSibling,
    Namespace,
    Parent,
    Preceding,
    PrecedingSibling,
    Self_,
}

impl Axis {
    /// Reverse axes must iterate backwards so predicates see forward
    /// document-order positions (spec.md §4.6).
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Parent
                | Axis::Ancestor
                | Axis::AncestorOrSelf
                | Axis::Preceding
                | Axis::PrecedingSibling
        )
    }

    /// The node kind a bare `*` or unqualified name test matches on this
    /// axis (spec.md §4.6 "principal node kind").
    pub fn principal_node_kind(&self) -> PrincipalNodeKind {
        match self {
            Axis::Attribute => PrincipalNodeKind::Attribute,
            Axis::Namespace => PrincipalNodeKind::Namespace,
            _ => PrincipalNodeKind::Element,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalNodeKind {
    Element,
    Attribute,
    Namespace,
}

/// A step's node test: either a name test (possibly wildcarded) or a kind
/// test (`node()`, `element(...)`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    NameTest(NameTest),
    KindTest(KindTest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameTest {
    /// A fully resolved name (`foo`, `ns:foo`).
    Name(Name),
    /// Bare `*`.
    Wildcard,
    /// `*:local` — any namespace, fixed local name.
    WildcardLocal(String),
    /// `ns:*` — fixed namespace, any local name.
    WildcardNamespace(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KindTest {
    Any,
    Text,
    Comment,
    NamespaceNode,
    ProcessingInstruction(Option<String>),
    Document(Option<Box<KindTest>>),
    Element(Option<ElementOrAttributeTest>),
    Attribute(Option<ElementOrAttributeTest>),
    SchemaElement(Name),
    SchemaAttribute(Name),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementOrAttributeTest {
    pub name: Option<Name>,
    pub type_name: Option<Name>,
}
