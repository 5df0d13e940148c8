//! The node adapter interface (spec.md §6): the engine never constructs or
//! mutates host document nodes, it only reads through this trait. Grounded
//! on the shape of the teacher's `xot`-backed node handling
//! (`xee-interpreter::xml::node`), generalized into a host-supplied trait
//! rather than a concrete `xot::Node` wrapper, since spec.md places the
//! concrete tree representation out of scope (see DESIGN.md).

use xpath_name::Name;

/// The seven node kinds of the XPath/XDM data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

/// An opaque, borrowed handle onto a node in the host's document tree.
///
/// Implementors are cheap to clone (typically an index or pointer) and are
/// compared for document identity via [`Node::document_order_key`], never
/// by structural equality — two adapter values that wrap the same
/// underlying node must compare equal and produce the same key.
pub trait Node: Clone + std::fmt::Debug + Eq {
    /// An opaque key with a total order matching document order. Used for
    /// `is`/`<<`/`>>`, duplicate removal, and path-result sorting (spec.md
    /// invariant ii).
    type Key: Copy + Ord + std::hash::Hash;

    fn node_kind(&self) -> NodeKind;

    /// `None` for document/text/comment nodes and unnamed processing
    /// instructions.
    fn node_name(&self) -> Option<Name>;

    /// The node's string value per the XDM `dm:string-value` accessor.
    fn string_value(&self) -> String;

    /// The node's typed value, when schema validation has annotated one.
    /// Untyped nodes return `None`; callers fall back to `string_value`
    /// treated as `xs:untypedAtomic`.
    fn typed_value(&self) -> Option<String> {
        None
    }

    fn parent(&self) -> Option<Self>;

    /// Children in document order (element and document nodes only).
    fn children(&self) -> Vec<Self>;

    /// Attributes, in implementation-defined (commonly declaration) order.
    fn attributes(&self) -> Vec<Self>;

    /// In-scope namespace nodes.
    fn namespaces(&self) -> Vec<Self> {
        Vec::new()
    }

    fn base_uri(&self) -> Option<String> {
        None
    }

    /// The opaque, totally ordered document-order key (spec.md §3).
    fn document_order_key(&self) -> Self::Key;

    /// Optional PSVI type annotation, read (never attached) through the
    /// adapter (spec.md §9 "PSVI annotations").
    fn type_annotation(&self) -> Option<Name> {
        None
    }
}

/// Forward/reverse direction of a single axis (spec.md §4.6 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisDirection {
    Forward,
    Reverse,
}
