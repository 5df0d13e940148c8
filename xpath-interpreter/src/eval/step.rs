//! Axis traversal and node-test matching (spec.md §4.6 "Axis semantics").
//! Reverse axes are generated nearest-candidate-first directly (walking
//! `parent()`/sibling pointers rather than collecting full document order
//! and reversing), which already satisfies "predicates see forward
//! document-order positions" without a separate reversal pass. Grounded on
//! the teacher's `xee-interpreter::xml::step` (which delegates the same
//! axis enumeration to `xot::Xot::axis`); generalized here to walk the
//! `Node` adapter trait directly since this core carries no concrete tree.

use xpath_ast::node_test::{Axis, ElementOrAttributeTest, KindTest, NameTest, NodeTest, PrincipalNodeKind};

use crate::error::Error;
use crate::node::{Node, NodeKind};

/// Candidate nodes for `axis` starting at `node`, in the order spec.md's
/// predicate-position rule requires (nearest-first for reverse axes,
/// document order for forward axes).
pub fn axis_candidates<N: Node>(axis: Axis, node: &N) -> Result<Vec<N>, Error> {
    Ok(match axis {
        Axis::Self_ => vec![node.clone()],
        Axis::Child => node.children(),
        Axis::Attribute => node.attributes(),
        Axis::Namespace => node.namespaces(),
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Descendant => descendants(node),
        Axis::DescendantOrSelf => {
            let mut out = vec![node.clone()];
            out.extend(descendants(node));
            out
        }
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut out = vec![node.clone()];
            out.extend(ancestors(node));
            out
        }
        Axis::FollowingSibling => siblings_after(node),
        Axis::PrecedingSibling => siblings_before_reversed(node),
        Axis::Following => following(node),
        Axis::Preceding => preceding(node),
    })
}

fn descendants<N: Node>(node: &N) -> Vec<N> {
    let mut out = Vec::new();
    for child in node.children() {
        push_preorder(&child, &mut out);
    }
    out
}

fn ancestors<N: Node>(node: &N) -> Vec<N> {
    let mut out = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = current.parent() {
        out.push(parent.clone());
        current = parent;
    }
    out
}

fn siblings_after<N: Node>(node: &N) -> Vec<N> {
    match node.parent() {
        Some(parent) => {
            let siblings = parent.children();
            match siblings.iter().position(|s| s == node) {
                Some(pos) => siblings[pos + 1..].to_vec(),
                None => Vec::new(),
            }
        }
        None => Vec::new(),
    }
}

fn siblings_before_reversed<N: Node>(node: &N) -> Vec<N> {
    match node.parent() {
        Some(parent) => {
            let siblings = parent.children();
            match siblings.iter().position(|s| s == node) {
                Some(pos) => siblings[..pos].iter().rev().cloned().collect(),
                None => Vec::new(),
            }
        }
        None => Vec::new(),
    }
}

fn following<N: Node>(node: &N) -> Vec<N> {
    let mut out = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = current.parent() {
        let siblings = parent.children();
        if let Some(pos) = siblings.iter().position(|s| *s == current) {
            for sibling in &siblings[pos + 1..] {
                push_preorder(sibling, &mut out);
            }
        }
        current = parent;
    }
    out
}

fn preceding<N: Node>(node: &N) -> Vec<N> {
    let mut out = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = current.parent() {
        let siblings = parent.children();
        if let Some(pos) = siblings.iter().position(|s| *s == current) {
            for sibling in siblings[..pos].iter().rev() {
                push_reverse_preorder(sibling, &mut out);
            }
        }
        current = parent;
    }
    out
}

fn push_preorder<N: Node>(node: &N, out: &mut Vec<N>) {
    out.push(node.clone());
    for child in node.children() {
        push_preorder(&child, out);
    }
}

fn push_reverse_preorder<N: Node>(node: &N, out: &mut Vec<N>) {
    for child in node.children().iter().rev() {
        push_reverse_preorder(child, out);
    }
    out.push(node.clone());
}

/// The node kind a step's node test is evaluated against: the axis's
/// principal kind (spec.md §4.6 table), independent of the candidate's
/// actual kind, which is what disambiguates e.g. `@foo` (attribute
/// principal) from `foo` on the child axis (element principal).
fn principal_kind(axis: Axis) -> NodeKind {
    match axis.principal_node_kind() {
        PrincipalNodeKind::Attribute => NodeKind::Attribute,
        PrincipalNodeKind::Namespace => NodeKind::Namespace,
        PrincipalNodeKind::Element => NodeKind::Element,
    }
}

/// Does `candidate` satisfy `node_test` when reached via `axis` (spec.md
/// §4.2/§4.6)?
pub fn matches_node_test<N: Node>(node_test: &NodeTest, axis: Axis, candidate: &N) -> bool {
    match node_test {
        NodeTest::KindTest(kind_test) => matches_kind_test(kind_test, candidate),
        NodeTest::NameTest(name_test) => {
            if candidate.node_kind() != principal_kind(axis) {
                return false;
            }
            let name = match candidate.node_name() {
                Some(name) => name,
                None => return false,
            };
            match name_test {
                NameTest::Name(expected) => name == *expected,
                NameTest::Wildcard => true,
                NameTest::WildcardLocal(local) => name.local_name() == local,
                NameTest::WildcardNamespace(ns) => name.namespace() == Some(ns.as_str()),
            }
        }
    }
}

pub(crate) fn matches_kind_test<N: Node>(kind_test: &KindTest, candidate: &N) -> bool {
    match kind_test {
        KindTest::Any => true,
        KindTest::Text => candidate.node_kind() == NodeKind::Text,
        KindTest::Comment => candidate.node_kind() == NodeKind::Comment,
        KindTest::NamespaceNode => candidate.node_kind() == NodeKind::Namespace,
        KindTest::ProcessingInstruction(expected_name) => {
            candidate.node_kind() == NodeKind::ProcessingInstruction
                && match expected_name {
                    Some(expected) => candidate.node_name().map(|n| n.local_name().to_string()).as_deref() == Some(expected.as_str()),
                    None => true,
                }
        }
        KindTest::Document(subtest) => {
            candidate.node_kind() == NodeKind::Document
                && match subtest {
                    Some(inner) => candidate
                        .children()
                        .iter()
                        .any(|child| child.node_kind() == NodeKind::Element && matches_kind_test(inner, child)),
                    None => true,
                }
        }
        KindTest::Element(test) => candidate.node_kind() == NodeKind::Element && matches_element_or_attribute(test, candidate),
        KindTest::Attribute(test) => candidate.node_kind() == NodeKind::Attribute && matches_element_or_attribute(test, candidate),
        KindTest::SchemaElement(name) => candidate.node_kind() == NodeKind::Element && candidate.node_name().as_ref() == Some(name),
        KindTest::SchemaAttribute(name) => candidate.node_kind() == NodeKind::Attribute && candidate.node_name().as_ref() == Some(name),
    }
}

fn matches_element_or_attribute<N: Node>(test: &Option<ElementOrAttributeTest>, candidate: &N) -> bool {
    match test {
        None => true,
        Some(test) => {
            let name_ok = match &test.name {
                Some(expected) => candidate.node_name().as_ref() == Some(expected),
                None => true,
            };
            let type_ok = match &test.type_name {
                Some(expected) => candidate.type_annotation().as_ref() == Some(expected),
                None => true,
            };
            name_ok && type_ok
        }
    }
}
