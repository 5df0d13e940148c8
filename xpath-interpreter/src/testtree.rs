//! An in-memory [`Node`] implementation used by this crate's own test
//! suite and, behind the `test-util` feature, by downstream crates that
//! want a concrete tree to exercise the engine against without pulling in
//! a host XML library (spec.md SPEC_FULL §3 "A minimal in-memory node
//! tree"). Never compiled into a normal release build — it exists purely
//! so `eval`/`function`/`context` tests have something to run `Node`
//! methods against, the same role the teacher's tests give
//! `xee-interpreter`'s `xot`-backed fixtures (generalized here to a
//! minimal `Rc`-tree since this crate carries no `xot` dependency).

#![cfg(any(test, feature = "test-util"))]

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use xpath_name::Name;

use crate::node::{Node, NodeKind};

struct TestNodeData {
    kind: NodeKind,
    name: Option<Name>,
    value: String,
    order: usize,
    parent: RefCell<Weak<TestNodeData>>,
    children: RefCell<Vec<TestNode>>,
    attributes: RefCell<Vec<TestNode>>,
}

#[derive(Clone)]
pub struct TestNode(Rc<TestNodeData>);

impl PartialEq for TestNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TestNode {}

impl std::fmt::Debug for TestNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestNode")
            .field("kind", &self.0.kind)
            .field("name", &self.0.name)
            .field("order", &self.0.order)
            .finish()
    }
}

impl Node for TestNode {
    type Key = usize;

    fn node_kind(&self) -> NodeKind {
        self.0.kind
    }

    fn node_name(&self) -> Option<Name> {
        self.0.name.clone()
    }

    fn string_value(&self) -> String {
        match self.0.kind {
            NodeKind::Element | NodeKind::Document => self.0.children.borrow().iter().map(|c| c.string_value()).collect(),
            _ => self.0.value.clone(),
        }
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.borrow().upgrade().map(TestNode)
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.borrow().clone()
    }

    fn attributes(&self) -> Vec<Self> {
        self.0.attributes.borrow().clone()
    }

    fn document_order_key(&self) -> Self::Key {
        self.0.order
    }
}

/// Declarative shape of an element, used to build a [`TestNode`] document
/// tree without exposing the `Rc`/`RefCell` plumbing to test bodies.
pub struct ElementSpec {
    pub name: &'static str,
    pub attributes: Vec<(&'static str, &'static str)>,
    pub children: Vec<ChildSpec>,
}

pub enum ChildSpec {
    Element(ElementSpec),
    Text(&'static str),
    Comment(&'static str),
}

pub fn root(name: &'static str, attributes: Vec<(&'static str, &'static str)>, children: Vec<ChildSpec>) -> ElementSpec {
    ElementSpec { name, attributes, children }
}

pub fn element(name: &'static str, attributes: Vec<(&'static str, &'static str)>, children: Vec<ChildSpec>) -> ChildSpec {
    ChildSpec::Element(ElementSpec { name, attributes, children })
}

pub fn text(value: &'static str) -> ChildSpec {
    ChildSpec::Text(value)
}

pub fn comment(value: &'static str) -> ChildSpec {
    ChildSpec::Comment(value)
}

fn next(counter: &Cell<usize>) -> usize {
    let current = counter.get();
    counter.set(current + 1);
    current
}

fn leaf(kind: NodeKind, value: String, counter: &Cell<usize>, parent: &TestNode) -> TestNode {
    TestNode(Rc::new(TestNodeData {
        kind,
        name: None,
        value,
        order: next(counter),
        parent: RefCell::new(Rc::downgrade(&parent.0)),
        children: RefCell::new(Vec::new()),
        attributes: RefCell::new(Vec::new()),
    }))
}

fn build_element(spec: &ElementSpec, counter: &Cell<usize>, parent: Option<&TestNode>) -> TestNode {
    let data = Rc::new(TestNodeData {
        kind: NodeKind::Element,
        name: Some(Name::unprefixed(spec.name)),
        value: String::new(),
        order: next(counter),
        parent: RefCell::new(parent.map(|p| Rc::downgrade(&p.0)).unwrap_or_default()),
        children: RefCell::new(Vec::new()),
        attributes: RefCell::new(Vec::new()),
    });
    let node = TestNode(data.clone());

    let attributes: Vec<TestNode> = spec
        .attributes
        .iter()
        .map(|(attr_name, attr_value)| {
            TestNode(Rc::new(TestNodeData {
                kind: NodeKind::Attribute,
                name: Some(Name::unprefixed(attr_name)),
                value: attr_value.to_string(),
                order: next(counter),
                parent: RefCell::new(Rc::downgrade(&node.0)),
                children: RefCell::new(Vec::new()),
                attributes: RefCell::new(Vec::new()),
            }))
        })
        .collect();
    *data.attributes.borrow_mut() = attributes;

    let children: Vec<TestNode> = spec
        .children
        .iter()
        .map(|child| match child {
            ChildSpec::Element(inner) => build_element(inner, counter, Some(&node)),
            ChildSpec::Text(value) => leaf(NodeKind::Text, value.to_string(), counter, &node),
            ChildSpec::Comment(value) => leaf(NodeKind::Comment, value.to_string(), counter, &node),
        })
        .collect();
    *data.children.borrow_mut() = children;

    node
}

impl TestNode {
    /// Build a document node whose single element child is `root_spec`,
    /// assigning document-order keys by preorder traversal (element, its
    /// attributes, then its children, recursively).
    pub fn document(root_spec: ElementSpec) -> TestNode {
        let counter = Cell::new(0);
        let data = Rc::new(TestNodeData {
            kind: NodeKind::Document,
            name: None,
            value: String::new(),
            order: next(&counter),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            attributes: RefCell::new(Vec::new()),
        });
        let document = TestNode(data.clone());
        let root_node = build_element(&root_spec, &counter, Some(&document));
        *data.children.borrow_mut() = vec![root_node];
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_order_keys_increase_in_preorder_with_attributes_before_children() {
        let doc = TestNode::document(root(
            "a",
            vec![("id", "1")],
            vec![element("b", vec![], vec![text("hi")]), element("c", vec![], vec![])],
        ));
        let a = &doc.children()[0];
        let attr = &a.attributes()[0];
        let b = &a.children()[0];
        let text_node = &b.children()[0];
        let c = &a.children()[1];
        assert!(doc.document_order_key() < a.document_order_key());
        assert!(a.document_order_key() < attr.document_order_key());
        assert!(attr.document_order_key() < b.document_order_key());
        assert!(b.document_order_key() < text_node.document_order_key());
        assert!(text_node.document_order_key() < c.document_order_key());
    }

    #[test]
    fn string_value_concatenates_descendant_text() {
        let doc = TestNode::document(root("a", vec![], vec![text("hello "), element("b", vec![], vec![text("world")])]));
        let a = &doc.children()[0];
        assert_eq!(a.string_value(), "hello world");
    }

    #[test]
    fn parent_pointers_round_trip() {
        let doc = TestNode::document(root("a", vec![], vec![element("b", vec![], vec![])]));
        let a = doc.children()[0].clone();
        let b = a.children()[0].clone();
        assert_eq!(b.parent().unwrap(), a);
        assert_eq!(a.parent().unwrap(), doc);
        assert!(doc.parent().is_none());
    }
}
