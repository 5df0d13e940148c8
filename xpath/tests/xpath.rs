//! End-to-end scenarios exercising `compile`/`Expression::evaluate` against
//! the in-memory test tree (spec.md §8), in the style of the teacher's
//! `xee-xpath/tests/xpath.rs`.

use xpath::{AtomicValue, Item, Options, Version};
use xpath_interpreter::testtree::{comment as test_comment, element, root, text, TestNode};

fn eval(source: &str, version: Version, doc: &TestNode) -> xpath::Sequence<TestNode> {
    let options = Options::<TestNode>::new(version);
    let expression = xpath::compile(source, &options).unwrap();
    let ctx = expression.new_context(Some(Item::Node(doc.clone())));
    expression.evaluate(&ctx).unwrap()
}

fn bookstore() -> TestNode {
    TestNode::document(root(
        "bookstore",
        vec![],
        vec![
            element(
                "book",
                vec![("price", "12.50")],
                vec![element("title", vec![], vec![text("Harold and the Purple Crayon")])],
            ),
            element(
                "book",
                vec![("price", "8.00")],
                vec![element("title", vec![], vec![text("Goodnight Moon")])],
            ),
        ],
    ))
}

#[test]
fn path_with_predicate_selects_matching_titles_in_document_order() {
    let doc = bookstore();
    let result = eval("//book[@price > 10]/title/text()", Version::V2_0, &doc);
    let texts: Vec<String> = result.iter().map(|item| item.as_node().unwrap().string_value()).collect();
    assert_eq!(texts, vec!["Harold and the Purple Crayon"]);
}

#[test]
fn for_expression_squares_a_range() {
    let doc = TestNode::document(root("r", vec![], vec![]));
    let result = eval("for $i in 1 to 3 return $i * $i", Version::V2_0, &doc);
    let values: Vec<ibig::IBig> = result
        .iter()
        .map(|item| match item.as_atomic().unwrap() {
            AtomicValue::Integer(i, _) => i.clone(),
            other => panic!("expected an integer, got {other:?}"),
        })
        .collect();
    assert_eq!(values, vec![ibig::IBig::from(1), ibig::IBig::from(4), ibig::IBig::from(9)]);
}

#[test]
fn let_binding_of_a_named_function_reference_is_callable() {
    let doc = TestNode::document(root("r", vec![], vec![]));
    let result = eval("let $f := upper-case#1 return $f('abc')", Version::V3_0, &doc);
    assert_eq!(result.as_slice().len(), 1);
    match result.as_slice()[0].as_atomic().unwrap() {
        AtomicValue::String(s, _) => assert_eq!(s, "ABC"),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn map_lookup_via_unary_lookup_operator() {
    let doc = TestNode::document(root("r", vec![], vec![]));
    let result = eval("map{'a': 1, 'b': 2}?b", Version::V3_1, &doc);
    match result.as_slice() {
        [xpath::Item::Atomic(AtomicValue::Integer(i, _))] => assert_eq!(*i, ibig::IBig::from(2)),
        other => panic!("expected a single integer, got {other:?}"),
    }
}

#[test]
fn braceduriliteral_qualified_function_call_resolves_against_the_fn_namespace() {
    let doc = TestNode::document(root("r", vec![], vec![]));
    let result = eval("Q{http://www.w3.org/2005/xpath-functions}concat('a', 'b')", Version::V3_0, &doc);
    match result.as_slice() {
        [xpath::Item::Atomic(AtomicValue::String(s, _))] => assert_eq!(s, "ab"),
        other => panic!("expected a single string, got {other:?}"),
    }
}

#[test]
fn adding_a_number_and_a_non_numeric_string_is_a_type_error() {
    let doc = TestNode::document(root("r", vec![], vec![]));
    let options = Options::<TestNode>::new(Version::V2_0);
    let expression = xpath::compile("1 + 'a'", &options).unwrap();
    let ctx = expression.new_context(Some(Item::Node(doc)));
    let err = expression.evaluate(&ctx).unwrap_err();
    assert_eq!(err.error.code(), "XPTY0004");
}

#[test]
fn legacy_node_set_effective_boolean_value_under_version_one() {
    let doc = TestNode::document(root("r", vec![], vec![element("a", vec![], vec![]), element("a", vec![], vec![])]));
    let result = eval("if (a) then 'yes' else 'no'", Version::V1_0, &doc);
    match result.as_slice() {
        [xpath::Item::Atomic(AtomicValue::String(s, _))] => assert_eq!(s, "yes"),
        other => panic!("expected a single string, got {other:?}"),
    }
}

#[test]
fn integer_division_by_zero_yields_double_infinity() {
    let doc = TestNode::document(root("r", vec![], vec![]));
    let result = eval("1 div 0", Version::V2_0, &doc);
    match result.as_slice() {
        [xpath::Item::Atomic(AtomicValue::Double(d))] => assert_eq!(d.0, f64::INFINITY),
        other => panic!("expected a single double, got {other:?}"),
    }
}

#[test]
fn range_operator_rejects_a_non_integer_operand() {
    let doc = TestNode::document(root("r", vec![], vec![]));
    let options = Options::<TestNode>::new(Version::V2_0);
    let expression = xpath::compile("1.5 to 3", &options).unwrap();
    let ctx = expression.new_context(Some(Item::Node(doc)));
    let err = expression.evaluate(&ctx).unwrap_err();
    assert_eq!(err.error.code(), "XPTY0004");
}

#[test]
fn a_shared_cache_amortizes_a_second_compile_of_the_same_source() {
    let cache = std::rc::Rc::new(xpath_interpreter::cache::ExpressionCache::with_max_size(8));
    let mut options = Options::<TestNode>::new(Version::V2_0);
    options.cache = xpath::CacheMode::Shared(cache.clone());

    xpath::compile("//book/title/text()", &options).unwrap();
    assert_eq!(cache.statistics().misses, 1);
    assert_eq!(cache.statistics().hits, 0);

    xpath::compile("//book/title/text()", &options).unwrap();
    let stats = cache.statistics();
    assert_eq!(stats.hits, 1, "second compile of identical source should hit the cache rather than re-parse");
    assert_eq!(stats.misses, 1);
}

#[test]
fn compile_with_cache_enabled_is_equivalent_to_cache_disabled() {
    let doc = bookstore();
    let mut cached_options = Options::<TestNode>::new(Version::V2_0);
    cached_options.cache = xpath::CacheMode::Enabled;
    let cached = xpath::compile("//book/title/text()", &cached_options).unwrap();

    let plain_options = Options::<TestNode>::new(Version::V2_0);
    let plain = xpath::compile("//book/title/text()", &plain_options).unwrap();

    let cached_ctx = cached.new_context(Some(Item::Node(doc.clone())));
    let plain_ctx = plain.new_context(Some(Item::Node(doc)));
    let cached_result: Vec<String> = cached
        .evaluate(&cached_ctx)
        .unwrap()
        .iter()
        .map(|item| item.as_node().unwrap().string_value())
        .collect();
    let plain_result: Vec<String> = plain
        .evaluate(&plain_ctx)
        .unwrap()
        .iter()
        .map(|item| item.as_node().unwrap().string_value())
        .collect();
    assert_eq!(cached_result, plain_result);
}

#[test]
fn comments_are_skipped_by_the_lexer() {
    let doc = TestNode::document(root("r", vec![], vec![test_comment("note"), text("hi")]));
    let result = eval("(: a leading comment :) string(text())", Version::V2_0, &doc);
    match result.as_slice() {
        [xpath::Item::Atomic(AtomicValue::String(s, _))] => assert_eq!(s, "hi"),
        other => panic!("expected a single string, got {other:?}"),
    }
}
