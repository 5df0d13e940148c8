//! The expression evaluator (spec.md §4 "Evaluation semantics"): a
//! tree-walking interpreter over [`xpath_ast::ast`], dispatching every
//! `ExprSingle`/`PathExpr`/`PrimaryExpr` form directly rather than compiling
//! to bytecode first (spec.md §9 redesign flag — this core has no compiler
//! stage, grounded on how the teacher's `xee-interpreter::interpreter`
//! dispatches opcodes, generalized here to dispatch AST node kinds one-for-one
//! instead).

pub mod arithmetic;
pub mod compare;
pub mod step;

use std::cmp::Ordering;
use std::rc::Rc;

use ibig::IBig;

use xpath_ast::ast::{
    ArrayConstructor, ArrowTarget, BinaryExpr, ExprS, ExprSingle, ExprSingleS, FunctionCall, IfExpr, KeySpecifier, Literal,
    MapConstructor, NameS, PathExpr, PrimaryExpr, PrimaryExprS, Quantifier, StepExpr, StepExprS, XPath,
};
use xpath_ast::operator::{BinaryOperator, UnaryOperator};
use xpath_ast::sequence_type::{FunctionTest, ItemType, MapTest, Occurrence, SequenceType};
use xpath_schema_type::Xs;

use crate::atomic::AtomicValue;
use crate::coerce;
use crate::context::DynamicContext;
use crate::error::{Error, SpannedError};
use crate::item::{ArrayItem, FunctionItem, FunctionItemKind, Item, MapItem};
use crate::node::Node;
use crate::sequence::Sequence;

/// Entry point: evaluate a compiled expression against a dynamic context
/// (spec.md §4 "Evaluation produces a `Result` sequence").
pub fn evaluate<N: Node>(xpath: &XPath, ctx: &DynamicContext<N>) -> Result<Sequence<N>, SpannedError> {
    eval_expr(&xpath.0, ctx, 0)
}

fn eval_expr<N: Node>(expr: &ExprS, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    let mut result = Sequence::empty();
    for single in &expr.node.0 {
        result.extend(eval_expr_single(single, ctx, depth)?);
    }
    Ok(result)
}

fn eval_expr_single<N: Node>(expr: &ExprSingleS, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    ctx.check_cancelled().map_err(|e| SpannedError::spanned(e, expr.span.clone()))?;
    match &expr.node {
        ExprSingle::Path(path) => eval_path(path, ctx, depth, &expr.span),
        ExprSingle::Binary(bin) => eval_binary(bin, ctx, depth, &expr.span),
        ExprSingle::Unary { operators, operand } => eval_unary(operators, operand, ctx, depth),
        ExprSingle::SimpleMap(parts) => eval_simple_map(parts, ctx, depth),
        ExprSingle::InstanceOf { operand, sequence_type } => {
            let seq = eval_expr_single(operand, ctx, depth)?;
            Ok(Sequence::boolean(matches_sequence_type(&seq, sequence_type)))
        }
        ExprSingle::TreatAs { operand, sequence_type } => {
            let seq = eval_expr_single(operand, ctx, depth)?;
            if matches_sequence_type(&seq, sequence_type) {
                Ok(seq)
            } else {
                Err(SpannedError::spanned(Error::XPTY0004, expr.span.clone()))
            }
        }
        ExprSingle::CastAs { operand, single_type } => {
            let seq = eval_expr_single(operand, ctx, depth)?;
            if seq.is_empty() {
                return if single_type.optional {
                    Ok(Sequence::empty())
                } else {
                    Err(SpannedError::spanned(Error::XPTY0004, expr.span.clone()))
                };
            }
            let atomic = coerce::singleton_atomic(&seq)?;
            let cast = atomic
                .cast(single_type.name)
                .map_err(|e| SpannedError::spanned(e, expr.span.clone()))?;
            Ok(Sequence::from_atomic(cast))
        }
        ExprSingle::CastableAs { operand, single_type } => {
            let seq = eval_expr_single(operand, ctx, depth)?;
            if seq.is_empty() {
                return Ok(Sequence::boolean(single_type.optional));
            }
            let castable = match coerce::singleton_atomic(&seq) {
                Ok(atomic) => atomic.cast(single_type.name).is_ok(),
                Err(_) => false,
            };
            Ok(Sequence::boolean(castable))
        }
        ExprSingle::Arrow { source, target, arguments } => eval_arrow(source, target, arguments, ctx, depth, &expr.span),
        ExprSingle::For(binding) => eval_for_bindings(&binding.bindings, &binding.body, ctx, depth),
        ExprSingle::Let(binding) => eval_let_bindings(&binding.bindings, &binding.body, ctx, depth),
        ExprSingle::Quantified {
            quantifier,
            bindings,
            satisfies,
        } => {
            let result = eval_quantified(*quantifier, bindings, satisfies, ctx, depth)?;
            Ok(Sequence::boolean(result))
        }
        ExprSingle::If(if_expr) => eval_if(if_expr, ctx, depth),
    }
}

// ---------------------------------------------------------------------
// Path expressions and steps (spec.md §4.6)
// ---------------------------------------------------------------------

fn root_of_context<N: Node>(ctx: &DynamicContext<N>) -> Result<N, Error> {
    let item = ctx.require_context_item()?;
    let mut current = item.as_node().ok_or(Error::XPDY0050)?.clone();
    while let Some(parent) = current.parent() {
        current = parent;
    }
    Ok(current)
}

fn eval_path<N: Node>(path: &PathExpr, ctx: &DynamicContext<N>, depth: usize, span: &xpath_ast::span::Span) -> Result<Sequence<N>, SpannedError> {
    if path.steps.is_empty() {
        let root = root_of_context(ctx).map_err(|e| SpannedError::spanned(e, span.clone()))?;
        return Ok(Sequence::single(Item::Node(root)));
    }

    let mut current: Option<Sequence<N>> = None;
    for step in &path.steps {
        current = Some(match current {
            None => {
                if path.rooted {
                    let root = root_of_context(ctx).map_err(|e| SpannedError::spanned(e, span.clone()))?;
                    let step_ctx = ctx.with_context_item(Item::Node(root), 1, 1);
                    eval_step(step, &step_ctx, depth)?
                } else {
                    eval_step(step, ctx, depth)?
                }
            }
            Some(prev) => {
                let mut out = Sequence::empty();
                let size = prev.len();
                for (idx, item) in prev.into_vec().into_iter().enumerate() {
                    let node = item.as_node().ok_or_else(|| SpannedError::spanned(Error::XPTY0019, step.span.clone()))?;
                    let step_ctx = ctx.with_context_item(Item::Node(node.clone()), idx + 1, size);
                    out.extend(eval_step(step, &step_ctx, depth)?);
                }
                if matches!(step.node, StepExpr::Axis(_)) {
                    out.into_document_order().map_err(|e| SpannedError::spanned(e, step.span.clone()))?
                } else {
                    out
                }
            }
        });
    }
    Ok(current.expect("at least one step"))
}

fn eval_step<N: Node>(step: &StepExprS, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    ctx.check_cancelled().map_err(|e| SpannedError::spanned(e, step.span.clone()))?;
    match &step.node {
        StepExpr::Axis(axis_step) => eval_axis_step(axis_step, ctx, depth, &step.span),
        StepExpr::Postfix { primary, postfixes } => {
            let value = eval_primary(primary, ctx, depth)?;
            eval_postfixes(value, postfixes, ctx, depth)
        }
    }
}

fn eval_axis_step<N: Node>(
    axis_step: &xpath_ast::ast::AxisStep,
    ctx: &DynamicContext<N>,
    depth: usize,
    span: &xpath_ast::span::Span,
) -> Result<Sequence<N>, SpannedError> {
    let context_node = ctx
        .require_context_item()
        .map_err(|e| SpannedError::spanned(e, span.clone()))?
        .as_node()
        .ok_or_else(|| SpannedError::spanned(Error::XPTY0020, span.clone()))?
        .clone();
    let mut candidates = step::axis_candidates(axis_step.axis, &context_node).map_err(|e| SpannedError::spanned(e, span.clone()))?;
    candidates.retain(|candidate| step::matches_node_test(&axis_step.node_test, axis_step.axis, candidate));

    let size = candidates.len();
    let mut out = Vec::with_capacity(candidates.len());
    for (idx, candidate) in candidates.into_iter().enumerate() {
        let position = idx + 1;
        let pred_ctx = ctx.with_context_item(Item::Node(candidate.clone()), position, size);
        let mut keep = true;
        for predicate in &axis_step.predicates {
            let value = eval_expr(predicate, &pred_ctx, depth)?;
            if !predicate_matches(&value, position, &pred_ctx).map_err(|e| SpannedError::spanned(e, span.clone()))? {
                keep = false;
                break;
            }
        }
        if keep {
            out.push(Item::Node(candidate));
        }
    }
    Ok(Sequence::from_items(out))
}

/// A predicate keeps its candidate iff: its value is a single number equal
/// to the candidate's position, or (otherwise) its effective boolean value
/// is true (spec.md §4.6 "Predicates").
fn predicate_matches<N: Node>(value: &Sequence<N>, position: usize, ctx: &DynamicContext<N>) -> Result<bool, Error> {
    if let [Item::Atomic(atomic)] = value.as_slice() {
        if atomic.is_numeric() {
            let target = AtomicValue::Integer(IBig::from(position as i64), Xs::Integer);
            return Ok(crate::atomic::compare_numeric(atomic, &target) == Some(Ordering::Equal));
        }
    }
    value.effective_boolean_value_for_version(ctx.xpath_version, &ctx.warnings)
}

/// Effective boolean value, honoring the dynamic context's XPath version
/// (spec.md §4.7).
fn ebv<N: Node>(seq: &Sequence<N>, ctx: &DynamicContext<N>) -> Result<bool, SpannedError> {
    seq.effective_boolean_value_for_version(ctx.xpath_version, &ctx.warnings)
        .map_err(SpannedError::unspanned)
}

fn eval_postfixes<N: Node>(
    mut value: Sequence<N>,
    postfixes: &[xpath_ast::ast::Postfix],
    ctx: &DynamicContext<N>,
    depth: usize,
) -> Result<Sequence<N>, SpannedError> {
    use xpath_ast::ast::Postfix;
    for postfix in postfixes {
        value = match postfix {
            Postfix::Predicate(expr) => {
                let size = value.len();
                let mut kept = Vec::new();
                for (idx, item) in value.into_vec().into_iter().enumerate() {
                    let position = idx + 1;
                    let pred_ctx = ctx.with_context_item(item.clone(), position, size);
                    let pv = eval_expr(expr, &pred_ctx, depth)?;
                    if predicate_matches(&pv, position, &pred_ctx).map_err(SpannedError::unspanned)? {
                        kept.push(item);
                    }
                }
                Sequence::from_items(kept)
            }
            Postfix::ArgumentList(arguments) => {
                let func = match value.require_singleton().map_err(SpannedError::unspanned)? {
                    Item::Function(f) => f.clone(),
                    _ => return Err(SpannedError::unspanned(Error::XPTY0004)),
                };
                let args = arguments
                    .iter()
                    .map(|a| eval_expr_single(a, ctx, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                call_function_item(&func, ctx, &args, depth, None)?
            }
            Postfix::Lookup(key) => eval_lookup(&value, key, ctx, depth)?,
        };
    }
    Ok(value)
}

// ---------------------------------------------------------------------
// Primary expressions (spec.md §4.6 "Primary expression")
// ---------------------------------------------------------------------

fn eval_primary<N: Node>(primary: &PrimaryExprS, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    match &primary.node {
        PrimaryExpr::Literal(lit) => Ok(Sequence::from_atomic(match lit {
            Literal::Integer(i) => AtomicValue::Integer(i.clone(), Xs::Integer),
            Literal::Decimal(d) => AtomicValue::Decimal(*d),
            Literal::Double(d) => AtomicValue::Double(*d),
            Literal::String(s) => AtomicValue::String(s.clone(), Xs::String),
        })),
        PrimaryExpr::VarRef(name) => ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| SpannedError::spanned(Error::XPST0008, primary.span.clone())),
        PrimaryExpr::Parenthesized(None) => Ok(Sequence::empty()),
        PrimaryExpr::Parenthesized(Some(expr)) => eval_expr(expr, ctx, depth),
        PrimaryExpr::ContextItem => ctx
            .require_context_item()
            .map(|item| Sequence::single(item.clone()))
            .map_err(|e| SpannedError::spanned(e, primary.span.clone())),
        PrimaryExpr::FunctionCall(call) => eval_function_call(call, ctx, depth, &primary.span),
        PrimaryExpr::NamedFunctionRef { name, arity } => Ok(Sequence::single(Item::Function(Rc::new(FunctionItem {
            arity: *arity,
            kind: FunctionItemKind::Named { name: name.clone() },
        })))),
        PrimaryExpr::InlineFunction(f) => {
            let body = f
                .body
                .clone()
                .ok_or_else(|| SpannedError::spanned(Error::XPST0017, primary.span.clone()))?;
            let params = f.params.iter().map(|p| p.name.clone()).collect();
            Ok(Sequence::single(Item::Function(Rc::new(FunctionItem {
                arity: f.params.len() as u8,
                kind: FunctionItemKind::Inline {
                    params,
                    body: XPath(body),
                    captured: ctx.clone(),
                },
            }))))
        }
        PrimaryExpr::MapConstructor(m) => eval_map_constructor(m, ctx, depth),
        PrimaryExpr::ArrayConstructor(a) => eval_array_constructor(a, ctx, depth),
        PrimaryExpr::UnaryLookup(key) => {
            let context = ctx
                .require_context_item()
                .map(|item| Sequence::single(item.clone()))
                .map_err(|e| SpannedError::spanned(e, primary.span.clone()))?;
            eval_lookup(&context, key, ctx, depth)
        }
        PrimaryExpr::StringTemplate(s) => Ok(Sequence::string(s.clone())),
    }
}

fn eval_map_constructor<N: Node>(m: &MapConstructor, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    let mut entries = Vec::with_capacity(m.entries.len());
    for (key_expr, value_expr) in &m.entries {
        let key_seq = eval_expr_single(key_expr, ctx, depth)?;
        let key = coerce::singleton_atomic(&key_seq)?;
        let value = eval_expr_single(value_expr, ctx, depth)?;
        entries.push((key, value));
    }
    Ok(Sequence::single(Item::Map(Rc::new(MapItem { entries }))))
}

fn eval_array_constructor<N: Node>(a: &ArrayConstructor, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    let members = match a {
        ArrayConstructor::Square(items) => items
            .iter()
            .map(|e| eval_expr_single(e, ctx, depth))
            .collect::<Result<Vec<_>, _>>()?,
        ArrayConstructor::Curly(expr) => {
            let seq = match expr {
                Some(e) => eval_expr(e, ctx, depth)?,
                None => Sequence::empty(),
            };
            seq.into_vec().into_iter().map(Sequence::single).collect()
        }
    };
    Ok(Sequence::single(Item::Array(Rc::new(ArrayItem { members }))))
}

fn eval_lookup<N: Node>(value: &Sequence<N>, key: &KeySpecifier, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    let mut out = Sequence::empty();
    for item in value.as_slice() {
        match item {
            Item::Map(map) => lookup_map(map, key, ctx, depth, &mut out)?,
            Item::Array(array) => lookup_array(array, key, ctx, depth, &mut out)?,
            _ => return Err(SpannedError::unspanned(Error::XPTY0004)),
        }
    }
    Ok(out)
}

fn lookup_map<N: Node>(
    map: &MapItem<N>,
    key: &KeySpecifier,
    ctx: &DynamicContext<N>,
    depth: usize,
    out: &mut Sequence<N>,
) -> Result<(), SpannedError> {
    match key {
        KeySpecifier::Star => {
            for (_, v) in &map.entries {
                out.extend(v.clone());
            }
        }
        KeySpecifier::NCName(name) => {
            if let Some(v) = map.get(&AtomicValue::String(name.clone(), Xs::String)) {
                out.extend(v.clone());
            }
        }
        KeySpecifier::Integer(i) => {
            if let Some(v) = map.get(&AtomicValue::Integer(i.clone(), Xs::Integer)) {
                out.extend(v.clone());
            }
        }
        KeySpecifier::Parenthesized(expr) => {
            let key_seq = match expr {
                Some(e) => eval_expr(e, ctx, depth)?,
                None => Sequence::empty(),
            };
            for key_item in key_seq.as_slice() {
                if let Some(k) = key_item.as_atomic() {
                    if let Some(v) = map.get(k) {
                        out.extend(v.clone());
                    }
                }
            }
        }
    }
    Ok(())
}

fn lookup_array<N: Node>(
    array: &ArrayItem<N>,
    key: &KeySpecifier,
    ctx: &DynamicContext<N>,
    depth: usize,
    out: &mut Sequence<N>,
) -> Result<(), SpannedError> {
    match key {
        KeySpecifier::Star => {
            for member in &array.members {
                out.extend(member.clone());
            }
        }
        KeySpecifier::Integer(i) => {
            let index = ibig_to_i64(i)?;
            out.extend(array.get(index)?.clone());
        }
        KeySpecifier::Parenthesized(expr) => {
            let key_seq = match expr {
                Some(e) => eval_expr(e, ctx, depth)?,
                None => Sequence::empty(),
            };
            for key_item in key_seq.as_slice() {
                let atomic = key_item.as_atomic().ok_or(Error::XPTY0004).map_err(SpannedError::unspanned)?;
                let integer = atomic.cast(Xs::Integer).map_err(SpannedError::unspanned)?;
                let index = match integer {
                    AtomicValue::Integer(i, _) => ibig_to_i64(&i)?,
                    _ => unreachable!("cast(Xs::Integer) always returns AtomicValue::Integer"),
                };
                out.extend(array.get(index)?.clone());
            }
        }
        KeySpecifier::NCName(_) => return Err(SpannedError::unspanned(Error::XPTY0004)),
    }
    Ok(())
}

fn ibig_to_i64(value: &IBig) -> Result<i64, SpannedError> {
    value.to_string().parse().map_err(|_| SpannedError::unspanned(Error::FOAR0002))
}

// ---------------------------------------------------------------------
// Function calls (spec.md §4.5)
// ---------------------------------------------------------------------

fn eval_function_call<N: Node>(
    call: &FunctionCall,
    ctx: &DynamicContext<N>,
    depth: usize,
    span: &xpath_ast::span::Span,
) -> Result<Sequence<N>, SpannedError> {
    let args = call
        .arguments
        .iter()
        .map(|a| eval_expr_single(a, ctx, depth))
        .collect::<Result<Vec<_>, _>>()?;
    let callable = ctx
        .functions
        .resolve(&call.name.node, args.len())
        .map_err(|e| SpannedError::spanned(e, call.name.span.clone()))?;
    call_callable(&callable, ctx, &args, depth, Some(span))
}

fn call_callable<N: Node>(
    callable: &crate::function::Callable<N>,
    ctx: &DynamicContext<N>,
    args: &[Sequence<N>],
    depth: usize,
    span: Option<&xpath_ast::span::Span>,
) -> Result<Sequence<N>, SpannedError> {
    check_recursion(ctx, depth, span)?;
    ctx.check_cancelled()
        .map_err(|e| SpannedError::new(e, span.cloned()))?;
    callable(ctx, args)
}

fn call_function_item<N: Node>(
    func: &Rc<FunctionItem<N>>,
    ctx: &DynamicContext<N>,
    args: &[Sequence<N>],
    depth: usize,
    span: Option<&xpath_ast::span::Span>,
) -> Result<Sequence<N>, SpannedError> {
    if args.len() != func.arity as usize {
        return Err(SpannedError::new(Error::XPTY0004, span.cloned()));
    }
    check_recursion(ctx, depth, span)?;
    match &func.kind {
        FunctionItemKind::Named { name } => {
            let callable = ctx
                .functions
                .resolve(name, args.len())
                .map_err(|e| SpannedError::new(e, span.cloned()))?;
            callable(ctx, args)
        }
        FunctionItemKind::Inline { params, body, captured } => {
            let mut call_ctx = captured.clone();
            for (param_name, arg_value) in params.iter().zip(args.iter()) {
                call_ctx = call_ctx.with_variable(param_name.clone(), arg_value.clone());
            }
            eval_expr(&body.0, &call_ctx, depth + 1)
        }
    }
}

fn check_recursion<N: Node>(ctx: &DynamicContext<N>, depth: usize, span: Option<&xpath_ast::span::Span>) -> Result<(), SpannedError> {
    if depth + 1 > ctx.recursion_limit {
        return Err(SpannedError::new(Error::RecursionLimit, span.cloned()));
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Binary/unary operators (spec.md §4.6)
// ---------------------------------------------------------------------

fn eval_binary<N: Node>(bin: &BinaryExpr, ctx: &DynamicContext<N>, depth: usize, span: &xpath_ast::span::Span) -> Result<Sequence<N>, SpannedError> {
    use BinaryOperator::*;
    match bin.operator {
        Or => {
            let left = ebv(&eval_expr_single(&bin.left, ctx, depth)?, ctx)?;
            if left {
                return Ok(Sequence::boolean(true));
            }
            let right = ebv(&eval_expr_single(&bin.right, ctx, depth)?, ctx)?;
            Ok(Sequence::boolean(right))
        }
        And => {
            let left = ebv(&eval_expr_single(&bin.left, ctx, depth)?, ctx)?;
            if !left {
                return Ok(Sequence::boolean(false));
            }
            let right = ebv(&eval_expr_single(&bin.right, ctx, depth)?, ctx)?;
            Ok(Sequence::boolean(right))
        }
        GenEq | GenNe | GenLt | GenLe | GenGt | GenGe => {
            let left = eval_expr_single(&bin.left, ctx, depth)?;
            let right = eval_expr_single(&bin.right, ctx, depth)?;
            Ok(Sequence::boolean(
                compare::general_compare(bin.operator, &left, &right).map_err(|e| SpannedError::spanned(e, span.clone()))?,
            ))
        }
        ValueEq | ValueNe | ValueLt | ValueLe | ValueGt | ValueGe => {
            let left = eval_expr_single(&bin.left, ctx, depth)?;
            let right = eval_expr_single(&bin.right, ctx, depth)?;
            Ok(Sequence::boolean(
                compare::value_compare(bin.operator, &left, &right).map_err(|e| SpannedError::spanned(e, span.clone()))?,
            ))
        }
        Is | Precedes | Follows => {
            let left = eval_expr_single(&bin.left, ctx, depth)?;
            let right = eval_expr_single(&bin.right, ctx, depth)?;
            Ok(Sequence::boolean(
                compare::node_compare(bin.operator, &left, &right).map_err(|e| SpannedError::spanned(e, span.clone()))?,
            ))
        }
        Concat => {
            let left = eval_expr_single(&bin.left, ctx, depth)?;
            let right = eval_expr_single(&bin.right, ctx, depth)?;
            let l = coerce::optional_singleton_string(&left)?.unwrap_or_default();
            let r = coerce::optional_singleton_string(&right)?.unwrap_or_default();
            Ok(Sequence::string(format!("{l}{r}")))
        }
        Range => {
            let left = eval_expr_single(&bin.left, ctx, depth)?;
            let right = eval_expr_single(&bin.right, ctx, depth)?;
            if left.is_empty() || right.is_empty() {
                return Ok(Sequence::empty());
            }
            let from = ibig_to_i64(&coerce::singleton_integer(&left)?)?;
            let to = ibig_to_i64(&coerce::singleton_integer(&right)?)?;
            Ok((from..=to).map(|v| Item::Atomic(AtomicValue::Integer(IBig::from(v), Xs::Integer))).collect())
        }
        Add | Sub | Mul | Div | IntDiv | Mod => {
            let left = eval_expr_single(&bin.left, ctx, depth)?;
            let right = eval_expr_single(&bin.right, ctx, depth)?;
            if left.is_empty() || right.is_empty() {
                return Ok(Sequence::empty());
            }
            let a = coerce::singleton_atomic(&left)?;
            let b = coerce::singleton_atomic(&right)?;
            let result = match bin.operator {
                Add => arithmetic::add(&a, &b),
                Sub => arithmetic::subtract(&a, &b),
                Mul => arithmetic::multiply(&a, &b),
                Div => arithmetic::divide(&a, &b),
                IntDiv => arithmetic::integer_divide(&a, &b),
                Mod => arithmetic::modulo(&a, &b),
                _ => unreachable!(),
            }
            .map_err(|e| SpannedError::spanned(e, span.clone()))?;
            Ok(Sequence::from_atomic(result))
        }
        Union | Intersect | Except => {
            let left = eval_expr_single(&bin.left, ctx, depth)?
                .into_document_order()
                .map_err(|e| SpannedError::spanned(e, span.clone()))?;
            let right = eval_expr_single(&bin.right, ctx, depth)?
                .into_document_order()
                .map_err(|e| SpannedError::spanned(e, span.clone()))?;
            Ok(eval_set_op(bin.operator, left, right))
        }
    }
}

fn eval_set_op<N: Node>(op: BinaryOperator, left: Sequence<N>, right: Sequence<N>) -> Sequence<N> {
    let left_nodes: Vec<N> = left
        .into_vec()
        .into_iter()
        .filter_map(|i| match i {
            Item::Node(n) => Some(n),
            _ => None,
        })
        .collect();
    let right_nodes: Vec<N> = right.into_vec().into_iter().filter_map(|i| match i {
        Item::Node(n) => Some(n),
        _ => None,
    }).collect();
    let result: Vec<N> = match op {
        BinaryOperator::Union => {
            let mut merged = left_nodes;
            for node in right_nodes {
                if !merged.iter().any(|n| n.document_order_key() == node.document_order_key()) {
                    merged.push(node);
                }
            }
            merged.sort_by_key(|n| n.document_order_key());
            merged
        }
        BinaryOperator::Intersect => left_nodes
            .into_iter()
            .filter(|n| right_nodes.iter().any(|r| r.document_order_key() == n.document_order_key()))
            .collect(),
        BinaryOperator::Except => left_nodes
            .into_iter()
            .filter(|n| !right_nodes.iter().any(|r| r.document_order_key() == n.document_order_key()))
            .collect(),
        _ => unreachable!(),
    };
    result.into_iter().map(Item::Node).collect()
}

fn eval_unary<N: Node>(operators: &[UnaryOperator], operand: &ExprSingleS, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    let value = eval_expr_single(operand, ctx, depth)?;
    if value.is_empty() {
        return Ok(Sequence::empty());
    }
    let mut atomic = coerce::singleton_atomic(&value)?;
    if !atomic.is_numeric() {
        return Err(SpannedError::unspanned(Error::XPTY0004));
    }
    let minus_count = operators.iter().filter(|op| matches!(op, UnaryOperator::Minus)).count();
    if minus_count % 2 == 1 {
        atomic = arithmetic::negate(&atomic).map_err(SpannedError::unspanned)?;
    }
    Ok(Sequence::from_atomic(atomic))
}

fn eval_simple_map<N: Node>(parts: &[ExprSingleS], ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    let (first, rest) = parts.split_first().expect("simple map always has at least one operand");
    let mut current = eval_expr_single(first, ctx, depth)?;
    for part in rest {
        let mut out = Sequence::empty();
        let size = current.len();
        for (idx, item) in current.into_vec().into_iter().enumerate() {
            let step_ctx = ctx.with_context_item(item, idx + 1, size);
            out.extend(eval_expr_single(part, &step_ctx, depth)?);
        }
        current = out;
    }
    Ok(current)
}

fn eval_arrow<N: Node>(
    source: &ExprSingleS,
    target: &ArrowTarget,
    arguments: &[ExprSingleS],
    ctx: &DynamicContext<N>,
    depth: usize,
    span: &xpath_ast::span::Span,
) -> Result<Sequence<N>, SpannedError> {
    let source_value = eval_expr_single(source, ctx, depth)?;
    let mut args = Vec::with_capacity(arguments.len() + 1);
    args.push(source_value);
    for arg in arguments {
        args.push(eval_expr_single(arg, ctx, depth)?);
    }
    match target {
        ArrowTarget::Name(name) => {
            let callable = ctx
                .functions
                .resolve(&name.node, args.len())
                .map_err(|e| SpannedError::spanned(e, name.span.clone()))?;
            call_callable(&callable, ctx, &args, depth, Some(span))
        }
        ArrowTarget::VarRef(name) => {
            let item = ctx
                .variables
                .get(&name.node)
                .ok_or_else(|| SpannedError::spanned(Error::XPST0008, name.span.clone()))?
                .require_singleton()
                .map_err(SpannedError::unspanned)?
                .clone();
            let func = match item {
                Item::Function(f) => f,
                _ => return Err(SpannedError::spanned(Error::XPTY0004, name.span.clone())),
            };
            call_function_item(&func, ctx, &args, depth, Some(span))
        }
        ArrowTarget::Parenthesized(expr) => {
            let value = eval_expr_single(expr, ctx, depth)?;
            let item = value.require_singleton().map_err(SpannedError::unspanned)?.clone();
            let func = match item {
                Item::Function(f) => f,
                _ => return Err(SpannedError::spanned(Error::XPTY0004, span.clone())),
            };
            call_function_item(&func, ctx, &args, depth, Some(span))
        }
    }
}

// ---------------------------------------------------------------------
// Bindings and control flow (spec.md §4.3)
// ---------------------------------------------------------------------

fn eval_for_bindings<N: Node>(
    bindings: &[(NameS, ExprSingleS)],
    body: &ExprSingleS,
    ctx: &DynamicContext<N>,
    depth: usize,
) -> Result<Sequence<N>, SpannedError> {
    match bindings.split_first() {
        None => eval_expr_single(body, ctx, depth),
        Some(((name, expr), rest)) => {
            let seq = eval_expr_single(expr, ctx, depth)?;
            let mut out = Sequence::empty();
            for item in seq.into_vec() {
                let new_ctx = ctx.with_variable(name.node.clone(), Sequence::single(item));
                out.extend(eval_for_bindings(rest, body, &new_ctx, depth)?);
            }
            Ok(out)
        }
    }
}

fn eval_let_bindings<N: Node>(
    bindings: &[(NameS, ExprSingleS)],
    body: &ExprSingleS,
    ctx: &DynamicContext<N>,
    depth: usize,
) -> Result<Sequence<N>, SpannedError> {
    match bindings.split_first() {
        None => eval_expr_single(body, ctx, depth),
        Some(((name, expr), rest)) => {
            let seq = eval_expr_single(expr, ctx, depth)?;
            let new_ctx = ctx.with_variable(name.node.clone(), seq);
            eval_let_bindings(rest, body, &new_ctx, depth)
        }
    }
}

fn eval_quantified<N: Node>(
    quantifier: Quantifier,
    bindings: &[(NameS, ExprSingleS)],
    satisfies: &ExprSingleS,
    ctx: &DynamicContext<N>,
    depth: usize,
) -> Result<bool, SpannedError> {
    match bindings.split_first() {
        None => ebv(&eval_expr_single(satisfies, ctx, depth)?, ctx),
        Some(((name, expr), rest)) => {
            let seq = eval_expr_single(expr, ctx, depth)?;
            for item in seq.into_vec() {
                let new_ctx = ctx.with_variable(name.node.clone(), Sequence::single(item));
                let satisfied = eval_quantified(quantifier, rest, satisfies, &new_ctx, depth)?;
                match quantifier {
                    Quantifier::Some if satisfied => return Ok(true),
                    Quantifier::Every if !satisfied => return Ok(false),
                    _ => {}
                }
            }
            Ok(matches!(quantifier, Quantifier::Every))
        }
    }
}

fn eval_if<N: Node>(if_expr: &IfExpr, ctx: &DynamicContext<N>, depth: usize) -> Result<Sequence<N>, SpannedError> {
    let condition = ebv(&eval_expr(&if_expr.condition, ctx, depth)?, ctx)?;
    if condition {
        eval_expr_single(&if_expr.then_branch, ctx, depth)
    } else {
        eval_expr_single(&if_expr.else_branch, ctx, depth)
    }
}

// ---------------------------------------------------------------------
// Sequence type matching (spec.md §4.4 "instance of"/"treat as")
// ---------------------------------------------------------------------

fn matches_sequence_type<N: Node>(seq: &Sequence<N>, sequence_type: &SequenceType) -> bool {
    match sequence_type {
        SequenceType::Empty => seq.is_empty(),
        SequenceType::Item { item_type, occurrence } => {
            let len = seq.len();
            let cardinality_ok = match occurrence {
                Occurrence::ExactlyOne => len == 1,
                Occurrence::ZeroOrOne => len <= 1,
                Occurrence::ZeroOrMore => true,
                Occurrence::OneOrMore => len >= 1,
            };
            cardinality_ok && seq.iter().all(|item| matches_item_type(item, item_type))
        }
    }
}

fn matches_item_type<N: Node>(item: &Item<N>, item_type: &ItemType) -> bool {
    match item_type {
        ItemType::Item => true,
        ItemType::AtomicOrUnion(xs) => item.as_atomic().map(|a| a.schema_type().matches(*xs)).unwrap_or(false),
        ItemType::Kind(kind_test) => item.as_node().map(|n| step::matches_kind_test(kind_test, n)).unwrap_or(false),
        ItemType::Function(test) => match (item, test) {
            (Item::Function(f), FunctionTest::Any) => {
                let _ = f;
                true
            }
            (Item::Function(f), FunctionTest::Typed { parameter_types, .. }) => f.arity as usize == parameter_types.len(),
            _ => false,
        },
        // Map/array value-type checking is structural and not enforced beyond
        // the item kind itself — this core validates arity/shape, not the
        // declared key/value types (documented simplification, see DESIGN.md).
        ItemType::Map(test) => matches!((item, test), (Item::Map(_), MapTest::Any | MapTest::Typed { .. })),
        ItemType::Array(_) => matches!(item, Item::Array(_)),
    }
}
