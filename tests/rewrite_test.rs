use pretty_assertions::assert_eq;
use pyrestrict::{
    hooks, transform_source, Dialect, RestrictingTransformer, TransformOutcome, Unpacked,
};
use rustpython_parser::ast::{self, Constant, Expr, ExprContext, Stmt};

fn transform(source: &str) -> TransformOutcome {
    transform_source(source, &Dialect::modern()).unwrap()
}

fn body(outcome: &TransformOutcome) -> &[Stmt] {
    match &outcome.module {
        ast::Mod::Module(module) => &module.body,
        other => panic!("expected module root, got {other:?}"),
    }
}

fn errors(outcome: &TransformOutcome) -> Vec<String> {
    outcome
        .diagnostics
        .errors()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn guard_call<'a>(expr: &'a Expr, hook: &str) -> Option<&'a ast::ExprCall> {
    let Expr::Call(call) = expr else { return None };
    match &*call.func {
        Expr::Name(name) if name.id.as_str() == hook => Some(call),
        _ => None,
    }
}

fn str_value(expr: &Expr) -> &str {
    match expr {
        Expr::Constant(node) => match &node.value {
            Constant::Str(value) => value,
            other => panic!("expected string constant, got {other:?}"),
        },
        other => panic!("expected constant, got {other:?}"),
    }
}

#[test]
fn attribute_read_goes_through_getattr() {
    let outcome = transform("result = data.value");
    assert_eq!(errors(&outcome), Vec::<String>::new());

    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected assignment");
    };
    let call = guard_call(&assign.value, hooks::GETATTR).unwrap();
    assert!(matches!(&call.args[0], Expr::Name(n) if n.id.as_str() == "data"));
    assert_eq!(str_value(&call.args[1]), "value");
}

#[test]
fn attribute_chain_nests_getattr_calls() {
    let outcome = transform("response.payload.header");
    let Stmt::Expr(stmt) = &body(&outcome)[0] else {
        panic!("expected expression statement");
    };
    let outer = guard_call(&stmt.value, hooks::GETATTR).unwrap();
    assert_eq!(str_value(&outer.args[1]), "header");
    let inner = guard_call(&outer.args[0], hooks::GETATTR).unwrap();
    assert_eq!(str_value(&inner.args[1]), "payload");
    assert!(matches!(&inner.args[0], Expr::Name(n) if n.id.as_str() == "response"));
}

#[test]
fn attribute_write_proxies_the_object() {
    let outcome = transform("record.status = done");
    assert_eq!(errors(&outcome), Vec::<String>::new());

    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected assignment");
    };
    let Expr::Attribute(target) = &assign.targets[0] else {
        panic!("expected attribute target");
    };
    assert_eq!(target.attr.as_str(), "status");
    assert!(matches!(target.ctx, ExprContext::Store));
    let proxy = guard_call(&target.value, hooks::WRITE).unwrap();
    assert!(matches!(&proxy.args[0], Expr::Name(n) if n.id.as_str() == "record"));
}

#[test]
fn subscript_read_goes_through_getitem() {
    let outcome = transform("entry = table[key]");
    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected assignment");
    };
    let call = guard_call(&assign.value, hooks::GETITEM).unwrap();
    assert!(matches!(&call.args[0], Expr::Name(n) if n.id.as_str() == "table"));
    // A plain index key passes through untouched.
    assert!(matches!(&call.args[1], Expr::Name(n) if n.id.as_str() == "key"));
}

#[test]
fn slice_keys_become_slice_calls() {
    let outcome = transform("window = samples[1:limit]");
    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected assignment");
    };
    let call = guard_call(&assign.value, hooks::GETITEM).unwrap();
    let slice = guard_call(&call.args[1], "slice").unwrap();
    assert_eq!(slice.args.len(), 3);
    assert!(matches!(
        &slice.args[0],
        Expr::Constant(c) if matches!(c.value, Constant::Int(_))
    ));
    assert!(matches!(&slice.args[1], Expr::Name(n) if n.id.as_str() == "limit"));
    // Absent step filled with None.
    assert!(matches!(
        &slice.args[2],
        Expr::Constant(c) if matches!(c.value, Constant::None)
    ));
}

#[test]
fn absent_lower_bound_fills_with_none() {
    let outcome = transform("window = samples[:limit]");
    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected assignment");
    };
    let call = guard_call(&assign.value, hooks::GETITEM).unwrap();
    let slice = guard_call(&call.args[1], "slice").unwrap();
    assert!(matches!(
        &slice.args[0],
        Expr::Constant(c) if matches!(c.value, Constant::None)
    ));
    assert!(matches!(&slice.args[1], Expr::Name(n) if n.id.as_str() == "limit"));
}

#[test]
fn multidimensional_keys_normalize_each_dimension() {
    let outcome = transform("region = grid[1:2, 3]");
    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected assignment");
    };
    let call = guard_call(&assign.value, hooks::GETITEM).unwrap();
    let Expr::Tuple(dims) = &call.args[1] else {
        panic!("expected tuple key");
    };
    assert!(guard_call(&dims.elts[0], "slice").is_some());
    assert!(matches!(
        &dims.elts[1],
        Expr::Constant(c) if matches!(c.value, Constant::Int(_))
    ));
}

#[test]
fn subscript_write_and_delete_proxy_the_object() {
    for source in ["cache[key] = value", "del cache[key]"] {
        let outcome = transform(source);
        assert_eq!(errors(&outcome), Vec::<String>::new(), "{source}");
        let target = match &body(&outcome)[0] {
            Stmt::Assign(assign) => &assign.targets[0],
            Stmt::Delete(delete) => &delete.targets[0],
            other => panic!("unexpected statement for {source}: {other:?}"),
        };
        let Expr::Subscript(node) = target else {
            panic!("expected subscript target for {source}");
        };
        let proxy = guard_call(&node.value, hooks::WRITE).unwrap();
        assert!(matches!(&proxy.args[0], Expr::Name(n) if n.id.as_str() == "cache"));
        // The key keeps its source syntax on the write path.
        assert!(matches!(&*node.slice, Expr::Name(_)));
    }
}

#[test]
fn for_loops_guard_the_iterable() {
    let outcome = transform("for item in items:\n    pass");
    let Stmt::For(stmt) = &body(&outcome)[0] else {
        panic!("expected for loop");
    };
    let call = guard_call(&stmt.iter, hooks::GETITER).unwrap();
    assert!(matches!(&call.args[0], Expr::Name(n) if n.id.as_str() == "items"));
}

#[test]
fn comprehensions_guard_every_clause() {
    let outcome = transform("pairs = [(a, b) for a in left for b in right if b]");
    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected assignment");
    };
    let Expr::ListComp(comp) = &*assign.value else {
        panic!("expected list comprehension");
    };
    assert_eq!(comp.generators.len(), 2);
    for generator in &comp.generators {
        assert!(guard_call(&generator.iter, hooks::GETITER).is_some());
    }
}

#[test]
fn spread_calls_route_through_apply() {
    let outcome = transform("handler(first, *rest, **options)");
    assert_eq!(errors(&outcome), Vec::<String>::new());

    let Stmt::Expr(stmt) = &body(&outcome)[0] else {
        panic!("expected expression statement");
    };
    let call = guard_call(&stmt.value, hooks::APPLY).unwrap();
    assert!(matches!(&call.args[0], Expr::Name(n) if n.id.as_str() == "handler"));
    assert!(matches!(&call.args[1], Expr::Name(n) if n.id.as_str() == "first"));
    assert!(matches!(&call.args[2], Expr::Starred(_)));
    assert!(call.keywords[0].arg.is_none());
}

#[test]
fn plain_calls_keep_their_callee() {
    let outcome = transform("handler(first, mode=1)");
    let Stmt::Expr(stmt) = &body(&outcome)[0] else {
        panic!("expected expression statement");
    };
    let Expr::Call(call) = &*stmt.value else {
        panic!("expected call");
    };
    assert!(matches!(&*call.func, Expr::Name(n) if n.id.as_str() == "handler"));
}

#[test]
fn augmented_assignment_of_names_uses_inplacevar() {
    let outcome = transform("total += step");
    assert_eq!(errors(&outcome), Vec::<String>::new());

    let Stmt::Assign(assign) = &body(&outcome)[0] else {
        panic!("expected rewritten assignment");
    };
    assert!(matches!(&assign.targets[0], Expr::Name(n) if n.id.as_str() == "total"));
    let call = guard_call(&assign.value, hooks::INPLACEVAR).unwrap();
    assert_eq!(str_value(&call.args[0]), "+=");
    assert!(matches!(&call.args[1], Expr::Name(n) if n.id.as_str() == "total"));
    assert!(matches!(&call.args[2], Expr::Name(n) if n.id.as_str() == "step"));
}

#[test]
fn operator_tokens_follow_the_source() {
    for (source, token) in [
        ("n -= 1", "-="),
        ("n //= 2", "//="),
        ("n **= 2", "**="),
        ("n @= m", "@="),
    ] {
        let outcome = transform(source);
        let Stmt::Assign(assign) = &body(&outcome)[0] else {
            panic!("expected rewritten assignment for {source}");
        };
        let call = guard_call(&assign.value, hooks::INPLACEVAR).unwrap();
        assert_eq!(str_value(&call.args[0]), token, "{source}");
    }
}

#[test]
fn augmented_attribute_and_item_targets_are_rejected_unmodified() {
    let outcome = transform("obj.count += 1");
    assert_eq!(
        errors(&outcome),
        vec!["Line 1: Augmented assignment of attributes is not allowed."]
    );
    assert!(matches!(&body(&outcome)[0], Stmt::AugAssign(_)));

    let outcome = transform("counts[key] += 1");
    assert_eq!(
        errors(&outcome),
        vec!["Line 1: Augmented assignment of object items and slices is not allowed."]
    );
    assert!(matches!(&body(&outcome)[0], Stmt::AugAssign(_)));
}

#[test]
fn sequence_assignment_guards_and_cleans_up() {
    let outcome = transform("(head, (left, right)) = pairs");
    assert_eq!(errors(&outcome), Vec::<String>::new());

    let stmts = body(&outcome);
    assert_eq!(stmts.len(), 2);

    let Stmt::Assign(first) = &stmts[0] else {
        panic!("expected outer assignment");
    };
    assert!(guard_call(&first.value, hooks::GETITER).is_some());
    let Expr::Tuple(outer) = &first.targets[0] else {
        panic!("expected tuple target");
    };
    assert!(matches!(&outer.elts[0], Expr::Name(n) if n.id.as_str() == "head"));
    assert!(matches!(&outer.elts[1], Expr::Name(n) if n.id.as_str() == "_tmp0"));

    let Stmt::Try(cleanup) = &stmts[1] else {
        panic!("expected try/finally");
    };
    let Stmt::Assign(inner) = &cleanup.body[0] else {
        panic!("expected inner assignment");
    };
    let call = guard_call(&inner.value, hooks::GETITER).unwrap();
    assert!(matches!(&call.args[0], Expr::Name(n) if n.id.as_str() == "_tmp0"));
    let Stmt::Delete(del) = &cleanup.finalbody[0] else {
        panic!("expected temporary deletion");
    };
    assert!(matches!(&del.targets[0], Expr::Name(n) if n.id.as_str() == "_tmp0"));
}

#[test]
fn chained_targets_fill_right_to_left() {
    let outcome = transform("alias = (a, b) = source");
    let stmts = body(&outcome);
    assert_eq!(stmts.len(), 2);

    // Rightmost target first, mirroring the host's own fill order.
    let Stmt::Assign(first) = &stmts[0] else {
        panic!("expected sequence assignment first");
    };
    assert!(matches!(&first.targets[0], Expr::Tuple(_)));
    assert!(guard_call(&first.value, hooks::GETITER).is_some());

    let Stmt::Assign(second) = &stmts[1] else {
        panic!("expected plain assignment second");
    };
    assert!(matches!(&second.targets[0], Expr::Name(n) if n.id.as_str() == "alias"));
    assert!(matches!(&*second.value, Expr::Name(n) if n.id.as_str() == "source"));
}

#[test]
fn for_targets_are_not_desugared() {
    let outcome = transform("for key, value in table:\n    pass");
    let Stmt::For(stmt) = &body(&outcome)[0] else {
        panic!("expected for loop");
    };
    assert!(matches!(&*stmt.target, Expr::Tuple(_)));
    assert!(guard_call(&stmt.iter, hooks::GETITER).is_some());
}

#[test]
fn function_bodies_are_rewritten() {
    let source = r#"
def pick(record):
    return record.field
"#;
    let outcome = transform(source);
    let Stmt::FunctionDef(func) = &body(&outcome)[0] else {
        panic!("expected function definition");
    };
    let Stmt::Return(ret) = &func.body[0] else {
        panic!("expected return");
    };
    let call = guard_call(ret.value.as_ref().unwrap(), hooks::GETATTR).unwrap();
    assert_eq!(str_value(&call.args[1]), "field");
}

fn parse_assign(source: &str) -> (Expr, Expr, rustpython_parser::text_size::TextRange) {
    let module =
        rustpython_parser::parse(source, rustpython_parser::Mode::Module, "<test>").unwrap();
    let ast::Mod::Module(module) = module else {
        panic!("expected module");
    };
    let Some(Stmt::Assign(assign)) = module.body.into_iter().next() else {
        panic!("expected assignment in {source:?}");
    };
    let range = assign.range;
    let target = assign.targets.into_iter().next().unwrap();
    (target, *assign.value, range)
}

#[test]
fn public_desugar_follows_the_dialect_strategy() {
    let source = "(a, (b, c)) = value";

    let (target, value, range) = parse_assign(source);
    let mut modern = RestrictingTransformer::new(Dialect::modern(), source);
    let Unpacked::Stmts(stmts) = modern.desugar_unpack(target, value, range) else {
        panic!("expected statement expansion");
    };
    assert_eq!(stmts.len(), 2);

    // Legacy grammars carry tuple-shaped parameters, so hosts splicing into
    // expression-only positions get the closure chain instead.
    let (target, value, range) = parse_assign(source);
    let mut legacy = RestrictingTransformer::new(Dialect::legacy(), source);
    let Unpacked::Expr(rewritten) = legacy.desugar_unpack(target, value, range) else {
        panic!("expected expression chain");
    };
    let Expr::Call(wrapper) = &rewritten else {
        panic!("expected wrapper call");
    };
    assert!(matches!(&*wrapper.func, Expr::Lambda(_)));
}

#[test]
fn clean_sources_round_trip_without_diagnostics() {
    let source = r#"
def total(rows):
    acc = 0
    for row in rows:
        acc += row
    return acc

result = total(data)
"#;
    let outcome = transform(source);
    assert_eq!(errors(&outcome), Vec::<String>::new());
    assert!(outcome.diagnostics.warnings().is_empty());
    assert!(!outcome.diagnostics.has_errors());
}
