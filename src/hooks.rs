//! Reserved guard-hook identifiers and AST synthesis helpers.
//!
//! The six hook names below are the entire boundary contract between this
//! transformer and the host's access-control policy. The host injects them
//! into the execution scope; the leading `_` prefix, which the name policy
//! forbids in user code, guarantees sandboxed code can neither shadow nor
//! reference them.
//!
//! Synthesized nodes always copy their `range` from the node they replace;
//! position metadata is mandatory, never inferred.

use rustpython_parser::ast::{self, Expr, ExprContext, Stmt};
use rustpython_parser::text_size::TextRange;

/// Read-attribute guard: `obj.attr` → `_getattr_(obj, "attr")`.
pub const GETATTR: &str = "_getattr_";
/// Write-access guard; returns a write-proxy for attribute/item mutation.
pub const WRITE: &str = "_write_";
/// Read-item guard: `obj[k]` → `_getitem_(obj, k)`.
pub const GETITEM: &str = "_getitem_";
/// Iteration guard, wrapped around every iterable source.
pub const GETITER: &str = "_getiter_";
/// Variadic-call guard: validates spread arguments before applying.
pub const APPLY: &str = "_apply_";
/// In-place-operator guard for augmented assignment of plain names.
pub const INPLACEVAR: &str = "_inplacevar_";

/// All reserved hook identifiers, in rewrite order of introduction.
pub const GUARD_HOOKS: [&str; 6] = [GETATTR, WRITE, GETITEM, GETITER, APPLY, INPLACEVAR];

/// A name reference with the given access context.
pub(crate) fn name(id: &str, ctx: ExprContext, range: TextRange) -> Expr {
    Expr::Name(ast::ExprName {
        id: id.to_string().into(),
        ctx,
        range,
    })
}

/// A string literal, used for attribute names and operator tokens.
pub(crate) fn str_literal(value: &str, range: TextRange) -> Expr {
    Expr::Constant(ast::ExprConstant {
        value: ast::Constant::Str(value.to_string()),
        kind: None,
        range,
    })
}

/// An integer literal, used for positional reads in unpack wrappers.
pub(crate) fn int_literal(value: u32, range: TextRange) -> Expr {
    Expr::Constant(ast::ExprConstant {
        value: ast::Constant::Int(value.into()),
        kind: None,
        range,
    })
}

/// The `None` filler for absent slice bounds. Dialects without constant
/// literal nodes spell it as a plain name reference instead.
pub(crate) fn none_literal(named_constants: bool, range: TextRange) -> Expr {
    if named_constants {
        Expr::Constant(ast::ExprConstant {
            value: ast::Constant::None,
            kind: None,
            range,
        })
    } else {
        name("None", ExprContext::Load, range)
    }
}

/// A call to a fixed identifier (guard hook or `slice` constructor).
pub(crate) fn call_ident(func: &str, args: Vec<Expr>, range: TextRange) -> Expr {
    Expr::Call(ast::ExprCall {
        func: Box::new(name(func, ExprContext::Load, range)),
        args,
        keywords: vec![],
        range,
    })
}

/// Moves an expression out of its slot, leaving a placeholder that the
/// caller overwrites immediately.
pub(crate) fn take(slot: &mut Expr) -> Expr {
    let range = expr_range(slot);
    std::mem::replace(slot, str_literal("", range))
}

/// Rewrites `expr` in place into `hook(expr)`, copying its position.
pub(crate) fn wrap_in_guard(slot: &mut Expr, hook: &str) {
    let range = expr_range(slot);
    let inner = take(slot);
    *slot = call_ident(hook, vec![inner], range);
}

pub(crate) fn expr_range(expr: &Expr) -> TextRange {
    use rustpython_parser::ast::Ranged;
    expr.range()
}

pub(crate) fn stmt_range(stmt: &Stmt) -> TextRange {
    use rustpython_parser::ast::Ranged;
    stmt.range()
}

/// A single-target assignment statement.
pub(crate) fn assign(target: Expr, value: Expr, range: TextRange) -> Stmt {
    Stmt::Assign(ast::StmtAssign {
        targets: vec![target],
        value: Box::new(value),
        type_comment: None,
        range,
    })
}

/// `del name`, the cleanup step for hidden temporaries.
pub(crate) fn del_stmt(name_to_del: &str, range: TextRange) -> Stmt {
    Stmt::Delete(ast::StmtDelete {
        targets: vec![name(name_to_del, ExprContext::Del, range)],
        range,
    })
}

/// `try: <body> finally: <finalbody>` with no handlers, the scoped-cleanup
/// block guaranteeing temporary deletion on every exit path.
pub(crate) fn try_finally(body: Vec<Stmt>, finalbody: Vec<Stmt>, range: TextRange) -> Stmt {
    Stmt::Try(ast::StmtTry {
        body,
        handlers: vec![],
        orelse: vec![],
        finalbody,
        range,
    })
}

/// A one-parameter lambda, the wrapper shape of the expression-only unpack
/// strategy.
pub(crate) fn lambda_expr(param: &str, body: Expr, range: TextRange) -> Expr {
    let parameter = ast::ArgWithDefault {
        def: ast::Arg {
            arg: param.to_string().into(),
            annotation: None,
            type_comment: None,
            range,
        },
        default: None,
        range: Default::default(),
    };
    Expr::Lambda(ast::ExprLambda {
        args: Box::new(ast::Arguments {
            posonlyargs: vec![],
            args: vec![parameter],
            vararg: None,
            kwonlyargs: vec![],
            kwarg: None,
            range: Default::default(),
        }),
        body: Box::new(body),
        range,
    })
}
