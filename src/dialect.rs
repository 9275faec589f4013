//! Dialect configuration and the node-kind whitelist.
//!
//! A [`Dialect`] describes which grammar forms the target language version
//! supports. It is consumed once at transformer construction; no version
//! inspection happens inside the transform logic itself. The whitelist is a
//! closed match over the AST enums; absence from the whitelist is terminal
//! for that subtree, never a warning.

use rustpython_parser::ast::{Constant, Expr, Stmt};
use serde::{Deserialize, Serialize};

/// Which tuple-unpack desugaring a dialect requires for tuple-shaped
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnpackStyle {
    /// Expand into guarded assignment statements with try/finally cleanup.
    /// Used wherever the context permits statements.
    Statements,
    /// Build nested wrapper closures; needed when the surrounding position
    /// (a single-expression function body) forbids statements.
    Expressions,
}

/// Capability flags for the target grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    /// Spread-call syntax: `f(*args)` positional and nameless `f(**kw)`
    /// keyword expansion.
    pub spread_calls: bool,
    /// Dedicated literal nodes for `True`/`False`/`None`. Without them the
    /// grammar spells `None` as a plain name reference.
    pub named_constants: bool,
    /// The `@` matrix-multiply operator (and its `@=` in-place form).
    pub matrix_multiply: bool,
    /// Legacy tuple-shaped function/lambda parameters, which force the
    /// expression-only unpack strategy inside single-expression bodies.
    pub tuple_parameters: bool,
}

impl Dialect {
    /// Current grammar: spread calls, constant literals, matrix multiply;
    /// no tuple-shaped parameters.
    pub fn modern() -> Self {
        Self {
            spread_calls: true,
            named_constants: true,
            matrix_multiply: true,
            tuple_parameters: false,
        }
    }

    /// Legacy grammar: tuple-shaped parameters exist, spread-call syntax,
    /// constant literal nodes and matrix multiply do not.
    pub fn legacy() -> Self {
        Self {
            spread_calls: false,
            named_constants: false,
            matrix_multiply: false,
            tuple_parameters: true,
        }
    }

    /// Strategy for unpacking tuple-shaped parameters.
    pub fn unpack_style(&self) -> UnpackStyle {
        if self.tuple_parameters {
            UnpackStyle::Expressions
        } else {
            UnpackStyle::Statements
        }
    }

    /// Whitelist check for statement kinds. The wildcard arm is the
    /// whitelist boundary: kinds not named here are denied.
    pub fn stmt_allowed(&self, stmt: &Stmt) -> bool {
        matches!(
            stmt,
            Stmt::FunctionDef(_)
                | Stmt::ClassDef(_)
                | Stmt::Return(_)
                | Stmt::Delete(_)
                | Stmt::Assign(_)
                | Stmt::AugAssign(_)
                | Stmt::For(_)
                | Stmt::While(_)
                | Stmt::If(_)
                | Stmt::With(_)
                | Stmt::Raise(_)
                | Stmt::Try(_)
                | Stmt::Assert(_)
                | Stmt::Import(_)
                | Stmt::ImportFrom(_)
                | Stmt::Expr(_)
                | Stmt::Pass(_)
                | Stmt::Break(_)
                | Stmt::Continue(_)
        )
    }

    /// Whitelist check for expression kinds.
    pub fn expr_allowed(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Constant(node) => match node.value {
                Constant::Bool(_) | Constant::None => self.named_constants,
                _ => true,
            },
            Expr::Starred(_) => self.spread_calls,
            Expr::BoolOp(_)
            | Expr::BinOp(_)
            | Expr::UnaryOp(_)
            | Expr::Lambda(_)
            | Expr::IfExp(_)
            | Expr::Dict(_)
            | Expr::Set(_)
            | Expr::ListComp(_)
            | Expr::SetComp(_)
            | Expr::DictComp(_)
            | Expr::GeneratorExp(_)
            | Expr::Compare(_)
            | Expr::Call(_)
            | Expr::Attribute(_)
            | Expr::Subscript(_)
            | Expr::Name(_)
            | Expr::List(_)
            | Expr::Tuple(_)
            | Expr::Slice(_) => true,
            _ => false,
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::modern()
    }
}

/// Statement kind name for rejection messages, matching the grammar's node
/// class names.
pub fn stmt_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::FunctionDef(_) => "FunctionDef",
        Stmt::AsyncFunctionDef(_) => "AsyncFunctionDef",
        Stmt::ClassDef(_) => "ClassDef",
        Stmt::Return(_) => "Return",
        Stmt::Delete(_) => "Delete",
        Stmt::Assign(_) => "Assign",
        Stmt::AugAssign(_) => "AugAssign",
        Stmt::AnnAssign(_) => "AnnAssign",
        Stmt::For(_) => "For",
        Stmt::AsyncFor(_) => "AsyncFor",
        Stmt::While(_) => "While",
        Stmt::If(_) => "If",
        Stmt::With(_) => "With",
        Stmt::AsyncWith(_) => "AsyncWith",
        Stmt::Match(_) => "Match",
        Stmt::Raise(_) => "Raise",
        Stmt::Try(_) => "Try",
        Stmt::TryStar(_) => "TryStar",
        Stmt::Assert(_) => "Assert",
        Stmt::Import(_) => "Import",
        Stmt::ImportFrom(_) => "ImportFrom",
        Stmt::Global(_) => "Global",
        Stmt::Nonlocal(_) => "Nonlocal",
        Stmt::Expr(_) => "Expr",
        Stmt::Pass(_) => "Pass",
        Stmt::Break(_) => "Break",
        Stmt::Continue(_) => "Continue",
        _ => "Statement",
    }
}

/// Expression kind name for rejection messages.
pub fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::BoolOp(_) => "BoolOp",
        Expr::NamedExpr(_) => "NamedExpr",
        Expr::BinOp(_) => "BinOp",
        Expr::UnaryOp(_) => "UnaryOp",
        Expr::Lambda(_) => "Lambda",
        Expr::IfExp(_) => "IfExp",
        Expr::Dict(_) => "Dict",
        Expr::Set(_) => "Set",
        Expr::ListComp(_) => "ListComp",
        Expr::SetComp(_) => "SetComp",
        Expr::DictComp(_) => "DictComp",
        Expr::GeneratorExp(_) => "GeneratorExp",
        Expr::Await(_) => "Await",
        Expr::Yield(_) => "Yield",
        Expr::YieldFrom(_) => "YieldFrom",
        Expr::Compare(_) => "Compare",
        Expr::Call(_) => "Call",
        Expr::FormattedValue(_) => "FormattedValue",
        Expr::JoinedStr(_) => "JoinedStr",
        Expr::Constant(node) => match node.value {
            Constant::Bool(_) | Constant::None => "NameConstant",
            _ => "Constant",
        },
        Expr::Attribute(_) => "Attribute",
        Expr::Subscript(_) => "Subscript",
        Expr::Starred(_) => "Starred",
        Expr::Name(_) => "Name",
        Expr::List(_) => "List",
        Expr::Tuple(_) => "Tuple",
        Expr::Slice(_) => "Slice",
        _ => "Expression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_parser::{ast, Mode};

    fn first_stmt(source: &str) -> Stmt {
        let module = rustpython_parser::parse(source, Mode::Module, "<test>").unwrap();
        match module {
            ast::Mod::Module(m) => m.body.into_iter().next().unwrap(),
            _ => unreachable!(),
        }
    }

    fn first_expr(source: &str) -> Expr {
        match first_stmt(source) {
            Stmt::Expr(node) => *node.value,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn async_forms_are_denied() {
        let dialect = Dialect::modern();
        assert!(!dialect.stmt_allowed(&first_stmt("async def f():\n    pass")));
        assert!(!dialect.expr_allowed(&first_expr("f\"x {y}\"")));
    }

    #[test]
    fn walrus_and_yield_are_denied() {
        let dialect = Dialect::modern();
        assert!(!dialect.expr_allowed(&first_expr("(x := 1)")));
        assert!(!dialect.stmt_allowed(&first_stmt("global x")));
    }

    #[test]
    fn plain_statements_pass_the_gate() {
        let dialect = Dialect::modern();
        for src in ["x = 1", "if x:\n    pass", "import math", "del x", "assert x"] {
            assert!(dialect.stmt_allowed(&first_stmt(src)), "{src}");
        }
    }

    #[test]
    fn named_constants_follow_the_dialect() {
        let constant = first_expr("True");
        assert!(Dialect::modern().expr_allowed(&constant));
        assert!(!Dialect::legacy().expr_allowed(&constant));
        assert_eq!(expr_kind(&constant), "NameConstant");

        let number = first_expr("42");
        assert!(Dialect::legacy().expr_allowed(&number));
    }

    #[test]
    fn spread_follows_the_dialect() {
        let call = first_expr("f(*args)");
        let Expr::Call(call) = call else { unreachable!() };
        let starred = &call.args[0];
        assert!(Dialect::modern().expr_allowed(starred));
        assert!(!Dialect::legacy().expr_allowed(starred));
    }

    #[test]
    fn unpack_style_selected_by_capability() {
        assert_eq!(Dialect::modern().unpack_style(), UnpackStyle::Statements);
        assert_eq!(Dialect::legacy().unpack_style(), UnpackStyle::Expressions);
    }
}
