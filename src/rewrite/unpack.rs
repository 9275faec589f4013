//! Sequence-target desugaring.
//!
//! Unpacking a sequence iterates its source, so every level of a tuple or
//! list target must pass through the iteration guard. Two strategies exist
//! behind one interface, selected by [`UnpackStyle`]:
//!
//! * `Statements` expands into plain assignments. Nested levels bind hidden
//!   temporaries, each consumed inside a try/finally that deletes the
//!   temporary on every exit path.
//! * `Expressions` builds a chain of one-parameter wrapper closures, one per
//!   nesting level, for positions whose grammar forbids statements. Each
//!   wrapper rebuilds the pattern shape with positional `_getitem_` reads
//!   and wraps that level's sequences in `_getiter_`.

use super::RestrictingTransformer;
use crate::dialect::UnpackStyle;
use crate::hooks;
use rustpython_parser::ast::{self, Expr, ExprContext, Stmt};
use rustpython_parser::text_size::TextRange;

/// Result of desugaring one sequence target.
#[derive(Debug)]
pub enum Unpacked {
    Stmts(Vec<Stmt>),
    Expr(Expr),
}

/// True for targets that destructure by iteration.
pub(crate) fn is_sequence_pattern(expr: &Expr) -> bool {
    matches!(expr, Expr::Tuple(_) | Expr::List(_))
}

fn sequence_elts(expr: &Expr) -> Option<&[Expr]> {
    match expr {
        Expr::Tuple(node) => Some(&node.elts),
        Expr::List(node) => Some(&node.elts),
        _ => None,
    }
}

/// True if `expr` contains a sequence pattern exactly `depth` levels down.
fn has_sequence_at_depth(expr: &Expr, depth: u32) -> bool {
    match sequence_elts(expr) {
        None => false,
        Some(elts) => {
            depth == 0
                || elts
                    .iter()
                    .any(|elt| has_sequence_at_depth(elt, depth - 1))
        }
    }
}

/// Rebuilds `pattern` as an expression reading from `base`, wrapping the
/// sequences found `depth_left` levels down in the iteration guard.
/// Subtrees with nothing left to wrap pass through as a single read.
fn rebuild_level(pattern: &Expr, base: Expr, depth_left: u32) -> Expr {
    if !has_sequence_at_depth(pattern, depth_left) {
        return base;
    }
    let range = hooks::expr_range(pattern);
    if depth_left == 0 {
        return hooks::call_ident(hooks::GETITER, vec![base], range);
    }
    let elts = match sequence_elts(pattern) {
        Some(elts) => elts,
        None => return base,
    };
    let rebuilt = elts
        .iter()
        .enumerate()
        .map(|(index, elt)| {
            let read = hooks::call_ident(
                hooks::GETITEM,
                vec![base.clone(), hooks::int_literal(index as u32, range)],
                hooks::expr_range(elt),
            );
            rebuild_level(elt, read, depth_left - 1)
        })
        .collect();
    Expr::Tuple(ast::ExprTuple {
        elts: rebuilt,
        ctx: ExprContext::Load,
        range,
    })
}

impl RestrictingTransformer {
    /// Desugars one sequence target against `source` under the strategy the
    /// dialect requires.
    ///
    /// The transform itself expands assignment statements, where statements
    /// are always permitted. Hosts that embed restricted code in
    /// expression-only positions (legacy tuple-shaped parameters inside
    /// single-expression bodies) call this directly and splice the result.
    pub fn desugar_unpack(&mut self, pattern: Expr, source: Expr, range: TextRange) -> Unpacked {
        self.desugar_unpack_with(self.dialect.unpack_style(), pattern, source, range)
    }

    pub(crate) fn desugar_unpack_with(
        &mut self,
        style: UnpackStyle,
        pattern: Expr,
        source: Expr,
        range: TextRange,
    ) -> Unpacked {
        match style {
            UnpackStyle::Statements => {
                Unpacked::Stmts(self.desugar_sequence_assign(pattern, source, range))
            }
            UnpackStyle::Expressions => {
                Unpacked::Expr(self.desugar_sequence_expr(&pattern, source))
            }
        }
    }

    /// Statement strategy.
    ///
    /// `(a, b) = v` becomes `(a, b) = _getiter_(v)`. A nested level binds a
    /// hidden temporary first:
    ///
    /// ```text
    /// (a, _tmp0) = _getiter_(v)
    /// try:
    ///     (b, c) = _getiter_(_tmp0)
    /// finally:
    ///     del _tmp0
    /// ```
    fn desugar_sequence_assign(&mut self, pattern: Expr, value: Expr, range: TextRange) -> Vec<Stmt> {
        let (mut elts, pattern_range) = match pattern {
            Expr::Tuple(node) => (node.elts, node.range),
            Expr::List(node) => (node.elts, node.range),
            other => return vec![hooks::assign(other, value, range)],
        };

        let mut nested: Vec<(String, Expr)> = Vec::new();
        for elt in &mut elts {
            if is_sequence_pattern(elt) {
                let tmp = self.gen_tmp_name();
                let elt_range = hooks::expr_range(elt);
                let child =
                    std::mem::replace(elt, hooks::name(&tmp, ExprContext::Store, elt_range));
                nested.push((tmp, child));
            }
        }

        let target = Expr::Tuple(ast::ExprTuple {
            elts,
            ctx: ExprContext::Store,
            range: pattern_range,
        });
        let guarded = hooks::call_ident(hooks::GETITER, vec![value], range);
        let mut out = vec![hooks::assign(target, guarded, range)];

        for (tmp, child) in nested {
            let child_range = hooks::expr_range(&child);
            let source = hooks::name(&tmp, ExprContext::Load, child_range);
            let body = self.desugar_sequence_assign(child, source, range);
            out.push(hooks::try_finally(
                body,
                vec![hooks::del_stmt(&tmp, range)],
                range,
            ));
        }
        out
    }

    /// Expression strategy.
    ///
    /// Builds one wrapper per nesting level, outside in, and threads the
    /// source through the chain. For `(a, (b, c))` against `v`:
    ///
    /// ```text
    /// (lambda _tmp0:
    ///     (_getitem_(_tmp0, 0), _getiter_(_getitem_(_tmp0, 1)))
    /// )(_getiter_(v))
    /// ```
    ///
    /// Position reads go through `_getitem_`, so the host's iteration guard
    /// must hand back an indexable sequence for these wrappers to consume.
    fn desugar_sequence_expr(&mut self, pattern: &Expr, source: Expr) -> Expr {
        let range = hooks::expr_range(pattern);
        let mut acc = hooks::call_ident(hooks::GETITER, vec![source], range);
        let mut depth = 1;
        while has_sequence_at_depth(pattern, depth) {
            let tmp = self.gen_tmp_name();
            let base = hooks::name(&tmp, ExprContext::Load, range);
            let body = rebuild_level(pattern, base, depth);
            let wrapper = hooks::lambda_expr(&tmp, body, range);
            acc = Expr::Call(ast::ExprCall {
                func: Box::new(wrapper),
                args: vec![acc],
                keywords: vec![],
                range,
            });
            depth += 1;
        }
        acc
    }
}
