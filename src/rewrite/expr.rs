//! Expression rewrite rules.
//!
//! Expressions are rewritten in place, children first. The gate runs before
//! any rule: a denied kind is reported and its subtree left untouched, so a
//! single pass never mixes guard calls into rejected code.

use super::{RestrictingTransformer, StmtRewrite};
use crate::dialect;
use crate::hooks;
use rustpython_parser::ast::{self, Expr, ExprContext, Operator, Stmt};
use rustpython_parser::text_size::TextRange;

impl RestrictingTransformer {
    pub(crate) fn visit_expr(&mut self, expr: &mut Expr) {
        if !self.dialect.expr_allowed(expr) {
            self.error(
                hooks::expr_range(expr),
                format!("{} statements are not allowed.", dialect::expr_kind(expr)),
            );
            return;
        }

        if matches!(expr, Expr::Attribute(_)) {
            return self.rewrite_attribute(expr);
        }
        if matches!(expr, Expr::Subscript(_)) {
            return self.rewrite_subscript(expr);
        }
        if matches!(expr, Expr::Call(_)) {
            return self.rewrite_call(expr);
        }

        match expr {
            Expr::Name(node) => {
                let id = node.id.as_str().to_string();
                if matches!(node.ctx, ExprContext::Load) {
                    let line = self.lines.line_of(node.range.start());
                    self.diagnostics.use_name(line, &id);
                }
                self.check_name(node.range, &id);
            }
            Expr::Constant(_) => {}
            Expr::BoolOp(node) => {
                for value in &mut node.values {
                    self.visit_expr(value);
                }
            }
            Expr::BinOp(node) => {
                if matches!(node.op, Operator::MatMult) && !self.dialect.matrix_multiply {
                    self.error(node.range, "MatMult statements are not allowed.");
                }
                self.visit_expr(&mut node.left);
                self.visit_expr(&mut node.right);
            }
            Expr::UnaryOp(node) => self.visit_expr(&mut node.operand),
            Expr::Lambda(node) => {
                self.visit_parameters(&mut node.args);
                self.visit_expr(&mut node.body);
            }
            Expr::IfExp(node) => {
                self.visit_expr(&mut node.test);
                self.visit_expr(&mut node.body);
                self.visit_expr(&mut node.orelse);
            }
            Expr::Dict(node) => {
                // A keyless entry is a `**mapping` expansion inside a
                // display; the value is still visited.
                for key in node.keys.iter_mut().flatten() {
                    self.visit_expr(key);
                }
                for value in &mut node.values {
                    self.visit_expr(value);
                }
            }
            Expr::Set(node) => {
                for elt in &mut node.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::ListComp(node) => {
                self.visit_comprehensions(&mut node.generators);
                self.visit_expr(&mut node.elt);
            }
            Expr::SetComp(node) => {
                self.visit_comprehensions(&mut node.generators);
                self.visit_expr(&mut node.elt);
            }
            Expr::GeneratorExp(node) => {
                self.visit_comprehensions(&mut node.generators);
                self.visit_expr(&mut node.elt);
            }
            Expr::DictComp(node) => {
                self.visit_comprehensions(&mut node.generators);
                self.visit_expr(&mut node.key);
                self.visit_expr(&mut node.value);
            }
            Expr::Compare(node) => {
                self.visit_expr(&mut node.left);
                for comparator in &mut node.comparators {
                    self.visit_expr(comparator);
                }
            }
            Expr::Starred(node) => self.visit_expr(&mut node.value),
            Expr::List(node) => {
                for elt in &mut node.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Tuple(node) => {
                for elt in &mut node.elts {
                    self.visit_expr(elt);
                }
            }
            Expr::Slice(node) => {
                for bound in [&mut node.lower, &mut node.upper, &mut node.step] {
                    if let Some(bound) = bound {
                        self.visit_expr(bound);
                    }
                }
            }
            // Unreachable: every other kind was denied by the gate above.
            _ => {}
        }
    }

    /// `obj.attr` reads become `_getattr_(obj, "attr")`; writes proxy the
    /// object through `_write_`. The attribute name itself is policed in
    /// every context.
    fn rewrite_attribute(&mut self, expr: &mut Expr) {
        let Expr::Attribute(node) = expr else { return };
        let attr = node.attr.as_str().to_string();
        self.check_attr_name(node.range, &attr);
        self.visit_expr(&mut node.value);
        match node.ctx {
            ExprContext::Load => {
                let range = node.range;
                let value = hooks::take(&mut node.value);
                *expr = hooks::call_ident(
                    hooks::GETATTR,
                    vec![value, hooks::str_literal(&attr, range)],
                    range,
                );
            }
            ExprContext::Store => hooks::wrap_in_guard(&mut node.value, hooks::WRITE),
            ExprContext::Del => {
                self.warn(
                    node.range,
                    format!("Attribute deletion of \"{attr}\" is not guarded."),
                );
            }
        }
    }

    /// `obj[key]` reads become `_getitem_(obj, key)` with slice keys
    /// normalized to `slice(...)` calls; writes and deletes proxy the object
    /// through `_write_` and keep the key syntax intact.
    fn rewrite_subscript(&mut self, expr: &mut Expr) {
        let Expr::Subscript(node) = expr else { return };
        self.visit_expr(&mut node.value);
        self.visit_key_children(&mut node.slice);
        match node.ctx {
            ExprContext::Load => {
                let range = node.range;
                let value = hooks::take(&mut node.value);
                let key = hooks::take(&mut node.slice);
                let key = self.normalize_key(key);
                *expr = hooks::call_ident(hooks::GETITEM, vec![value, key], range);
            }
            ExprContext::Store | ExprContext::Del => {
                hooks::wrap_in_guard(&mut node.value, hooks::WRITE);
            }
        }
    }

    /// Visits the expressions inside a subscript key without treating the
    /// key node itself as a value position.
    fn visit_key_children(&mut self, key: &mut Expr) {
        match key {
            Expr::Slice(node) => {
                for bound in [&mut node.lower, &mut node.upper, &mut node.step] {
                    if let Some(bound) = bound {
                        self.visit_expr(bound);
                    }
                }
            }
            Expr::Tuple(node) => {
                for dim in &mut node.elts {
                    self.visit_key_children(dim);
                }
            }
            other => self.visit_expr(other),
        }
    }

    /// Reifies a read key into a first-class value: slice syntax becomes a
    /// `slice(lower, upper, step)` call with `None` fillers, multi-dimension
    /// tuples normalize each dimension, anything else passes through.
    fn normalize_key(&self, key: Expr) -> Expr {
        match key {
            Expr::Slice(node) => {
                let range = node.range;
                let named = self.dialect.named_constants;
                let args = [node.lower, node.upper, node.step]
                    .into_iter()
                    .map(|bound| match bound {
                        Some(bound) => *bound,
                        None => hooks::none_literal(named, range),
                    })
                    .collect();
                hooks::call_ident("slice", args, range)
            }
            Expr::Tuple(node) => {
                let dims = node
                    .elts
                    .into_iter()
                    .map(|dim| self.normalize_key(dim))
                    .collect();
                Expr::Tuple(ast::ExprTuple {
                    elts: dims,
                    ctx: ExprContext::Load,
                    range: node.range,
                })
            }
            other => other,
        }
    }

    /// Calls with spread arguments are routed through `_apply_` so argument
    /// expansion happens under host control. Dynamic-code callees are
    /// rejected outright.
    fn rewrite_call(&mut self, expr: &mut Expr) {
        let Expr::Call(node) = expr else { return };
        if let Expr::Name(func) = &*node.func {
            match func.id.as_str() {
                "exec" => self.error(node.range, "Exec calls are not allowed."),
                "eval" => self.error(node.range, "Eval calls are not allowed."),
                _ => {}
            }
        }

        // Detected before child rewrites: the rewrites below replace the
        // nodes the detection looks at.
        let nameless_keyword = node.keywords.iter().any(|kw| kw.arg.is_none());
        let needs_wrap =
            nameless_keyword || node.args.iter().any(|arg| matches!(arg, Expr::Starred(_)));

        self.visit_expr(&mut node.func);
        for arg in &mut node.args {
            self.visit_expr(arg);
        }
        for keyword in &mut node.keywords {
            self.visit_expr(&mut keyword.value);
        }

        if !needs_wrap {
            return;
        }
        if !self.dialect.spread_calls {
            // Starred positionals were already denied by the gate; the
            // nameless-keyword form has no node of its own to deny there.
            if nameless_keyword {
                self.error(node.range, "Keyword argument unpacking is not allowed.");
            }
            return;
        }

        let func_range = hooks::expr_range(&node.func);
        let callee = std::mem::replace(
            &mut *node.func,
            hooks::name(hooks::APPLY, ExprContext::Load, func_range),
        );
        node.args.insert(0, callee);
    }

    /// Augmented assignment of a plain name turns into an `_inplacevar_`
    /// call carrying the operator token; attribute and item targets are
    /// rejected and left unmodified.
    pub(crate) fn rewrite_aug_assign(&mut self, mut node: ast::StmtAugAssign) -> StmtRewrite {
        self.visit_expr(&mut node.value);
        match &*node.target {
            Expr::Attribute(_) => {
                self.error(node.range, "Augmented assignment of attributes is not allowed.");
                StmtRewrite::Keep(Stmt::AugAssign(node))
            }
            Expr::Subscript(_) => {
                self.error(
                    node.range,
                    "Augmented assignment of object items and slices is not allowed.",
                );
                StmtRewrite::Keep(Stmt::AugAssign(node))
            }
            Expr::Name(target) => {
                let name = target.id.as_str().to_string();
                let target_range = target.range;
                self.check_name(target_range, &name);
                let range = node.range;
                match self.inplace_op_token(node.op, range) {
                    Some(token) => {
                        let call = hooks::call_ident(
                            hooks::INPLACEVAR,
                            vec![
                                hooks::str_literal(token, range),
                                hooks::name(&name, ExprContext::Load, target_range),
                                *node.value,
                            ],
                            range,
                        );
                        let target = hooks::name(&name, ExprContext::Store, target_range);
                        StmtRewrite::Replace(hooks::assign(target, call, range))
                    }
                    None => StmtRewrite::Keep(Stmt::AugAssign(node)),
                }
            }
            // The grammar permits no other augmented-assignment target.
            _ => StmtRewrite::Keep(Stmt::AugAssign(node)),
        }
    }

    /// Source token for an in-place operator, forwarded verbatim to the
    /// `_inplacevar_` hook.
    fn inplace_op_token(&mut self, op: Operator, range: TextRange) -> Option<&'static str> {
        let token = match op {
            Operator::Add => "+=",
            Operator::Sub => "-=",
            Operator::Mult => "*=",
            Operator::Div => "/=",
            Operator::Mod => "%=",
            Operator::Pow => "**=",
            Operator::LShift => "<<=",
            Operator::RShift => ">>=",
            Operator::BitOr => "|=",
            Operator::BitXor => "^=",
            Operator::BitAnd => "&=",
            Operator::FloorDiv => "//=",
            Operator::MatMult => {
                if !self.dialect.matrix_multiply {
                    self.error(range, "MatMult statements are not allowed.");
                    return None;
                }
                "@="
            }
        };
        Some(token)
    }

    /// Every iteration source in a comprehension chain is wrapped in the
    /// iteration guard; targets and filters are rewritten like any other
    /// position.
    pub(crate) fn visit_comprehensions(&mut self, generators: &mut [ast::Comprehension]) {
        for comp in generators {
            if comp.is_async {
                let range = hooks::expr_range(&comp.iter);
                self.error(range, "AsyncComprehension statements are not allowed.");
                continue;
            }
            self.visit_expr(&mut comp.target);
            self.visit_expr(&mut comp.iter);
            hooks::wrap_in_guard(&mut comp.iter, hooks::GETITER);
            for filter in &mut comp.ifs {
                self.visit_expr(filter);
            }
        }
    }
}
