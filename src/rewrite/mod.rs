//! Single-pass traversal driver.
//!
//! The driver walks the module once, post-order. For each statement it
//! consults the node gate, then dispatches to a dedicated per-kind rule or
//! recurses into children unchanged. Rule results are modeled explicitly as
//! [`StmtRewrite`] and consumed by one body-splicing loop; expression rules
//! replace nodes in place.

mod expr;
mod unpack;

pub use unpack::Unpacked;

use crate::diagnostics::{Diagnostics, LineIndex};
use crate::dialect::{self, Dialect, UnpackStyle};
use crate::hooks;
use crate::names;
use rustpython_parser::ast::{self, Stmt};
use rustpython_parser::text_size::TextRange;

/// The rewritten module plus the complete diagnostic set for the unit.
#[derive(Debug)]
pub struct TransformOutcome {
    pub module: ast::Mod,
    pub diagnostics: Diagnostics,
}

/// Result of rewriting one statement, consumed uniformly by body splicing.
#[derive(Debug)]
pub(crate) enum StmtRewrite {
    /// Node kept (children may have been rewritten in place).
    Keep(Stmt),
    /// Node replaced by a single synthesized statement.
    Replace(Stmt),
    /// Node expanded into a sequence, spliced in place preserving order.
    Splice(Vec<Stmt>),
    /// Node removed; the subtree was rejected by the gate.
    Remove,
}

/// One-shot transformer for a single compilation unit.
///
/// Owns fresh diagnostics and a fresh temporary-name counter; must not be
/// reused across unrelated compilations. The transform runs exactly once,
/// before any guard identifier exists in user-writable scope; its own
/// output is not a valid input (the guard names fail the name policy).
pub struct RestrictingTransformer {
    dialect: Dialect,
    diagnostics: Diagnostics,
    lines: LineIndex,
    tmp_idx: u32,
}

impl RestrictingTransformer {
    pub fn new(dialect: Dialect, source: &str) -> Self {
        Self {
            dialect,
            diagnostics: Diagnostics::new(),
            lines: LineIndex::new(source),
            tmp_idx: 0,
        }
    }

    /// Rewrite a parsed module, consuming the transformer.
    pub fn transform_module(mut self, module: ast::Mod) -> TransformOutcome {
        let module = match module {
            ast::Mod::Module(mut node) => {
                let body = std::mem::take(&mut node.body);
                node.body = self.transform_body(body);
                ast::Mod::Module(node)
            }
            other => {
                // Only whole modules are accepted; other roots have no
                // position of their own and are reported at line 1.
                self.diagnostics
                    .error(1, "Only modules can be transformed.");
                other
            }
        };
        TransformOutcome {
            module,
            diagnostics: self.diagnostics,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn line(&self, range: TextRange) -> u32 {
        self.lines.line_of(range.start())
    }

    pub(crate) fn error(&mut self, range: TextRange, message: impl Into<String>) {
        self.diagnostics.error(self.lines.line_of(range.start()), message);
    }

    pub(crate) fn warn(&mut self, range: TextRange, message: impl Into<String>) {
        self.diagnostics.warn(self.lines.line_of(range.start()), message);
    }

    /// Next hidden temporary. The name policy rejects every ordinary
    /// leading-underscore identifier, so `_tmp{N}` cannot collide with
    /// anything a policy-compliant author wrote.
    pub(crate) fn gen_tmp_name(&mut self) -> String {
        let name = format!("_tmp{}", self.tmp_idx);
        self.tmp_idx += 1;
        name
    }

    pub(crate) fn check_name(&mut self, range: TextRange, name: &str) {
        if let Some(violation) = names::check(name) {
            let line = self.line(range);
            self.diagnostics
                .error(line, names::describe_name(name, violation));
        }
    }

    pub(crate) fn check_attr_name(&mut self, range: TextRange, name: &str) {
        if let Some(violation) = names::check_attr(name) {
            let line = self.line(range);
            self.diagnostics
                .error(line, names::describe_attr(name, violation));
        }
    }

    /// Splices per-statement rewrite results into a new body.
    pub(crate) fn transform_body(&mut self, body: Vec<Stmt>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            match self.visit_stmt(stmt) {
                StmtRewrite::Keep(stmt) | StmtRewrite::Replace(stmt) => out.push(stmt),
                StmtRewrite::Splice(stmts) => out.extend(stmts),
                StmtRewrite::Remove => {}
            }
        }
        out
    }

    fn visit_stmt(&mut self, stmt: Stmt) -> StmtRewrite {
        if !self.dialect.stmt_allowed(&stmt) {
            self.error(
                hooks::stmt_range(&stmt),
                format!("{} statements are not allowed.", dialect::stmt_kind(&stmt)),
            );
            return StmtRewrite::Remove;
        }

        match stmt {
            Stmt::FunctionDef(mut node) => {
                self.check_name(node.range, node.name.as_str());
                if !node.type_params.is_empty() {
                    self.error(node.range, "Type parameters are not allowed.");
                }
                for decorator in &mut node.decorator_list {
                    self.visit_expr(decorator);
                }
                if let Some(returns) = &mut node.returns {
                    self.visit_expr(returns);
                }
                self.visit_parameters(&mut node.args);
                node.body = self.transform_body(node.body);
                StmtRewrite::Keep(Stmt::FunctionDef(node))
            }
            Stmt::ClassDef(mut node) => {
                self.check_name(node.range, node.name.as_str());
                if !node.type_params.is_empty() {
                    self.error(node.range, "Type parameters are not allowed.");
                }
                for decorator in &mut node.decorator_list {
                    self.visit_expr(decorator);
                }
                for base in &mut node.bases {
                    self.visit_expr(base);
                }
                for keyword in &mut node.keywords {
                    self.visit_expr(&mut keyword.value);
                }
                node.body = self.transform_body(node.body);
                StmtRewrite::Keep(Stmt::ClassDef(node))
            }
            Stmt::Return(mut node) => {
                if let Some(value) = &mut node.value {
                    self.visit_expr(value);
                }
                StmtRewrite::Keep(Stmt::Return(node))
            }
            Stmt::Delete(mut node) => {
                for target in &mut node.targets {
                    self.visit_expr(target);
                }
                StmtRewrite::Keep(Stmt::Delete(node))
            }
            Stmt::Assign(node) => self.rewrite_assign(node),
            Stmt::AugAssign(node) => self.rewrite_aug_assign(node),
            Stmt::For(mut node) => {
                self.visit_expr(&mut node.target);
                self.visit_expr(&mut node.iter);
                hooks::wrap_in_guard(&mut node.iter, hooks::GETITER);
                node.body = self.transform_body(node.body);
                node.orelse = self.transform_body(node.orelse);
                StmtRewrite::Keep(Stmt::For(node))
            }
            Stmt::While(mut node) => {
                self.visit_expr(&mut node.test);
                node.body = self.transform_body(node.body);
                node.orelse = self.transform_body(node.orelse);
                StmtRewrite::Keep(Stmt::While(node))
            }
            Stmt::If(mut node) => {
                self.visit_expr(&mut node.test);
                node.body = self.transform_body(node.body);
                node.orelse = self.transform_body(node.orelse);
                StmtRewrite::Keep(Stmt::If(node))
            }
            Stmt::With(mut node) => {
                for item in &mut node.items {
                    self.visit_expr(&mut item.context_expr);
                    if let Some(vars) = &mut item.optional_vars {
                        self.visit_expr(vars);
                    }
                }
                node.body = self.transform_body(node.body);
                StmtRewrite::Keep(Stmt::With(node))
            }
            Stmt::Raise(mut node) => {
                if let Some(exc) = &mut node.exc {
                    self.visit_expr(exc);
                }
                if let Some(cause) = &mut node.cause {
                    self.visit_expr(cause);
                }
                StmtRewrite::Keep(Stmt::Raise(node))
            }
            Stmt::Try(mut node) => {
                node.body = self.transform_body(node.body);
                for handler in &mut node.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    if let Some(type_) = &mut h.type_ {
                        self.visit_expr(type_);
                    }
                    if let Some(name) = &h.name {
                        let name = name.as_str().to_string();
                        self.check_name(h.range, &name);
                    }
                    h.body = self.transform_body(std::mem::take(&mut h.body));
                }
                node.orelse = self.transform_body(node.orelse);
                node.finalbody = self.transform_body(node.finalbody);
                StmtRewrite::Keep(Stmt::Try(node))
            }
            Stmt::Assert(mut node) => {
                self.visit_expr(&mut node.test);
                if let Some(msg) = &mut node.msg {
                    self.visit_expr(msg);
                }
                StmtRewrite::Keep(Stmt::Assert(node))
            }
            Stmt::Import(node) => {
                self.check_aliases(&node.names);
                StmtRewrite::Keep(Stmt::Import(node))
            }
            Stmt::ImportFrom(node) => {
                self.check_aliases(&node.names);
                StmtRewrite::Keep(Stmt::ImportFrom(node))
            }
            Stmt::Expr(mut node) => {
                self.visit_expr(&mut node.value);
                StmtRewrite::Keep(Stmt::Expr(node))
            }
            Stmt::Pass(_) | Stmt::Break(_) | Stmt::Continue(_) => StmtRewrite::Keep(stmt),
            // Unreachable: every other kind was denied by the gate above.
            other => StmtRewrite::Keep(other),
        }
    }

    /// Name-checks every parameter binder and rewrites annotation and
    /// default expressions.
    pub(crate) fn visit_parameters(&mut self, args: &mut ast::Arguments) {
        for param in args
            .posonlyargs
            .iter_mut()
            .chain(args.args.iter_mut())
            .chain(args.kwonlyargs.iter_mut())
        {
            let name = param.def.arg.as_str().to_string();
            self.check_name(param.def.range, &name);
            if let Some(annotation) = &mut param.def.annotation {
                self.visit_expr(annotation);
            }
            if let Some(default) = &mut param.default {
                self.visit_expr(default);
            }
        }
        if let Some(vararg) = &mut args.vararg {
            let name = vararg.arg.as_str().to_string();
            self.check_name(vararg.range, &name);
            if let Some(annotation) = &mut vararg.annotation {
                self.visit_expr(annotation);
            }
        }
        if let Some(kwarg) = &mut args.kwarg {
            let name = kwarg.arg.as_str().to_string();
            self.check_name(kwarg.range, &name);
            if let Some(annotation) = &mut kwarg.annotation {
                self.visit_expr(annotation);
            }
        }
    }

    /// Import aliases bind names in the sandboxed scope. A dotted
    /// `import a.b` binds its first segment, which never carries the
    /// reserved prefix unless the first segment itself does.
    fn check_aliases(&mut self, aliases: &[ast::Alias]) {
        for alias in aliases {
            let bound = match &alias.asname {
                Some(asname) => asname.as_str().to_string(),
                None => {
                    let full = alias.name.as_str().to_string();
                    match full.split('.').next() {
                        Some(first) => first.to_string(),
                        None => full,
                    }
                }
            };
            if bound == "*" {
                continue;
            }
            self.check_name(alias.range, &bound);
        }
    }

    /// Assignment: rewrite children first, then expand tuple/list targets
    /// into guarded unpacking statements. Chained targets are processed
    /// right-to-left, matching the host's own fill order, each protected
    /// independently against the same source expression.
    fn rewrite_assign(&mut self, mut node: ast::StmtAssign) -> StmtRewrite {
        self.visit_expr(&mut node.value);
        for target in &mut node.targets {
            self.visit_expr(target);
        }

        if !node.targets.iter().any(unpack::is_sequence_pattern) {
            return StmtRewrite::Keep(Stmt::Assign(node));
        }

        let range = node.range;
        let value = *node.value;
        let mut out = Vec::new();
        for target in node.targets.into_iter().rev() {
            if unpack::is_sequence_pattern(&target) {
                // Statement context always permits the statement strategy,
                // whatever the dialect.
                match self.desugar_unpack_with(UnpackStyle::Statements, target, value.clone(), range)
                {
                    Unpacked::Stmts(stmts) => out.extend(stmts),
                    Unpacked::Expr(_) => unreachable!("statement strategy requested"),
                }
            } else {
                out.push(hooks::assign(target, value.clone(), range));
            }
        }
        StmtRewrite::Splice(out)
    }
}
