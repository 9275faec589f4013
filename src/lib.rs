//! Static sandbox transformer for untrusted Python code.
//!
//! `pyrestrict` sits between a trusted parser and a host runtime that wants
//! to execute scripts written by untrusted authors. It rewrites a parsed
//! module so that every operation capable of escaping a sandbox (attribute
//! access, item access, iteration, in-place mutation, variadic call
//! expansion) is routed through a small fixed set of guard hooks supplied
//! by the host, and it rejects every syntactic form or identifier pattern
//! for which no safe rewrite exists.
//!
//! # Overview
//!
//! The transformer:
//!
//! 1. Walks the `rustpython_parser` AST once, post-order.
//! 2. Validates every node against a whitelist of allowed node kinds.
//! 3. Rewrites escape-capable nodes into calls to the reserved guard hooks.
//! 4. Returns the rewritten module together with accumulated diagnostics.
//!
//! # Rewrites
//!
//! - `obj.attr` becomes `_getattr_(obj, "attr")`
//! - `obj.attr = v` becomes `_write_(obj).attr = v`
//! - `obj[k]` becomes `_getitem_(obj, k)`; slices turn into `slice(...)` calls
//! - `obj[k] = v` and `del obj[k]` route `obj` through `_write_`
//! - `for x in xs` and comprehension clauses wrap the iterable in `_getiter_`
//! - `f(*args, **kw)` becomes `_apply_(f, *args, **kw)`
//! - `n += 1` becomes `n = _inplacevar_("+=", n, 1)`
//! - `(a, (b, c)) = v` expands into guarded assignments with hidden,
//!   always-deleted temporaries
//!
//! # One-shot invariant
//!
//! The transform runs exactly once per compilation unit, before any guard
//! identifier exists in user-writable scope. The synthesized guard names
//! carry the reserved `_` prefix that the name policy forbids, so feeding
//! transformed output back through the transformer reports errors by
//! design. The host must compile the output directly, never re-transform it.
//!
//! # Errors
//!
//! Rejections never abort the walk: one pass yields the complete diagnostic
//! set. A non-empty error list means the result must not be compiled or
//! executed.
//!
//! ```
//! use pyrestrict::{transform_source, Dialect};
//!
//! let outcome = transform_source("data.items()", &Dialect::modern()).unwrap();
//! assert!(outcome.diagnostics.errors().is_empty());
//! ```

pub mod diagnostics;
pub mod dialect;
pub mod hooks;
pub mod names;
pub mod rewrite;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use dialect::{Dialect, UnpackStyle};
pub use rewrite::{RestrictingTransformer, TransformOutcome, Unpacked};

use rustpython_parser::{Mode, ParseError};

/// Errors from the convenience entry points.
///
/// The transform itself never fails midway; rejections accumulate in
/// [`Diagnostics`]. Only the parse seam is fallible.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Python parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Parse `source` as a module and run the restricting transform over it.
///
/// One compilation unit per call: a fresh transformer (fresh diagnostics,
/// fresh temporary-name counter) is constructed and consumed.
pub fn transform_source(
    source: &str,
    dialect: &Dialect,
) -> Result<TransformOutcome, TransformError> {
    let module = rustpython_parser::parse(source, Mode::Module, "<module>")?;
    let transformer = RestrictingTransformer::new(dialect.clone(), source);
    Ok(transformer.transform_module(module))
}
