//! Identifier policy for sandboxed code.
//!
//! A pure predicate over identifiers and attribute names. Rejecting ordinary
//! leading-underscore names is what makes the reserved guard hooks and the
//! `_tmp{N}` hidden temporaries unreachable from user code.

/// Suffix reserved for the host's role metadata on proxied objects.
pub const ROLES_SUFFIX: &str = "__roles__";

/// Name reserved for the host's print-collection machinery.
pub const PRINTED_NAME: &str = "printed";

/// Why an identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameViolation {
    /// Starts with `_` and is not exactly `_`.
    LeadingUnderscore,
    /// Ends with the reserved `__roles__` suffix.
    RolesSuffix,
    /// Is the reserved literal `printed`.
    ReservedLiteral,
}

/// Full policy, applied to every bound identifier.
pub fn check(name: &str) -> Option<NameViolation> {
    if name.starts_with('_') && name != "_" {
        Some(NameViolation::LeadingUnderscore)
    } else if name.ends_with(ROLES_SUFFIX) {
        Some(NameViolation::RolesSuffix)
    } else if name == PRINTED_NAME {
        Some(NameViolation::ReservedLiteral)
    } else {
        None
    }
}

/// Attribute-name policy: prefix and suffix rules only, on both read and
/// write. The reserved-literal rule does not apply to attributes.
pub fn check_attr(name: &str) -> Option<NameViolation> {
    if name.starts_with('_') && name != "_" {
        Some(NameViolation::LeadingUnderscore)
    } else if name.ends_with(ROLES_SUFFIX) {
        Some(NameViolation::RolesSuffix)
    } else {
        None
    }
}

pub(crate) fn describe_name(name: &str, violation: NameViolation) -> String {
    match violation {
        NameViolation::LeadingUnderscore => format!(
            "\"{name}\" is an invalid variable name because it starts with \"_\""
        ),
        NameViolation::RolesSuffix => format!(
            "\"{name}\" is an invalid variable name because it ends with \"__roles__\"."
        ),
        NameViolation::ReservedLiteral => format!("\"{name}\" is a reserved name."),
    }
}

pub(crate) fn describe_attr(name: &str, violation: NameViolation) -> String {
    match violation {
        NameViolation::LeadingUnderscore => format!(
            "\"{name}\" is an invalid attribute name because it starts with \"_\"."
        ),
        NameViolation::RolesSuffix => format!(
            "\"{name}\" is an invalid attribute name because it ends with \"__roles__\"."
        ),
        // Not produced by check_attr; kept accurate in case the attribute
        // policy ever grows the reserved-literal rule.
        NameViolation::ReservedLiteral => format!("\"{name}\" is a reserved name."),
    }
}
