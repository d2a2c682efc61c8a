use thiserror::Error;

/// Errors raised at the crate's parse boundaries. The hierarchy resolver
/// itself never returns these; an unconfigured form type is absorbed as an
/// empty resolution, not reported as an error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(
        "unknown role `{value}` (expected dean|comex_coordinator|academic_services_director|academic_director|faculty)"
    )]
    UnknownRole { value: String },
}
