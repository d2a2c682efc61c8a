pub mod config;
pub mod domain;
pub mod errors;
pub mod hierarchy;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
pub use domain::form::{FormApprovals, FormType, RoleApproval};
pub use domain::role::Role;
pub use errors::DomainError;
pub use hierarchy::{ApprovalPolicy, FormEntry, HierarchyTable, PendingApprover, Resolution};
