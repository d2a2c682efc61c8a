use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Organizational roles that appear in extension-program approval chains.
///
/// `Faculty` submits forms but never approves them; it exists so callers can
/// ask the resolver about any authenticated role, not just approvers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Dean,
    // rename_all would split this into com_ex_coordinator; the config file
    // and the parse boundary both use comex_coordinator.
    #[serde(rename = "comex_coordinator")]
    ComExCoordinator,
    AcademicServicesDirector,
    AcademicDirector,
    Faculty,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dean => "dean",
            Self::ComExCoordinator => "comex_coordinator",
            Self::AcademicServicesDirector => "academic_services_director",
            Self::AcademicDirector => "academic_director",
            Self::Faculty => "faculty",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dean" => Ok(Self::Dean),
            "comex_coordinator" => Ok(Self::ComExCoordinator),
            "academic_services_director" => Ok(Self::AcademicServicesDirector),
            "academic_director" => Ok(Self::AcademicDirector),
            "faculty" => Ok(Self::Faculty),
            other => Err(DomainError::UnknownRole { value: other.to_string() }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}
