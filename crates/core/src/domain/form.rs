use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::role::Role;

/// Identifier for one of the fixed extension-program form templates.
///
/// Codes outside the configured table are representable on purpose: the
/// resolver treats them as a configuration gap rather than an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormType(pub u16);

impl FormType {
    pub const PROGRAM_PROPOSAL: Self = Self(1);
    pub const OUTREACH_PROPOSAL: Self = Self(2);
    pub const PROGRAM_CHECKLIST: Self = Self(3);
    pub const OUTREACH_CHECKLIST: Self = Self(4);
    pub const NEEDS_ASSESSMENT: Self = Self(5);
    pub const MEMORANDUM_OF_AGREEMENT: Self = Self(6);
    pub const COMMUNITY_CONSENT: Self = Self(7);
    pub const ACTIVITY_PLAN_BUDGET: Self = Self(8);
    pub const ATTENDANCE_SHEET: Self = Self(9);
    pub const POST_ACTIVITY_REPORT: Self = Self(10);
    pub const EVALUATION_REPORT: Self = Self(11);
    pub const IMPACT_ASSESSMENT: Self = Self(12);
    pub const TERMINAL_REPORT: Self = Self(13);
    pub const CERTIFICATE_REQUEST: Self = Self(14);

    pub fn code(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for FormType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "form {}", self.0)
    }
}

/// One role's recorded action on a specific form instance, as persisted by
/// the external API layer: an approval flag plus optional revision remarks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleApproval {
    pub role: Role,
    pub approved: bool,
    pub remarks: Option<String>,
    pub acted_at: Option<DateTime<Utc>>,
}

/// Per-role approval state for one form instance.
///
/// This is the caller-side view of the API layer's flags; `approved_roles`
/// translates it into the set the hierarchy resolver consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormApprovals {
    pub form_type: FormType,
    pub entries: Vec<RoleApproval>,
}

impl FormApprovals {
    pub fn new(form_type: FormType) -> Self {
        Self { form_type, entries: Vec::new() }
    }

    pub fn record_approval(&mut self, role: Role, acted_at: Option<DateTime<Utc>>) {
        self.upsert(RoleApproval { role, approved: true, remarks: None, acted_at });
    }

    pub fn record_rejection(
        &mut self,
        role: Role,
        remarks: impl Into<String>,
        acted_at: Option<DateTime<Utc>>,
    ) {
        self.upsert(RoleApproval { role, approved: false, remarks: Some(remarks.into()), acted_at });
    }

    /// The set of roles whose approval flag is set. Fed to
    /// `HierarchyTable::resolve` as the approved set.
    pub fn approved_roles(&self) -> BTreeSet<Role> {
        self.entries.iter().filter(|entry| entry.approved).map(|entry| entry.role).collect()
    }

    pub fn remarks_for(&self, role: Role) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.role == role)
            .and_then(|entry| entry.remarks.as_deref())
    }

    pub fn has_rejection(&self) -> bool {
        self.entries.iter().any(|entry| !entry.approved)
    }

    fn upsert(&mut self, record: RoleApproval) {
        match self.entries.iter_mut().find(|entry| entry.role == record.role) {
            Some(existing) => *existing = record,
            None => self.entries.push(record),
        }
    }
}
