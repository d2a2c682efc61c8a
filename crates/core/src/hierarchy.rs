use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::domain::form::FormType;
use crate::domain::role::Role;

/// Approval policy shape for one form template, fixed at configuration-load
/// time. Adding a policy shape is a new variant here, never a special case
/// inside the resolution algorithm.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Roles must approve strictly in chain order.
    Sequential { chain: Vec<Role> },
    /// Any one `first_stage` role satisfies the first stage, after which
    /// `then` is the single remaining required approver.
    EitherThen { first_stage: Vec<Role>, then: Role },
}

impl ApprovalPolicy {
    /// Every role participating in this policy, in display order.
    pub fn participants(&self) -> Vec<Role> {
        match self {
            Self::Sequential { chain } => chain.clone(),
            Self::EitherThen { first_stage, then } => {
                first_stage.iter().copied().chain([*then]).collect()
            }
        }
    }
}

/// One configured form template: a display name plus its approval policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormEntry {
    pub name: String,
    pub policy: ApprovalPolicy,
}

/// The approver(s) whose action is required next.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingApprover {
    Role { role: Role },
    AnyOf { roles: Vec<Role> },
}

/// Outcome of one hierarchy resolution. Advisory only: `included` and
/// `next_approver` tell a caller what to show, never what to authorize —
/// the API layer that records approvals remains the authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Participating roles for this form type, in approval order.
    pub approvers: Vec<Role>,
    /// Whether the requesting role participates in this form's chain at all,
    /// regardless of how far approval has progressed.
    pub included: bool,
    pub next_approver: Option<PendingApprover>,
    pub is_fully_approved: bool,
}

impl Resolution {
    /// Degraded result for a form type with no configured policy. An empty
    /// chain is reported as NOT fully approved: a configuration gap must
    /// never read as a completed approval.
    fn unconfigured() -> Self {
        Self { approvers: Vec::new(), included: false, next_approver: None, is_fully_approved: false }
    }
}

/// Deploy-time mapping from form template to approval policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyTable {
    entries: BTreeMap<FormType, FormEntry>,
}

impl HierarchyTable {
    pub fn new(entries: BTreeMap<FormType, FormEntry>) -> Self {
        Self { entries }
    }

    pub fn entry(&self, form_type: FormType) -> Option<&FormEntry> {
        self.entries.get(&form_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormType, &FormEntry)> {
        self.entries.iter().map(|(form_type, entry)| (*form_type, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve who must act next on a form instance.
    ///
    /// Pure and total: identical input yields identical output, and a form
    /// type absent from the table degrades to an empty resolution instead of
    /// an error.
    pub fn resolve(
        &self,
        form_type: FormType,
        requesting_role: Role,
        approved: &BTreeSet<Role>,
    ) -> Resolution {
        let Some(entry) = self.entries.get(&form_type) else {
            debug!(form_code = form_type.code(), "no approval policy configured for form type");
            return Resolution::unconfigured();
        };

        match &entry.policy {
            ApprovalPolicy::Sequential { chain } => {
                let next = chain.iter().copied().find(|role| !approved.contains(role));
                Resolution {
                    approvers: chain.clone(),
                    included: chain.contains(&requesting_role),
                    is_fully_approved: next.is_none(),
                    next_approver: next.map(|role| PendingApprover::Role { role }),
                }
            }
            ApprovalPolicy::EitherThen { first_stage, then } => {
                let approvers = entry.policy.participants();
                let included = approvers.contains(&requesting_role);
                let first_stage_satisfied = first_stage.iter().any(|role| approved.contains(role));

                let (next_approver, is_fully_approved) = if !first_stage_satisfied {
                    (Some(PendingApprover::AnyOf { roles: first_stage.clone() }), false)
                } else if !approved.contains(then) {
                    (Some(PendingApprover::Role { role: *then }), false)
                } else {
                    (None, true)
                };

                Resolution { approvers, included, next_approver, is_fully_approved }
            }
        }
    }
}

impl Default for HierarchyTable {
    /// The fourteen extension-program form templates. Forms 3 and 4, the two
    /// checklist-of-criteria templates, take either the Dean or the Academic
    /// Services Director first and the ComEx Coordinator after; every other
    /// template is strictly sequential.
    fn default() -> Self {
        use Role::{AcademicDirector, AcademicServicesDirector, ComExCoordinator, Dean};

        let checklist_policy = ApprovalPolicy::EitherThen {
            first_stage: vec![Dean, AcademicServicesDirector],
            then: ComExCoordinator,
        };

        let forms: Vec<(FormType, &str, ApprovalPolicy)> = vec![
            (
                FormType::PROGRAM_PROPOSAL,
                "Extension Program Proposal",
                ApprovalPolicy::Sequential {
                    chain: vec![Dean, ComExCoordinator, AcademicServicesDirector, AcademicDirector],
                },
            ),
            (
                FormType::OUTREACH_PROPOSAL,
                "Outreach Activity Proposal",
                ApprovalPolicy::Sequential {
                    chain: vec![Dean, ComExCoordinator, AcademicServicesDirector],
                },
            ),
            (
                FormType::PROGRAM_CHECKLIST,
                "Extension Program Checklist of Criteria",
                checklist_policy.clone(),
            ),
            (
                FormType::OUTREACH_CHECKLIST,
                "Outreach Activity Checklist of Criteria",
                checklist_policy,
            ),
            (
                FormType::NEEDS_ASSESSMENT,
                "Community Needs Assessment",
                ApprovalPolicy::Sequential {
                    chain: vec![ComExCoordinator, AcademicServicesDirector],
                },
            ),
            (
                FormType::MEMORANDUM_OF_AGREEMENT,
                "Memorandum of Agreement",
                ApprovalPolicy::Sequential { chain: vec![Dean, AcademicDirector] },
            ),
            (
                FormType::COMMUNITY_CONSENT,
                "Community Consent Form",
                ApprovalPolicy::Sequential { chain: vec![ComExCoordinator] },
            ),
            (
                FormType::ACTIVITY_PLAN_BUDGET,
                "Activity Plan and Budget",
                ApprovalPolicy::Sequential {
                    chain: vec![Dean, ComExCoordinator, AcademicServicesDirector],
                },
            ),
            (
                FormType::ATTENDANCE_SHEET,
                "Attendance and Monitoring Sheet",
                ApprovalPolicy::Sequential { chain: vec![ComExCoordinator] },
            ),
            (
                FormType::POST_ACTIVITY_REPORT,
                "Post-Activity Report",
                ApprovalPolicy::Sequential {
                    chain: vec![ComExCoordinator, AcademicServicesDirector],
                },
            ),
            (
                FormType::EVALUATION_REPORT,
                "Evaluation Summary Report",
                ApprovalPolicy::Sequential {
                    chain: vec![ComExCoordinator, AcademicServicesDirector, AcademicDirector],
                },
            ),
            (
                FormType::IMPACT_ASSESSMENT,
                "Impact Assessment Report",
                ApprovalPolicy::Sequential {
                    chain: vec![ComExCoordinator, AcademicServicesDirector, AcademicDirector],
                },
            ),
            (
                FormType::TERMINAL_REPORT,
                "Terminal Report",
                ApprovalPolicy::Sequential {
                    chain: vec![Dean, ComExCoordinator, AcademicServicesDirector, AcademicDirector],
                },
            ),
            (
                FormType::CERTIFICATE_REQUEST,
                "Certificate Issuance Request",
                ApprovalPolicy::Sequential { chain: vec![ComExCoordinator, Dean] },
            ),
        ];

        let entries = forms
            .into_iter()
            .map(|(form_type, name, policy)| {
                (form_type, FormEntry { name: name.to_string(), policy })
            })
            .collect();

        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{ApprovalPolicy, HierarchyTable, PendingApprover};
    use crate::domain::form::FormType;
    use crate::domain::role::Role;

    fn roles(list: &[Role]) -> BTreeSet<Role> {
        list.iter().copied().collect()
    }

    #[test]
    fn sequential_next_approver_is_first_unapproved_in_chain_order() {
        let table = HierarchyTable::default();

        let resolution =
            table.resolve(FormType::PROGRAM_PROPOSAL, Role::ComExCoordinator, &roles(&[Role::Dean]));

        assert_eq!(
            resolution.next_approver,
            Some(PendingApprover::Role { role: Role::ComExCoordinator })
        );
        assert!(!resolution.is_fully_approved);
        assert!(resolution.included);
        assert_eq!(
            resolution.approvers,
            vec![
                Role::Dean,
                Role::ComExCoordinator,
                Role::AcademicServicesDirector,
                Role::AcademicDirector,
            ]
        );
    }

    #[test]
    fn sequential_prefix_property_holds_for_every_prefix() {
        let table = HierarchyTable::default();
        let chain = [
            Role::Dean,
            Role::ComExCoordinator,
            Role::AcademicServicesDirector,
            Role::AcademicDirector,
        ];

        for prefix_len in 0..chain.len() {
            let approved = roles(&chain[..prefix_len]);
            let resolution = table.resolve(FormType::PROGRAM_PROPOSAL, Role::Dean, &approved);

            assert_eq!(
                resolution.next_approver,
                Some(PendingApprover::Role { role: chain[prefix_len] }),
                "prefix of length {prefix_len}"
            );
            assert!(!resolution.is_fully_approved);
        }
    }

    #[test]
    fn sequential_full_chain_is_fully_approved_with_no_next() {
        let table = HierarchyTable::default();
        let approved = roles(&[
            Role::Dean,
            Role::ComExCoordinator,
            Role::AcademicServicesDirector,
            Role::AcademicDirector,
        ]);

        let resolution = table.resolve(FormType::PROGRAM_PROPOSAL, Role::Dean, &approved);

        assert!(resolution.is_fully_approved);
        assert_eq!(resolution.next_approver, None);
    }

    #[test]
    fn sequential_skipped_role_still_blocks_the_chain() {
        let table = HierarchyTable::default();

        // ASD approved out of order; the chain still waits on the Dean.
        let resolution = table.resolve(
            FormType::PROGRAM_PROPOSAL,
            Role::Dean,
            &roles(&[Role::AcademicServicesDirector]),
        );

        assert_eq!(resolution.next_approver, Some(PendingApprover::Role { role: Role::Dean }));
        assert!(!resolution.is_fully_approved);
    }

    #[test]
    fn included_reflects_chain_membership_not_progress() {
        let table = HierarchyTable::default();
        let approved = roles(&[Role::Dean]);

        let comex = table.resolve(FormType::PROGRAM_PROPOSAL, Role::ComExCoordinator, &approved);
        let faculty = table.resolve(FormType::PROGRAM_PROPOSAL, Role::Faculty, &approved);
        let dean = table.resolve(FormType::PROGRAM_PROPOSAL, Role::Dean, &approved);

        assert!(comex.included);
        assert!(!faculty.included);
        // Already approved, still a participant.
        assert!(dean.included);
    }

    #[test]
    fn checklist_first_stage_requires_either_dean_or_asd() {
        let table = HierarchyTable::default();

        let resolution = table.resolve(FormType::PROGRAM_CHECKLIST, Role::Dean, &roles(&[]));

        assert_eq!(
            resolution.next_approver,
            Some(PendingApprover::AnyOf {
                roles: vec![Role::Dean, Role::AcademicServicesDirector],
            })
        );
        assert!(!resolution.is_fully_approved);
    }

    #[test]
    fn checklist_either_first_stage_role_advances_to_coordinator() {
        let table = HierarchyTable::default();

        for first in [Role::Dean, Role::AcademicServicesDirector] {
            let resolution = table.resolve(FormType::PROGRAM_CHECKLIST, first, &roles(&[first]));

            assert_eq!(
                resolution.next_approver,
                Some(PendingApprover::Role { role: Role::ComExCoordinator }),
                "first stage satisfied by {first}"
            );
            assert!(!resolution.is_fully_approved);
        }
    }

    #[test]
    fn checklist_completes_once_coordinator_signs_after_first_stage() {
        let table = HierarchyTable::default();
        let approved = roles(&[Role::Dean, Role::ComExCoordinator]);

        let resolution = table.resolve(FormType::OUTREACH_CHECKLIST, Role::Dean, &approved);

        assert!(resolution.is_fully_approved);
        assert_eq!(resolution.next_approver, None);
    }

    #[test]
    fn checklist_coordinator_alone_does_not_satisfy_first_stage() {
        let table = HierarchyTable::default();

        let resolution = table.resolve(
            FormType::PROGRAM_CHECKLIST,
            Role::ComExCoordinator,
            &roles(&[Role::ComExCoordinator]),
        );

        assert_eq!(
            resolution.next_approver,
            Some(PendingApprover::AnyOf {
                roles: vec![Role::Dean, Role::AcademicServicesDirector],
            })
        );
        assert!(!resolution.is_fully_approved);
    }

    #[test]
    fn checklist_included_covers_exactly_the_three_participants() {
        let table = HierarchyTable::default();
        let approved = roles(&[]);

        for role in [Role::Dean, Role::AcademicServicesDirector, Role::ComExCoordinator] {
            assert!(table.resolve(FormType::PROGRAM_CHECKLIST, role, &approved).included);
        }
        for role in [Role::AcademicDirector, Role::Faculty] {
            assert!(!table.resolve(FormType::PROGRAM_CHECKLIST, role, &approved).included);
        }
    }

    #[test]
    fn unconfigured_form_type_degrades_without_panicking() {
        let table = HierarchyTable::default();

        let resolution = table.resolve(FormType(999), Role::Dean, &roles(&[Role::Dean]));

        assert!(resolution.approvers.is_empty());
        assert!(!resolution.included);
        assert_eq!(resolution.next_approver, None);
        assert!(!resolution.is_fully_approved);
    }

    #[test]
    fn resolution_is_deterministic_for_identical_input() {
        let table = HierarchyTable::default();
        let approved = roles(&[Role::Dean, Role::ComExCoordinator]);

        let first = table.resolve(FormType::TERMINAL_REPORT, Role::AcademicDirector, &approved);
        let second = table.resolve(FormType::TERMINAL_REPORT, Role::AcademicDirector, &approved);

        assert_eq!(first, second);
    }

    #[test]
    fn participants_orders_either_then_first_stage_before_second() {
        let policy = ApprovalPolicy::EitherThen {
            first_stage: vec![Role::Dean, Role::AcademicServicesDirector],
            then: Role::ComExCoordinator,
        };

        assert_eq!(
            policy.participants(),
            vec![Role::Dean, Role::AcademicServicesDirector, Role::ComExCoordinator]
        );
    }

    #[test]
    fn default_table_covers_all_fourteen_templates() {
        let table = HierarchyTable::default();

        assert_eq!(table.len(), 14);
        for code in 1..=14 {
            assert!(table.entry(FormType(code)).is_some(), "form {code} missing");
        }
    }
}
