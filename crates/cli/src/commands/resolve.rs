use comexflow_core::config::{AppConfig, LoadOptions};
use comexflow_core::domain::form::{FormApprovals, FormType};
use comexflow_core::domain::role::Role;
use serde_json::json;

use super::CommandResult;

const COMMAND: &str = "resolve";

pub fn run(form: u16, approved: &[String], requesting_role: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let form_type = FormType(form);
    let mut approvals = FormApprovals::new(form_type);
    for name in approved {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        match name.parse::<Role>() {
            Ok(role) => approvals.record_approval(role, None),
            Err(error) => {
                return CommandResult::failure(COMMAND, "bad_input", error.to_string(), 1)
            }
        }
    }

    let requesting = match requesting_role {
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(error) => {
                return CommandResult::failure(COMMAND, "bad_input", error.to_string(), 1)
            }
        },
        None => None,
    };

    let approved_set = approvals.approved_roles();
    // `included` is only meaningful when the caller names a role; the
    // resolution itself does not depend on which role asks.
    let resolution = config.hierarchy.resolve(
        form_type,
        requesting.unwrap_or(Role::Faculty),
        &approved_set,
    );

    let configured = config.hierarchy.entry(form_type).is_some();
    let details = json!({
        "form": form,
        "form_name": config.hierarchy.entry(form_type).map(|entry| entry.name.clone()),
        "configured": configured,
        "approvers": resolution.approvers,
        "approved": approved_set,
        "next_approver": resolution.next_approver,
        "is_fully_approved": resolution.is_fully_approved,
        "included": requesting.map(|_| resolution.included),
    });

    let message = if !configured {
        format!("form {form} has no configured approval policy")
    } else if resolution.is_fully_approved {
        format!("form {form} is fully approved")
    } else {
        format!("form {form} is awaiting approval")
    };

    CommandResult::success_with_details(COMMAND, message, Some(details))
}
