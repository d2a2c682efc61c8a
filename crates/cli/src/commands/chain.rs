use comexflow_core::config::{AppConfig, LoadOptions};
use comexflow_core::domain::form::FormType;
use comexflow_core::hierarchy::ApprovalPolicy;
use serde_json::json;

use super::CommandResult;

const COMMAND: &str = "chain";

pub fn run(form: u16) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let Some(entry) = config.hierarchy.entry(FormType(form)) else {
        return CommandResult::failure(
            COMMAND,
            "unconfigured_form",
            format!("form {form} has no configured approval policy"),
            1,
        );
    };

    let shape = match &entry.policy {
        ApprovalPolicy::Sequential { .. } => "sequential",
        ApprovalPolicy::EitherThen { .. } => "either_then",
    };
    let details = json!({
        "form": form,
        "form_name": entry.name,
        "shape": shape,
        "policy": entry.policy,
        "participants": entry.policy.participants(),
    });

    CommandResult::success_with_details(
        COMMAND,
        format!("form {form}: {} ({shape})", entry.name),
        Some(details),
    )
}
