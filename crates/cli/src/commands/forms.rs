use comexflow_core::config::{AppConfig, LoadOptions};
use comexflow_core::hierarchy::ApprovalPolicy;
use serde_json::json;

use super::CommandResult;

const COMMAND: &str = "forms";

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let forms: Vec<_> = config
        .hierarchy
        .iter()
        .map(|(form_type, entry)| {
            let shape = match &entry.policy {
                ApprovalPolicy::Sequential { .. } => "sequential",
                ApprovalPolicy::EitherThen { .. } => "either_then",
            };
            json!({
                "code": form_type.code(),
                "name": entry.name,
                "shape": shape,
                "participants": entry.policy.participants(),
            })
        })
        .collect();

    CommandResult::success_with_details(
        COMMAND,
        format!("{} form templates configured", forms.len()),
        Some(json!({ "forms": forms })),
    )
}
