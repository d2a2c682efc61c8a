use std::collections::BTreeSet;

use comexflow_core::config::{AppConfig, LoadOptions};
use comexflow_core::domain::role::Role;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_hierarchy_table(&config));
            checks.push(check_resolver_smoke(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "hierarchy_table",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "resolver_smoke",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_hierarchy_table(config: &AppConfig) -> DoctorCheck {
    if config.hierarchy.is_empty() {
        return DoctorCheck {
            name: "hierarchy_table",
            status: CheckStatus::Fail,
            details: "no form templates configured".to_string(),
        };
    }

    DoctorCheck {
        name: "hierarchy_table",
        status: CheckStatus::Pass,
        details: format!("{} form templates configured", config.hierarchy.len()),
    }
}

fn check_resolver_smoke(config: &AppConfig) -> DoctorCheck {
    // Resolve the first configured form with nothing approved; a well-formed
    // policy always reports a pending approver at that point.
    let Some((form_type, _)) = config.hierarchy.iter().next() else {
        return DoctorCheck {
            name: "resolver_smoke",
            status: CheckStatus::Skipped,
            details: "no form templates to resolve".to_string(),
        };
    };

    let resolution = config.hierarchy.resolve(form_type, Role::Faculty, &BTreeSet::new());
    if resolution.next_approver.is_none() || resolution.is_fully_approved {
        return DoctorCheck {
            name: "resolver_smoke",
            status: CheckStatus::Fail,
            details: format!(
                "{form_type} resolved to no pending approver with an empty approved set"
            ),
        };
    }

    DoctorCheck {
        name: "resolver_smoke",
        status: CheckStatus::Pass,
        details: format!("{} reports a pending approver with an empty approved set", form_type),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let status = match check.status {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skipped",
        };
        lines.push(format!("  [{status}] {}: {}", check.name, check.details));
    }
    lines.join("\n")
}

fn escape_json(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
