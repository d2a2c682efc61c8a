use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use comexflow_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            &["logging", "level"],
            Some("COMEXFLOW_LOG_LEVEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            &["logging", "format"],
            Some("COMEXFLOW_LOG_FORMAT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "hierarchy.forms",
        &config.hierarchy.len().to_string(),
        field_source(&["form"], None, config_file_doc.as_ref(), config_file_path.as_deref()),
    ));

    lines.join("\n")
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("  {key} = {value}  [{source}]")
}

fn field_source(
    doc_path: &[&str],
    env_var: Option<&str>,
    doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if let Some(env_var) = env_var {
        if env::var(env_var).is_ok() {
            return format!("env ({env_var})");
        }
    }

    if doc.map(|doc| doc_has_path(doc, doc_path)).unwrap_or(false) {
        if let Some(file_path) = file_path {
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn doc_has_path(doc: &Value, path: &[&str]) -> bool {
    let mut current = doc;
    for segment in path {
        match current.get(segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn detect_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("COMEXFLOW_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let default = PathBuf::from("comexflow.toml");
    default.exists().then_some(default)
}
