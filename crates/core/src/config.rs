use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::form::FormType;
use crate::hierarchy::{ApprovalPolicy, FormEntry, HierarchyTable};

const CONFIG_PATH_ENV: &str = "COMEXFLOW_CONFIG";
const LOG_LEVEL_ENV: &str = "COMEXFLOW_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "COMEXFLOW_LOG_FORMAT";
const DEFAULT_CONFIG_FILE: &str = "comexflow.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub hierarchy: HierarchyTable,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: Box<toml::de::Error> },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// One `[[form]]` entry in the config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormSpec {
    pub code: u16,
    pub name: String,
    #[serde(flatten)]
    pub policy: ApprovalPolicy,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    #[serde(default, rename = "form")]
    forms: Vec<FormSpec>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hierarchy: HierarchyTable::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Load configuration with file, environment, and explicit overrides
    /// layered over the built-in defaults (env > file > default).
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
            debug!(path = %path.display(), "loaded hierarchy config file");
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        // Any [[form]] entry replaces the built-in table wholesale; partial
        // tables are a misconfiguration callers should see, not a merge.
        if !patch.forms.is_empty() {
            let mut entries: BTreeMap<FormType, FormEntry> = BTreeMap::new();
            for spec in patch.forms {
                let form_type = FormType(spec.code);
                let previous = entries
                    .insert(form_type, FormEntry { name: spec.name, policy: spec.policy });
                if previous.is_some() {
                    return Err(ConfigError::Validation(format!(
                        "duplicate form code {}",
                        spec.code
                    )));
                }
            }
            self.hierarchy = HierarchyTable::new(entries);
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            self.logging.level = level;
        }

        if let Ok(format) = env::var(LOG_FORMAT_ENV) {
            self.logging.format = format.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: LOG_FORMAT_ENV.to_string(),
                value: format,
            })?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (form_type, entry) in self.hierarchy.iter() {
            match &entry.policy {
                ApprovalPolicy::Sequential { chain } => {
                    if chain.is_empty() {
                        return Err(ConfigError::Validation(format!(
                            "form {}: sequential chain is empty",
                            form_type.code()
                        )));
                    }
                    if has_duplicates(chain) {
                        return Err(ConfigError::Validation(format!(
                            "form {}: role appears twice in chain",
                            form_type.code()
                        )));
                    }
                }
                ApprovalPolicy::EitherThen { first_stage, then } => {
                    if first_stage.is_empty() {
                        return Err(ConfigError::Validation(format!(
                            "form {}: first stage is empty",
                            form_type.code()
                        )));
                    }
                    if has_duplicates(first_stage) {
                        return Err(ConfigError::Validation(format!(
                            "form {}: role appears twice in first stage",
                            form_type.code()
                        )));
                    }
                    if first_stage.contains(then) {
                        return Err(ConfigError::Validation(format!(
                            "form {}: second-stage role `{then}` already in first stage",
                            form_type.code()
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn has_duplicates(roles: &[crate::domain::role::Role]) -> bool {
    let unique: std::collections::BTreeSet<_> = roles.iter().collect();
    unique.len() != roles.len()
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    if let Ok(from_env) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(from_env);
        return path.exists().then_some(path);
    }

    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw).map_err(|source| ConfigError::ParseFile {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::domain::form::FormType;
    use crate::domain::role::Role;
    use crate::hierarchy::{ApprovalPolicy, PendingApprover};

    fn load_from_toml(contents: &str) -> Result<AppConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        file.write_all(contents.as_bytes()).expect("write config");
        AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
    }

    #[test]
    fn defaults_carry_the_full_builtin_table() {
        let config = AppConfig::default();
        assert_eq!(config.hierarchy.len(), 14);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/comexflow.toml")),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect_err("missing file should fail when required");

        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn file_table_replaces_builtin_table() {
        let config = load_from_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [[form]]
            code = 1
            name = "Pilot Proposal"
            policy = "sequential"
            chain = ["dean", "comex_coordinator"]

            [[form]]
            code = 2
            name = "Pilot Checklist"
            policy = "either_then"
            first_stage = ["dean", "academic_services_director"]
            then = "comex_coordinator"
            "#,
        )
        .expect("config should load");

        assert_eq!(config.hierarchy.len(), 2);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);

        let entry = config.hierarchy.entry(FormType(2)).expect("form 2 configured");
        assert_eq!(
            entry.policy,
            ApprovalPolicy::EitherThen {
                first_stage: vec![Role::Dean, Role::AcademicServicesDirector],
                then: Role::ComExCoordinator,
            }
        );

        let resolution =
            config.hierarchy.resolve(FormType(1), Role::Dean, &Default::default());
        assert_eq!(
            resolution.next_approver,
            Some(PendingApprover::Role { role: Role::Dean })
        );
    }

    #[test]
    fn duplicate_form_codes_are_rejected() {
        let error = load_from_toml(
            r#"
            [[form]]
            code = 1
            name = "A"
            policy = "sequential"
            chain = ["dean"]

            [[form]]
            code = 1
            name = "B"
            policy = "sequential"
            chain = ["comex_coordinator"]
            "#,
        )
        .expect_err("duplicate codes should fail");

        assert!(matches!(error, ConfigError::Validation(message) if message.contains("duplicate")));
    }

    #[test]
    fn empty_sequential_chain_is_rejected() {
        let error = load_from_toml(
            r#"
            [[form]]
            code = 3
            name = "Empty"
            policy = "sequential"
            chain = []
            "#,
        )
        .expect_err("empty chain should fail");

        assert!(matches!(error, ConfigError::Validation(message) if message.contains("empty")));
    }

    #[test]
    fn duplicated_role_in_chain_is_rejected() {
        let error = load_from_toml(
            r#"
            [[form]]
            code = 4
            name = "Doubled"
            policy = "sequential"
            chain = ["dean", "dean"]
            "#,
        )
        .expect_err("doubled role should fail");

        assert!(matches!(error, ConfigError::Validation(message) if message.contains("twice")));
    }

    #[test]
    fn second_stage_role_may_not_repeat_first_stage() {
        let error = load_from_toml(
            r#"
            [[form]]
            code = 5
            name = "Overlapping"
            policy = "either_then"
            first_stage = ["dean", "comex_coordinator"]
            then = "dean"
            "#,
        )
        .expect_err("overlapping stages should fail");

        assert!(matches!(error, ConfigError::Validation(message) if message.contains("first stage")));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let error = load_from_toml("[[form]\ncode = 1").expect_err("bad toml should fail");
        assert!(matches!(error, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn explicit_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        file.write_all(b"[logging]\nlevel = \"warn\"\n").expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides {
                log_level: Some("trace".to_string()),
                log_format: Some(LogFormat::Pretty),
            },
        })
        .expect("config should load");

        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn log_format_parses_known_values_only() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
