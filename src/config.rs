//! Pipeline configuration loaded via `ortho-config`.
//!
//! The CD pipeline exports the instance under deployment and which of its
//! subsystems changed; everything else has defaults suitable for a build
//! agent's working directory.

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::composer::{ChangeFlags, Stage};
use crate::defaults::ARTIFACTS_DIR_NAME;

/// Pipeline settings derived from environment variables and configuration
/// files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "STAGEHAND",
    discovery(
        app_name = "stagehand",
        env_var = "STAGEHAND_CONFIG_PATH",
        config_file_name = "stagehand.toml",
        dotfile_name = ".stagehand.toml",
        project_file_name = "stagehand.toml"
    )
)]
pub struct PipelineConfig {
    /// Identifier of the instance the scripts are generated for.
    #[ortho_config(default = String::new())]
    pub instance_uuid: String,
    /// Whether the instance artifacts were rebuilt.
    pub artifacts_changes: Option<bool>,
    /// Whether the deployment descriptor changed.
    pub deployment_changes: Option<bool>,
    /// Whether the instance data sources changed.
    pub data_changes: Option<bool>,
    /// Whether instance properties changed.
    pub properties_changes: Option<bool>,
    /// Directory the generated scripts are written to.
    #[ortho_config(default = "build".to_owned())]
    pub build_dir: String,
    /// Root under which artifacts are staged per instance. Defaults to
    /// `<build_dir>/artifacts`.
    pub artifacts_dir: Option<String>,
    /// JSON file holding the instance definitions.
    #[ortho_config(default = "instances.json".to_owned())]
    pub store_path: String,
    /// File name of the host preparation script.
    #[ortho_config(default = "prepare-host.sh".to_owned())]
    pub prepare_host_script: String,
    /// File name of the instance start script.
    #[ortho_config(default = "start-instance.sh".to_owned())]
    pub start_instance_script: String,
    /// File name of the startup monitoring script.
    #[ortho_config(default = "monitor-startup.sh".to_owned())]
    pub monitor_startup_script: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl PipelineConfig {
    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("stagehand")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages name
    /// the environment variable and the `stagehand.toml` key to set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.instance_uuid,
            &FieldMetadata::new(
                "instance identifier",
                "STAGEHAND_INSTANCE_UUID",
                "instance_uuid",
            ),
        )?;
        Self::require_field(
            &self.build_dir,
            &FieldMetadata::new("build directory", "STAGEHAND_BUILD_DIR", "build_dir"),
        )?;
        Self::require_field(
            &self.store_path,
            &FieldMetadata::new("instance store path", "STAGEHAND_STORE_PATH", "store_path"),
        )?;
        if let Some(artifacts_dir) = &self.artifacts_dir {
            Self::require_field(
                artifacts_dir,
                &FieldMetadata::new(
                    "artifacts staging directory",
                    "STAGEHAND_ARTIFACTS_DIR",
                    "artifacts_dir",
                ),
            )?;
        }
        for stage in Stage::ALL {
            let (env_var, toml_key) = Self::script_field(stage);
            Self::require_field(
                self.script_name(stage),
                &FieldMetadata::new("script file name", env_var, toml_key),
            )?;
        }
        Ok(())
    }

    /// Change flags exported by the pipeline. Unset signals count as
    /// unchanged.
    #[must_use]
    pub fn change_flags(&self) -> ChangeFlags {
        ChangeFlags {
            artifacts: self.artifacts_changes.unwrap_or(false),
            deployment: self.deployment_changes.unwrap_or(false),
            data: self.data_changes.unwrap_or(false),
            properties: self.properties_changes.unwrap_or(false),
        }
    }

    /// Directory the generated scripts are written to.
    #[must_use]
    pub fn build_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.build_dir.trim())
    }

    /// Root under which artifacts are staged per instance.
    #[must_use]
    pub fn artifacts_root(&self) -> Utf8PathBuf {
        self.artifacts_dir.as_deref().map_or_else(
            || self.build_dir().join(ARTIFACTS_DIR_NAME),
            |dir| Utf8PathBuf::from(dir.trim()),
        )
    }

    /// Path of the instance definition store.
    #[must_use]
    pub fn store_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.store_path.trim())
    }

    /// File name the script of `stage` is saved under.
    #[must_use]
    pub fn script_name(&self, stage: Stage) -> &str {
        match stage {
            Stage::PrepareHost => &self.prepare_host_script,
            Stage::StartInstance => &self.start_instance_script,
            Stage::MonitorStartup => &self.monitor_startup_script,
        }
    }

    const fn script_field(stage: Stage) -> (&'static str, &'static str) {
        match stage {
            Stage::PrepareHost => ("STAGEHAND_PREPARE_HOST_SCRIPT", "prepare_host_script"),
            Stage::StartInstance => ("STAGEHAND_START_INSTANCE_SCRIPT", "start_instance_script"),
            Stage::MonitorStartup => ("STAGEHAND_MONITOR_STARTUP_SCRIPT", "monitor_startup_script"),
        }
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to stagehand.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
