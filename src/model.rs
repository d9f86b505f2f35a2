//! Declarative instance definitions consumed by the script builders.
//!
//! Definitions are produced by the instance store and are read-only to the
//! rest of the crate. Field names follow the camelCase JSON layout of the
//! pipeline's instance database.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Deserializer};

use crate::error::ScriptError;
use crate::transport::HostConnection;

/// One deployable application stack.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct InstanceDefinition {
    /// Unique identifier of the instance.
    pub uuid: String,
    /// Display name, also used as the container or compose project name.
    pub name: String,
    /// Instance type tag, such as `dev` or `prod`.
    #[serde(rename = "type")]
    pub instance_type: String,
    /// Group tag used to label containers.
    pub group: String,
    /// Where and how the instance is deployed.
    pub deployment: DeploymentDescriptor,
    /// Data sources synchronised into the instance, in order.
    #[serde(default)]
    pub data: Vec<DataSource>,
    /// Shared folders linked into the instance filesystem at start.
    #[serde(default)]
    pub links: Vec<LinkDescriptor>,
}

impl InstanceDefinition {
    /// Returns the host connection, or `None` for local execution.
    #[must_use]
    pub const fn connection(&self) -> Option<&HostConnection> {
        self.deployment.host.as_ref()
    }
}

/// Container runtimes an instance can be deployed with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RuntimeKind {
    /// A single container started with `docker run`.
    Docker,
    /// A multi-service stack managed with `docker-compose`.
    DockerCompose,
}

impl RuntimeKind {
    /// Selector used for this runtime in instance definitions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::DockerCompose => "dockerCompose",
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeKind {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "docker" => Ok(Self::Docker),
            "dockerCompose" | "dockerComposeGit" => Ok(Self::DockerCompose),
            other => Err(ScriptError::invalid(format!(
                "unsupported runtime type `{other}`"
            ))),
        }
    }
}

/// Runtime-specific deployment values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuntimeSpec {
    /// Values for the single-container runtime.
    Docker(DockerSpec),
    /// Values for the compose runtime.
    DockerCompose(ComposeSpec),
}

impl RuntimeSpec {
    /// Returns the runtime selector for these values.
    #[must_use]
    pub const fn kind(&self) -> RuntimeKind {
        match self {
            Self::Docker(_) => RuntimeKind::Docker,
            Self::DockerCompose(_) => RuntimeKind::DockerCompose,
        }
    }
}

/// Deployment target of an instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(try_from = "RawDeployment")]
pub struct DeploymentDescriptor {
    /// Directory on the target host owned by the instance.
    pub host_dir: Utf8PathBuf,
    /// Connection to the target host; `None` means the pipeline host.
    pub host: Option<HostConnection>,
    /// Runtime selector and its values.
    pub runtime: RuntimeSpec,
}

/// Single-container deployment values.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct DockerSpec {
    /// Image name without tag.
    pub image: String,
    /// Image tag.
    pub tag: String,
    /// Published ports keyed by container port, valued by host port.
    #[serde(default, deserialize_with = "port_map")]
    pub ports: BTreeMap<u16, String>,
    /// Networks the container attaches to.
    #[serde(default)]
    pub networks: Vec<String>,
    /// Whether the container runs privileged with the cgroup mount.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub privileged: bool,
    /// Timezone configured inside the container at start.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl DockerSpec {
    /// Returns the `image:tag` reference.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

/// Compose deployment values.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposeSpec {
    /// Repository holding the compose project.
    pub git_url: String,
    /// Commit checked out after cloning.
    pub git_commit: String,
    /// OpenMRS configuration path exported to the stack.
    pub openmrs_config_path: String,
    /// Bahmni configuration path exported to the stack.
    pub bahmni_config_path: String,
    /// OpenMRS modules path exported to the stack.
    pub openmrs_modules_path: String,
    /// Bahmni home directory exported to the stack.
    pub bahmni_home: String,
    /// Timezone exported to the stack.
    pub timezone: String,
    /// Cron expression for the mart refresh job.
    pub bahmni_cron: String,
}

impl ComposeSpec {
    /// Environment entries written to the compose `.env` file, in file order.
    #[must_use]
    pub fn env_entries(&self) -> [(&'static str, &str); 6] {
        [
            ("OPENMRS_CONFIG_PATH", self.openmrs_config_path.as_str()),
            ("BAHMNI_CONFIG_PATH", self.bahmni_config_path.as_str()),
            ("OPENMRS_MODULES_PATH", self.openmrs_modules_path.as_str()),
            ("BAHMNI_HOME", self.bahmni_home.as_str()),
            ("TIMEZONE", self.timezone.as_str()),
            ("BAHMNI_MART_CRON_TIME", self.bahmni_cron.as_str()),
        ]
    }
}

/// Where an instance's data comes from.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum DataSource {
    /// Data copied from another instance's data directory.
    Instance {
        /// Identifier of the source instance.
        #[serde(default)]
        uuid: String,
        /// Directory on the target host used in place of the source
        /// instance's data directory.
        #[serde(default, rename = "dataDir")]
        data_dir: Option<Utf8PathBuf>,
    },
    /// Data copied from a literal directory on the target host.
    Directory {
        /// Directory holding the data.
        #[serde(rename = "dataDir")]
        path: Utf8PathBuf,
    },
}

/// Kind of shared folder a link maps.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Folder taken from the synchronised artifacts.
    Artifact,
    /// Folder taken from the instance data.
    Data,
}

impl LinkKind {
    /// Component group selecting every link of this kind.
    #[must_use]
    pub const fn component_group(self) -> &'static str {
        match self {
            Self::Artifact => "artifacts",
            Self::Data => "data",
        }
    }
}

/// Mapping of a shared folder onto an instance-local path.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct LinkDescriptor {
    /// Kind of folder being linked.
    #[serde(rename = "type")]
    pub kind: LinkKind,
    /// Component owning the folder.
    pub component: String,
    /// Shared folder the link points to.
    pub source: String,
    /// Instance-local path replaced by the link.
    pub target: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeployment {
    #[serde(rename = "type")]
    kind: String,
    host_dir: Utf8PathBuf,
    #[serde(default)]
    host: Option<RawHost>,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct RawHost {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<HostConnection>,
}

impl TryFrom<RawDeployment> for DeploymentDescriptor {
    type Error = ScriptError;

    fn try_from(raw: RawDeployment) -> Result<Self, Self::Error> {
        let runtime = match raw.kind.parse::<RuntimeKind>()? {
            RuntimeKind::Docker => RuntimeSpec::Docker(parse_value(raw.value)?),
            RuntimeKind::DockerCompose => RuntimeSpec::DockerCompose(parse_value(raw.value)?),
        };
        let host = raw.host.map(resolve_host).transpose()?.flatten();
        Ok(Self {
            host_dir: raw.host_dir,
            host,
            runtime,
        })
    }
}

fn resolve_host(raw: RawHost) -> Result<Option<HostConnection>, ScriptError> {
    match raw.kind.as_str() {
        "local" => Ok(None),
        "ssh" => raw
            .value
            .map(Some)
            .ok_or_else(|| ScriptError::invalid("ssh host requires connection details")),
        other => Err(ScriptError::invalid(format!(
            "unsupported host type `{other}`"
        ))),
    }
}

fn parse_value<T: for<'de> Deserialize<'de>>(value: serde_json::Value) -> Result<T, ScriptError> {
    serde_json::from_value(value).map_err(|err| ScriptError::invalid(err.to_string()))
}

/// JSON scalars that older definitions store as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Bool(value) => Ok(value),
        Scalar::Text(value) => Ok(value.trim().eq_ignore_ascii_case("true")),
        Scalar::Number(value) => Ok(value != 0),
    }
}

fn port_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<u16, String>, D::Error> {
    let raw = BTreeMap::<u16, Scalar>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(container, host)| (container, host.into_text()))
        .collect())
}

pub(crate) fn flexible_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    use serde::de::Error as _;

    let text = Scalar::deserialize(deserializer)?.into_text();
    text.trim()
        .parse()
        .map_err(|_| D::Error::custom(format!("invalid port `{text}`")))
}
