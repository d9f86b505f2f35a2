//! Stage scripts composed from instance definitions and change flags.
//!
//! Each stage emits only the blocks whose change flag is set; unchanged
//! subsystems produce no text at all, so repeated pipeline runs do no
//! redundant work. Generation is all-or-nothing: any error aborts the stage
//! before a document is returned.

mod host_preparation;
mod monitor_startup;
mod start_instance;

use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use tracing::info;

use crate::error::ScriptError;
use crate::links::LinkComposer;
use crate::model::InstanceDefinition;
use crate::paths::{SuffixSource, UuidSuffix};
use crate::script::ScriptDocument;

/// Resolves instance definitions by identifier.
pub trait InstanceLookup {
    /// Returns the definition of `uuid`, or `None` when it is unknown.
    fn instance(&self, uuid: &str) -> Option<&InstanceDefinition>;
}

impl InstanceLookup for [InstanceDefinition] {
    fn instance(&self, uuid: &str) -> Option<&InstanceDefinition> {
        self.iter().find(|def| def.uuid == uuid)
    }
}

impl InstanceLookup for Vec<InstanceDefinition> {
    fn instance(&self, uuid: &str) -> Option<&InstanceDefinition> {
        self.as_slice().instance(uuid)
    }
}

/// Subsystems that changed since the previous pipeline run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag mirrors an independent pipeline change signal"
)]
pub struct ChangeFlags {
    /// Artifacts were rebuilt.
    pub artifacts: bool,
    /// The deployment descriptor changed.
    pub deployment: bool,
    /// The instance data sources changed.
    pub data: bool,
    /// Instance properties changed.
    pub properties: bool,
}

impl ChangeFlags {
    /// Returns `true` when at least one subsystem changed.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.artifacts || self.deployment || self.data || self.properties
    }
}

/// Pipeline stages a script can be generated for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    /// Provision directories and synchronise artifacts and data.
    PrepareHost,
    /// Start or refresh the instance.
    StartInstance,
    /// Check the instance came up.
    MonitorStartup,
}

impl Stage {
    /// Every stage in pipeline order.
    pub const ALL: [Self; 3] = [Self::PrepareHost, Self::StartInstance, Self::MonitorStartup];

    /// Stable stage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrepareHost => "prepare-host",
            Self::StartInstance => "start-instance",
            Self::MonitorStartup => "monitor-startup",
        }
    }

    fn head_comment(self) -> &'static str {
        match self {
            Self::PrepareHost => "# Autogenerated script for the CD host preparation...",
            Self::StartInstance => "# Autogenerated script for the instance start...",
            Self::MonitorStartup => "# Autogenerated script for the instance startup monitoring...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| ScriptError::invalid(format!("unknown stage `{value}`")))
    }
}

/// Builds stage scripts for instances found through an [`InstanceLookup`].
#[derive(Debug)]
pub struct ScriptComposer<'a, L: ?Sized, S = UuidSuffix> {
    lookup: &'a L,
    flags: ChangeFlags,
    artifacts_root: Utf8PathBuf,
    links: LinkComposer<S>,
}

impl<'a, L: InstanceLookup + ?Sized> ScriptComposer<'a, L> {
    /// Creates a composer reading definitions from `lookup`.
    ///
    /// Artifacts for an instance are staged under `<artifacts_root>/<uuid>`.
    #[must_use]
    pub fn new(lookup: &'a L, flags: ChangeFlags, artifacts_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            lookup,
            flags,
            artifacts_root: artifacts_root.into(),
            links: LinkComposer::default(),
        }
    }
}

impl<'a, L, S> ScriptComposer<'a, L, S>
where
    L: InstanceLookup + ?Sized,
    S: SuffixSource,
{
    /// Replaces the source of backup suffixes.
    #[must_use]
    pub fn with_suffixes<T: SuffixSource>(self, suffixes: T) -> ScriptComposer<'a, L, T> {
        ScriptComposer {
            lookup: self.lookup,
            flags: self.flags,
            artifacts_root: self.artifacts_root,
            links: LinkComposer::new(suffixes),
        }
    }

    /// Returns the change flags driving this composer.
    #[must_use]
    pub const fn flags(&self) -> ChangeFlags {
        self.flags
    }

    /// Generates the script of `stage` for the instance `uuid`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::EmptyDefinition`] when `uuid` is unknown, and
    /// any error raised by the stage itself.
    pub fn compose(&self, stage: Stage, uuid: &str) -> Result<ScriptDocument, ScriptError> {
        let instance = self.resolve(uuid)?;
        info!(%stage, instance = %instance.uuid, name = %instance.name, "composing script");

        let mut doc = ScriptDocument::new(stage.head_comment());
        match stage {
            Stage::PrepareHost => self.prepare_host(instance, &mut doc)?,
            Stage::StartInstance => self.start_instance(instance, &mut doc)?,
            Stage::MonitorStartup => self.monitor_startup(instance, &mut doc),
        }
        Ok(doc)
    }

    fn resolve(&self, uuid: &str) -> Result<&'a InstanceDefinition, ScriptError> {
        self.lookup
            .instance(uuid)
            .ok_or_else(|| ScriptError::EmptyDefinition {
                uuid: uuid.to_owned(),
            })
    }
}
