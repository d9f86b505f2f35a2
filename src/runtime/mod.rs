//! Container runtime adapters.
//!
//! Both adapters expose the same capability set so the composer can drive
//! either one; the adapter is chosen once per instance from the deployment
//! descriptor and never mixed within a script.

mod compose;
mod docker;

use crate::defaults::FRAGMENT_STRICT_MODE;
use crate::error::ScriptError;
use crate::model::{DeploymentDescriptor, InstanceDefinition, RuntimeKind, RuntimeSpec};

pub use compose::ComposeRuntime;
pub use docker::DockerRuntime;

/// Bind mount from a host path into a container.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mount {
    /// Path on the host.
    pub source: String,
    /// Path inside the container.
    pub target: String,
}

impl Mount {
    /// Creates a bind mount of `source` at `target`.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Capabilities shared by every container runtime.
///
/// Operations that may already have happened (removal, restart) are wrapped
/// in [`ContainerRuntime::exists_guard`] so re-running a script is safe.
pub trait ContainerRuntime {
    /// Emits a conditional running `if_exists` when a container named `name`
    /// exists and `otherwise` when it does not. Missing or empty branches
    /// default to `echo`.
    fn exists_guard(&self, name: &str, if_exists: Option<&str>, otherwise: Option<&str>)
    -> String;

    /// Starts the instance.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidArgument`] when the instance is not
    /// deployed with this runtime.
    fn run(
        &self,
        name: &str,
        instance: &InstanceDefinition,
        mounts: &[Mount],
    ) -> Result<String, ScriptError>;

    /// Stops and removes the instance if it exists.
    fn remove(&self, name: &str) -> String;

    /// Restarts the instance if it exists.
    fn restart(&self, name: &str) -> String;

    /// Pipes `command` into a shell inside the container.
    fn exec(&self, name: &str, command: &str) -> String;

    /// Copies `source` from the host to `destination` in the container.
    fn copy(&self, name: &str, source: &str, destination: &str) -> String;
}

/// Runtime adapter selected for one instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuntimeAdapter {
    /// Single-container runtime.
    Docker(DockerRuntime),
    /// Compose runtime rooted at the instance host directory.
    Compose(ComposeRuntime),
}

impl RuntimeAdapter {
    /// Selects the adapter declared by `deployment`.
    #[must_use]
    pub fn for_deployment(deployment: &DeploymentDescriptor) -> Self {
        match deployment.runtime {
            RuntimeSpec::Docker(_) => Self::Docker(DockerRuntime),
            RuntimeSpec::DockerCompose(_) => {
                Self::Compose(ComposeRuntime::new(deployment.host_dir.clone()))
            }
        }
    }

    /// Returns the runtime kind of this adapter.
    #[must_use]
    pub const fn kind(&self) -> RuntimeKind {
        match self {
            Self::Docker(_) => RuntimeKind::Docker,
            Self::Compose(_) => RuntimeKind::DockerCompose,
        }
    }

    /// Returns the adapter as a capability object.
    #[must_use]
    pub fn as_runtime(&self) -> &dyn ContainerRuntime {
        match self {
            Self::Docker(runtime) => runtime,
            Self::Compose(runtime) => runtime,
        }
    }
}

/// How an existence guard compares the listed name with the wanted one.
#[derive(Clone, Copy, Debug)]
enum NameMatch {
    Exact,
    Substring,
}

fn exists_guard(
    name: &str,
    matching: NameMatch,
    if_exists: Option<&str>,
    otherwise: Option<&str>,
) -> String {
    let mut script = String::new();
    script.push_str(FRAGMENT_STRICT_MODE);
    script.push('\n');
    script.push_str("container=\\$(docker ps -a --filter name=");
    script.push_str(name);
    script.push_str(" --format {{.Names}})\n");
    match matching {
        NameMatch::Exact => script.push_str(&format!("if [ \"\\$container\" == \"{name}\" ]\n")),
        NameMatch::Substring => {
            script.push_str(&format!("if [[ \"\\$container\" =~ \"{name}\" ]]\n"));
        }
    }
    script.push_str("then ");
    script.push_str(branch_or_echo(if_exists));
    script.push_str("else ");
    script.push_str(branch_or_echo(otherwise));
    script.push_str("fi\n");
    script
}

fn branch_or_echo(branch: Option<&str>) -> &str {
    branch.filter(|cmd| !cmd.is_empty()).unwrap_or("echo\n")
}

fn heredoc_shell(invocation: &str, delimiter: &str, command: &str) -> String {
    let mut script = format!("{FRAGMENT_STRICT_MODE}\n{invocation} /bin/bash -s <<{delimiter}\n");
    script.push_str(FRAGMENT_STRICT_MODE);
    script.push('\n');
    script.push_str(command);
    if !command.ends_with('\n') {
        script.push('\n');
    }
    script.push_str(delimiter);
    script.push('\n');
    script
}
