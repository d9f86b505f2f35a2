//! Multi-service runtime driven by `docker-compose`.
//!
//! Every command runs from the project directory `<host_dir>/<name>`. The
//! existence guard matches by substring because compose derives container
//! names from the project name.

use camino::Utf8PathBuf;

use crate::defaults::{COMPOSE_ENV_FILE, FRAGMENT_STRICT_MODE, SERVICE_ACCOUNT, SERVICE_HEREDOC};
use crate::error::ScriptError;
use crate::links::init_folder;
use crate::model::{ComposeSpec, InstanceDefinition, RuntimeSpec};

use super::{ContainerRuntime, Mount, NameMatch, exists_guard, heredoc_shell};

/// Adapter emitting `docker-compose` commands for a cloned project.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComposeRuntime {
    host_dir: Utf8PathBuf,
}

impl ComposeRuntime {
    /// Creates an adapter whose projects live under `host_dir`.
    #[must_use]
    pub const fn new(host_dir: Utf8PathBuf) -> Self {
        Self { host_dir }
    }

    /// Returns an adapter rooted at the project directory of `project`, so
    /// [`ContainerRuntime::exec`] and [`ContainerRuntime::copy`] address that
    /// project's services.
    #[must_use]
    pub fn scoped(&self, project: &str) -> Self {
        Self::new(self.project_dir(project))
    }

    /// Directory the project named `name` is cloned into.
    #[must_use]
    pub fn project_dir(&self, name: &str) -> Utf8PathBuf {
        self.host_dir.join(name)
    }

    /// Clones the pinned project revision and writes its environment file.
    ///
    /// Any previous checkout is wiped so the clone always starts clean.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidArgument`] when the instance is not
    /// deployed with compose.
    pub fn prepare_deployment(&self, instance: &InstanceDefinition) -> Result<String, ScriptError> {
        let compose = Self::spec(instance)?;
        let dest = self.project_dir(&instance.name);
        let owner = instance
            .connection()
            .map_or(SERVICE_ACCOUNT, |conn| conn.user.as_str());

        let mut script = init_folder(dest.as_str(), owner, None, true);
        script.push_str(&format!("git clone {} {dest}\n", compose.git_url));
        script.push_str(&format!("cd {dest}\n"));
        script.push_str(&format!("git checkout {}\n", compose.git_commit));
        script.push_str(&env_file(compose));
        Ok(script)
    }

    fn in_project(&self, name: &str, command: &str) -> String {
        format!(
            "{FRAGMENT_STRICT_MODE}\ncd {}\n{command}\n",
            self.project_dir(name)
        )
    }

    fn spec(instance: &InstanceDefinition) -> Result<&ComposeSpec, ScriptError> {
        match &instance.deployment.runtime {
            RuntimeSpec::DockerCompose(spec) => Ok(spec),
            RuntimeSpec::Docker(_) => Err(ScriptError::invalid(format!(
                "instance {} is not deployed with docker-compose",
                instance.uuid
            ))),
        }
    }
}

fn env_file(compose: &ComposeSpec) -> String {
    compose
        .env_entries()
        .iter()
        .enumerate()
        .map(|(index, (key, value))| {
            let redirect = if index == 0 { ">" } else { ">>" };
            format!("echo '{key}={value}' {redirect} {COMPOSE_ENV_FILE}\n")
        })
        .collect()
}

impl ContainerRuntime for ComposeRuntime {
    fn exists_guard(
        &self,
        name: &str,
        if_exists: Option<&str>,
        otherwise: Option<&str>,
    ) -> String {
        exists_guard(name, NameMatch::Substring, if_exists, otherwise)
    }

    /// Volumes are declared by the project, so `mounts` is not used.
    fn run(
        &self,
        name: &str,
        instance: &InstanceDefinition,
        _mounts: &[Mount],
    ) -> Result<String, ScriptError> {
        Self::spec(instance)?;
        Ok(self.in_project(name, "docker-compose up"))
    }

    fn remove(&self, name: &str) -> String {
        let script = self.in_project(name, "docker-compose down");
        self.exists_guard(name, Some(&script), None)
    }

    fn restart(&self, name: &str) -> String {
        let script = self.in_project(name, "docker-compose restart");
        self.exists_guard(name, Some(&script), None)
    }

    /// `name` is the compose service to enter; the command runs from the
    /// adapter's directory.
    fn exec(&self, name: &str, command: &str) -> String {
        let invocation = format!("cd {}\ndocker-compose exec -T {name}", self.host_dir);
        heredoc_shell(&invocation, SERVICE_HEREDOC, command)
    }

    /// Paths are relative to the project; the destination must already be
    /// declared by the service.
    fn copy(&self, name: &str, source: &str, destination: &str) -> String {
        format!(
            "cd {}\ndocker-compose cp {source} {name}:{destination}\n",
            self.host_dir
        )
    }
}
