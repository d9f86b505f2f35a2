//! Single-container runtime driven by the `docker` CLI.

use crate::defaults::{
    CONTAINER_HEREDOC, CONTAINER_HOSTNAME, FRAGMENT_STRICT_MODE, INSTANCE_MOUNT_TARGET,
    RESTART_POLICY,
};
use crate::error::ScriptError;
use crate::model::{DockerSpec, InstanceDefinition, RuntimeSpec};

use super::{ContainerRuntime, Mount, NameMatch, exists_guard, heredoc_shell};

/// Adapter emitting `docker` commands for one container per instance.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DockerRuntime;

impl DockerRuntime {
    /// Pulls `image:tag`.
    #[must_use]
    pub fn pull(&self, image: &str, tag: &str) -> String {
        format!("docker pull {image}:{tag}\n")
    }

    /// Mounts every instance gets: its host directory at `/mnt`.
    #[must_use]
    pub fn instance_mounts(&self, instance: &InstanceDefinition) -> Vec<Mount> {
        vec![Mount::new(
            instance.deployment.host_dir.as_str(),
            INSTANCE_MOUNT_TARGET,
        )]
    }

    /// Copies like [`ContainerRuntime::copy`], optionally through `sudo`.
    #[must_use]
    pub fn copy_with(&self, name: &str, source: &str, destination: &str, sudo: bool) -> String {
        let mut script = self.exec(name, &format!("mkdir -p {destination}"));
        if sudo {
            script.push_str("sudo ");
        }
        script.push_str(&format!("docker cp {source} {name}:{destination}\n"));
        script
    }

    fn spec(instance: &InstanceDefinition) -> Result<&DockerSpec, ScriptError> {
        match &instance.deployment.runtime {
            RuntimeSpec::Docker(spec) => Ok(spec),
            RuntimeSpec::DockerCompose(_) => Err(ScriptError::invalid(format!(
                "instance {} is not deployed with docker",
                instance.uuid
            ))),
        }
    }
}

impl ContainerRuntime for DockerRuntime {
    fn exists_guard(
        &self,
        name: &str,
        if_exists: Option<&str>,
        otherwise: Option<&str>,
    ) -> String {
        exists_guard(name, NameMatch::Exact, if_exists, otherwise)
    }

    fn run(
        &self,
        name: &str,
        instance: &InstanceDefinition,
        mounts: &[Mount],
    ) -> Result<String, ScriptError> {
        let docker = Self::spec(instance)?;

        let mut args = vec![String::from("docker run -dit")];
        if docker.privileged {
            args.push(String::from("--privileged"));
            args.push(String::from("-v /sys/fs/cgroup:/sys/fs/cgroup:ro"));
        }
        args.push(format!("--restart {RESTART_POLICY}"));
        args.extend(
            docker
                .ports
                .iter()
                .map(|(container, host)| format!("--publish {host}:{container}")),
        );
        let labels = [
            ("type", instance.instance_type.as_str()),
            ("group", instance.group.as_str()),
        ];
        args.extend(
            labels
                .iter()
                .map(|(key, value)| format!("--label {key}={value}")),
        );
        args.push(format!("--name {name}"));
        args.push(format!("--hostname {CONTAINER_HOSTNAME}"));
        args.extend(
            docker
                .networks
                .iter()
                .map(|network| format!("--network {network}")),
        );
        args.extend(mounts.iter().map(|mount| {
            format!(
                "--mount type=bind,source={},target={}",
                mount.source, mount.target
            )
        }));
        args.push(docker.reference());

        Ok(format!("{FRAGMENT_STRICT_MODE}\n{}\n", args.join(" ")))
    }

    fn remove(&self, name: &str) -> String {
        let script =
            format!("{FRAGMENT_STRICT_MODE}\ndocker stop {name}\ndocker rm -v {name}\n");
        self.exists_guard(name, Some(&script), None)
    }

    fn restart(&self, name: &str) -> String {
        let script = format!("{FRAGMENT_STRICT_MODE}\ndocker restart {name}\n");
        self.exists_guard(name, Some(&script), None)
    }

    fn exec(&self, name: &str, command: &str) -> String {
        heredoc_shell(&format!("docker exec -i {name}"), CONTAINER_HEREDOC, command)
    }

    fn copy(&self, name: &str, source: &str, destination: &str) -> String {
        self.copy_with(name, source, destination, false)
    }
}
