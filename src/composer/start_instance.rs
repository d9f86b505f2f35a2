//! Instance start: (re)create the runtime and restore links.

use tracing::debug;

use crate::error::ScriptError;
use crate::model::{InstanceDefinition, LinkKind, RuntimeSpec};
use crate::paths::SuffixSource;
use crate::runtime::{ComposeRuntime, ContainerRuntime, DockerRuntime, RuntimeAdapter};
use crate::script::ScriptDocument;
use crate::transport::wrap_host;

use super::{InstanceLookup, ScriptComposer};

impl<L, S> ScriptComposer<'_, L, S>
where
    L: InstanceLookup + ?Sized,
    S: SuffixSource,
{
    pub(super) fn start_instance(
        &self,
        instance: &InstanceDefinition,
        doc: &mut ScriptDocument,
    ) -> Result<(), ScriptError> {
        let adapter = RuntimeAdapter::for_deployment(&instance.deployment);
        debug!(instance = %instance.uuid, runtime = %adapter.kind(), "composing start");
        let fragment = match adapter {
            RuntimeAdapter::Docker(docker) => self.start_docker(docker, instance)?,
            RuntimeAdapter::Compose(compose) => self.start_compose(&compose, instance)?,
        };
        if !fragment.is_empty() {
            doc.push(&wrap_host(instance.connection(), &fragment));
        }
        Ok(())
    }

    fn start_docker(
        &self,
        docker: DockerRuntime,
        instance: &InstanceDefinition,
    ) -> Result<String, ScriptError> {
        let name = instance.name.as_str();
        let mut script = String::new();

        if self.flags.deployment {
            debug!(container = name, "deployment changed; recreating container");
            script.push_str(&docker.remove(name));
            script.push_str(&docker.run(name, instance, &docker.instance_mounts(instance))?);
            script.push_str(&self.restore_links(
                docker,
                instance,
                &[LinkKind::Artifact, LinkKind::Data],
            ));
            if let RuntimeSpec::Docker(spec) = &instance.deployment.runtime
                && let Some(timezone) = &spec.timezone
            {
                script.push_str(&docker.exec(name, &timezone_command(timezone)));
            }
            return Ok(script);
        }

        let mut kinds = Vec::new();
        if self.flags.artifacts {
            kinds.push(LinkKind::Artifact);
        }
        if self.flags.data {
            kinds.push(LinkKind::Data);
        }
        script.push_str(&self.restore_links(docker, instance, &kinds));

        if self.flags.any() {
            debug!(container = name, "restarting container to apply changes");
            script.push_str(&docker.restart(name));
        }
        Ok(script)
    }

    fn start_compose(
        &self,
        compose: &ComposeRuntime,
        instance: &InstanceDefinition,
    ) -> Result<String, ScriptError> {
        let name = instance.name.as_str();
        let mut script = String::new();

        if self.flags.deployment {
            debug!(project = name, "deployment changed; recreating stack");
            script.push_str(&compose.remove(name));
            script.push_str(&compose.prepare_deployment(instance)?);
            script.push_str(&compose.run(name, instance, &[])?);
        } else if self.flags.any() {
            debug!(project = name, "restarting stack to apply changes");
            script.push_str(&compose.restart(name));
        }
        Ok(script)
    }

    /// Relinks the shared folders of the given kinds inside the container.
    fn restore_links(
        &self,
        docker: DockerRuntime,
        instance: &InstanceDefinition,
        kinds: &[LinkKind],
    ) -> String {
        let groups: Vec<&str> = kinds.iter().map(|kind| kind.component_group()).collect();
        let links = self.links.link_components(&groups, &instance.links);
        if links.is_empty() {
            return String::new();
        }
        docker.exec(&instance.name, &links)
    }
}

fn timezone_command(timezone: &str) -> String {
    format!(
        "ln -snf /usr/share/zoneinfo/{timezone} /etc/localtime\necho {timezone} > /etc/timezone"
    )
}
