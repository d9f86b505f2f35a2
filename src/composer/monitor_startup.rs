//! Startup monitoring: fail the stage when the instance is not up.

use tracing::debug;

use crate::model::InstanceDefinition;
use crate::paths::SuffixSource;
use crate::runtime::RuntimeAdapter;
use crate::script::ScriptDocument;
use crate::transport::wrap_host;

use super::{InstanceLookup, ScriptComposer};

impl<L, S> ScriptComposer<'_, L, S>
where
    L: InstanceLookup + ?Sized,
    S: SuffixSource,
{
    pub(super) fn monitor_startup(&self, instance: &InstanceDefinition, doc: &mut ScriptDocument) {
        let flags = self.flags;
        if !(flags.deployment || flags.artifacts || flags.data) {
            debug!(instance = %instance.uuid, "runtime untouched; no startup to monitor");
            return;
        }

        let name = instance.name.as_str();
        let adapter = RuntimeAdapter::for_deployment(&instance.deployment);
        let status = match &adapter {
            RuntimeAdapter::Docker(_) => format!("docker inspect -f '{{{{.State.Status}}}}' {name}\n"),
            RuntimeAdapter::Compose(compose) => {
                format!("cd {}\ndocker-compose ps\n", compose.project_dir(name))
            }
        };
        let missing = format!("echo \"'{name}' is not running.\"\nexit 1\n");
        let guard = adapter
            .as_runtime()
            .exists_guard(name, Some(&status), Some(&missing));
        doc.push(&wrap_host(instance.connection(), &guard));
    }
}
