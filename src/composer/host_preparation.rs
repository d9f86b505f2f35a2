//! Host preparation: directories, artifacts, images and data.

use tracing::debug;

use crate::defaults::{ARTIFACTS_DIR_NAME, DATA_DIR_NAME, SERVICE_ACCOUNT};
use crate::error::ScriptError;
use crate::links::init_folder;
use crate::model::{DataSource, InstanceDefinition, RuntimeSpec};
use crate::paths::{SuffixSource, TrailingSlash, normalize_trailing_slash};
use crate::runtime::DockerRuntime;
use crate::script::ScriptDocument;
use crate::sync::{SyncDirection, SyncRequest, build_sync};
use crate::transport::wrap_remote;

use super::{InstanceLookup, ScriptComposer};

impl<L, S> ScriptComposer<'_, L, S>
where
    L: InstanceLookup + ?Sized,
    S: SuffixSource,
{
    pub(super) fn prepare_host(
        &self,
        instance: &InstanceDefinition,
        doc: &mut ScriptDocument,
    ) -> Result<(), ScriptError> {
        let conn = instance.connection();
        let host_dir = &instance.deployment.host_dir;
        let owner = conn.map_or(SERVICE_ACCOUNT, |c| c.user.as_str());

        doc.push(&wrap_remote(
            conn,
            &init_folder(host_dir.as_str(), owner, None, false),
            false,
        ));

        if self.flags.artifacts {
            let host_artifacts = host_dir.join(ARTIFACTS_DIR_NAME);
            let staging = self.artifacts_root.join(&instance.uuid);
            debug!(%staging, destination = %host_artifacts, "artifacts changed; syncing");

            doc.push(&wrap_remote(
                conn,
                &init_folder(host_artifacts.as_str(), owner, None, false),
                true,
            ));
            let push = conn.map(|c| c.with_remote_destination());
            let request =
                SyncRequest::new(staging.as_str(), host_artifacts.as_str()).source_is_dir(true);
            doc.push(&build_sync(push.as_ref(), &request)?);
        }

        if self.flags.deployment {
            match &instance.deployment.runtime {
                RuntimeSpec::Docker(docker) => {
                    debug!(image = %docker.reference(), "deployment changed; pulling image");
                    doc.push(&wrap_remote(
                        conn,
                        &DockerRuntime.pull(&docker.image, &docker.tag),
                        false,
                    ));
                }
                RuntimeSpec::DockerCompose(_) => {
                    debug!("deployment changed; compose pulls images when the stack starts");
                }
            }
        }

        if self.flags.data {
            let instance_data = host_dir.join(DATA_DIR_NAME);
            for source in &instance.data {
                let source_dir = self.data_source_dir(source)?;
                debug!(source = %source_dir, destination = %instance_data, "data changed; syncing");
                let request = SyncRequest::new(source_dir, instance_data.as_str())
                    .direction(SyncDirection::Local);
                doc.push(&wrap_remote(conn, &build_sync(conn, &request)?, false));
            }
        }

        Ok(())
    }

    /// Resolves the directory a data source is copied from.
    ///
    /// Instance sources copy the contents of the source instance's data
    /// directory, hence the trailing slash. An explicit `dataDir` replaces
    /// that directory, but a named source instance must still exist.
    fn data_source_dir(&self, source: &DataSource) -> Result<String, ScriptError> {
        match source {
            DataSource::Instance { uuid, data_dir } => {
                let mut resolved = None;
                if !uuid.trim().is_empty() {
                    let source_instance = self.lookup.instance(uuid).ok_or_else(|| {
                        ScriptError::MissingReference { uuid: uuid.clone() }
                    })?;
                    let source_data = source_instance.deployment.host_dir.join(DATA_DIR_NAME);
                    resolved = Some(normalize_trailing_slash(
                        source_data.as_str(),
                        TrailingSlash::Append,
                    ));
                }
                if let Some(explicit) = data_dir.as_ref().filter(|path| !path.as_str().is_empty()) {
                    resolved = Some(explicit.as_str().to_owned());
                }
                resolved.ok_or_else(|| {
                    ScriptError::invalid("instance data source needs a uuid or a dataDir")
                })
            }
            DataSource::Directory { path } => Ok(path.as_str().to_owned()),
        }
    }
}
