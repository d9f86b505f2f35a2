//! Symlink, ownership and folder initialisation fragments.
//!
//! Backups are emitted as shell conditionals: whether the target exists is
//! only known when the script runs on the host.

use crate::defaults::{DEFAULT_RSYNC_FLAGS, SERVICE_ACCOUNT};
use crate::model::LinkDescriptor;
use crate::paths::{SuffixSource, UuidSuffix, backup_suffix};

/// Builds link fragments, naming backups from a [`SuffixSource`].
#[derive(Clone, Debug, Default)]
pub struct LinkComposer<S = UuidSuffix> {
    suffixes: S,
}

impl<S: SuffixSource> LinkComposer<S> {
    /// Creates a composer drawing backup suffixes from `suffixes`.
    #[must_use]
    pub const fn new(suffixes: S) -> Self {
        Self { suffixes }
    }

    /// Replaces `target` with a symlink to `source` owned by the service
    /// account.
    ///
    /// With `backup_if_exists`, an existing target is copied to
    /// `<target>_<suffix>.backup` and removed first.
    #[must_use]
    pub fn link_folder(&self, source: &str, target: &str, backup_if_exists: bool) -> String {
        let mut script = String::new();
        if backup_if_exists {
            let backup = format!("{target}_{}.backup", backup_suffix(&self.suffixes.token()));
            script.push_str(&format!("if [ -e {target} ]; then\n"));
            script.push_str(&format!("echo \"'{target}' exists. Backing it up...\"\n"));
            script.push_str(&format!("rsync {DEFAULT_RSYNC_FLAGS} {target} {backup}\n"));
            script.push_str(&format!("rm -rf {target}\n"));
            script.push_str("fi\n");
        }
        script.push_str(&format!("echo \"MountPoint: {source}, Target: {target}\"\n"));
        script.push_str(&format!("ln -s {source} {target}\n"));
        script.push_str(&format!(
            "chown -R {SERVICE_ACCOUNT}:{SERVICE_ACCOUNT} {source}\n"
        ));
        script
    }

    /// Emits a backed-up link for every descriptor selected by `components`.
    ///
    /// A descriptor is selected when `components` names its kind's group
    /// (`artifacts` or `data`) or its own component. Output follows the
    /// order of `links`.
    #[must_use]
    pub fn link_components<C: AsRef<str>>(&self, components: &[C], links: &[LinkDescriptor]) -> String {
        links
            .iter()
            .filter(|link| is_selected(components, link))
            .map(|link| {
                format!(
                    "# '{}' component:\n{}\n",
                    link.component,
                    self.link_folder(&link.source, &link.target, true)
                )
            })
            .collect()
    }
}

fn is_selected<C: AsRef<str>>(components: &[C], link: &LinkDescriptor) -> bool {
    components.iter().any(|name| {
        let name = name.as_ref();
        name == link.kind.component_group() || name == link.component
    })
}

/// Creates `path` owned by `owner` (and `group`, defaulting to `owner`).
///
/// With `wipe`, any existing content is removed first so the folder starts
/// empty.
#[must_use]
pub fn init_folder(path: &str, owner: &str, group: Option<&str>, wipe: bool) -> String {
    let group = group.unwrap_or(owner);
    let mut script = String::new();
    if wipe {
        script.push_str(&format!("sudo rm -rf {path}\n"));
    }
    script.push_str(&format!("sudo mkdir -p {path}\n"));
    script.push_str(&format!("sudo chown -R {owner}:{group} {path}\n"));
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkKind;
    use crate::paths::FixedSuffix;
    use rstest::{fixture, rstest};

    #[fixture]
    fn composer() -> LinkComposer<FixedSuffix> {
        LinkComposer::new(FixedSuffix(String::from("0.123456789")))
    }

    #[fixture]
    fn links() -> Vec<LinkDescriptor> {
        vec![
            LinkDescriptor {
                kind: LinkKind::Artifact,
                component: String::from("bahmniconnect"),
                source: String::from(
                    "/mnt/artifacts/bahmni_emr/bahmniconnect/bahmni-connect-apps",
                ),
                target: String::from("/opt/bahmni-offline/bahmni-connect-apps"),
            },
            LinkDescriptor {
                kind: LinkKind::Data,
                component: String::from("db_dumps"),
                source: String::from("/mnt/data/db_dumps"),
                target: String::from("/data"),
            },
        ]
    }

    #[rstest]
    fn link_folder_backs_up_existing_target(composer: LinkComposer<FixedSuffix>) {
        assert_eq!(
            composer.link_folder("source123", "target123", true),
            concat!(
                "if [ -e target123 ]; then\n",
                "echo \"'target123' exists. Backing it up...\"\n",
                "rsync -avz target123 target123_56789.backup\n",
                "rm -rf target123\n",
                "fi\n",
                "echo \"MountPoint: source123, Target: target123\"\n",
                "ln -s source123 target123\n",
                "chown -R bahmni:bahmni source123\n",
            )
        );
    }

    #[rstest]
    fn link_folder_without_backup_only_links(composer: LinkComposer<FixedSuffix>) {
        let script = composer.link_folder("src", "tgt", false);
        assert!(!script.contains("if [ -e"), "unexpected backup: {script}");
        assert!(script.starts_with("echo \"MountPoint: src, Target: tgt\"\n"));
    }

    #[rstest]
    fn link_components_selects_artifact_links(
        composer: LinkComposer<FixedSuffix>,
        links: Vec<LinkDescriptor>,
    ) {
        let script = composer.link_components(&["artifacts"], &links);
        assert!(script.starts_with("# 'bahmniconnect' component:\n"));
        assert!(!script.contains("db_dumps"), "data link leaked: {script}");
    }

    #[rstest]
    fn link_components_grows_monotonically(
        composer: LinkComposer<FixedSuffix>,
        links: Vec<LinkDescriptor>,
    ) {
        let artifacts_only = composer.link_components(&["artifacts"], &links);
        let with_data = composer.link_components(&["artifacts", "data"], &links);
        let expected_data = format!(
            "# 'db_dumps' component:\n{}\n",
            composer.link_folder("/mnt/data/db_dumps", "/data", true)
        );
        assert_eq!(with_data, format!("{artifacts_only}{expected_data}"));
    }

    #[rstest]
    fn link_components_follows_descriptor_order(
        composer: LinkComposer<FixedSuffix>,
        links: Vec<LinkDescriptor>,
    ) {
        let forward = composer.link_components(&["data", "artifacts"], &links);
        let artifact_at = forward.find("bahmniconnect").expect("artifact link");
        let data_at = forward.find("db_dumps").expect("data link");
        assert!(artifact_at < data_at);
    }

    #[rstest]
    fn link_components_accepts_component_names(
        composer: LinkComposer<FixedSuffix>,
        links: Vec<LinkDescriptor>,
    ) {
        let script = composer.link_components(&[String::from("db_dumps")], &links);
        assert!(script.starts_with("# 'db_dumps' component:\n"));
        assert!(!script.contains("bahmniconnect"));
    }

    #[test]
    fn init_folder_creates_and_owns() {
        assert_eq!(
            init_folder("/srv/app", "deploy", None, false),
            "sudo mkdir -p /srv/app\nsudo chown -R deploy:deploy /srv/app\n"
        );
        assert_eq!(
            init_folder("/srv/app", "deploy", Some("docker"), true),
            concat!(
                "sudo rm -rf /srv/app\n",
                "sudo mkdir -p /srv/app\n",
                "sudo chown -R deploy:docker /srv/app\n",
            )
        );
    }
}
