//! Fixed tokens shared by every command builder.
//!
//! Generated scripts must be byte-identical across pipeline runs, so every
//! literal that appears in more than one fragment lives here.

/// Interpreter line written at the top of every generated script.
pub const INTERPRETER: &str = "#!/bin/bash";

/// Strict-mode directive opening a full script body; traces each command.
pub const SCRIPT_STRICT_MODE: &str = "set -xe";

/// Strict-mode directive opening individual fragments.
pub const FRAGMENT_STRICT_MODE: &str = "set -e";

/// Flags passed to `rsync` when the caller does not override them.
pub const DEFAULT_RSYNC_FLAGS: &str = "-avz";

/// Heredoc delimiter used when piping a fragment to a remote shell.
pub const REMOTE_HEREDOC: &str = "REMOTE_EOF";

/// Heredoc delimiter used when piping a fragment to a shell on the pipeline
/// host.
pub const LOCAL_HEREDOC: &str = "LOCAL_EOF";

/// Heredoc delimiter used when piping a fragment into a container shell.
pub const CONTAINER_HEREDOC: &str = "CONTAINER_EOF";

/// Heredoc delimiter used when piping a fragment into a compose service.
pub const SERVICE_HEREDOC: &str = "SERVICE_EOF";

/// Account owning linked folders inside an instance.
pub const SERVICE_ACCOUNT: &str = "bahmni";

/// Hostname assigned to every single-container instance.
pub const CONTAINER_HOSTNAME: &str = "bahmni";

/// Restart policy applied to every single-container instance.
pub const RESTART_POLICY: &str = "unless-stopped";

/// Container path where the instance host directory is bind-mounted.
pub const INSTANCE_MOUNT_TARGET: &str = "/mnt";

/// Sub-directory of the host directory holding synchronised artifacts.
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";

/// Sub-directory of the host directory holding instance data.
pub const DATA_DIR_NAME: &str = "data";

/// Number of trailing token characters kept in backup filenames.
pub const BACKUP_SUFFIX_LEN: usize = 5;

/// Compose environment file written next to the cloned project.
pub const COMPOSE_ENV_FILE: &str = ".env";
