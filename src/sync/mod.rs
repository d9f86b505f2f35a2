//! `rsync` command construction for local and remote transfers.
//!
//! Directory semantics follow `rsync`: a trailing slash on the source syncs
//! the directory contents, no slash copies the directory itself into the
//! destination. The builder never checks existence and never retries; the
//! transfer is idempotent by construction.

use crate::defaults::DEFAULT_RSYNC_FLAGS;
use crate::error::ScriptError;
use crate::paths::{TrailingSlash, normalize_trailing_slash};
use crate::transport::HostConnection;

/// Which side of a transfer lives on the remote host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncDirection {
    /// Local source, remote destination.
    Push,
    /// Remote source, local destination.
    Pull,
    /// Both sides on the machine running the command.
    Local,
}

/// Parameters of a single `rsync` invocation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SyncRequest {
    source: String,
    destination: String,
    source_slash: TrailingSlash,
    destination_slash: TrailingSlash,
    flags: Option<String>,
    direction: Option<SyncDirection>,
}

impl SyncRequest {
    /// Starts a request copying `source` to `destination` with default flags.
    #[must_use]
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Self::default()
        }
    }

    /// Sets the trailing-slash policy of the source path.
    #[must_use]
    pub fn source_is_dir(mut self, flag: impl Into<TrailingSlash>) -> Self {
        self.source_slash = flag.into();
        self
    }

    /// Sets the trailing-slash policy of the destination path.
    #[must_use]
    pub fn dest_is_dir(mut self, flag: impl Into<TrailingSlash>) -> Self {
        self.destination_slash = flag.into();
        self
    }

    /// Replaces the default `-avz` flag set.
    #[must_use]
    pub fn flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = Some(flags.into());
        self
    }

    /// Overrides the direction implied by the connection flags.
    #[must_use]
    pub const fn direction(mut self, direction: SyncDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Builds one newline-terminated `rsync` command line.
///
/// # Errors
///
/// Returns [`ScriptError::InvalidArgument`] when the connection marks both
/// sides as remote, or when a remote direction is requested without a
/// connection.
///
/// # Examples
///
/// ```
/// use stagehand::sync::{SyncRequest, build_sync};
///
/// let request = SyncRequest::new("/src", "/dst").source_is_dir(true).dest_is_dir(true);
/// assert_eq!(build_sync(None, &request).unwrap(), "rsync -avz /src/ /dst/\n");
/// ```
pub fn build_sync(
    connection: Option<&HostConnection>,
    request: &SyncRequest,
) -> Result<String, ScriptError> {
    let direction = resolve_direction(connection, request.direction)?;
    let mut flags = request
        .flags
        .clone()
        .unwrap_or_else(|| String::from(DEFAULT_RSYNC_FLAGS));
    let mut source = normalize_trailing_slash(&request.source, request.source_slash);
    let mut destination =
        normalize_trailing_slash(&request.destination, request.destination_slash);

    if let Some(conn) = connection {
        match direction {
            SyncDirection::Push => {
                destination = format!("{}:{destination}", conn.target());
                push_remote_shell(&mut flags, conn.port);
            }
            SyncDirection::Pull => {
                source = format!("{}:{source}", conn.target());
                push_remote_shell(&mut flags, conn.port);
            }
            SyncDirection::Local => {}
        }
    }

    Ok(format!("rsync {flags} {source} {destination}\n"))
}

fn push_remote_shell(flags: &mut String, port: u16) {
    flags.push_str(&format!(" -e 'ssh -p {port}'"));
}

fn resolve_direction(
    connection: Option<&HostConnection>,
    requested: Option<SyncDirection>,
) -> Result<SyncDirection, ScriptError> {
    let direction = match (requested, connection) {
        (Some(direction), _) => direction,
        (None, None) => SyncDirection::Local,
        (None, Some(conn)) => match (conn.remote_source, conn.remote_destination) {
            (true, true) => {
                return Err(ScriptError::invalid(
                    "connection marks both source and destination as remote",
                ));
            }
            (true, false) => SyncDirection::Pull,
            (false, true) => SyncDirection::Push,
            (false, false) => SyncDirection::Local,
        },
    };

    if connection.is_none() && direction != SyncDirection::Local {
        return Err(ScriptError::invalid(
            "remote sync requested without a host connection",
        ));
    }
    Ok(direction)
}
