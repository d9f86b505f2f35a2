//! Remote execution wrapping for generated fragments.
//!
//! Fragments are piped to `/bin/bash -s` on the target host through an
//! unquoted heredoc, which is why runtime fragments escape their own `$`
//! expansions.
//!
//! # Security
//!
//! Command text is interpolated verbatim. Only the connection identity
//! (user and address) is shell-escaped; callers must ensure descriptor values
//! are safe to run.

use serde::Deserialize;

use crate::defaults::{LOCAL_HEREDOC, REMOTE_HEREDOC};
use crate::model::flexible_port;
use crate::paths::quote_identity;

/// SSH connection details for a target host.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HostConnection {
    /// Remote user to connect as.
    pub user: String,
    /// Address of the host.
    #[serde(alias = "address")]
    pub ip: String,
    /// SSH port.
    #[serde(deserialize_with = "flexible_port")]
    pub port: u16,
    /// Treat the source side of a two-path operation as remote.
    #[serde(default, rename = "remoteSrc")]
    pub remote_source: bool,
    /// Treat the destination side of a two-path operation as remote.
    #[serde(default, rename = "remoteDst")]
    pub remote_destination: bool,
}

impl HostConnection {
    /// Creates a connection with both remote-side flags cleared.
    #[must_use]
    pub fn new(user: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            user: user.into(),
            ip: ip.into(),
            port,
            remote_source: false,
            remote_destination: false,
        }
    }

    /// Returns a copy marking the destination side as remote.
    #[must_use]
    pub fn with_remote_destination(&self) -> Self {
        Self {
            remote_source: false,
            remote_destination: true,
            ..self.clone()
        }
    }

    /// Returns a copy marking the source side as remote.
    #[must_use]
    pub fn with_remote_source(&self) -> Self {
        Self {
            remote_source: true,
            remote_destination: false,
            ..self.clone()
        }
    }

    /// Returns `true` when either side of a two-path operation is remote.
    #[must_use]
    pub const fn addresses_remote_side(&self) -> bool {
        self.remote_source || self.remote_destination
    }

    /// Returns the escaped `user@ip` target.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}@{}", quote_identity(&self.user), quote_identity(&self.ip))
    }
}

/// Wraps `command` so it runs on the host described by `connection`.
///
/// Without a connection the command is returned unchanged. A connection
/// already flagged for a two-path operation reaches the remote itself, so
/// its commands stay local unless `force_remote` is set.
///
/// # Examples
///
/// ```
/// use stagehand::transport::{HostConnection, wrap_remote};
///
/// assert_eq!(wrap_remote(None, "ls\n", false), "ls\n");
///
/// let conn = HostConnection::new("deploy", "10.0.0.4", 22);
/// assert_eq!(
///     wrap_remote(Some(&conn), "ls", false),
///     "ssh -T -p 22 deploy@10.0.0.4 /bin/bash -s <<REMOTE_EOF\nls\nREMOTE_EOF\n"
/// );
/// ```
#[must_use]
pub fn wrap_remote(connection: Option<&HostConnection>, command: &str, force_remote: bool) -> String {
    let Some(conn) = connection else {
        return command.to_owned();
    };
    if conn.addresses_remote_side() && !force_remote {
        return command.to_owned();
    }

    let invocation = format!("ssh -T -p {} {} /bin/bash -s", conn.port, conn.target());
    heredoc(&invocation, REMOTE_HEREDOC, command)
}

/// Pipes `command` to a fresh `/bin/bash` on the machine running the script.
///
/// Fragments escape their `$` expansions for an unquoted heredoc; this gives
/// local fragments the same escape level as [`wrap_remote`] does for remote
/// ones.
#[must_use]
pub fn wrap_local(command: &str) -> String {
    heredoc("/bin/bash -s", LOCAL_HEREDOC, command)
}

/// Wraps a fragment that must run through a heredoc shell wherever the
/// instance lives: over SSH for a remote host, locally otherwise.
///
/// A connection flagged for a two-path operation is treated as local.
#[must_use]
pub fn wrap_host(connection: Option<&HostConnection>, command: &str) -> String {
    match connection {
        Some(conn) if !conn.addresses_remote_side() => wrap_remote(Some(conn), command, false),
        _ => wrap_local(command),
    }
}

fn heredoc(invocation: &str, delimiter: &str, command: &str) -> String {
    let mut script = format!("{invocation} <<{delimiter}\n");
    script.push_str(command);
    if !command.ends_with('\n') {
        script.push('\n');
    }
    script.push_str(delimiter);
    script.push('\n');
    script
}
