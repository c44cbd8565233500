//! Privilege drop to an unprivileged identity after all privileged
//! resources (device nodes, actuator, instance lock) are held.

use nix::unistd::{Gid, Uid, setgid, setuid};
use tracing::{debug, info};

use crate::core::config::PrivilegeConfig;
use crate::core::errors::{GlowdError, Result};

/// Drop to the configured uid/gid. Group first, then user; once the user id
/// is gone the group change would no longer be permitted.
///
/// A daemon started without root keeps its identity (there is nothing to
/// drop); a failed drop while root is fatal.
pub fn drop_privileges(config: &PrivilegeConfig) -> Result<()> {
    if !Uid::effective().is_root() {
        debug!("not running as root, keeping current identity");
        return Ok(());
    }
    setgid(Gid::from_raw(config.gid)).map_err(|errno| GlowdError::PrivilegeDrop {
        uid: config.uid,
        gid: config.gid,
        details: format!("setgid: {errno}"),
    })?;
    setuid(Uid::from_raw(config.uid)).map_err(|errno| GlowdError::PrivilegeDrop {
        uid: config.uid,
        gid: config.gid,
        details: format!("setuid: {errno}"),
    })?;
    info!(uid = config.uid, gid = config.gid, "dropped privileges");
    Ok(())
}
