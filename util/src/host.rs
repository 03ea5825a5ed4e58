//! Host platform (linux for example) utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable holding the root directory of the software.
pub const SW_ROOT_VAR: &str = "PTZ_SW_ROOT";

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the root directory of the software, which holds the `params` and `sessions`
/// directories.
pub fn get_ptz_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_VAR).map(PathBuf::from)
}
