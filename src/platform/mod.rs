//! Platform-specific helpers.
//! Hides Unix/Windows differences for log files, config writes and
//! no-clobber renames.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{open_log_file_secure_append, rename_no_clobber, write_config_secure_new_0600};

#[cfg(not(unix))]
pub use windows::{open_log_file_secure_append, rename_no_clobber, write_config_secure_new_0600};
