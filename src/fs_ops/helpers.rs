//! I/O error enrichment.
//!
//! Wraps io::Error with the operation, the path and a hint for the errno
//! values a rename or removal typically hits:
//!
//!   // in functions returning anyhow::Result<_>
//!   fs::read_to_string(p).map_err(io_error_with_help("read file list", p))?;
//!
//!   // in functions returning io::Result<_>
//!   fs::remove_dir(p).map_err(io_error_with_help_io("rmdir", p))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

fn hint_for(e: &io::Error) -> Option<&'static str> {
    #[cfg(unix)]
    if let Some(code) = e.raw_os_error() {
        let hint = match code {
            libc::EACCES | libc::EPERM => "permission denied; check ownership and write permission on the parent directory",
            libc::EXDEV => "source and target are on different filesystems; rename cannot cross them",
            libc::ENOTEMPTY => "directory is not empty",
            libc::EEXIST => "target already exists",
            libc::ENOTDIR => "a path component is not a directory",
            libc::EISDIR => "target is a directory",
            libc::ENOENT => "path not found; was it changed while the editor was open?",
            libc::EBUSY => "resource busy; a mount point or open directory cannot be moved",
            libc::EROFS => "read-only filesystem",
            libc::ENOSPC => "no space left on device",
            libc::ENAMETOOLONG => "file name too long",
            libc::ELOOP => "too many levels of symbolic links",
            _ => return None,
        };
        return Some(hint);
    }
    #[cfg(windows)]
    if let Some(code) = e.raw_os_error() {
        let hint = match code {
            5 => "access denied; check permissions",
            17 => "not the same device; rename cannot cross volumes",
            32 => "sharing violation; the file is in use",
            2 | 3 => "path not found; was it changed while the editor was open?",
            80 | 183 => "target already exists",
            145 => "directory is not empty",
            _ => return None,
        };
        return Some(hint);
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied"),
        io::ErrorKind::NotFound => Some("path not found; was it changed while the editor was open?"),
        io::ErrorKind::AlreadyExists => Some("target already exists"),
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{op} '{}': {e}", path.display());
    if let Some(hint) = hint_for(e) {
        msg.push_str(" (");
        msg.push_str(hint);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Closure for `.map_err(...)` in anyhow code paths.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// Closure for `.map_err(...)` in io::Result code paths; keeps the ErrorKind.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_operation_and_path() {
        let e = io::Error::new(io::ErrorKind::NotFound, "gone");
        let msg = build_message("rmdir", Path::new("a/b"), &e);
        assert!(msg.starts_with("rmdir 'a/b': gone"));
        assert!(msg.contains("path not found"));
    }

    #[cfg(unix)]
    #[test]
    fn errno_hint_and_code_are_appended() {
        let e = io::Error::from_raw_os_error(libc::ENOTEMPTY);
        let msg = build_message("rmdir", Path::new("d"), &e);
        assert!(msg.contains("directory is not empty"));
        assert!(msg.contains(&format!("[os code: {}]", libc::ENOTEMPTY)));
    }

    #[test]
    fn io_variant_preserves_kind() {
        let e = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let wrapped = io_error_with_help_io("mv -n", Path::new("x"))(e);
        assert_eq!(wrapped.kind(), io::ErrorKind::PermissionDenied);
    }
}
