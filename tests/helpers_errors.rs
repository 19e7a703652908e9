use std::io;
use std::path::Path;

use dir_edit::fs_ops::{io_error_with_help, io_error_with_help_io};

#[test]
fn notfound_fallback_hint_includes_path() {
    let p = Path::new("/nonexistent/path/for/test");
    let f = io_error_with_help("mv -n", p);
    let err = f(io::Error::from(io::ErrorKind::NotFound));
    let msg = format!("{}", err);
    assert!(msg.contains("mv -n"));
    assert!(msg.contains(p.to_string_lossy().as_ref()));
    assert!(msg.contains("path not found"));
}

#[cfg(unix)]
#[test]
fn cross_device_hint_present() {
    let f = io_error_with_help("mv -n", Path::new("a"));
    let msg = format!("{}", f(io::Error::from_raw_os_error(libc::EXDEV)));
    assert!(msg.contains("different filesystems"), "msg was: {}", msg);
    assert!(msg.contains("os code"), "should include os code in message");
}

#[cfg(unix)]
#[test]
fn rmdir_hints() {
    let p = Path::new("d");
    let m1 = format!("{}", io_error_with_help("rmdir", p)(io::Error::from_raw_os_error(libc::ENOTEMPTY)));
    let m2 = format!("{}", io_error_with_help("rmdir", p)(io::Error::from_raw_os_error(libc::EBUSY)));
    assert!(m1.contains("not empty"), "msg was: {}", m1);
    assert!(m2.contains("busy"), "msg was: {}", m2);
}

#[cfg(unix)]
#[test]
fn filesystem_state_hints() {
    let p = Path::new("/tmp");
    let erofs = format!("{}", io_error_with_help("mkdir", p)(io::Error::from_raw_os_error(libc::EROFS)));
    let enospc = format!("{}", io_error_with_help("mkdir", p)(io::Error::from_raw_os_error(libc::ENOSPC)));
    let eloop = format!("{}", io_error_with_help("mkdir", p)(io::Error::from_raw_os_error(libc::ELOOP)));
    assert!(erofs.contains("read-only filesystem"));
    assert!(enospc.contains("no space"));
    assert!(eloop.contains("symbolic links"));
}

#[test]
fn io_adapter_preserves_kind() {
    let p = Path::new("b");
    let f = io_error_with_help_io("mv -n", p);
    let wrapped = f(io::Error::from(io::ErrorKind::AlreadyExists));
    assert_eq!(wrapped.kind(), io::ErrorKind::AlreadyExists);
    let msg = format!("{}", wrapped);
    assert!(msg.contains("already exists"));
}
