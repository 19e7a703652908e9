//! Apply one [`Operation`] below the edited directory.

use std::fs;
use std::io;
use std::path::Path;

use crate::ops::Operation;
use crate::platform::rename_no_clobber;

use super::helpers::io_error_with_help_io;

/// Perform `op` with its paths joined onto `root`.
///
/// Renames never replace an existing entry. Creating a directory that already
/// exists is not an error.
pub fn apply_operation(root: &Path, op: &Operation) -> io::Result<()> {
    let cmd = op.command();
    match op {
        Operation::MakeDir(p) => {
            let path = root.join(p);
            match fs::create_dir(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
                Err(e) => Err(io_error_with_help_io(cmd, p)(e)),
            }
        }
        Operation::Rename { from, to } => {
            rename_no_clobber(&root.join(from), &root.join(to)).map_err(io_error_with_help_io(cmd, from))
        }
        Operation::RemoveFile(p) => fs::remove_file(root.join(p)).map_err(io_error_with_help_io(cmd, p)),
        Operation::RemoveDir(p) => fs::remove_dir(root.join(p)).map_err(io_error_with_help_io(cmd, p)),
        Operation::RemoveTree(p) => {
            fs::remove_dir_all(root.join(p)).map_err(io_error_with_help_io(cmd, p))
        }
    }
}
