//! Filesystem primitives behind each planned operation.

mod apply;
mod helpers;

pub use apply::apply_operation;
pub use helpers::{io_error_with_help, io_error_with_help_io};
