//! Run resolved operations against the filesystem, in order.
//!
//! Each operation is echoed to the optional trace as a shell line before it
//! runs, so the trace of a dry run is a script that would perform the edit.
//! Execution stops at the first failure; nothing is rolled back.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{DirEditError, Result};
use crate::fs_ops::apply_operation;
use crate::ops::{Operation, shell_command};
use crate::shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Apply,
    /// Trace only; the filesystem is not touched.
    DryRun,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Operations performed (or, in a dry run, that would have been).
    pub applied: usize,
    pub renamed: usize,
    pub removed: usize,
    pub created: usize,
    pub dry_run: bool,
}

impl ExecutionReport {
    fn count(&mut self, op: &Operation) {
        self.applied += 1;
        match op {
            Operation::Rename { .. } => self.renamed += 1,
            Operation::MakeDir(_) => self.created += 1,
            Operation::RemoveFile(_) | Operation::RemoveDir(_) | Operation::RemoveTree(_) => {
                self.removed += 1
            }
        }
    }
}

pub fn execute(
    root: &Path,
    ops: &[Operation],
    mode: ExecutionMode,
    mut trace: Option<&mut dyn Write>,
) -> Result<ExecutionReport> {
    let mut report = ExecutionReport {
        dry_run: mode == ExecutionMode::DryRun,
        ..Default::default()
    };
    if ops.is_empty() {
        info!("Nothing to do");
        return Ok(report);
    }

    emit(&mut trace, &trace_line("cd", &[root]));

    for op in ops {
        if shutdown::is_requested() {
            warn!(applied = report.applied, "Interrupted; stopping before next operation");
            return Err(DirEditError::Interrupted {
                applied: report.applied,
            });
        }
        emit(&mut trace, &op.shell_line());
        if mode == ExecutionMode::Apply {
            if let Err(cause) = apply_operation(root, op) {
                return Err(DirEditError::FilesystemOperationFailed {
                    operation: op.clone(),
                    applied: report.applied,
                    cause,
                });
            }
        }
        debug!(op = %op, dry_run = report.dry_run, "Applied operation");
        report.count(op);
    }

    info!(
        applied = report.applied,
        renamed = report.renamed,
        removed = report.removed,
        created = report.created,
        dry_run = report.dry_run,
        "Edit complete"
    );
    Ok(report)
}

fn emit(trace: &mut Option<&mut dyn Write>, line: &str) {
    if let Some(w) = trace.as_mut() {
        if let Err(e) = writeln!(w, "{line}") {
            warn!(error = %e, "Failed to write operation trace");
        }
    }
}

/// Shell line for a command over path arguments.
pub fn trace_line(command: &str, args: &[&Path]) -> String {
    let args: Vec<Cow<'_, str>> = args.iter().map(|p| p.to_string_lossy()).collect();
    shell_command(command, &args)
}
