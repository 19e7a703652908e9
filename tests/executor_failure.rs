//! A failing operation stops the run and reports what was already applied.

use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;
use std::io;

use dir_edit::{DirEditError, ExecutionMode, Operation, execute};

#[test]
fn failure_reports_operation_and_progress() {
    let td = TempDir::new().unwrap();
    td.child("a").write_str("A").unwrap();
    let ops = vec![
        Operation::rename("a", "b"),
        Operation::rename("missing", "c"),
        Operation::rename("b", "d"),
    ];

    let mut trace = Vec::new();
    let err = execute(td.path(), &ops, ExecutionMode::Apply, Some(&mut trace)).unwrap_err();
    match &err {
        DirEditError::FilesystemOperationFailed {
            operation,
            applied,
            cause,
        } => {
            assert_eq!(operation, &ops[1]);
            assert_eq!(*applied, 1);
            assert_eq!(cause.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.code(), 30);

    // no rollback: the first rename stays, the third never ran
    assert!(td.path().join("b").exists());
    assert!(!td.path().join("d").exists());
    let trace = String::from_utf8(trace).unwrap();
    assert_eq!(trace.lines().count(), 3, "cd plus the two attempted operations");
}

#[test]
fn rename_never_replaces_an_entry_created_behind_our_back() {
    let td = TempDir::new().unwrap();
    td.child("a").write_str("A").unwrap();
    td.child("b").write_str("late arrival").unwrap();

    let err = execute(td.path(), &[Operation::rename("a", "b")], ExecutionMode::Apply, None).unwrap_err();
    assert!(matches!(err, DirEditError::FilesystemOperationFailed { applied: 0, .. }));
    assert_eq!(fs::read_to_string(td.path().join("b")).unwrap(), "late arrival");
}

#[test]
fn existing_target_is_refused_before_the_platform_rename() {
    let td = TempDir::new().unwrap();
    td.child("a").write_str("A").unwrap();
    td.child("b").write_str("B").unwrap();
    td.child("empty").create_dir_all().unwrap();

    for target in ["b", "empty"] {
        let err = execute(td.path(), &[Operation::rename("a", target)], ExecutionMode::Apply, None).unwrap_err();
        match err {
            DirEditError::FilesystemOperationFailed { cause, applied, .. } => {
                assert_eq!(applied, 0);
                assert_eq!(cause.kind(), io::ErrorKind::AlreadyExists, "{target}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
    td.child("a").assert("A");
    td.child("b").assert("B");
}
