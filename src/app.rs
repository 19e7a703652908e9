//! Application orchestrator.
//! Loads and merges config, initializes logging, installs the interrupt
//! handler, then runs snapshot -> editor -> plan -> resolve -> execute.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use dir_edit::cli::Args;
use dir_edit::config::{create_template_config, load_config};
use dir_edit::fs_ops::io_error_with_help;
use dir_edit::output as out;
use dir_edit::platform::open_log_file_secure_append;
use dir_edit::{
    BuildOptions, Config, DirEditError, DiskProbe, ExecutionMode, ExecutionReport, SnapshotEntry,
    default_config_path, editor, listing, plan, resolve, shutdown, snapshot,
};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // config housekeeping happens before logging is set up
    if args.print_config {
        return print_config();
    }
    if args.init_config {
        let path = default_config_path().context("could not determine a config file location")?;
        create_template_config(&path)?;
        out::print_success(&format!("wrote config template to {}", path.display()));
        return Ok(());
    }

    let (mut cfg, cfg_path) = load_config().inspect_err(|e| out::print_error(&format!("{e:#}")))?;
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(&cfg.log_level, cfg.trace_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    if let Err(e) = ctrlc::set_handler(|| {
        shutdown::request();
        out::print_warn("interrupt received; stopping before the next operation");
    }) {
        warn!(error = %e, "Could not install interrupt handler");
    }

    debug!(?args, config = ?cfg_path, "Starting dir_edit");
    let result = edit_directory(&args, &cfg);
    if let Err(e) = &result {
        report_error(e);
    }
    drop(guard);
    result
}

fn print_config() -> Result<()> {
    match default_config_path() {
        Some(p) => {
            out::print_user(&p.display().to_string());
            if p.exists() {
                out::print_info("a config file exists at that location");
            } else {
                out::print_info("no config file there yet; create one with --init-config");
            }
        }
        None => out::print_error("could not determine a config file location"),
    }
    Ok(())
}

fn edit_directory(args: &Args, cfg: &Config) -> Result<()> {
    let root = std::path::absolute(&args.dir)
        .with_context(|| format!("resolve directory '{}'", args.dir.display()))?;
    let md = fs::metadata(&root).map_err(io_error_with_help("open directory", &root))?;
    if !md.is_dir() {
        bail!("not a directory: {}", root.display());
    }

    let (originals, sorted) = gather_originals(args, cfg, &root)?;
    if originals.is_empty() {
        bail!("no valid path given for renaming");
    }

    let listing = listing::encode(&originals, &cfg.listing_options(sorted))?;
    let edited_text = match &args.output {
        Some(path) => fs::read_to_string(path).map_err(io_error_with_help("read new names", path))?,
        None => {
            let command = editor::resolve_command(None, cfg.editor.as_deref());
            editor::edit(&listing.text, &command)?
        }
    };
    let edited = listing.decode(&edited_text)?;

    let build = BuildOptions {
        root: Some(root.clone()),
        nested: cfg.nested_policy,
    };
    let plan = plan::build(&originals, &edited, &build)?;
    if plan.change_count() == 0 {
        info!("No changes");
        return Ok(());
    }

    let ops = resolve(&plan, &DiskProbe::new(&root), &cfg.resolve_options())?;
    let report = run_operations(args, &root, &ops)?;
    if report.dry_run {
        info!(operations = report.applied, "Dry run; nothing was changed");
    }
    Ok(())
}

/// Entries to list and whether the listing should be sorted.
fn gather_originals(args: &Args, cfg: &Config, root: &Path) -> Result<(Vec<SnapshotEntry>, bool)> {
    if let Some(input) = &args.input {
        let paths: Vec<PathBuf> = snapshot::read_path_list(input)?;
        return Ok((snapshot::from_paths(root, &paths), false));
    }
    if !args.files.is_empty() {
        return Ok((snapshot::from_paths(root, &args.files), false));
    }
    Ok((snapshot::read_dir(root, &cfg.read_options())?, true))
}

fn run_operations(args: &Args, root: &Path, ops: &[dir_edit::Operation]) -> Result<ExecutionReport> {
    let mode = if args.dry_run {
        ExecutionMode::DryRun
    } else {
        ExecutionMode::Apply
    };
    if !args.wants_trace() {
        return Ok(dir_edit::execute(root, ops, mode, None)?);
    }
    let report = match &args.logfile {
        Some(path) => {
            let mut file = open_log_file_secure_append(path)
                .map_err(io_error_with_help("open operation log", path))?;
            dir_edit::execute(root, ops, mode, Some(&mut file))?
        }
        None => {
            let mut stdout = io::stdout().lock();
            dir_edit::execute(root, ops, mode, Some(&mut stdout))?
        }
    };
    Ok(report)
}

fn report_error(e: &anyhow::Error) {
    let Some(de) = e.downcast_ref::<DirEditError>() else {
        error!(error = %format!("{e:#}"), "dir_edit failed");
        return;
    };
    let code = de.code();
    let kind = de.kind();
    match de {
        DirEditError::FilesystemOperationFailed {
            operation,
            applied,
            cause,
        } => {
            error!(code, kind, operation = %operation, applied, cause = %cause, "Edit stopped part-way");
            out::print_warn(&format!(
                "{applied} operations were applied before the failure; the directory is partially edited"
            ));
        }
        DirEditError::Interrupted { applied } => {
            error!(code, kind, applied, "Edit interrupted");
        }
        other => {
            error!(code, kind, error = %other, "Edit rejected; nothing was changed");
        }
    }
}
