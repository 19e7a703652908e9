//! Drive the built binary end to end. Each run points DIR_EDIT_CONFIG at a
//! file in its own temp dir so the user's config is never read.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{TempDir, tempdir};

struct Fixture {
    _td: TempDir,
    base: PathBuf,
    dir: PathBuf,
    config: PathBuf,
}

impl Fixture {
    fn new(files: &[&str]) -> Self {
        let td = tempdir().unwrap();
        // resolve /var -> /private/var on macOS so no ancestor is a symlink
        let base = fs::canonicalize(td.path()).unwrap();
        let dir = base.join("work");
        fs::create_dir(&dir).unwrap();
        for f in files {
            fs::write(dir.join(f), f.to_uppercase()).unwrap();
        }
        let config = base.join("config.xml");
        fs::write(&config, "").unwrap();
        Fixture {
            _td: td,
            base,
            dir,
            config,
        }
    }

    fn names_file(&self, lines: &str) -> PathBuf {
        let p = self.base.join("names.txt");
        fs::write(&p, lines).unwrap();
        p
    }

    fn run(&self, args: &[&str]) -> Output {
        let me = assert_cmd::cargo::cargo_bin!("dir_edit");
        Command::new(me)
            .env("DIR_EDIT_CONFIG", &self.config)
            .env_remove("VISUAL")
            .env_remove("EDITOR")
            .args(args)
            .output()
            .expect("spawn binary")
    }

    fn listing(&self) -> Vec<String> {
        let mut v: Vec<String> = fs::read_dir(&self.dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        v.sort();
        v
    }
}

fn s(p: &Path) -> &str {
    p.to_str().expect("utf-8 temp path")
}

fn dump(out: &Output) -> String {
    format!(
        "status {:?}\n--- stdout\n{}--- stderr\n{}",
        out.status,
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    )
}

#[test]
fn print_config_shows_env_path() {
    let fx = Fixture::new(&[]);
    let out = fx.run(&["--print-config"]);
    assert!(out.status.success(), "{}", dump(&out));
    assert!(String::from_utf8_lossy(&out.stdout).contains(s(&fx.config)));
}

#[test]
fn init_config_writes_a_template_once() {
    let fx = Fixture::new(&[]);
    fs::remove_file(&fx.config).unwrap();

    let out = fx.run(&["--init-config"]);
    assert!(out.status.success(), "{}", dump(&out));
    assert!(fs::read_to_string(&fx.config).unwrap().contains("<nested_policy>"));

    let again = fx.run(&["--init-config"]);
    assert!(!again.status.success(), "existing config must not be replaced");
}

#[test]
fn names_file_swaps_two_entries() {
    let fx = Fixture::new(&["a", "b"]);
    let names = fx.names_file("b\na\n");

    let out = fx.run(&["-o", s(&names), s(&fx.dir)]);
    assert!(out.status.success(), "{}", dump(&out));
    assert_eq!(fx.listing(), vec!["a", "b"]);
    assert_eq!(fs::read_to_string(fx.dir.join("a")).unwrap(), "B");
    assert_eq!(fs::read_to_string(fx.dir.join("b")).unwrap(), "A");
}

#[test]
fn dry_run_prints_script_and_changes_nothing() {
    let fx = Fixture::new(&["a", "b"]);
    let names = fx.names_file("c\n\n");

    let out = fx.run(&["--dry-run", "-o", s(&names), s(&fx.dir)]);
    assert!(out.status.success(), "{}", dump(&out));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "{}", dump(&out));
    assert!(lines[0].starts_with("cd "));
    assert_eq!(lines[1], "rm b");
    assert_eq!(lines[2], "mv -n a c");
    assert_eq!(fx.listing(), vec!["a", "b"]);
}

#[test]
fn trace_goes_to_log_file() {
    let fx = Fixture::new(&["a"]);
    let names = fx.names_file("z\n");
    let log = fx.base.join("ops.log");

    let out = fx.run(&["-L", s(&log), "-o", s(&names), s(&fx.dir)]);
    assert!(out.status.success(), "{}", dump(&out));
    assert!(out.stdout.is_empty(), "{}", dump(&out));
    let trace = fs::read_to_string(&log).unwrap();
    assert!(trace.lines().any(|l| l == "mv -n a z"), "{trace}");
    assert_eq!(fx.listing(), vec!["z"]);
}

#[test]
fn wrong_line_count_fails_without_changes() {
    let fx = Fixture::new(&["a", "b"]);
    let names = fx.names_file("only one\n");

    let out = fx.run(&["-o", s(&names), s(&fx.dir)]);
    assert!(!out.status.success(), "{}", dump(&out));
    assert!(String::from_utf8_lossy(&out.stderr).contains("lines"), "{}", dump(&out));
    assert_eq!(fx.listing(), vec!["a", "b"]);
}

#[test]
fn explicit_files_limit_the_listing() {
    let fx = Fixture::new(&["a", "b", "c"]);
    let names = fx.names_file("x\n");

    let out = fx.run(&["-o", s(&names), s(&fx.dir), "b"]);
    assert!(out.status.success(), "{}", dump(&out));
    assert_eq!(fx.listing(), vec!["a", "c", "x"]);
}

#[test]
fn missing_directory_is_an_error() {
    let fx = Fixture::new(&[]);
    let names = fx.names_file("");
    let out = fx.run(&["-o", s(&names), s(&fx.base.join("nope"))]);
    assert!(!out.status.success(), "{}", dump(&out));
}

#[test]
fn empty_directory_has_nothing_to_rename() {
    let fx = Fixture::new(&[]);
    let names = fx.names_file("");
    let out = fx.run(&["-o", s(&names), s(&fx.dir)]);
    assert!(!out.status.success(), "{}", dump(&out));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no valid path"), "{}", dump(&out));
}

#[test]
fn missing_config_named_by_env_is_an_error() {
    let fx = Fixture::new(&["a"]);
    fs::remove_file(&fx.config).unwrap();
    let names = fx.names_file("a\n");
    let out = fx.run(&["-o", s(&names), s(&fx.dir)]);
    assert!(!out.status.success(), "{}", dump(&out));
}

#[cfg(unix)]
#[test]
fn editor_command_rewrites_the_listing() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new(&["a", "b"]);
    let script = fx.base.join("fake-editor.sh");
    fs::write(&script, "#!/bin/sh\nprintf 'first\\nsecond\\n' > \"$1\"\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let out = fx.run(&["-e", s(&script), s(&fx.dir)]);
    assert!(out.status.success(), "{}", dump(&out));
    assert_eq!(fx.listing(), vec!["first", "second"]);
    assert_eq!(fs::read_to_string(fx.dir.join("first")).unwrap(), "A");
}

#[cfg(unix)]
#[test]
fn failing_editor_aborts_the_edit() {
    let fx = Fixture::new(&["a"]);
    let out = fx.run(&["-e", "false", s(&fx.dir)]);
    assert!(!out.status.success(), "{}", dump(&out));
    assert_eq!(fx.listing(), vec!["a"]);
}
