//! XML configuration file.
//! - Parses config.xml with quick_xml + serde; unknown elements are an error.
//! - Writes a commented template on request (`--init-config`).
//!
//! Every element is optional. A missing file means defaults.

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::{default_config_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use crate::plan::NestedPolicy;
use crate::platform::write_config_secure_new_0600;

/// Mirror of the XML document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    editor: Option<String>,
    log_level: Option<String>,
    trace_file: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    all: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    recursive: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    numeric_sort: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    mangle_newlines: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    safe: Option<bool>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    remove_recursive: Option<bool>,
    nested_policy: Option<String>,
}

// Accepts surrounding whitespace and an empty element (= unset).
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("invalid boolean '{other}'"))),
        },
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn xml_to_config(parsed: XmlConfig, origin: &Path) -> Result<Config> {
    let log_level = match non_empty(parsed.log_level) {
        Some(s) => LogLevel::parse(&s)
            .ok_or_else(|| anyhow!("invalid log_level '{s}' in {}", origin.display()))?,
        None => LogLevel::default(),
    };
    let nested_policy = match non_empty(parsed.nested_policy) {
        Some(s) => NestedPolicy::parse(&s)
            .ok_or_else(|| anyhow!("invalid nested_policy '{s}' in {}", origin.display()))?,
        None => NestedPolicy::default(),
    };
    Ok(Config {
        editor: non_empty(parsed.editor),
        log_level,
        trace_file: non_empty(parsed.trace_file).map(PathBuf::from),
        all: parsed.all.unwrap_or(false),
        recursive: parsed.recursive.unwrap_or(false),
        numeric_sort: parsed.numeric_sort.unwrap_or(false),
        mangle_newlines: parsed.mangle_newlines.unwrap_or(false),
        safe: parsed.safe.unwrap_or(false),
        remove_recursive: parsed.remove_recursive.unwrap_or(false),
        nested_policy,
    })
}

/// Load a Config from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = if contents.trim().is_empty() {
        XmlConfig::default()
    } else {
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?
    };
    xml_to_config(parsed, path)
}

/// Load the config from [`default_config_path`]. A missing default file gives
/// defaults; a missing file named by `$DIR_EDIT_CONFIG` is an error.
pub fn load_config() -> Result<(Config, Option<PathBuf>)> {
    let explicit = std::env::var_os(super::CONFIG_ENV).is_some_and(|v| !v.is_empty());
    let Some(path) = default_config_path() else {
        return Ok((Config::default(), None));
    };
    if !path.exists() {
        if explicit {
            bail!("config file named by {} does not exist: {}", super::CONFIG_ENV, path.display());
        }
        debug!(path = %path.display(), "No config file; using defaults");
        return Ok((Config::default(), None));
    }
    let cfg = load_config_from_xml_path(&path)?;
    Ok((cfg, Some(path)))
}

/// Commented template listing every element with its default.
pub fn template_xml() -> String {
    r#"<!--
  dir_edit configuration (XML). Every element is optional.

    editor            -> command used to edit the listing (default: $VISUAL, $EDITOR, vi)
    log_level         -> quiet | normal | info | debug
    trace_file        -> also write diagnostic logs to this file
    all               -> list hidden entries too
    recursive         -> list recursively, create and clean up directories
    numeric_sort      -> sort names by leading number
    mangle_newlines   -> replace newlines in names with a blank
    safe              -> never create or remove directories
    remove_recursive  -> allow deleting non-empty directories
    nested_policy     -> reject | compose (changed entries inside changed directories)

  Command-line flags override these values.
-->
<config>
  <editor></editor>
  <log_level>normal</log_level>
  <trace_file></trace_file>
  <all>false</all>
  <recursive>false</recursive>
  <numeric_sort>false</numeric_sort>
  <mangle_newlines>false</mangle_newlines>
  <safe>false</safe>
  <remove_recursive>false</remove_recursive>
  <nested_policy>reject</nested_policy>
</config>
"#
    .to_string()
}

/// Write the template to `path`, refusing symlinked ancestors and existing files.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }
    write_config_secure_new_0600(path, template_xml().as_bytes())?;
    debug!(path = %path.display(), "Created template config");
    Ok(())
}
