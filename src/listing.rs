//! Listing codec: entries to editable text and edited text back to lines.
//!
//! Sorting only changes the presentation. The listing remembers which display
//! line belongs to which entry so decoded lines come back in entry order.

use std::cmp::Ordering;

use crate::entry::SnapshotEntry;
use crate::errors::{DirEditError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Keep the order the entries were given in.
    #[default]
    Preserve,
    /// Component-wise lexical order.
    Text,
    /// Component-wise, leading numbers compared by value (`2 - b` before `10 - a`).
    Numeric,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListingOptions {
    pub mangle_newlines: bool,
    pub sort: SortOrder,
}

/// Encoded listing plus the display-line to entry-index mapping.
#[derive(Debug, Clone)]
pub struct Listing {
    pub text: String,
    order: Vec<usize>,
}

impl Listing {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Decode edited text and return the lines in entry order.
    pub fn decode(&self, edited: &str) -> Result<Vec<String>> {
        let lines = decode(edited, self.len())?;
        let mut by_entry = vec![String::new(); lines.len()];
        for (line, &entry) in lines.into_iter().zip(&self.order) {
            by_entry[entry] = line;
        }
        Ok(by_entry)
    }
}

pub fn encode(entries: &[SnapshotEntry], options: &ListingOptions) -> Result<Listing> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    match options.sort {
        SortOrder::Preserve => {}
        SortOrder::Text => order.sort_by(|&a, &b| text_cmp(&entries[a], &entries[b])),
        SortOrder::Numeric => order.sort_by(|&a, &b| numeric_cmp(&entries[a], &entries[b])),
    }

    let mut text = String::new();
    for &i in &order {
        let name = entries[i].display_name();
        if name.contains(['\n', '\r']) {
            if !options.mangle_newlines {
                return Err(DirEditError::NewlineInName {
                    path: entries[i].path.clone(),
                });
            }
            text.push_str(&mangle_newlines(&name));
        } else {
            text.push_str(&name);
        }
        text.push('\n');
    }
    Ok(Listing { text, order })
}

/// Split edited text into lines; the count must match the listing exactly.
pub fn decode(edited: &str, expected_count: usize) -> Result<Vec<String>> {
    let lines: Vec<String> = edited
        .lines()
        .map(|l| l.trim_end_matches(['\r', '\n']).to_string())
        .collect();
    if lines.len() != expected_count {
        return Err(DirEditError::InconsistentLineCount {
            expected: expected_count,
            found: lines.len(),
        });
    }
    Ok(lines)
}

/// Replace every run of CR/LF characters with a single blank.
pub fn mangle_newlines(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c == '\n' || c == '\r' {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

fn components(entry: &SnapshotEntry) -> Vec<String> {
    entry
        .path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

fn text_cmp(a: &SnapshotEntry, b: &SnapshotEntry) -> Ordering {
    components(a).cmp(&components(b))
}

fn numeric_cmp(a: &SnapshotEntry, b: &SnapshotEntry) -> Ordering {
    let ka: Vec<(f64, String)> = components(a).iter().map(|c| numeric_key(c)).collect();
    let kb: Vec<(f64, String)> = components(b).iter().map(|c| numeric_key(c)).collect();
    for ((na, ra), (nb, rb)) in ka.iter().zip(&kb) {
        let ord = na.total_cmp(nb).then_with(|| ra.cmp(rb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ka.len().cmp(&kb.len())
}

/// Sort key for names like `23 - foo`: the leading number and the remainder.
/// Names without a leading number sort as 0.
pub fn numeric_key(name: &str) -> (f64, String) {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let digits = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits {
        return (0.0, name.to_string());
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    let number = name[start..i].parse::<f64>().unwrap_or(0.0);
    let rest = name[i..].trim_start();
    (number, rest.to_string())
}
