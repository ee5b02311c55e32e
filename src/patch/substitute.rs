//! Literal byte substitutions for installer files.
//!
//! The installer is never parsed; files are edited by exact byte
//! replacement only. Each [`Substitution`] is idempotent: when its
//! replacement text is already present the buffer is left alone, so
//! running the tool over an already-patched tree changes nothing.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::write_file_mode;

/// One literal find/replace pair. Replaces every non-overlapping
/// occurrence, like the shell `sed s///g` edits it replaces.
#[derive(Debug, Clone, Copy)]
pub struct Substitution {
    pub from: &'static str,
    pub to: &'static str,
}

impl Substitution {
    pub const fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to }
    }

    /// Apply to a buffer. Returns the rewritten buffer and whether
    /// anything changed.
    ///
    /// Insertion-style edits (where `to` contains `from`) would grow
    /// on every run if applied blindly; the already-present guard
    /// makes them single-shot.
    pub fn apply(&self, buf: Vec<u8>) -> (Vec<u8>, bool) {
        if contains(&buf, self.to.as_bytes()) {
            return (buf, false);
        }
        replace_all(&buf, self.from.as_bytes(), self.to.as_bytes())
    }
}

/// Find the first occurrence of `needle` at or after `start`.
fn find(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() || start > haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + start)
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle, 0).is_some()
}

/// Replace every non-overlapping occurrence of `from` with `to`.
/// Returns the new buffer and whether any replacement happened.
pub fn replace_all(buf: &[u8], from: &[u8], to: &[u8]) -> (Vec<u8>, bool) {
    let mut out = Vec::with_capacity(buf.len());
    let mut pos = 0;
    let mut changed = false;

    while let Some(at) = find(buf, from, pos) {
        out.extend_from_slice(&buf[pos..at]);
        out.extend_from_slice(to);
        pos = at + from.len();
        changed = true;
    }
    out.extend_from_slice(&buf[pos..]);

    (out, changed)
}

/// Read a file, apply the substitutions in order, rewrite it with
/// `mode`. Returns whether the content changed.
pub fn patch_file(path: &Path, subs: &[Substitution], mode: u32) -> Result<bool> {
    let mut buf =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut changed = false;
    for sub in subs {
        let (next, applied) = sub.apply(buf);
        buf = next;
        changed |= applied;
    }

    write_file_mode(path, &buf, mode)?;
    Ok(changed)
}
