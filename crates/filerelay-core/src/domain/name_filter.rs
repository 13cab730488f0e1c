//! Include/exclude name filtering
//!
//! Masks use shell-glob syntax (`*`, `?`) and are translated to anchored,
//! case-insensitive regular expressions by plain substitution. Only `.`,
//! `*` and `?` are rewritten; every other regex metacharacter passes
//! through untouched, so a mask such as `*.[xX][mM][lL]` or `(a|b).txt`
//! keeps its regex meaning. Existing triggers rely on that.

use regex::{Regex, RegexBuilder};

use super::errors::DomainError;

/// Mask applied when the caller supplies an empty include mask.
pub const MATCH_ALL_MASK: &str = "*";

/// A compiled include mask plus an optional exclude mask
///
/// Built once per poll and passed down explicitly; never stored on shared
/// state.
#[derive(Debug, Clone)]
pub struct NameFilter {
    include: Regex,
    exclude: Option<Regex>,
}

impl NameFilter {
    /// Compiles the two masks.
    ///
    /// An empty include mask means "everything"; an empty exclude mask means
    /// "exclude nothing".
    pub fn compile(include_mask: &str, exclude_mask: Option<&str>) -> Result<Self, DomainError> {
        let include_mask = if include_mask.is_empty() {
            MATCH_ALL_MASK
        } else {
            include_mask
        };

        let include = compile_mask(include_mask)?;
        let exclude = match exclude_mask {
            Some(mask) if !mask.is_empty() => Some(compile_mask(mask)?),
            _ => None,
        };

        Ok(Self { include, exclude })
    }

    /// True iff `name` matches the include mask and not the exclude mask.
    pub fn matches(&self, name: &str) -> bool {
        if !self.include.is_match(name) {
            return false;
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(name),
            None => true,
        }
    }
}

/// Rewrites a glob mask into the anchored pattern source.
pub fn mask_to_pattern(mask: &str) -> String {
    let body = mask
        .replace('.', "[.]")
        .replace('*', ".*")
        .replace('?', ".");
    format!("^{body}$")
}

fn compile_mask(mask: &str) -> Result<Regex, DomainError> {
    RegexBuilder::new(&mask_to_pattern(mask))
        .case_insensitive(true)
        .build()
        .map_err(|e| DomainError::InvalidMask {
            mask: mask.to_string(),
            reason: e.to_string(),
        })
}
