//! Joint-table serialization.
//!
//! Output is a joint-table file: a `variables:` header, then one
//! `<pattern>: <probability>` line per assignment in linear order, every
//! probability in fixed-point with exactly ten decimals.

use probs_common::format::{SERIALIZED_DECIMALS, VARIABLES_HEADER};
use probs_common::{Error, FileFormatError, Format};
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::Path;

use crate::distribution::JointDistribution;

/// Render `dist` as joint-table text. Only `{0,1}`-labelled variables are
/// representable.
pub fn serialize_distribution(dist: &JointDistribution) -> Result<String, FileFormatError> {
    if let Some(v) = dist.variables().iter().find(|v| !v.is_boolean()) {
        return Err(FileFormatError::NotBoolean {
            variable: v.name().to_string(),
        });
    }

    let n = dist.num_variables();
    let mut out = String::with_capacity(dist.len() * (n + SERIALIZED_DECIMALS + 5));
    let _ = writeln!(out, "{} {}", VARIABLES_HEADER, dist.catalog().names().join(","));
    for (linear, &p) in dist.probabilities().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:0width$b}: {:.prec$}",
            linear,
            p,
            width = n,
            prec = SERIALIZED_DECIMALS
        );
    }
    Ok(out)
}

/// Serialize and write to `path`, replacing any existing file.
pub fn save_distribution(dist: &JointDistribution, path: &Path) -> Result<(), Error> {
    let text = serialize_distribution(dist)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension(format!("{}.tmp", Format::JointTable.extension()));
    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    tracing::debug!(path = %path.display(), entries = dist.len(), "saved joint table");
    Ok(())
}
