//! Decision case loading.
//!
//! The corpus is a flat JSON file holding an array of [`DecisionCase`]
//! records. It is read once at startup (or on an explicit rebuild) and
//! handed to the index. There is no lazy module-level cache: the caller
//! owns the loaded cases and decides when to reload.

use std::path::Path;

use crate::error::{RecallError, Result};
use crate::models::DecisionCase;

/// Load the decision case corpus from a JSON file.
///
/// The file order is preserved; it becomes the index-to-row mapping of the
/// embedding matrix.
///
/// # Errors
///
/// An unreadable file or invalid JSON yields
/// [`RecallError::SourceUnavailable`]. On a rebuild, the caller keeps its
/// previously built index when this fails.
pub fn load_cases(path: &Path) -> Result<Vec<DecisionCase>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RecallError::SourceUnavailable(format!("{}: {}", path.display(), e))
    })?;

    let cases: Vec<DecisionCase> = serde_json::from_str(&content).map_err(|e| {
        RecallError::SourceUnavailable(format!("{}: {}", path.display(), e))
    })?;

    Ok(cases)
}
