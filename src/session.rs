//! Session log persistence.
//!
//! Each review session is one JSON file, `session_<uuid>.json`, holding the
//! submitted idea, the cases it was compared against, the generated
//! questions, and any feedback appended later. Files are small and written
//! whole; there is no database behind them.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::models::{DecisionCase, NewIdea, Question, QuestionFeedback};

/// On-disk session log schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub created_at: String,
    pub new_idea: NewIdea,
    pub similar_cases: Vec<SessionCaseRef>,
    pub questions: Vec<Question>,
    pub feedbacks: Vec<QuestionFeedback>,
}

/// Minimal reference to a case in a session log.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCaseRef {
    pub id: String,
    pub title: String,
}

fn session_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(format!("session_{}.json", session_id))
}

/// Create a new session log file and return its id.
pub fn create_session(
    dir: &Path,
    idea: &NewIdea,
    similar_cases: &[DecisionCase],
    questions: &[Question],
) -> Result<String> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    let session_id = Uuid::new_v4().to_string();
    let log = SessionLog {
        session_id: session_id.clone(),
        created_at: Utc::now().to_rfc3339(),
        new_idea: idea.clone(),
        similar_cases: similar_cases
            .iter()
            .map(|c| SessionCaseRef {
                id: c.id.clone(),
                title: c.title.clone(),
            })
            .collect(),
        questions: questions.to_vec(),
        feedbacks: Vec::new(),
    };

    let path = session_path(dir, &session_id);
    let content = serde_json::to_string_pretty(&log)?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write session log: {}", path.display()))?;

    Ok(session_id)
}

/// Append feedback entries to an existing session log.
///
/// Returns the number of entries appended. Fails with a "not found" error
/// when no log exists for `session_id`; the HTTP layer maps that message
/// onto a 404.
pub fn append_feedback(
    dir: &Path,
    session_id: &str,
    feedbacks: &[QuestionFeedback],
) -> Result<usize> {
    let path = session_path(dir, session_id);
    if !path.exists() {
        bail!("session not found: {}", session_id);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read session log: {}", path.display()))?;
    let mut log: SessionLog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session log: {}", path.display()))?;

    log.feedbacks.extend(feedbacks.iter().cloned());

    let content = serde_json::to_string_pretty(&log)?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write session log: {}", path.display()))?;

    Ok(feedbacks.len())
}
