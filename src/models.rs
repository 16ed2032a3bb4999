//! Core data models used throughout Decision Recall.
//!
//! These types represent the historical decision cases, incoming ideas,
//! generated questions, and feedback records that flow through the search
//! and session pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Adopted,
    Rejected,
    Pending,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Adopted => "adopted",
            CaseStatus::Rejected => "rejected",
            CaseStatus::Pending => "pending",
        };
        f.write_str(s)
    }
}

/// A recorded historical decision with a known outcome, used as reference
/// material when reviewing new ideas. Loaded once from the case data file
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCase {
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub title: String,
    pub summary: String,
    pub status: CaseStatus,
    pub main_reason: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub decision_date: Option<String>,
    #[serde(default)]
    pub decision_level: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A new project idea submitted for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdea {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One case paired with its cosine similarity to a query. Exists only for
/// the duration of a single search call.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCase {
    pub case: DecisionCase,
    pub score: f32,
}

/// A reflective question generated for a submitted idea.
///
/// `layer` is 1 (purpose/scope), 2 (execution), or 3 (risk/exit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub layer: u8,
    #[serde(default)]
    pub source_case_ids: Vec<String>,
}

/// A user's rating of one generated question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub question_id: String,
    /// 1–5.
    pub helpful_score: u8,
    pub modified_idea: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

// ============ HTTP request/response bodies ============

/// Lightweight case projection returned to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarCase {
    pub id: String,
    pub title: String,
    pub status: CaseStatus,
    pub main_reason: String,
    pub tags: Vec<String>,
}

impl From<&DecisionCase> for SimilarCase {
    fn from(case: &DecisionCase) -> Self {
        SimilarCase {
            id: case.id.clone(),
            title: case.title.clone(),
            status: case.status,
            main_reason: case.main_reason.clone(),
            tags: case.tags.clone(),
        }
    }
}

/// Response body for `POST /cases/search`.
#[derive(Debug, Serialize)]
pub struct SearchCasesResponse {
    pub similar_cases: Vec<SimilarCase>,
}

/// Request body for `POST /questions/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub idea: NewIdea,
    pub similar_case_ids: Vec<String>,
}

/// Response body for `POST /questions/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub session_id: String,
    pub questions: Vec<Question>,
}

/// Request body for `POST /sessions/{session_id}/feedback`.
#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedbacks: Vec<QuestionFeedback>,
}

/// Response body for `POST /sessions/{session_id}/feedback`.
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub session_id: String,
    pub saved_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        let json = serde_json::to_string(&CaseStatus::Adopted).unwrap();
        assert_eq!(json, "\"adopted\"");
        let back: CaseStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(back, CaseStatus::Rejected);
    }

    #[test]
    fn test_case_optional_fields_default() {
        let case: DecisionCase = serde_json::from_str(
            r#"{
                "id": "c1",
                "title": "Chat app",
                "summary": "Messaging tool for teams",
                "status": "adopted",
                "main_reason": "strong retention"
            }"#,
        )
        .unwrap();
        assert!(case.tags.is_empty());
        assert!(case.project_id.is_none());
        assert_eq!(case.status.to_string(), "adopted");
    }
}
