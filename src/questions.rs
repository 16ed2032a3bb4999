//! Reflective question generation.
//!
//! Produces a small set of fixed-template questions for a submitted idea,
//! tagged with the layer they probe (1 = purpose/scope, 2 = execution,
//! 3 = risk/exit) and linked to the similar cases the user selected.

use uuid::Uuid;

use crate::models::{DecisionCase, NewIdea, Question};

/// Question templates with their layer. The first five are used per
/// session, keeping the output inside the intended 3–7 question range.
const TEMPLATES: &[(&str, u8)] = &[
    ("What are the primary and secondary goals of this idea?", 1),
    (
        "Who is the target user, and what is explicitly out of scope?",
        1,
    ),
    (
        "Who owns day-to-day operation, and how is that staffed?",
        2,
    ),
    (
        "Compared to existing efforts, what does only this idea provide?",
        2,
    ),
    (
        "Which concrete metrics decide whether this idea succeeded?",
        1,
    ),
    (
        "What are the main risks, and how would you respond to each?",
        3,
    ),
    (
        "Under what conditions would you scale back or withdraw?",
        3,
    ),
];

/// How many templates are emitted per session.
const QUESTIONS_PER_SESSION: usize = 5;

/// How many selected cases are linked to each question.
const MAX_SOURCE_CASES: usize = 3;

/// Generate reflective questions for `idea`, referencing up to three of
/// the selected similar cases.
///
/// The idea itself does not alter the templates; it is recorded in the
/// session log alongside the questions.
pub fn generate_questions(_idea: &NewIdea, similar_cases: &[DecisionCase]) -> Vec<Question> {
    let source_case_ids: Vec<String> = similar_cases
        .iter()
        .take(MAX_SOURCE_CASES)
        .map(|c| c.id.clone())
        .collect();

    TEMPLATES
        .iter()
        .take(QUESTIONS_PER_SESSION)
        .map(|(text, layer)| Question {
            id: Uuid::new_v4().to_string(),
            text: (*text).to_string(),
            layer: *layer,
            source_case_ids: source_case_ids.clone(),
        })
        .collect()
}
