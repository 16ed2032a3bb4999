//! Similarity search over the decision case corpus.
//!
//! Three layers, separately testable:
//!
//! 1. Text composition ([`case_text`], [`idea_text`]) — deterministic
//!    canonical strings fed to the embedding provider.
//! 2. The pure ranker ([`rank_rows`]) — cosine top-K over a normalized
//!    matrix, with a deterministic tie-break.
//! 3. [`search_similar_cases`] — ties the published index snapshot and
//!    the provider together for one query.
//!
//! # Scoring
//!
//! Corpus rows and the query vector are L2-normalized, so the dot product
//! of a pair is their cosine similarity. Scores are returned as-is in
//! `[-1.0, 1.0]`, never rescaled. Ranking is by descending score; exactly
//! equal scores keep ascending corpus order, so a repeated query returns a
//! reproducible list.

use crate::embedding::{dot, normalize_rows, EmbeddingProvider};
use crate::error::{RecallError, Result};
use crate::index::CaseIndex;
use crate::models::{DecisionCase, NewIdea, ScoredCase};

// ============ Text composition ============

/// Canonical text for one corpus case.
///
/// Fixed order: title, summary, tags line, status line, main-reason line.
/// The same case always composes to the same string; the embedding call
/// depends on it.
pub fn case_text(case: &DecisionCase) -> String {
    let parts = [
        case.title.clone(),
        case.summary.clone(),
        format!("Tags: {}", case.tags.join(", ")),
        format!("Status: {}", case.status),
        format!("Main reason: {}", case.main_reason),
    ];
    parts.join("\n")
}

/// Canonical text for an incoming idea: title, summary, tags line.
pub fn idea_text(idea: &NewIdea) -> String {
    let parts = [
        idea.title.clone(),
        idea.summary.clone(),
        format!("Tags: {}", idea.tags.join(", ")),
    ];
    parts.join("\n")
}

// ============ Ranking ============

/// Rank corpus rows against a query vector by cosine similarity.
///
/// The query is normalized here (a zero query stays zero and scores 0
/// against every row); `rows` must already be normalized, which the index
/// guarantees. Returns at most `min(top_k, rows.len())` pairs of
/// `(corpus index, score)`, descending by score, ties broken by ascending
/// corpus index.
pub fn rank_rows(query: &[f32], rows: &[Vec<f32>], top_k: usize) -> Vec<(usize, f32)> {
    if rows.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let query = normalize_rows(vec![query.to_vec()])
        .into_iter()
        .next()
        .unwrap_or_default();

    let mut scored: Vec<(usize, f32)> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (i, dot(&query, row)))
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    scored.truncate(top_k.min(rows.len()));
    scored
}

// ============ Search ============

/// Find the `top_k` cases most similar to an idea.
///
/// Embeds the idea's canonical text with the given provider and ranks it
/// against the currently published index snapshot. The whole search runs
/// against one snapshot, so results are never a mix of two corpus
/// generations.
///
/// # Errors
///
/// - [`RecallError::NotInitialized`] if the index has never been built.
/// - Provider failures from the query embedding propagate before any
///   ranking work happens.
///
/// An initialized-but-empty corpus returns `Ok(vec![])` without calling
/// the provider.
pub async fn search_similar_cases(
    index: &CaseIndex,
    provider: &dyn EmbeddingProvider,
    idea: &NewIdea,
    top_k: usize,
) -> Result<Vec<ScoredCase>> {
    let snapshot = index.snapshot().await?;
    if snapshot.is_empty() {
        return Ok(Vec::new());
    }

    let query_text = idea_text(idea);
    let query_vec = provider
        .embed(&[query_text])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RecallError::MalformedResponse("empty embedding response".to_string()))?;

    let ranked = rank_rows(&query_vec, snapshot.matrix(), top_k);

    Ok(ranked
        .into_iter()
        .map(|(i, score)| ScoredCase {
            case: snapshot.cases()[i].clone(),
            score,
        })
        .collect())
}
