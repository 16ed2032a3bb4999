//! The case index: corpus plus precomputed embedding matrix.
//!
//! [`CaseIndex`] is the one piece of process-wide shared state. It moves
//! from `Uninitialized` to `Ready` on the first successful
//! [`initialize`](CaseIndex::initialize) and stays `Ready` from then on;
//! later calls rebuild the whole index, never patch it.
//!
//! # Snapshot discipline
//!
//! A rebuild composes, embeds, and normalizes the new corpus entirely off
//! to the side (the provider call is awaited with no lock held) and then
//! publishes the finished [`Snapshot`] with a single swap. Readers clone an
//! `Arc` to the currently published snapshot and keep using it for the
//! whole search, so an in-flight search sees either the fully-old or the
//! fully-new corpus, never a mix. A rebuild that fails leaves the
//! previously published snapshot untouched.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::embedding::{normalize_rows, EmbeddingProvider};
use crate::error::{RecallError, Result};
use crate::models::DecisionCase;
use crate::similarity::case_text;

/// One immutable (case list, embedding matrix) pairing.
///
/// Row `i` of the matrix is the L2-normalized embedding of `cases[i]`. An
/// empty corpus has an empty matrix; searches against it return no results.
#[derive(Debug)]
pub struct Snapshot {
    cases: Vec<DecisionCase>,
    matrix: Vec<Vec<f32>>,
}

impl Snapshot {
    /// The corpus, in file order. This order is the index-to-row mapping.
    pub fn cases(&self) -> &[DecisionCase] {
        &self.cases
    }

    /// The normalized embedding matrix, row-aligned with [`cases`](Self::cases).
    pub fn matrix(&self) -> &[Vec<f32>] {
        &self.matrix
    }

    /// Number of cases in this snapshot.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// True when the snapshot holds no cases.
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Shared, rebuild-on-demand index over the decision case corpus.
#[derive(Debug, Default)]
pub struct CaseIndex {
    published: RwLock<Option<Arc<Snapshot>>>,
}

impl CaseIndex {
    /// Create an index with no published snapshot. Searching before the
    /// first successful [`initialize`](Self::initialize) fails with
    /// [`RecallError::NotInitialized`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and publish a snapshot for `cases`, replacing any prior one.
    ///
    /// Composes one text per case, embeds them in a single batch,
    /// normalizes the rows, and swaps the result in. An empty case list
    /// publishes an empty snapshot; the index is then `Ready` and
    /// searches return empty results rather than erroring.
    ///
    /// # Errors
    ///
    /// Provider failures propagate unchanged. On error the previously
    /// published snapshot (if any) remains in place.
    pub async fn initialize(
        &self,
        provider: &dyn EmbeddingProvider,
        cases: Vec<DecisionCase>,
    ) -> Result<()> {
        let matrix = if cases.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = cases.iter().map(case_text).collect();
            let vectors = provider.embed(&texts).await?;
            if vectors.len() != cases.len() {
                return Err(RecallError::MalformedResponse(format!(
                    "embedded {} texts, got {} vectors",
                    cases.len(),
                    vectors.len()
                )));
            }
            normalize_rows(vectors)
        };

        let snapshot = Arc::new(Snapshot { cases, matrix });
        *self.published.write().await = Some(snapshot);
        Ok(())
    }

    /// The currently published snapshot.
    ///
    /// # Errors
    ///
    /// [`RecallError::NotInitialized`] before the first successful
    /// [`initialize`](Self::initialize).
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.published
            .read()
            .await
            .clone()
            .ok_or(RecallError::NotInitialized)
    }

    /// True once a snapshot has been published.
    pub async fn is_ready(&self) -> bool {
        self.published.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CaseStatus;
    use async_trait::async_trait;

    /// Deterministic test provider: hashes whitespace-separated tokens
    /// into a small bag-of-words vector, so similar texts get similar
    /// embeddings without any network access.
    struct StubProvider {
        dims: usize,
    }

    fn bag_of_words(text: &str, dims: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; dims];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut h: usize = 0;
            for b in token.bytes() {
                h = h.wrapping_mul(31).wrapping_add(b as usize);
            }
            v[h % dims] += 1.0;
        }
        v
    }

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        fn model_name(&self) -> &str {
            "stub"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| bag_of_words(t, self.dims)).collect())
        }
    }

    /// Provider that always fails, for rebuild-failure tests.
    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> usize {
            0
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(RecallError::Provider("unreachable".to_string()))
        }
    }

    fn case(id: &str, title: &str) -> DecisionCase {
        DecisionCase {
            id: id.to_string(),
            project_id: None,
            title: title.to_string(),
            summary: format!("{} summary", title),
            status: CaseStatus::Adopted,
            main_reason: "worked".to_string(),
            tags: Vec::new(),
            decision_date: None,
            decision_level: None,
            source: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_before_initialize_errors() {
        let index = CaseIndex::new();
        let err = index.snapshot().await.unwrap_err();
        assert!(matches!(err, RecallError::NotInitialized));
        assert!(!index.is_ready().await);
    }

    #[tokio::test]
    async fn test_initialize_empty_corpus_is_ready() {
        let index = CaseIndex::new();
        let provider = StubProvider { dims: 16 };
        index.initialize(&provider, Vec::new()).await.unwrap();

        let snapshot = index.snapshot().await.unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.matrix().is_empty());
        assert!(index.is_ready().await);
    }

    #[tokio::test]
    async fn test_initialize_aligns_rows_with_cases() {
        let index = CaseIndex::new();
        let provider = StubProvider { dims: 16 };
        index
            .initialize(&provider, vec![case("a", "Chat app"), case("b", "Recipe tracker")])
            .await
            .unwrap();

        let snapshot = index.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.matrix().len(), 2);
        assert_eq!(snapshot.cases()[0].id, "a");
        // Rows are unit-length after normalization.
        for row in snapshot.matrix() {
            let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn test_reinitialize_replaces_but_old_snapshot_survives() {
        let index = CaseIndex::new();
        let provider = StubProvider { dims: 16 };

        index
            .initialize(&provider, vec![case("a", "Chat app")])
            .await
            .unwrap();
        let old = index.snapshot().await.unwrap();

        index
            .initialize(&provider, vec![case("x", "Search engine"), case("y", "Billing")])
            .await
            .unwrap();
        let new = index.snapshot().await.unwrap();

        // The reader that grabbed the old snapshot still sees it whole.
        assert_eq!(old.len(), 1);
        assert_eq!(old.cases()[0].id, "a");
        assert_eq!(new.len(), 2);
        assert_eq!(new.cases()[0].id, "x");
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_published_snapshot() {
        let index = CaseIndex::new();
        let provider = StubProvider { dims: 16 };
        index
            .initialize(&provider, vec![case("a", "Chat app")])
            .await
            .unwrap();

        let err = index
            .initialize(&FailingProvider, vec![case("b", "Recipe tracker")])
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Provider(_)));

        let snapshot = index.snapshot().await.unwrap();
        assert_eq!(snapshot.cases()[0].id, "a");
    }
}
