//! # Decision Recall
//!
//! A self-review service for new project ideas.
//!
//! Decision Recall keeps a corpus of past decision cases (adopted,
//! rejected, or still pending, each with the main reason behind the call),
//! finds the cases most similar to a newly submitted idea via embedding
//! similarity, and generates a short list of reflective questions grounded
//! in those cases. Each review session and its feedback is logged to a
//! JSON file.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐
//! │ Case file │──▶│ Composer │──▶│ Embedding │──▶│ CaseIndex │
//! │  (JSON)   │   │          │   │ Provider  │   │ (snapshot)│
//! └───────────┘   └──────────┘   └───────────┘   └─────┬─────┘
//!                                                      │
//!                        query ──▶ embed ──▶ rank ─────┘
//!                                             │
//!                                             ▼
//!                                  top-K ScoredCase results
//! ```
//!
//! At startup the corpus is composed into canonical texts, embedded in one
//! batch, L2-normalized, and published as an immutable snapshot. Each
//! search embeds the idea text, normalizes it, and ranks the snapshot rows
//! by cosine similarity with a deterministic tie-break.
//!
//! ## Quick Start
//!
//! ```bash
//! recall --config ./recall.toml serve
//! recall --config ./recall.toml search \
//!     --title "Team messaging" \
//!     --summary "A messaging tool for teams" \
//!     --tag chat
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed failure kinds |
//! | [`loader`] | Case corpus loading |
//! | [`embedding`] | Embedding provider abstraction and vector math |
//! | [`index`] | Snapshot-published case index |
//! | [`similarity`] | Text composition and cosine ranking |
//! | [`questions`] | Reflective question generation |
//! | [`session`] | Session log files |
//! | [`server`] | HTTP API |

pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod models;
pub mod questions;
pub mod server;
pub mod session;
pub mod similarity;
