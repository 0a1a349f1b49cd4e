//! Originality verification
//!
//! A draft is scored against each retrieved reference on two signals,
//! semantic (cosine of embeddings) and lexical (5-gram Jaccard), and
//! scanned for source-leak patterns. The policy thresholds decide.

pub mod policy;
pub mod signals;
pub mod verifier;

pub use policy::OriginalityPolicy;
pub use signals::ngram_jaccard;
pub use verifier::{evaluate, ReferenceSignals, RejectionReason, Verdict, Verifier};
