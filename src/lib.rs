//! Huntsmith - Originality-Guarded Puzzle Generation
//!
//! Keeps a knowledge base of embedded reference chunks and generates new
//! scavenger-hunt puzzles with a language model. Every draft is scored
//! against the closest references and rejected, then retried with a mutated
//! tone, while it stays too close to any of them or leaks its sources.

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod originality;
pub mod patterns;
pub mod pipeline;
pub mod retrieval;
pub mod storage;

pub use error::{HuntError, Result};
