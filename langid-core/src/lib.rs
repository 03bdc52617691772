//! Word-bigram language identification library.
//!
//! This crate provides the statistical core of a language identifier:
//! - Counting-based word bigram models (`BigramModel`)
//! - Parallel, chunked training from tokenized corpora (`Trainer`)
//! - Fallback-smoothed probability and perplexity scoring
//! - Minimum-perplexity classification over a language registry (`Classifier`)
//! - Postcard persistence of trained parameter tables
//!
//! Corpus download and presentation layers live outside of this crate.

/// Error taxonomy shared by every module.
pub mod error;

/// Bigram models, training, scoring and classification.
///
/// Exposes the model types and the high-level classifier interface.
pub mod model;

/// Save/load of trained models and registries.
pub mod persistence;

/// JSON configuration with defaults for every field.
pub mod config;

/// I/O utilities (corpus reading, tokenization, path helpers).
pub mod io;

pub use error::{LangIdError, Result};
pub use model::bigram_model::BigramModel;
pub use model::classifier::{Classifier, Identification, Registry};
pub use model::perplexity::perplexity;
pub use model::trainer::Trainer;
