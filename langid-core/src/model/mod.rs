//! Top-level module for the bigram language identification system.
//!
//! This module provides:
//! - Word bigram models (`BigramModel`)
//! - Internal successor counters (`Successors`)
//! - Chunked, multithreaded training (`Trainer`)
//! - Perplexity scoring (`perplexity`)
//! - A minimum-perplexity classifier over a language registry (`Classifier`)

/// Word bigram model with unigram/bigram count tables.
///
/// Handles training from a token sequence, merging of partial models,
/// three-tier fallback probability and conversion to/from persisted data.
pub mod bigram_model;

/// Inner level of the bigram table: counts of words following one word.
///
/// This module is not exposed publicly.
mod successors;

/// Training front-end: single pass or chunked parallel training,
/// plus corpus-file and directory helpers.
pub mod trainer;

/// Bigram perplexity of a token sequence under a model.
pub mod perplexity;

/// Language registry and minimum-perplexity classification.
pub mod classifier;
