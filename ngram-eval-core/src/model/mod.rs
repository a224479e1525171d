//! Word-level language models.
//!
//! This module provides:
//! - Counting tables (`FrequencyTable`, `ConditionalFrequencyTable`)
//! - Count smoothing strategies (`Smoother`)
//! - Training configuration (`ModelConfig`)
//! - The interpolated n-gram model (`InterpolatedNGramModel`)
//! - Unigram sampling (`Generator`)

use crate::error::LmError;

/// Symbol → weight table normalized once into a distribution.
pub mod frequency_table;

/// Context tuple → `FrequencyTable` of the following symbol.
pub mod conditional_table;

/// Closed set of count smoothing strategies applied before normalization.
pub mod smoother;

/// Validated model order, interpolation weights and smoother choice.
pub mod config;

/// Interpolated n-gram model.
///
/// Handles sentence ingestion, parallel counting, the
/// train → smooth → normalize → query lifecycle and the binary cache.
pub mod ngram_model;

/// Seedable word and sentence sampling from a unigram distribution.
pub mod generator;

/// Anything that can assign a probability to a tokenized sentence.
///
/// The evaluation harness is written against this trait.
pub trait LanguageModel {
	/// Probability of `sentence` followed by the stop marker.
	fn sentence_probability(&self, sentence: &[String]) -> Result<f64, LmError>;
}
