//! Interpolated n-gram language modeling and rescoring evaluation.
//!
//! This crate provides:
//! - Word-level n-gram models blending every order down to unigrams
//! - Pluggable count smoothing (identity, additive)
//! - Parallel training and a binary model cache
//! - Perplexity and word error rate over n-best hypothesis lists
//!
//! Typical flow: `InterpolatedNGramModel::train` (count → smooth →
//! normalize), then the functions of `eval::harness`.

/// Crate-wide error type.
pub mod error;

/// Language models, counting tables and training configuration.
pub mod model;

/// Evaluation harness (edit distance, perplexity, WER).
pub mod eval;

/// Corpus and hypothesis list loading, path helpers.
pub mod io;

pub use error::LmError;
pub use eval::harness::{
	perplexity, word_error_rate, word_error_rate_lower_bound, word_error_rate_random_choice,
	word_error_rate_upper_bound,
};
pub use model::LanguageModel;
pub use model::config::ModelConfig;
pub use model::ngram_model::InterpolatedNGramModel;
pub use model::smoother::Smoother;
