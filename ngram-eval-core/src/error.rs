//! Error type shared by every module of the crate.

use thiserror::Error;

use crate::model::ngram_model::Phase;

/// Errors produced by training, querying, evaluating and persisting models.
#[derive(Debug, Error)]
pub enum LmError {
	/// A table was normalized while its total weight was zero (or not finite).
	#[error("cannot normalize a distribution with total weight {total}")]
	DegenerateDistribution { total: f64 },

	/// A table was normalized a second time.
	#[error("distribution is already normalized")]
	AlreadyNormalized,

	/// Interpolation weights, order or smoother parameters are invalid.
	#[error("invalid model configuration: {message}")]
	Configuration { message: String },

	/// A probability was requested before training finished.
	#[error("model is not ready for queries (phase: {phase})")]
	NotReady { phase: Phase },

	/// Counts were added after smoothing already happened.
	#[error("model can no longer accumulate counts (phase: {phase})")]
	Frozen { phase: Phase },

	/// The operation is not defined for this model (e.g. sampling order > 1).
	#[error("unsupported operation: {message}")]
	Unsupported { message: &'static str },

	/// An evaluation had nothing to aggregate over.
	#[error("nothing to evaluate: {message}")]
	EmptyEvaluation { message: &'static str },

	/// A parallel training worker did not report its partial counts.
	#[error("training worker failed: {message}")]
	Worker { message: String },

	/// Reading or writing a corpus, n-best file or model cache failed.
	#[error("I/O error while {context}: {source}")]
	Io {
		context: &'static str,
		#[source]
		source: std::io::Error,
	},

	/// A model cache could not be encoded or decoded.
	#[error("model encoding error while {context}: {source}")]
	Encoding {
		context: &'static str,
		#[source]
		source: postcard::Error,
	},

	/// A configuration or n-best file is not valid JSON for its type.
	#[error("JSON parse error while {context}: {source}")]
	Json {
		context: &'static str,
		#[source]
		source: serde_json::Error,
	},
}

impl LmError {
	pub(crate) fn configuration(message: impl Into<String>) -> Self {
		Self::Configuration { message: message.into() }
	}

	pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
		Self::Io { context, source }
	}

	pub(crate) fn encoding(context: &'static str, source: postcard::Error) -> Self {
		Self::Encoding { context, source }
	}

	pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
		Self::Json { context, source }
	}
}
