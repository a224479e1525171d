use serde::{Deserialize, Serialize};

use super::smoother::Smoother;
use crate::error::LmError;

/// Tolerance accepted on the sum of interpolation weights.
const LAMBDA_SUM_TOLERANCE: f64 = 1e-9;

/// Training parameters of an [`InterpolatedNGramModel`](super::ngram_model::InterpolatedNGramModel).
///
/// # Invariants (checked by `validate`)
/// - `order >= 1`
/// - for `order > 1`: `lambdas.len() == order - 1`, each weight in `[0, 1]`,
///   and their sum `<= 1`; the remainder goes to the unigram term
/// - for `order == 1`: `lambdas` is ignored
///
/// `lambdas[0]` weights the most specific (highest order) estimate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelConfig {
	pub order: usize,
	#[serde(default)]
	pub lambdas: Vec<f64>,
	#[serde(default)]
	pub smoother: Smoother,
}

impl ModelConfig {
	/// Creates and validates a configuration without smoothing.
	pub fn new(order: usize, lambdas: Vec<f64>) -> Result<Self, LmError> {
		let config = Self { order, lambdas, smoother: Smoother::Identity };
		config.validate()?;
		Ok(config)
	}

	/// Plain unigram model.
	pub fn unigram() -> Self {
		Self { order: 1, lambdas: Vec::new(), smoother: Smoother::Identity }
	}

	/// Replaces the smoother, validating its parameters.
	pub fn with_smoother(mut self, smoother: Smoother) -> Result<Self, LmError> {
		smoother.validate()?;
		self.smoother = smoother;
		Ok(self)
	}

	/// Parses and validates a configuration from JSON, e.g.
	/// `{"order": 3, "lambdas": [0.5, 0.3], "smoother": {"additive": {"increment": 1.0}}}`.
	pub fn from_json(json: &str) -> Result<Self, LmError> {
		let config: Self = serde_json::from_str(json).map_err(|e| LmError::json("parsing model config", e))?;
		config.validate()?;
		Ok(config)
	}

	/// Weight left to the unigram term, `1 - Σλ`.
	pub fn unigram_weight(&self) -> f64 {
		1.0 - self.active_lambdas().iter().sum::<f64>()
	}

	/// The interpolation weights actually used (empty for a unigram model).
	pub fn active_lambdas(&self) -> &[f64] {
		if self.order > 1 { &self.lambdas } else { &[] }
	}

	/// Checks every invariant listed on the type.
	///
	/// # Errors
	/// Returns a `Configuration` error describing the first violation.
	pub fn validate(&self) -> Result<(), LmError> {
		if self.order == 0 {
			return Err(LmError::configuration("order must be >= 1"));
		}
		self.smoother.validate()?;
		if self.order == 1 {
			return Ok(());
		}

		if self.lambdas.len() != self.order - 1 {
			return Err(LmError::configuration(format!(
				"an order {} model needs {} interpolation weights, got {}",
				self.order,
				self.order - 1,
				self.lambdas.len()
			)));
		}
		if let Some(lambda) = self.lambdas.iter().find(|l| !(0.0..=1.0).contains(*l)) {
			return Err(LmError::configuration(format!(
				"interpolation weights must be between 0.0 and 1.0, got {lambda}"
			)));
		}
		let sum: f64 = self.lambdas.iter().sum();
		if sum > 1.0 + LAMBDA_SUM_TOLERANCE {
			return Err(LmError::configuration(format!(
				"interpolation weights must sum to at most 1.0, got {sum}"
			)));
		}
		Ok(())
	}

	/// Named unigram to 5-gram configurations, each with and without
	/// Laplace smoothing, with hand-tuned interpolation weights.
	pub fn presets() -> Vec<(&'static str, ModelConfig)> {
		let plain = |order: usize, lambdas: &[f64]| ModelConfig {
			order,
			lambdas: lambdas.to_vec(),
			smoother: Smoother::Identity,
		};
		let laplace = |order: usize, lambdas: &[f64]| ModelConfig {
			order,
			lambdas: lambdas.to_vec(),
			smoother: Smoother::laplace(),
		};

		vec![
			("unigram", plain(1, &[])),
			("unigram-laplace", laplace(1, &[])),
			("bigram", plain(2, &[0.7])),
			("bigram-laplace", laplace(2, &[0.6])),
			("trigram", plain(3, &[0.5, 0.3])),
			("trigram-laplace", laplace(3, &[0.5, 0.3])),
			("quadgram", plain(4, &[0.28, 0.27, 0.17])),
			("quadgram-laplace", laplace(4, &[0.26, 0.26, 0.18])),
			("quintgram", plain(5, &[0.3, 0.2, 0.15, 0.1])),
			("quintgram-laplace", laplace(5, &[0.3, 0.2, 0.15, 0.1])),
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_valid_weights() {
		let config = ModelConfig::new(3, vec![0.5, 0.3]).unwrap();
		assert!((config.unigram_weight() - 0.2).abs() < 1e-12);
	}

	#[test]
	fn unigram_ignores_lambdas() {
		let config = ModelConfig::new(1, vec![0.9, 0.9]).unwrap();
		assert!(config.active_lambdas().is_empty());
		assert_eq!(config.unigram_weight(), 1.0);
	}

	#[test]
	fn rejects_wrong_length() {
		assert!(matches!(ModelConfig::new(3, vec![0.5]), Err(LmError::Configuration { .. })));
	}

	#[test]
	fn rejects_sum_above_one() {
		assert!(matches!(ModelConfig::new(3, vec![0.7, 0.4]), Err(LmError::Configuration { .. })));
	}

	#[test]
	fn rejects_out_of_range_weight() {
		assert!(ModelConfig::new(2, vec![-0.1]).is_err());
		assert!(ModelConfig::new(2, vec![f64::NAN]).is_err());
	}

	#[test]
	fn rejects_order_zero() {
		assert!(ModelConfig::new(0, vec![]).is_err());
	}

	#[test]
	fn parses_json() {
		let config = ModelConfig::from_json(
			r#"{"order": 2, "lambdas": [0.6], "smoother": {"additive": {"increment": 1.0}}}"#,
		)
		.unwrap();
		assert_eq!(config.order, 2);
		assert_eq!(config.smoother, Smoother::laplace());

		assert!(ModelConfig::from_json(r#"{"order": 2, "lambdas": [1.6]}"#).is_err());
	}

	#[test]
	fn presets_are_valid() {
		for (name, config) in ModelConfig::presets() {
			assert!(config.validate().is_ok(), "{name}");
		}
	}
}
