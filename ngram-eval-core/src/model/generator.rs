use rand::Rng;

use super::ngram_model::{InterpolatedNGramModel, Phase, STOP_SYMBOL, UNKNOWN_SYMBOL};
use crate::error::LmError;

/// Default cap on the number of words in a generated sentence.
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Samples words and sentences from the unigram distribution of a model.
///
/// Only order-1 models can be sampled: drawing from an interpolated
/// higher-order model is not supported and `new` refuses it.
///
/// The distribution is snapshotted in sorted symbol order, so a seeded
/// random source always produces the same output.
#[derive(Clone, Debug)]
pub struct Generator {
	/// `(symbol, probability)` sorted by symbol.
	distribution: Vec<(String, f64)>,
	/// Maximum number of words per generated sentence.
	pub max_length: usize,
}

impl Generator {
	/// Snapshots the unigram distribution of a ready order-1 model.
	///
	/// # Errors
	/// - `Unsupported` if the model order is greater than 1.
	/// - `NotReady` if the model is not trained yet.
	pub fn new(model: &InterpolatedNGramModel) -> Result<Self, LmError> {
		if model.order() > 1 {
			return Err(LmError::Unsupported {
				message: "sentence generation is only defined for unigram models",
			});
		}
		if model.phase() != Phase::Ready {
			return Err(LmError::NotReady { phase: model.phase() });
		}

		let mut distribution: Vec<(String, f64)> = model
			.unigram()
			.iter()
			.map(|(symbol, probability)| (symbol.to_owned(), probability))
			.collect();
		distribution.sort_by(|a, b| a.0.cmp(&b.0));

		Ok(Self { distribution, max_length: DEFAULT_MAX_LENGTH })
	}

	/// Draws one word with probability proportional to its unigram weight.
	///
	/// Falls back to the unknown placeholder if rounding leaves the
	/// sample beyond the cumulative sum.
	pub fn generate_word<R: Rng>(&self, rng: &mut R) -> &str {
		let sample: f64 = rng.random();
		let mut sum = 0.0;
		for (symbol, probability) in &self.distribution {
			sum += probability;
			if sum > sample {
				return symbol;
			}
		}
		UNKNOWN_SYMBOL
	}

	/// Draws words until the stop marker (not included) or `max_length` words.
	pub fn generate_sentence<R: Rng>(&self, rng: &mut R) -> Vec<String> {
		let mut sentence = Vec::new();
		while sentence.len() < self.max_length {
			let word = self.generate_word(rng);
			if word == STOP_SYMBOL {
				break;
			}
			sentence.push(word.to_owned());
		}
		sentence
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::config::ModelConfig;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn trained(config: ModelConfig) -> InterpolatedNGramModel {
		let corpus = vec![
			vec!["the".to_owned(), "cat".to_owned()],
			vec!["the".to_owned(), "dog".to_owned()],
		];
		InterpolatedNGramModel::train(config, &corpus).unwrap()
	}

	#[test]
	fn refuses_higher_order_models() {
		let model = trained(ModelConfig::new(2, vec![0.5]).unwrap());
		assert!(matches!(Generator::new(&model), Err(LmError::Unsupported { .. })));
	}

	#[test]
	fn refuses_untrained_models() {
		let model = InterpolatedNGramModel::new(ModelConfig::unigram()).unwrap();
		assert!(matches!(Generator::new(&model), Err(LmError::NotReady { .. })));
	}

	#[test]
	fn seeded_generation_is_reproducible() {
		let generator = Generator::new(&trained(ModelConfig::unigram())).unwrap();

		let first: Vec<Vec<String>> = {
			let mut rng = StdRng::seed_from_u64(7);
			(0..5).map(|_| generator.generate_sentence(&mut rng)).collect()
		};
		let second: Vec<Vec<String>> = {
			let mut rng = StdRng::seed_from_u64(7);
			(0..5).map(|_| generator.generate_sentence(&mut rng)).collect()
		};
		assert_eq!(first, second);
	}

	#[test]
	fn generated_words_come_from_the_vocabulary() {
		let mut generator = Generator::new(&trained(ModelConfig::unigram())).unwrap();
		generator.max_length = 10;
		let mut rng = StdRng::seed_from_u64(42);

		for _ in 0..20 {
			let sentence = generator.generate_sentence(&mut rng);
			assert!(sentence.len() <= 10);
			for word in sentence {
				assert!(["the", "cat", "dog", UNKNOWN_SYMBOL].contains(&word.as_str()));
			}
		}
	}
}
