use std::fmt;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::LanguageModel;
use super::conditional_table::ConditionalFrequencyTable;
use super::config::ModelConfig;
use super::frequency_table::FrequencyTable;
use crate::error::LmError;
use crate::io::read_sentences;

/// Marker padding the beginning of every sentence.
pub const START_SYMBOL: &str = "<S>";
/// Marker closing every sentence; predicted like any other token.
pub const STOP_SYMBOL: &str = "</S>";
/// Placeholder whose probability is used for out-of-vocabulary words.
pub const UNKNOWN_SYMBOL: &str = "*UNKNOWN*";

/// Number of training chunks per CPU for `train_parallel`.
const CHUNKS_PER_CPU: usize = 8;

/// Lifecycle of a model. Transitions only move forward.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// No sentence seen yet.
	Empty,
	/// Raw counts are being added.
	Accumulating,
	/// Unknown placeholder added and smoother applied.
	Smoothed,
	/// Every table normalized; the model answers queries.
	Ready,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Phase::Empty => "empty",
			Phase::Accumulating => "accumulating",
			Phase::Smoothed => "smoothed",
			Phase::Ready => "ready",
		};
		f.write_str(name)
	}
}

/// Word-level n-gram language model blending every order from `k` down to 1.
///
/// The model stores a unigram table and one conditional table per context
/// length `k-1 .. 1`. A probability is the weighted sum
/// `Σ λ_o · P_o(word | last o tokens) + (1 - Σλ) · P_unigram(word)`,
/// where the unigram term falls back to the unknown placeholder for
/// out-of-vocabulary words.
///
/// # Responsibilities
/// - Count n-grams from tokenized sentences (sequentially or in parallel)
/// - Smooth and normalize every table exactly once
/// - Answer word and sentence probability queries
/// - Persist itself as a compact binary cache
///
/// # Invariants
/// - `conditionals.len() == order - 1`; `conditionals[i]` is keyed by
///   contexts of length `order - 1 - i` and weighted by `lambdas[i]`
/// - Queries are only answered in `Phase::Ready`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InterpolatedNGramModel {
	config: ModelConfig,
	phase: Phase,
	unigram: FrequencyTable,
	conditionals: Vec<ConditionalFrequencyTable>,
}

impl InterpolatedNGramModel {
	/// Creates an empty model.
	///
	/// # Errors
	/// Returns a `Configuration` error if `config` is invalid.
	pub fn new(config: ModelConfig) -> Result<Self, LmError> {
		config.validate()?;
		let conditionals = vec![ConditionalFrequencyTable::new(); config.order - 1];
		Ok(Self { config, phase: Phase::Empty, unigram: FrequencyTable::new(), conditionals })
	}

	/// Builds a ready model from a corpus on the calling thread.
	pub fn train(config: ModelConfig, corpus: &[Vec<String>]) -> Result<Self, LmError> {
		let mut model = Self::count(config, corpus)?;
		model.finish()?;
		info!(
			"trained order {} model on {} sentences ({} unigram types)",
			model.order(),
			corpus.len(),
			model.unigram.len()
		);
		Ok(model)
	}

	/// Builds a ready model by counting corpus chunks on worker threads.
	///
	/// # Behavior
	/// - Splits the corpus into `cpus * 8` chunks.
	/// - Spawns one thread per chunk, each building a partial model.
	/// - Merges all partial counts, then smooths and normalizes once.
	///
	/// The result equals `train` up to floating point summation order.
	///
	/// # Errors
	/// Returns `Worker` if a thread terminated without reporting its counts.
	pub fn train_parallel(config: ModelConfig, corpus: &[Vec<String>]) -> Result<Self, LmError> {
		config.validate()?;
		if corpus.is_empty() {
			return Self::train(config, corpus);
		}

		let chunks = num_cpus::get() * CHUNKS_PER_CPU;
		let chunk_size = corpus.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut workers = 0;
		for chunk in corpus.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<Vec<String>> = chunk.to_vec();
			let config = config.clone();

			thread::spawn(move || {
				// The receiver lives until every worker reported
				let _ = tx.send(Self::count(config, &chunk));
			});
			workers += 1;
		}
		drop(tx);

		let mut model = Self::new(config)?;
		let mut received = 0;
		for partial_model in rx.iter() {
			model.merge(&partial_model?)?;
			received += 1;
		}
		if received != workers {
			return Err(LmError::Worker {
				message: format!("{} of {} workers reported counts", received, workers),
			});
		}

		model.finish()?;
		info!(
			"trained order {} model on {} sentences with {} workers ({} unigram types)",
			model.order(),
			corpus.len(),
			workers,
			model.unigram.len()
		);
		Ok(model)
	}

	/// Loads a model from `cache_path` if it was built with `config`,
	/// otherwise trains it from the corpus file and writes the cache.
	///
	/// # Parameters
	/// - `corpus_path`: one sentence per line, see [`read_sentences`].
	/// - `cache_path`: binary model written with `save`.
	/// - `config`: expected configuration; a cache built differently is ignored.
	pub fn load_or_train<PC, PB>(corpus_path: PC, cache_path: PB, config: ModelConfig) -> Result<Self, LmError>
	where
		PC: AsRef<Path>,
		PB: AsRef<Path>,
	{
		let cache_path = cache_path.as_ref();
		if cache_path.exists() {
			match Self::load(cache_path) {
				Ok(model) if model.config == config && model.phase == Phase::Ready => {
					info!("loaded cached model from {}", cache_path.display());
					return Ok(model);
				}
				Ok(_) => warn!(
					"cached model {} does not match the requested configuration, retraining",
					cache_path.display()
				),
				Err(e) => warn!("cached model {} is unreadable ({}), retraining", cache_path.display(), e),
			}
		}

		let corpus = read_sentences(corpus_path)?;
		let model = Self::train_parallel(config, &corpus)?;
		model.save(cache_path)?;
		Ok(model)
	}

	/// Serializes the model with `postcard`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LmError> {
		let bytes = postcard::to_stdvec(self).map_err(|e| LmError::encoding("serializing model", e))?;
		std::fs::write(path, bytes).map_err(|e| LmError::io("writing model cache", e))
	}

	/// Deserializes a model written by `save`.
	///
	/// # Errors
	/// - `Io` / `Encoding` if the file cannot be read or decoded.
	/// - `Configuration` if the stored configuration is invalid or the number
	///   of conditional tables does not match its order.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LmError> {
		let bytes = std::fs::read(path).map_err(|e| LmError::io("reading model cache", e))?;
		let model: Self = postcard::from_bytes(&bytes).map_err(|e| LmError::encoding("deserializing model", e))?;
		model.config.validate()?;
		if model.conditionals.len() != model.order() - 1 {
			return Err(LmError::configuration(format!(
				"order {} model holds {} conditional tables",
				model.order(),
				model.conditionals.len()
			)));
		}
		Ok(model)
	}

	fn count(config: ModelConfig, corpus: &[Vec<String>]) -> Result<Self, LmError> {
		let mut model = Self::new(config)?;
		for sentence in corpus {
			model.add_sentence(sentence)?;
		}
		Ok(model)
	}

	/// Highest n-gram order `k` of the model.
	pub fn order(&self) -> usize {
		self.config.order
	}

	/// Current lifecycle phase.
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Configuration the model was built with.
	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// The unigram table (counts before `Ready`, probabilities after).
	pub fn unigram(&self) -> &FrequencyTable {
		&self.unigram
	}

	/// The conditional table whose contexts hold `context_length` tokens,
	/// for `1 <= context_length < order`.
	pub fn conditional(&self, context_length: usize) -> Option<&ConditionalFrequencyTable> {
		if context_length == 0 || context_length >= self.order() {
			return None;
		}
		self.conditionals.get(self.order() - 1 - context_length)
	}

	/// Every symbol known to the unigram table, markers included.
	pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
		self.unigram.iter().map(|(symbol, _)| symbol)
	}

	/// Counts the n-grams of one sentence.
	///
	/// # Behavior
	/// - Pads with `order - 1` start markers and one stop marker.
	/// - For every real token and the stop marker, increments the unigram
	///   table and every conditional table (keyed by the trailing tokens of
	///   the context window).
	///
	/// # Errors
	/// Returns `Frozen` once the model has been smoothed.
	pub fn add_sentence(&mut self, sentence: &[String]) -> Result<(), LmError> {
		match self.phase {
			Phase::Empty | Phase::Accumulating => (),
			phase => return Err(LmError::Frozen { phase }),
		}

		let mut context = self.start_context();
		for word in padded(sentence) {
			self.unigram.increment(word, 1.0)?;
			for (index, table) in self.conditionals.iter_mut().enumerate() {
				table.increment(&context[index..], word, 1.0)?;
			}
			slide(&mut context, word);
		}

		self.phase = Phase::Accumulating;
		Ok(())
	}

	/// Sums the counts of another model still accumulating.
	///
	/// # Errors
	/// - `Configuration` if the configurations differ.
	/// - `Frozen` if either model was already smoothed.
	pub fn merge(&mut self, other: &Self) -> Result<(), LmError> {
		if self.config != other.config {
			return Err(LmError::configuration("cannot merge models with different configurations"));
		}
		for phase in [self.phase, other.phase] {
			if matches!(phase, Phase::Smoothed | Phase::Ready) {
				return Err(LmError::Frozen { phase });
			}
		}

		self.unigram.merge(&other.unigram)?;
		for (table, other_table) in self.conditionals.iter_mut().zip(&other.conditionals) {
			table.merge(other_table)?;
		}
		if other.phase == Phase::Accumulating {
			self.phase = Phase::Accumulating;
		}
		Ok(())
	}

	/// Adds the unknown placeholder and applies the configured smoother.
	///
	/// # Errors
	/// Returns `Frozen` if the model was already smoothed.
	pub fn smooth(&mut self) -> Result<(), LmError> {
		match self.phase {
			Phase::Empty | Phase::Accumulating => (),
			phase => return Err(LmError::Frozen { phase }),
		}

		self.unigram.increment(UNKNOWN_SYMBOL, 1.0)?;
		let smoother = self.config.smoother;
		smoother.smooth_table(&mut self.unigram)?;
		for table in &mut self.conditionals {
			smoother.smooth_conditional_table(table)?;
		}

		self.phase = Phase::Smoothed;
		debug!("smoothed order {} model with {:?}", self.order(), smoother);
		Ok(())
	}

	/// Normalizes the unigram table, then every conditional table.
	///
	/// # Errors
	/// - `NotReady` if the model has not been smoothed yet.
	/// - `AlreadyNormalized` on a ready model.
	pub fn normalize(&mut self) -> Result<(), LmError> {
		match self.phase {
			Phase::Smoothed => (),
			Phase::Ready => return Err(LmError::AlreadyNormalized),
			phase => return Err(LmError::NotReady { phase }),
		}

		self.unigram.normalize()?;
		for table in &mut self.conditionals {
			table.normalize()?;
		}

		self.phase = Phase::Ready;
		debug!("normalized order {} model", self.order());
		Ok(())
	}

	/// Smooths then normalizes: the end of training.
	pub fn finish(&mut self) -> Result<(), LmError> {
		self.smooth()?;
		self.normalize()
	}

	/// Interpolated probability of `word` after `context`.
	///
	/// Only the last `order - 1` tokens of `context` are used; a shorter
	/// context is padded on the left with start markers.
	///
	/// # Errors
	/// Returns `NotReady` unless training is finished.
	pub fn word_probability(&self, context: &[String], word: &str) -> Result<f64, LmError> {
		self.ensure_ready()?;

		let history = self.order() - 1;
		let window: Vec<String> = if context.len() >= history {
			context[context.len() - history..].to_vec()
		} else {
			let mut window = vec![START_SYMBOL.to_owned(); history - context.len()];
			window.extend_from_slice(context);
			window
		};
		Ok(self.interpolate(&window, word))
	}

	/// Probability of a whole sentence, stop marker included.
	///
	/// Per-token probabilities are multiplied directly; long sentences may
	/// underflow to 0.
	///
	/// # Errors
	/// Returns `NotReady` unless training is finished.
	pub fn sentence_probability(&self, sentence: &[String]) -> Result<f64, LmError> {
		self.ensure_ready()?;

		let mut probability = 1.0;
		let mut context = self.start_context();
		for word in padded(sentence) {
			probability *= self.interpolate(&context, word);
			slide(&mut context, word);
		}
		Ok(probability)
	}

	/// `context` holds exactly `order - 1` tokens.
	fn interpolate(&self, context: &[String], word: &str) -> f64 {
		let mut probability = 0.0;
		for (index, (table, lambda)) in self.conditionals.iter().zip(self.config.active_lambdas()).enumerate() {
			probability += lambda * table.get(&context[index..], word);
		}

		let mut unigram = self.unigram.get(word);
		if unigram == 0.0 {
			unigram = self.unigram.get(UNKNOWN_SYMBOL);
		}
		probability + self.config.unigram_weight() * unigram
	}

	fn ensure_ready(&self) -> Result<(), LmError> {
		if self.phase != Phase::Ready {
			return Err(LmError::NotReady { phase: self.phase });
		}
		Ok(())
	}

	fn start_context(&self) -> Vec<String> {
		vec![START_SYMBOL.to_owned(); self.order() - 1]
	}
}

impl LanguageModel for InterpolatedNGramModel {
	fn sentence_probability(&self, sentence: &[String]) -> Result<f64, LmError> {
		InterpolatedNGramModel::sentence_probability(self, sentence)
	}
}

/// The sentence tokens followed by the stop marker.
fn padded(sentence: &[String]) -> impl Iterator<Item = &str> {
	sentence.iter().map(String::as_str).chain(std::iter::once(STOP_SYMBOL))
}

/// Shifts the context window left by one and appends `word`.
fn slide(context: &mut Vec<String>, word: &str) {
	if context.is_empty() {
		return;
	}
	context.remove(0);
	context.push(word.to_owned());
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::smoother::Smoother;

	fn sentence(words: &str) -> Vec<String> {
		words.split_whitespace().map(str::to_owned).collect()
	}

	fn corpus() -> Vec<Vec<String>> {
		vec![sentence("the cat"), sentence("the dog")]
	}

	#[test]
	fn unigram_sentence_probability_uses_unknown_increment() {
		let model = InterpolatedNGramModel::train(ModelConfig::unigram(), &corpus()).unwrap();

		// the:2 cat:1 dog:1 </S>:2 *UNKNOWN*:1, total 7
		let expected = (2.0 / 7.0) * (1.0 / 7.0) * (2.0 / 7.0);
		let probability = model.sentence_probability(&sentence("the cat")).unwrap();
		assert!((probability - expected).abs() < 1e-12);
	}

	#[test]
	fn unknown_words_fall_back_to_placeholder() {
		let model = InterpolatedNGramModel::train(ModelConfig::unigram(), &corpus()).unwrap();
		let probability = model.word_probability(&[], "zebra").unwrap();
		assert!((probability - 1.0 / 7.0).abs() < 1e-12);
	}

	#[test]
	fn start_markers_are_not_counted_as_outcomes() {
		let model = InterpolatedNGramModel::train(ModelConfig::new(3, vec![0.5, 0.3]).unwrap(), &corpus()).unwrap();
		assert_eq!(model.unigram().get(START_SYMBOL), 0.0);

		let bigram = model.conditional(1).unwrap();
		let start = vec![START_SYMBOL.to_owned()];
		assert!((bigram.get(&start, "the") - 1.0).abs() < 1e-12);

		let trigram = model.conditional(2).unwrap();
		let the_start = vec![START_SYMBOL.to_owned(), "the".to_owned()];
		assert!((trigram.get(&the_start, "cat") - 0.5).abs() < 1e-12);
		assert!(model.conditional(3).is_none());
		assert!(model.conditional(0).is_none());
	}

	#[test]
	fn bigram_interpolates_with_unigram() {
		let model = InterpolatedNGramModel::train(ModelConfig::new(2, vec![0.7]).unwrap(), &corpus()).unwrap();

		// P(cat | the) = 0.5, P_uni(cat) = 1/7
		let context = vec!["the".to_owned()];
		let probability = model.word_probability(&context, "cat").unwrap();
		assert!((probability - (0.7 * 0.5 + 0.3 / 7.0)).abs() < 1e-12);
	}

	#[test]
	fn laplace_smoothing_changes_counts_before_normalization() {
		let config = ModelConfig::unigram().with_smoother(Smoother::laplace()).unwrap();
		let model = InterpolatedNGramModel::train(config, &corpus()).unwrap();

		// the:3 cat:2 dog:2 </S>:3 *UNKNOWN*:2, total 12
		assert!((model.unigram().get("the") - 3.0 / 12.0).abs() < 1e-12);
		assert!((model.unigram().get(UNKNOWN_SYMBOL) - 2.0 / 12.0).abs() < 1e-12);
	}

	#[test]
	fn queries_fail_before_ready() {
		let mut model = InterpolatedNGramModel::new(ModelConfig::unigram()).unwrap();
		model.add_sentence(&sentence("the cat")).unwrap();
		assert!(matches!(
			model.sentence_probability(&sentence("the")),
			Err(LmError::NotReady { phase: Phase::Accumulating })
		));

		model.smooth().unwrap();
		assert!(matches!(model.word_probability(&[], "the"), Err(LmError::NotReady { phase: Phase::Smoothed })));

		model.normalize().unwrap();
		assert!(model.sentence_probability(&sentence("the")).is_ok());
	}

	#[test]
	fn transitions_are_one_directional() {
		let mut model = InterpolatedNGramModel::new(ModelConfig::unigram()).unwrap();
		assert!(matches!(model.normalize(), Err(LmError::NotReady { phase: Phase::Empty })));

		model.add_sentence(&sentence("a")).unwrap();
		model.finish().unwrap();
		assert!(matches!(model.add_sentence(&sentence("b")), Err(LmError::Frozen { .. })));
		assert!(matches!(model.smooth(), Err(LmError::Frozen { .. })));
		assert!(matches!(model.normalize(), Err(LmError::AlreadyNormalized)));
	}

	#[test]
	fn empty_corpus_still_trains_thanks_to_unknown() {
		let model = InterpolatedNGramModel::train(ModelConfig::new(2, vec![0.5]).unwrap(), &[]).unwrap();
		assert_eq!(model.unigram().get(UNKNOWN_SYMBOL), 1.0);
		assert!((model.sentence_probability(&[]).unwrap() - 0.5).abs() < 1e-12);
	}

	#[test]
	fn load_rejects_mismatched_table_count() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.bin");
		let mut model = InterpolatedNGramModel::train(ModelConfig::new(3, vec![0.5, 0.3]).unwrap(), &corpus()).unwrap();
		model.conditionals.pop();
		model.save(&path).unwrap();

		assert!(matches!(InterpolatedNGramModel::load(&path), Err(LmError::Configuration { .. })));
	}

	#[test]
	fn corrupt_cache_is_retrained() {
		let dir = tempfile::tempdir().unwrap();
		let corpus_path = dir.path().join("train.txt");
		let cache_path = dir.path().join("train.unigram.bin");
		std::fs::write(&corpus_path, "the cat\nthe dog\n").unwrap();
		std::fs::write(&cache_path, [0xff, 0x00, 0x13]).unwrap();

		let model = InterpolatedNGramModel::load_or_train(&corpus_path, &cache_path, ModelConfig::unigram()).unwrap();
		assert_eq!(model.phase(), Phase::Ready);
		assert!(InterpolatedNGramModel::load(&cache_path).is_ok());
	}

	#[test]
	fn merge_requires_same_configuration() {
		let mut left = InterpolatedNGramModel::new(ModelConfig::unigram()).unwrap();
		let right = InterpolatedNGramModel::new(ModelConfig::new(2, vec![0.5]).unwrap()).unwrap();
		assert!(matches!(left.merge(&right), Err(LmError::Configuration { .. })));
	}

	#[test]
	fn merged_counts_match_sequential_counts() {
		let config = ModelConfig::new(2, vec![0.6]).unwrap();
		let mut left = InterpolatedNGramModel::new(config.clone()).unwrap();
		left.add_sentence(&sentence("the cat")).unwrap();
		let mut right = InterpolatedNGramModel::new(config.clone()).unwrap();
		right.add_sentence(&sentence("the dog")).unwrap();

		left.merge(&right).unwrap();
		left.finish().unwrap();
		let sequential = InterpolatedNGramModel::train(config, &corpus()).unwrap();

		let query = sentence("the dog");
		let merged = left.sentence_probability(&query).unwrap();
		let expected = sequential.sentence_probability(&query).unwrap();
		assert!((merged - expected).abs() < 1e-12);
	}
}
