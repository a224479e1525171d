use std::collections::HashSet;

use log::{debug, warn};
use rand::Rng;

use super::edit_distance::EditDistance;
use super::hypothesis::HypothesisList;
use crate::error::LmError;
use crate::model::LanguageModel;

/// Outcome of rescoring one n-best list with a language model.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
	/// Index of the first candidate reaching the best score.
	pub index: usize,
	/// `ln P(candidate) + acoustic / 16` of the selected candidates.
	pub score: f64,
	/// Number of candidates sharing the best score.
	pub ties: usize,
	/// Mean edit distance to the gold sentence over the tied candidates.
	pub distance: f64,
}

/// Perplexity of `model` on `corpus`: `2^(-Σ log2 P(s) / Σ |s|)`.
///
/// Stop markers are predicted but not counted as symbols. A sentence of
/// probability 0 makes the result `+∞`.
///
/// # Errors
/// - `EmptyEvaluation` if the corpus holds no tokens.
/// - Any error of the model (e.g. `NotReady`).
pub fn perplexity<M: LanguageModel + ?Sized>(model: &M, corpus: &[Vec<String>]) -> Result<f64, LmError> {
	let mut log_probability = 0.0;
	let mut symbols = 0usize;
	let mut zero_probability = 0usize;

	for sentence in corpus {
		let probability = model.sentence_probability(sentence)?;
		if probability == 0.0 {
			zero_probability += 1;
		}
		log_probability += probability.log2();
		symbols += sentence.len();
	}

	if symbols == 0 {
		return Err(LmError::EmptyEvaluation { message: "corpus contains no tokens" });
	}
	if zero_probability > 0 {
		warn!("{} sentences have probability 0, perplexity is infinite", zero_probability);
	}

	Ok((-log_probability / symbols as f64).exp2())
}

/// Picks the candidate(s) with the highest combined score.
///
/// Candidates tying exactly on the best score have their edit distances
/// averaged instead of one being picked arbitrarily.
///
/// # Errors
/// `EmptyEvaluation` if the list has no candidates.
pub fn rescore<M: LanguageModel + ?Sized>(
	model: &M,
	list: &HypothesisList,
	edit_distance: &EditDistance,
) -> Result<Selection, LmError> {
	let mut best: Option<Selection> = None;
	let mut distance_sum = 0.0;

	for (index, candidate) in list.candidates.iter().enumerate() {
		let score = model.sentence_probability(&candidate.words)?.ln() + candidate.scaled_acoustic_score();
		let distance = edit_distance.distance(&list.gold, &candidate.words);

		match best.as_mut() {
			Some(selection) if score == selection.score => {
				selection.ties += 1;
				distance_sum += distance;
				continue;
			}
			Some(selection) if score <= selection.score || score.is_nan() => continue,
			_ => (),
		}
		best = Some(Selection { index, score, ties: 1, distance });
		distance_sum = distance;
	}

	let mut selection = best.ok_or(LmError::EmptyEvaluation { message: "hypothesis list has no candidates" })?;
	selection.distance = distance_sum / selection.ties as f64;
	Ok(selection)
}

/// Word error rate obtained by letting `model` rescore every n-best list.
///
/// Each selected guess and its gold sentence are logged at `debug` level.
pub fn word_error_rate<M: LanguageModel + ?Sized>(model: &M, lists: &[HypothesisList]) -> Result<f64, LmError> {
	let edit_distance = EditDistance::new();
	let mut total_distance = 0.0;
	let mut total_words = 0usize;

	for list in lists {
		let selection = rescore(model, list, &edit_distance)?;
		debug!(
			"GUESS: {:?} (score {:.3e}, {} tied)\tGOLD: {:?}",
			list.candidates[selection.index].words,
			selection.score,
			selection.ties,
			list.gold
		);
		total_distance += selection.distance;
		total_words += list.gold.len();
	}

	error_rate(total_distance, total_words)
}

/// Oracle word error rate: the closest candidate of every list.
pub fn word_error_rate_lower_bound(lists: &[HypothesisList]) -> Result<f64, LmError> {
	aggregate(lists, |distances| distances.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Worst-case word error rate: the farthest candidate of every list.
pub fn word_error_rate_upper_bound(lists: &[HypothesisList]) -> Result<f64, LmError> {
	aggregate(lists, |distances| distances.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Expected word error rate of picking a candidate uniformly at random.
pub fn word_error_rate_random_choice(lists: &[HypothesisList]) -> Result<f64, LmError> {
	aggregate(lists, |distances| distances.iter().sum::<f64>() / distances.len() as f64)
}

/// Word error rate of one uniformly random pick per list, drawn from `rng`.
pub fn word_error_rate_sampled<R: Rng>(lists: &[HypothesisList], rng: &mut R) -> Result<f64, LmError> {
	aggregate(lists, |distances| distances[rng.random_range(0..distances.len())])
}

/// Gold sentences of every list, e.g. to measure their perplexity.
pub fn gold_sentences(lists: &[HypothesisList]) -> Vec<Vec<String>> {
	lists.iter().map(|list| list.gold.clone()).collect()
}

/// Every distinct token of a corpus.
pub fn extract_vocabulary(corpus: &[Vec<String>]) -> HashSet<String> {
	corpus.iter().flatten().cloned().collect()
}

/// Applies `choose` to the candidate distances of every list and divides
/// the summed choices by the number of gold tokens.
fn aggregate<F>(lists: &[HypothesisList], mut choose: F) -> Result<f64, LmError>
where
	F: FnMut(&[f64]) -> f64,
{
	let edit_distance = EditDistance::new();
	let mut total_distance = 0.0;
	let mut total_words = 0usize;

	for list in lists {
		if list.candidates.is_empty() {
			return Err(LmError::EmptyEvaluation { message: "hypothesis list has no candidates" });
		}
		let distances: Vec<f64> = list
			.candidates
			.iter()
			.map(|candidate| edit_distance.distance(&list.gold, &candidate.words))
			.collect();
		total_distance += choose(distances.as_slice());
		total_words += list.gold.len();
	}

	error_rate(total_distance, total_words)
}

fn error_rate(total_distance: f64, total_words: usize) -> Result<f64, LmError> {
	if total_words == 0 {
		return Err(LmError::EmptyEvaluation { message: "gold sentences contain no tokens" });
	}
	Ok(total_distance / total_words as f64)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::eval::hypothesis::Candidate;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	/// Assigns a fixed probability to every sentence.
	struct Constant(f64);

	impl LanguageModel for Constant {
		fn sentence_probability(&self, _sentence: &[String]) -> Result<f64, LmError> {
			Ok(self.0)
		}
	}

	/// Prefers shorter sentences.
	struct Shortest;

	impl LanguageModel for Shortest {
		fn sentence_probability(&self, sentence: &[String]) -> Result<f64, LmError> {
			Ok(0.5f64.powi(sentence.len() as i32 + 1))
		}
	}

	fn words(s: &str) -> Vec<String> {
		s.split_whitespace().map(str::to_owned).collect()
	}

	fn list(gold: &str, candidates: &[(&str, f64)]) -> HypothesisList {
		HypothesisList::new(
			words(gold),
			candidates.iter().map(|(w, score)| Candidate::new(words(w), *score)).collect(),
		)
	}

	#[test]
	fn exact_candidate_has_zero_error() {
		let lists = vec![list("the cat sat", &[("the cat sat", -10.0)])];
		assert_eq!(word_error_rate(&Constant(0.1), &lists).unwrap(), 0.0);
	}

	#[test]
	fn ties_average_their_distances() {
		// Equal LM and acoustic scores: distances 0 and 2 average to 1
		let lists = vec![list("a b", &[("a b", 0.0), ("x y", 0.0)])];
		let selection = rescore(&Constant(0.5), &lists[0], &EditDistance::new()).unwrap();
		assert_eq!(selection.ties, 2);
		assert_eq!(selection.distance, 1.0);
		assert_eq!(word_error_rate(&Constant(0.5), &lists).unwrap(), 0.5);
	}

	#[test]
	fn acoustic_score_breaks_language_model_ties() {
		let lists = vec![list("a b", &[("x y", 0.0), ("a b", 16.0)])];
		let selection = rescore(&Constant(0.5), &lists[0], &EditDistance::new()).unwrap();
		assert_eq!(selection.index, 1);
		assert_eq!(selection.ties, 1);
		assert!((selection.score - (0.5f64.ln() + 1.0)).abs() < 1e-12);
	}

	#[test]
	fn language_model_score_drives_selection() {
		let lists = vec![list("a b c", &[("a b c d e", 0.0), ("a b", 0.0)])];
		// Shortest picks "a b", one deletion away
		assert!((word_error_rate(&Shortest, &lists).unwrap() - 1.0 / 3.0).abs() < 1e-12);
	}

	#[test]
	fn zero_probability_candidates_still_select_one() {
		let lists = vec![list("a", &[("b", 0.0), ("a", 0.0)])];
		// Both scores are -inf and tie
		assert_eq!(word_error_rate(&Constant(0.0), &lists).unwrap(), 0.5);
	}

	#[test]
	fn baselines_bracket_the_model() {
		let lists = vec![
			list("a b c", &[("a b c", -3.0), ("a x c", -1.0), ("x y z w", -2.0)]),
			list("d e", &[("d", -1.0), ("d e f g", -1.5)]),
		];
		let lower = word_error_rate_lower_bound(&lists).unwrap();
		let upper = word_error_rate_upper_bound(&lists).unwrap();
		let average = word_error_rate_random_choice(&lists).unwrap();

		assert!((lower - 1.0 / 5.0).abs() < 1e-12);
		assert!((upper - 6.0 / 5.0).abs() < 1e-12);
		assert!((average - (5.0 / 3.0 + 1.5) / 5.0).abs() < 1e-12);
		let models: [&dyn LanguageModel; 2] = [&Constant(0.2), &Shortest];
		for model in models {
			let wer = word_error_rate(model, &lists).unwrap();
			assert!(lower <= wer && wer <= upper);
		}
	}

	#[test]
	fn sampled_baseline_is_seeded() {
		let lists = vec![list("a b", &[("a b", 0.0), ("x", 0.0), ("a", 0.0)])];
		let first = word_error_rate_sampled(&lists, &mut StdRng::seed_from_u64(3)).unwrap();
		let second = word_error_rate_sampled(&lists, &mut StdRng::seed_from_u64(3)).unwrap();
		assert_eq!(first, second);
		assert!(first >= word_error_rate_lower_bound(&lists).unwrap());
		assert!(first <= word_error_rate_upper_bound(&lists).unwrap());
	}

	#[test]
	fn empty_inputs_are_reported() {
		assert!(matches!(word_error_rate_lower_bound(&[]), Err(LmError::EmptyEvaluation { .. })));
		let no_candidates = vec![list("a", &[])];
		assert!(matches!(word_error_rate(&Constant(0.5), &no_candidates), Err(LmError::EmptyEvaluation { .. })));
		assert!(matches!(perplexity(&Constant(0.5), &[]), Err(LmError::EmptyEvaluation { .. })));
	}

	#[test]
	fn perplexity_of_uniform_model() {
		// Each sentence of 2 tokens has probability 1/8: log2 sum = -6 over 4 symbols
		let corpus = vec![words("a b"), words("c d")];
		let perplexity = perplexity(&Constant(0.125), &corpus).unwrap();
		assert!((perplexity - 2f64.powf(1.5)).abs() < 1e-12);
	}

	#[test]
	fn zero_probability_gives_infinite_perplexity() {
		let corpus = vec![words("a b")];
		assert_eq!(perplexity(&Constant(0.0), &corpus).unwrap(), f64::INFINITY);
	}

	#[test]
	fn vocabulary_and_gold_helpers() {
		let lists = vec![list("a b", &[("a", 0.0)]), list("b c", &[("c", 0.0)])];
		let gold = gold_sentences(&lists);
		assert_eq!(gold, vec![words("a b"), words("b c")]);
		let vocabulary = extract_vocabulary(&gold);
		assert_eq!(vocabulary.len(), 3);
		assert!(vocabulary.contains("c"));
	}
}
