use serde::{Deserialize, Serialize};

/// Divisor applied to acoustic scores before adding them to the language
/// model log probability.
pub const ACOUSTIC_SCALE: f64 = 16.0;

/// One candidate transcription with its externally supplied acoustic score.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Candidate {
	pub words: Vec<String>,
	/// Log-domain score from the recognizer.
	pub acoustic_score: f64,
}

impl Candidate {
	/// Creates a candidate from its tokens and raw acoustic score.
	pub fn new(words: Vec<String>, acoustic_score: f64) -> Self {
		Self { words, acoustic_score }
	}

	/// Acoustic score brought to the language model scale.
	pub fn scaled_acoustic_score(&self) -> f64 {
		self.acoustic_score / ACOUSTIC_SCALE
	}
}

/// N-best list for one utterance: the gold transcription and its candidates.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HypothesisList {
	pub gold: Vec<String>,
	pub candidates: Vec<Candidate>,
}

impl HypothesisList {
	/// Creates a list; candidates keep the recognizer's order.
	pub fn new(gold: Vec<String>, candidates: Vec<Candidate>) -> Self {
		Self { gold, candidates }
	}
}
