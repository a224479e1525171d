//! Evaluation of language models: perplexity and n-best rescoring WER.

/// Memoized token-level edit distance.
pub mod edit_distance;

/// N-best list entries read from the recognizer output.
pub mod hypothesis;

/// Perplexity, model-driven WER and oracle / random WER baselines.
pub mod harness;
