use std::path::PathBuf;

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use ngram_eval_core::eval::harness::{gold_sentences, word_error_rate_sampled};
use ngram_eval_core::io::{build_output_path, read_hypothesis_lists, read_sentences};
use ngram_eval_core::model::generator::Generator;
use ngram_eval_core::{
	InterpolatedNGramModel, ModelConfig, perplexity, word_error_rate, word_error_rate_lower_bound,
	word_error_rate_random_choice, word_error_rate_upper_bound,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	// RUST_LOG=debug also prints every rescoring decision
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	// Data folder: train.txt and test.txt (one sentence per line), nbest.json
	let data = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "./data".to_owned()));
	let train_path = data.join("train.txt");
	let test_sentences = read_sentences(data.join("test.txt"))?;
	let nbest_lists = read_hypothesis_lists(data.join("nbest.json"))?;
	let nbest_gold = gold_sentences(&nbest_lists);

	// Baselines do not depend on any model
	info!("WER baselines:");
	info!("  best path:  {}", word_error_rate_lower_bound(&nbest_lists)?);
	info!("  worst path: {}", word_error_rate_upper_bound(&nbest_lists)?);
	info!("  avg path:   {}", word_error_rate_random_choice(&nbest_lists)?);

	// Seeded so two runs report the same sampled baseline
	let mut rng = StdRng::seed_from_u64(16);
	info!("  one random path: {}", word_error_rate_sampled(&nbest_lists, &mut rng)?);

	for (name, config) in ModelConfig::presets() {
		// Each configuration gets its own binary cache next to the corpus,
		// e.g. data/train.trigram-laplace.bin
		let cache_path = build_output_path(&train_path, &format!("{name}.bin"))?;
		let model = InterpolatedNGramModel::load_or_train(&train_path, &cache_path, config)?;

		info!("{name}:");
		info!("  test perplexity:  {}", perplexity(&model, &test_sentences)?);
		info!("  n-best perplexity: {}", perplexity(&model, &nbest_gold)?);
		info!("  word error rate:  {}", word_error_rate(&model, &nbest_lists)?);

		// Sampling is only defined for unigram models
		if let Ok(generator) = Generator::new(&model) {
			info!("  generated: {}", generator.generate_sentence(&mut rng).join(" "));
		}
	}

	Ok(())
}
