use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::LmError;
use crate::eval::hypothesis::HypothesisList;

/// Reads a corpus file, one sentence per line.
///
/// - Splits each line on whitespace
/// - Lowercases every token
/// - Skips blank lines
pub fn read_sentences<P: AsRef<Path>>(filename: P) -> Result<Vec<Vec<String>>, LmError> {
	let mut contents = String::new();
	File::open(filename)
		.and_then(|mut file| file.read_to_string(&mut contents))
		.map_err(|e| LmError::io("reading corpus", e))?;

	Ok(contents
		.lines()
		.map(|line| line.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>())
		.filter(|sentence| !sentence.is_empty())
		.collect())
}

/// Reads n-best lists from a JSON array of
/// `{"gold": [..], "candidates": [{"words": [..], "acoustic_score": ..}]}`.
pub fn read_hypothesis_lists<P: AsRef<Path>>(filename: P) -> Result<Vec<HypothesisList>, LmError> {
	let file = File::open(filename).map_err(|e| LmError::io("opening hypothesis lists", e))?;
	serde_json::from_reader(BufReader::new(file)).map_err(|e| LmError::json("parsing hypothesis lists", e))
}

/// Builds an output path next to an input path with a new extension.
///
/// Example:
/// `data/train.txt` + `"bigram.bin"` → `data/train.bigram.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> Result<PathBuf, LmError> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path.file_stem().ok_or_else(|| {
		LmError::io(
			"building output path",
			std::io::Error::new(std::io::ErrorKind::InvalidInput, "Input path has no filename"),
		)
	})?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}
