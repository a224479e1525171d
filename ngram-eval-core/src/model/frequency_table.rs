use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LmError;

/// Accumulating weights over symbols, turned into a probability
/// distribution by a single call to [`FrequencyTable::normalize`].
///
/// ## Responsibilities:
/// - Accumulate occurrence counts during learning
/// - Merge with another table counted on a different corpus slice
/// - Normalize in place into probabilities
///
/// ## Invariants
/// - Every weight is `>= 0`
/// - Once normalized, weights sum to 1.0 and the table is read-only
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FrequencyTable {
	/// Weight per symbol.
	/// Example: { "the" => 42.0, "cat" => 3.0 }
	weights: HashMap<String, f64>,
	normalized: bool,
}

impl FrequencyTable {
	/// Creates a new empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `amount` to the weight of `symbol`, creating the entry if needed.
	///
	/// # Errors
	/// - `AlreadyNormalized` once the table is normalized.
	/// - `Configuration` for a negative or non-finite amount.
	pub fn increment(&mut self, symbol: &str, amount: f64) -> Result<(), LmError> {
		self.check_writable(amount)?;
		match self.weights.get_mut(symbol) {
			Some(weight) => *weight += amount,
			None => {
				self.weights.insert(symbol.to_owned(), amount);
			}
		}
		Ok(())
	}

	/// Adds `amount` to every symbol already present. Never creates entries.
	///
	/// # Errors
	/// Same as [`FrequencyTable::increment`].
	pub fn increment_all(&mut self, amount: f64) -> Result<(), LmError> {
		self.check_writable(amount)?;
		for weight in self.weights.values_mut() {
			*weight += amount;
		}
		Ok(())
	}

	/// Returns the current weight (or probability once normalized), 0 if absent.
	pub fn get(&self, symbol: &str) -> f64 {
		self.weights.get(symbol).copied().unwrap_or(0.0)
	}

	/// Sum of all weights.
	pub fn total(&self) -> f64 {
		self.weights.values().sum()
	}

	/// Number of distinct symbols.
	pub fn len(&self) -> usize {
		self.weights.len()
	}

	/// Returns true if no symbol was ever counted.
	pub fn is_empty(&self) -> bool {
		self.weights.is_empty()
	}

	/// Returns true once [`FrequencyTable::normalize`] succeeded.
	pub fn is_normalized(&self) -> bool {
		self.normalized
	}

	/// Iterates over `(symbol, weight)` pairs in arbitrary order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
		self.weights.iter().map(|(symbol, weight)| (symbol.as_str(), *weight))
	}

	/// Divides every weight by the total so the table sums to 1.0.
	///
	/// # Errors
	/// - `DegenerateDistribution` if the total weight is zero or not finite.
	/// - `AlreadyNormalized` on a second call.
	pub fn normalize(&mut self) -> Result<(), LmError> {
		if self.normalized {
			return Err(LmError::AlreadyNormalized);
		}

		let total = self.total();
		if total <= 0.0 || !total.is_finite() {
			return Err(LmError::DegenerateDistribution { total });
		}

		for weight in self.weights.values_mut() {
			*weight /= total;
		}
		self.normalized = true;
		Ok(())
	}

	/// Merges another table into this one by summing weights.
	///
	/// Intended for parallel learning, where partial tables are counted
	/// independently and combined before normalization.
	///
	/// # Errors
	/// Returns `AlreadyNormalized` if either table is already normalized.
	pub fn merge(&mut self, other: &Self) -> Result<(), LmError> {
		if self.normalized || other.normalized {
			return Err(LmError::AlreadyNormalized);
		}

		for (symbol, weight) in &other.weights {
			*self.weights.entry(symbol.clone()).or_insert(0.0) += *weight;
		}
		Ok(())
	}

	fn check_writable(&self, amount: f64) -> Result<(), LmError> {
		if self.normalized {
			return Err(LmError::AlreadyNormalized);
		}
		if amount < 0.0 || !amount.is_finite() {
			return Err(LmError::configuration(format!("weights must be finite and >= 0, got {amount}")));
		}
		Ok(())
	}
}
