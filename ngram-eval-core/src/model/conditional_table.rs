use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::frequency_table::FrequencyTable;
use crate::error::LmError;

/// Ordered tuple of the tokens preceding a position.
///
/// Tokens are kept separate so `["a", "bc"]` and `["ab", "c"]` never collide.
pub type Context = Vec<String>;

/// Maps a context to the distribution of the symbol that follows it.
///
/// # Invariants
/// - All contexts held by one table have the same length (the table's order)
/// - All nested tables are normalized together, once
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConditionalFrequencyTable {
	tables: HashMap<Context, FrequencyTable>,
}

impl ConditionalFrequencyTable {
	/// Creates a table without any context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `amount` occurrences of `symbol` following `context`.
	///
	/// # Errors
	/// See [`FrequencyTable::increment`]; a rejected amount leaves no new context behind.
	pub fn increment(&mut self, context: &[String], symbol: &str, amount: f64) -> Result<(), LmError> {
		match self.tables.get_mut(context) {
			Some(table) => table.increment(symbol, amount),
			None => {
				let mut table = FrequencyTable::new();
				table.increment(symbol, amount)?;
				self.tables.insert(context.to_vec(), table);
				Ok(())
			}
		}
	}

	/// Adds `amount` to every symbol of every nested table.
	pub fn increment_all(&mut self, amount: f64) -> Result<(), LmError> {
		for table in self.tables.values_mut() {
			table.increment_all(amount)?;
		}
		Ok(())
	}

	/// Returns the weight of `symbol` after `context`, 0 if either is unknown.
	pub fn get(&self, context: &[String], symbol: &str) -> f64 {
		self.tables.get(context).map_or(0.0, |table| table.get(symbol))
	}

	/// Returns the distribution observed after `context`, if any.
	pub fn table(&self, context: &[String]) -> Option<&FrequencyTable> {
		self.tables.get(context)
	}

	/// Iterates over every context seen so far, in arbitrary order.
	pub fn contexts(&self) -> impl Iterator<Item = &Context> {
		self.tables.keys()
	}

	/// Number of distinct contexts.
	pub fn len(&self) -> usize {
		self.tables.len()
	}

	/// Returns true if no context was ever counted.
	pub fn is_empty(&self) -> bool {
		self.tables.is_empty()
	}

	/// Normalizes every nested table.
	pub fn normalize(&mut self) -> Result<(), LmError> {
		for table in self.tables.values_mut() {
			table.normalize()?;
		}
		Ok(())
	}

	/// Sums the counts of `other` into this table.
	pub fn merge(&mut self, other: &Self) -> Result<(), LmError> {
		for (context, table) in &other.tables {
			if let Some(existing) = self.tables.get_mut(context) {
				existing.merge(table)?;
			} else {
				self.tables.insert(context.clone(), table.clone());
			}
		}
		Ok(())
	}
}
