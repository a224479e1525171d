use serde::{Deserialize, Serialize};

use super::conditional_table::ConditionalFrequencyTable;
use super::frequency_table::FrequencyTable;
use crate::error::LmError;

/// Count adjustment applied to raw tables before normalization.
///
/// # Variants
/// - `Identity`: leaves counts untouched.
/// - `Additive { increment }`: Laplace-style; adds `increment` to every symbol
///   already present in a table. Unseen symbols are not invented.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Smoother {
	#[default]
	Identity,
	Additive { increment: f64 },
}

impl Smoother {
	/// Additive smoothing with the classic add-one increment.
	pub fn laplace() -> Self {
		Smoother::Additive { increment: 1.0 }
	}

	/// Checks the smoother parameters.
	///
	/// # Errors
	/// Returns a `Configuration` error for a negative or non-finite increment.
	pub fn validate(&self) -> Result<(), LmError> {
		match self {
			Smoother::Identity => Ok(()),
			Smoother::Additive { increment } if increment.is_finite() && *increment >= 0.0 => Ok(()),
			Smoother::Additive { increment } => Err(LmError::configuration(format!(
				"additive increment must be finite and >= 0, got {increment}"
			))),
		}
	}

	/// Adjusts the raw counts of `table` in place.
	///
	/// # Errors
	/// Fails like [`FrequencyTable::increment_all`] on a normalized table or
	/// an invalid increment.
	pub fn smooth_table(&self, table: &mut FrequencyTable) -> Result<(), LmError> {
		match self {
			Smoother::Identity => Ok(()),
			Smoother::Additive { increment } => table.increment_all(*increment),
		}
	}

	/// Adjusts every nested table of `table` in place.
	pub fn smooth_conditional_table(&self, table: &mut ConditionalFrequencyTable) -> Result<(), LmError> {
		match self {
			Smoother::Identity => Ok(()),
			Smoother::Additive { increment } => table.increment_all(*increment),
		}
	}
}
