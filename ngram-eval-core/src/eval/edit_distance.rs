/// Token-level edit distance with unit insert, delete and substitute costs.
///
/// Solved by memoized recursion over suffix positions `(i, j)`:
/// `d(|a|, |b|) = 0` and
/// `d(i, j) = min(1 + d(i+1, j), 1 + d(i, j+1), 1 + d(i+1, j+1), d(i+1, j+1) if a[i] == b[j])`.
/// Each of the `(|a|+1) × (|b|+1)` cells is computed at most once.
#[derive(Clone, Copy, Debug, Default)]
pub struct EditDistance;

impl EditDistance {
	/// Cost of a token present only in the second sequence.
	pub const INSERT_COST: f64 = 1.0;
	/// Cost of a token present only in the first sequence.
	pub const DELETE_COST: f64 = 1.0;
	/// Cost of replacing one token by a different one.
	pub const SUBSTITUTE_COST: f64 = 1.0;

	/// Creates a calculator; every call to `distance` uses a fresh memo.
	pub fn new() -> Self {
		Self
	}

	/// Minimum cost of turning `first` into `second`.
	pub fn distance<T: PartialEq>(&self, first: &[T], second: &[T]) -> f64 {
		let mut memo = Memo::new(first.len(), second.len());
		Self::suffix_distance(first, second, 0, 0, &mut memo)
	}

	fn suffix_distance<T: PartialEq>(first: &[T], second: &[T], i: usize, j: usize, memo: &mut Memo) -> f64 {
		if i > first.len() || j > second.len() {
			return f64::INFINITY;
		}
		if i == first.len() && j == second.len() {
			return 0.0;
		}
		if let Some(distance) = memo.get(i, j) {
			return distance;
		}

		let mut distance = Self::DELETE_COST + Self::suffix_distance(first, second, i + 1, j, memo);
		distance = distance.min(Self::INSERT_COST + Self::suffix_distance(first, second, i, j + 1, memo));
		distance = distance.min(Self::SUBSTITUTE_COST + Self::suffix_distance(first, second, i + 1, j + 1, memo));
		if i < first.len() && j < second.len() && first[i] == second[j] {
			distance = distance.min(Self::suffix_distance(first, second, i + 1, j + 1, memo));
		}

		memo.set(i, j, distance);
		distance
	}
}

/// Flat `(rows + 1) × (columns + 1)` table of computed cells.
struct Memo {
	columns: usize,
	cells: Vec<Option<f64>>,
}

impl Memo {
	fn new(rows: usize, columns: usize) -> Self {
		Self { columns: columns + 1, cells: vec![None; (rows + 1) * (columns + 1)] }
	}

	fn get(&self, i: usize, j: usize) -> Option<f64> {
		self.cells[i * self.columns + j]
	}

	fn set(&mut self, i: usize, j: usize, distance: f64) {
		self.cells[i * self.columns + j] = Some(distance);
	}
}
