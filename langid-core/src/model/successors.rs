use std::collections::HashMap;

/// Counts of every word observed right after one fixed word.
///
/// A `Successors` is the inner level of the bigram table: the outer table
/// owns one of these per left word, created on first write.
///
/// ## Invariants
/// - Every stored count is strictly positive
/// - A lookup miss reads as 0 and never inserts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Successors {
	/// Example: { "gato" => 42, "perro" => 3 }
	counts: HashMap<String, usize>,
}

impl Successors {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn from_counts(counts: HashMap<String, usize>) -> Self {
		Self { counts }
	}

	/// Records one occurrence of `next` after the owning word.
	pub(crate) fn add(&mut self, next: &str) {
		if let Some(count) = self.counts.get_mut(next) {
			*count += 1;
		} else {
			self.counts.insert(next.to_owned(), 1);
		}
	}

	/// Number of times `next` followed the owning word, 0 if never.
	pub(crate) fn count(&self, next: &str) -> usize {
		self.counts.get(next).copied().unwrap_or(0)
	}

	pub(crate) fn len(&self) -> usize {
		self.counts.len()
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &usize)> {
		self.counts.iter()
	}

	pub(crate) fn as_map(&self) -> &HashMap<String, usize> {
		&self.counts
	}

	/// Sums the counts of another successor table into this one.
	///
	/// Used when partial models trained on separate chunks are combined.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (next, occurrence) in &other.counts {
			*self.counts.entry(next.clone()).or_insert(0) += *occurrence;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn miss_reads_zero_without_inserting() {
		let successors = Successors::new();
		assert_eq!(successors.count("gato"), 0);
		assert_eq!(successors.len(), 0);
	}

	#[test]
	fn add_and_merge_sum_counts() {
		let mut a = Successors::new();
		a.add("gato");
		a.add("gato");
		let mut b = Successors::new();
		b.add("gato");
		b.add("perro");

		a.merge(&b);
		assert_eq!(a.count("gato"), 3);
		assert_eq!(a.count("perro"), 1);
		assert_eq!(a.len(), 2);
	}
}
