use std::collections::HashMap;

use super::successors::Successors;
use crate::error::{LangIdError, Result};
use crate::persistence::PersistedModel;

/// Word bigram model of a single language.
///
/// The `BigramModel` stores how often each word was seen as an endpoint of
/// an adjacent pair, and how often each ordered pair was seen.
///
/// # Responsibilities
/// - Build the count tables from a token sequence
/// - Merge with a model trained on another chunk of the same corpus
/// - Estimate `P(word | prev_word)` with a three-tier fallback
/// - Convert to and from the persisted parameter tables
///
/// # Invariants
/// - `vocab_size == unigrams.len()` once training (or merging) completes
/// - All stored counts are >= 1
/// - Read-only once handed to a `Classifier`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BigramModel {
	/// Endpoint counts: every pair adds one to each of its two words.
	unigrams: HashMap<String, usize>,

	/// Left word to the counts of the words that followed it.
	bigrams: HashMap<String, Successors>,

	/// Number of distinct words in `unigrams`.
	vocab_size: usize,
}

impl BigramModel {
	/// Trains a model from an ordered token sequence.
	///
	/// For each adjacent pair `(w1, w2)` the pair count is incremented, and
	/// so are the unigram counts of BOTH `w1` and `w2`. Interior tokens are
	/// therefore counted twice (once per pair they belong to). This is
	/// intentional and must stay: persisted models and their scores depend
	/// on these exact numbers.
	///
	/// # Notes
	/// - A sequence shorter than 2 tokens yields an empty model (`vocab_size == 0`).
	pub fn train<S: AsRef<str>>(tokens: &[S]) -> Self {
		let mut model = Self::default();
		for pair in tokens.windows(2) {
			model.add_pair(pair[0].as_ref(), pair[1].as_ref());
		}
		model.vocab_size = model.unigrams.len();
		model
	}

	fn add_pair(&mut self, w1: &str, w2: &str) {
		match self.bigrams.get_mut(w1) {
			Some(successors) => successors.add(w2),
			None => {
				let mut successors = Successors::new();
				successors.add(w2);
				self.bigrams.insert(w1.to_owned(), successors);
			}
		}
		*self.unigrams.entry(w1.to_owned()).or_insert(0) += 1;
		*self.unigrams.entry(w2.to_owned()).or_insert(0) += 1;
	}

	/// Merges a model trained on another part of the same corpus.
	///
	/// Counts are summed and `vocab_size` is recomputed.
	pub fn merge(&mut self, other: &Self) {
		for (word, count) in &other.unigrams {
			*self.unigrams.entry(word.clone()).or_insert(0) += *count;
		}
		for (word, successors) in &other.bigrams {
			if let Some(existing) = self.bigrams.get_mut(word) {
				existing.merge(successors);
			} else {
				self.bigrams.insert(word.clone(), successors.clone());
			}
		}
		self.vocab_size = self.unigrams.len();
	}

	pub fn vocab_size(&self) -> usize {
		self.vocab_size
	}

	/// True when the model has no vocabulary and cannot score anything.
	pub fn is_empty(&self) -> bool {
		self.vocab_size == 0
	}

	/// Endpoint count of `word`, 0 if unseen.
	pub fn unigram_count(&self, word: &str) -> usize {
		self.unigrams.get(word).copied().unwrap_or(0)
	}

	/// Number of times `next` directly followed `prev`, 0 if never.
	pub fn bigram_count(&self, prev: &str, next: &str) -> usize {
		self.bigrams.get(prev).map_or(0, |successors| successors.count(next))
	}

	/// Number of distinct `(w1, w2)` pairs.
	pub fn distinct_bigrams(&self) -> usize {
		self.bigrams.values().map(Successors::len).sum()
	}

	/// Estimates the probability of `word` following `prev_word`.
	///
	/// Tiers, first match wins:
	/// 1. seen pair: `bigram(prev, word) / unigram(prev)`
	/// 2. seen word: `unigram(word) / vocab_size`
	/// 3. unseen word: `1 / vocab_size`
	///
	/// The values are not normalized over the vocabulary and tier 2 can
	/// exceed 1 for frequent words. Only relative comparison is meaningful.
	///
	/// # Errors
	/// - `LangIdError::EmptyModel` if `vocab_size == 0`
	/// - `LangIdError::CorruptModel` if a stored pair has no unigram for its left word
	pub fn probability(&self, word: &str, prev_word: &str) -> Result<f64> {
		if self.vocab_size == 0 {
			return Err(LangIdError::EmptyModel);
		}

		let pair = self.bigram_count(prev_word, word);
		if pair > 0 {
			let context = self.unigram_count(prev_word);
			if context == 0 {
				return Err(LangIdError::CorruptModel(format!(
					"pair '{prev_word} {word}' has no unigram entry for '{prev_word}'"
				)));
			}
			return Ok(pair as f64 / context as f64);
		}

		let unigram = self.unigram_count(word);
		if unigram > 0 {
			return Ok(unigram as f64 / self.vocab_size as f64);
		}

		Ok(1.0 / self.vocab_size as f64)
	}

	/// Copies the three parameter tables into their persisted shape.
	pub fn to_persistable(&self) -> PersistedModel {
		PersistedModel {
			unigram_counts: self.unigrams.clone(),
			bigram_counts: self
				.bigrams
				.iter()
				.map(|(word, successors)| (word.clone(), successors.as_map().clone()))
				.collect(),
			vocab_size: self.vocab_size,
		}
	}

	/// Rebuilds a model from persisted parameter tables.
	///
	/// The tables are taken as they are; nothing is recomputed.
	///
	/// # Errors
	/// Returns `LangIdError::CorruptModel` if a count is zero, an inner
	/// table is empty, a bigram word has no unigram entry, or `vocab_size`
	/// does not match the unigram table.
	pub fn from_persistable(data: PersistedModel) -> Result<Self> {
		if data.vocab_size != data.unigram_counts.len() {
			return Err(LangIdError::CorruptModel(format!(
				"vocab_size is {} but {} unigrams are stored",
				data.vocab_size,
				data.unigram_counts.len()
			)));
		}
		if let Some((word, _)) = data.unigram_counts.iter().find(|(_, count)| **count == 0) {
			return Err(LangIdError::CorruptModel(format!("zero unigram count for '{word}'")));
		}

		let mut bigrams = HashMap::with_capacity(data.bigram_counts.len());
		for (prev, counts) in data.bigram_counts {
			if counts.is_empty() {
				return Err(LangIdError::CorruptModel(format!("empty bigram row for '{prev}'")));
			}
			if let Some((next, _)) = counts.iter().find(|(_, count)| **count == 0) {
				return Err(LangIdError::CorruptModel(format!(
					"zero bigram count for '{prev} {next}'"
				)));
			}
			if !data.unigram_counts.contains_key(&prev) {
				return Err(LangIdError::CorruptModel(format!("no unigram for bigram word '{prev}'")));
			}
			if let Some(next) = counts.keys().find(|next| !data.unigram_counts.contains_key(*next)) {
				return Err(LangIdError::CorruptModel(format!("no unigram for bigram word '{next}'")));
			}
			bigrams.insert(prev, Successors::from_counts(counts));
		}

		Ok(Self {
			unigrams: data.unigram_counts,
			bigrams,
			vocab_size: data.vocab_size,
		})
	}

	/// Iterates over `(prev, next, count)` for every stored pair.
	#[cfg(test)]
	pub(crate) fn bigrams(&self) -> impl Iterator<Item = (&str, &str, usize)> {
		self.bigrams.iter().flat_map(|(prev, successors)| {
			successors.iter().map(move |(next, count)| (prev.as_str(), next.as_str(), *count))
		})
	}
}
