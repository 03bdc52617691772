use std::collections::HashMap;
use std::thread;

use log::debug;

use super::bigram_model::BigramModel;
use super::perplexity::perplexity;
use crate::config::LangIdConfig;
use crate::error::{LangIdError, Result};

/// Language label to model mapping, kept in registration order.
///
/// Registration order is the tie-break order of the classifier.
///
/// # Invariants
/// - Labels are unique
/// - No registered model is empty
#[derive(Clone, Debug, Default)]
pub struct Registry {
	entries: Vec<(String, BigramModel)>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a model under `language`.
	///
	/// # Errors
	/// - `LangIdError::DuplicateLanguage` if the label is already present
	/// - `LangIdError::EmptyModel` if the model has no vocabulary
	pub fn insert<L: Into<String>>(&mut self, language: L, model: BigramModel) -> Result<()> {
		let language = language.into();
		if self.get(&language).is_some() {
			return Err(LangIdError::DuplicateLanguage(language));
		}
		if model.is_empty() {
			return Err(LangIdError::EmptyModel);
		}
		self.entries.push((language, model));
		Ok(())
	}

	pub fn get(&self, language: &str) -> Option<&BigramModel> {
		self.entries.iter().find(|(label, _)| label == language).map(|(_, model)| model)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Labels in registration order.
	pub fn languages(&self) -> Vec<&str> {
		self.entries.iter().map(|(label, _)| label.as_str()).collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &BigramModel)> {
		self.entries.iter().map(|(label, model)| (label.as_str(), model))
	}
}

/// Decision and per-language perplexities of one identification.
#[derive(Clone, Debug, PartialEq)]
pub struct LanguageScores {
	/// Language with the lowest perplexity.
	pub language: String,
	/// Perplexity of the query under every registered language.
	pub scores: HashMap<String, f64>,
}

impl LanguageScores {
	/// Scores sorted from best (lowest perplexity) to worst.
	///
	/// Equal perplexities are ordered by label.
	pub fn ranked(&self) -> Vec<(&str, f64)> {
		let mut ranked: Vec<(&str, f64)> =
			self.scores.iter().map(|(label, score)| (label.as_str(), *score)).collect();
		ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
		ranked
	}
}

/// Result of `Classifier::identify`.
#[derive(Clone, Debug, PartialEq)]
pub enum Identification {
	/// The registry holds no model: nothing was scored.
	NoModels,
	Identified(LanguageScores),
}

impl Identification {
	/// The identified language, if any.
	pub fn language(&self) -> Option<&str> {
		match self {
			Identification::NoModels => None,
			Identification::Identified(scores) => Some(&scores.language),
		}
	}
}

/// Minimum-perplexity language classifier.
///
/// # Responsibilities
/// - Own the language registry for the lifetime of a session
/// - Score a query under every model, optionally one thread per language
/// - Pick the lowest perplexity, first registered language on exact ties
///
/// The registry is never mutated after construction, so a `Classifier` can
/// be shared between threads by reference.
#[derive(Debug)]
pub struct Classifier {
	registry: Registry,
	parallel: bool,
}

impl Classifier {
	pub fn new(registry: Registry, config: &LangIdConfig) -> Self {
		Self { registry, parallel: config.parallel_scoring }
	}

	pub fn languages(&self) -> Vec<&str> {
		self.registry.languages()
	}

	/// Identifies the language of a tokenized query.
	///
	/// # Returns
	/// - `Ok(Identification::NoModels)` if the registry is empty
	/// - `Ok(Identification::Identified(..))` with the decision and all scores
	///
	/// # Errors
	/// Returns `LangIdError::InsufficientInput` for fewer than 2 tokens,
	/// before any model is scored.
	pub fn identify<S: AsRef<str> + Sync>(&self, tokens: &[S]) -> Result<Identification> {
		if self.registry.is_empty() {
			return Ok(Identification::NoModels);
		}
		if tokens.len() < 2 {
			return Err(LangIdError::InsufficientInput { got: tokens.len() });
		}

		let perplexities = self.score_all(tokens)?;

		let mut best: Option<(&str, f64)> = None;
		for ((label, _), score) in self.registry.iter().zip(&perplexities) {
			// Strictly lower only: the earlier registration keeps ties
			if best.is_none_or(|(_, best_score)| *score < best_score) {
				best = Some((label, *score));
			}
		}

		let Some((language, score)) = best else {
			return Ok(Identification::NoModels);
		};
		debug!("identified {language} (perplexity {score:.4}) among {} languages", perplexities.len());

		let scores = self
			.registry
			.iter()
			.zip(perplexities)
			.map(|((label, _), score)| (label.to_owned(), score))
			.collect();
		Ok(Identification::Identified(LanguageScores { language: language.to_owned(), scores }))
	}

	/// Perplexity under every model, in registration order.
	fn score_all<S: AsRef<str> + Sync>(&self, tokens: &[S]) -> Result<Vec<f64>> {
		if !self.parallel || self.registry.len() < 2 {
			return self.registry.iter().map(|(_, model)| perplexity(model, tokens)).collect();
		}

		thread::scope(|scope| {
			let handles: Vec<_> = self
				.registry
				.iter()
				.map(|(_, model)| scope.spawn(move || perplexity(model, tokens)))
				.collect();
			handles
				.into_iter()
				.map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
				.collect()
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::tokenize;

	const SPANISH: &str = "el gato come el pescado y el perro come la carne \
		la casa es grande y el gato duerme en la casa \
		el perro come el pescado en la casa grande";
	const ENGLISH: &str = "the cat eats the fish and the dog eats the meat \
		the house is big and the cat sleeps in the house \
		the dog eats the fish in the big house";

	fn config(parallel: bool) -> LangIdConfig {
		LangIdConfig { parallel_scoring: parallel, ..LangIdConfig::default() }
	}

	fn registry() -> Registry {
		let mut registry = Registry::new();
		registry.insert("Spanish", BigramModel::train(&tokenize(SPANISH))).unwrap();
		registry.insert("English", BigramModel::train(&tokenize(ENGLISH))).unwrap();
		registry
	}

	#[test]
	fn identifies_held_out_spanish() {
		for parallel in [false, true] {
			let classifier = Classifier::new(registry(), &config(parallel));
			let result = classifier.identify(&tokenize("el perro duerme en la casa")).unwrap();
			let Identification::Identified(scores) = result else {
				panic!("expected an identification");
			};
			assert_eq!(scores.language, "Spanish");
			assert!(scores.scores["Spanish"] < scores.scores["English"]);
			assert_eq!(scores.ranked()[0].0, "Spanish");
		}
	}

	#[test]
	fn parallel_and_sequential_agree() {
		let query = tokenize("the dog sleeps in the house");
		let sequential = Classifier::new(registry(), &config(false)).identify(&query).unwrap();
		let parallel = Classifier::new(registry(), &config(true)).identify(&query).unwrap();
		assert_eq!(sequential, parallel);
		assert_eq!(sequential.language(), Some("English"));
	}

	#[test]
	fn empty_registry_is_the_no_models_sentinel() {
		let classifier = Classifier::new(Registry::new(), &config(true));
		assert_eq!(classifier.identify(&["a", "b"]).unwrap(), Identification::NoModels);
		// Even a too-short query does not raise without models
		assert_eq!(classifier.identify(&["a"]).unwrap(), Identification::NoModels);
	}

	#[test]
	fn short_query_is_rejected() {
		let classifier = Classifier::new(registry(), &config(true));
		assert!(matches!(
			classifier.identify(&["gato"]),
			Err(LangIdError::InsufficientInput { got: 1 })
		));
	}

	#[test]
	fn exact_tie_goes_to_first_registered() {
		let model = BigramModel::train(&tokenize(SPANISH));
		for order in [["Castilian", "Spanish"], ["Spanish", "Castilian"]] {
			let mut registry = Registry::new();
			registry.insert(order[0], model.clone()).unwrap();
			registry.insert(order[1], model.clone()).unwrap();
			let classifier = Classifier::new(registry, &config(true));
			let result = classifier.identify(&tokenize("el gato come")).unwrap();
			assert_eq!(result.language(), Some(order[0]));
		}
	}

	#[test]
	fn registry_rejects_duplicates_and_empty_models() {
		let mut registry = registry();
		assert!(matches!(
			registry.insert("Spanish", BigramModel::train(&tokenize("otra vez"))),
			Err(LangIdError::DuplicateLanguage(_))
		));
		assert!(matches!(
			registry.insert("Latin", BigramModel::train(&["solus"])),
			Err(LangIdError::EmptyModel)
		));
		assert_eq!(registry.languages(), vec!["Spanish", "English"]);
		assert!(registry.get("English").is_some());
	}

	#[test]
	fn ranked_is_ascending() {
		let classifier = Classifier::new(registry(), &config(false));
		let Identification::Identified(scores) =
			classifier.identify(&tokenize("the cat eats the meat")).unwrap()
		else {
			panic!("expected an identification");
		};
		let ranked = scores.ranked();
		assert_eq!(ranked.len(), 2);
		assert!(ranked[0].1 <= ranked[1].1);
		assert_eq!(ranked[0].0, scores.language);
	}
}
