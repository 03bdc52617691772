use log::trace;

use super::bigram_model::BigramModel;
use crate::error::{LangIdError, Result};

/// Log-probability substituted for a non-positive probability.
const FLOOR_LOG_PROB: f64 = -23.025850929940457; // ln(1e-10)

/// Computes the bigram perplexity of `tokens` under `model`.
///
/// `exp(-(1 / (n-1)) * Σ ln P(tokens[i] | tokens[i-1]))` over the `n-1`
/// adjacent pairs, using the natural logarithm. Lower is a better fit.
///
/// # Errors
/// - `LangIdError::InsufficientInput` if fewer than 2 tokens are given
/// - `LangIdError::EmptyModel` if the model has no vocabulary
pub fn perplexity<S: AsRef<str>>(model: &BigramModel, tokens: &[S]) -> Result<f64> {
	if tokens.len() < 2 {
		return Err(LangIdError::InsufficientInput { got: tokens.len() });
	}
	if model.is_empty() {
		return Err(LangIdError::EmptyModel);
	}

	let mut sum_log_prob = 0.0;
	for pair in tokens.windows(2) {
		let prob = model.probability(pair[1].as_ref(), pair[0].as_ref())?;
		// Cannot happen with the fallback tiers, kept so the sum stays finite
		sum_log_prob += if prob > 0.0 { prob.ln() } else { FLOOR_LOG_PROB };
	}

	let pairs = (tokens.len() - 1) as f64;
	let result = (-sum_log_prob / pairs).exp();
	trace!("perplexity over {} pairs: {result}", tokens.len() - 1);
	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::tokenize;

	#[test]
	fn floor_is_ln_of_1e_minus_10() {
		assert!((FLOOR_LOG_PROB - 1e-10_f64.ln()).abs() < 1e-12);
	}

	#[test]
	fn fewer_than_two_tokens_is_rejected() {
		let model = BigramModel::train(&tokenize("a b c"));
		assert!(matches!(
			perplexity(&model, &["a"]),
			Err(LangIdError::InsufficientInput { got: 1 })
		));
		assert!(matches!(
			perplexity::<&str>(&model, &[]),
			Err(LangIdError::InsufficientInput { got: 0 })
		));
	}

	#[test]
	fn empty_model_is_rejected() {
		let model = BigramModel::train::<&str>(&[]);
		assert!(matches!(perplexity(&model, &["a", "b"]), Err(LangIdError::EmptyModel)));
	}

	#[test]
	fn matches_hand_computed_value() {
		// el:3 gato:2 come:2 pescado:1, vocab 4
		let model = BigramModel::train(&tokenize("el gato come el pescado"));
		// P(gato|el) = 1/3, P(come|gato) = 1/2, P(perro|come) = 1/4
		let ppl = perplexity(&model, &["el", "gato", "come", "perro"]).unwrap();
		let expected = (-((1.0f64 / 3.0).ln() + 0.5f64.ln() + 0.25f64.ln()) / 3.0).exp();
		assert!((ppl - expected).abs() < 1e-12);
	}

	#[test]
	fn unseen_text_scores_vocab_size() {
		let model = BigramModel::train(&tokenize("el gato come el pescado"));
		let ppl = perplexity(&model, &tokenize("the dog eats a bone")).unwrap();
		assert!((ppl - model.vocab_size() as f64).abs() < 1e-9);
	}

	#[test]
	fn repeated_chain_converges_to_two() {
		// Endpoint double counting halves every pair probability of a
		// deterministic chain, so the limit is 2 rather than 1.
		let corpus: Vec<&str> = ["a", "b", "c"].iter().copied().cycle().take(3 * 2000).collect();
		let model = BigramModel::train(&corpus);
		let ppl = perplexity(&model, &["a", "b", "c", "a", "b"]).unwrap();
		assert!((ppl - 2.0).abs() < 0.01, "got {ppl}");
	}

	#[test]
	fn in_vocabulary_text_beats_unseen_text() {
		let model = BigramModel::train(&tokenize(
			"the cat eats the fish the dog eats the meat the cat sleeps",
		));
		let known = perplexity(&model, &tokenize("the dog eats the fish")).unwrap();
		let unknown = perplexity(&model, &tokenize("el perro come el pescado")).unwrap();
		assert!(known < unknown);
	}
}
