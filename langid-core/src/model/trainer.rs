use std::path::Path;
use std::thread;

use log::{debug, info, warn};

use super::bigram_model::BigramModel;
use super::classifier::Registry;
use crate::config::LangIdConfig;
use crate::error::{LangIdError, Result};
use crate::io::{build_output_path, list_corpora, read_corpus};
use crate::persistence::{RegistryLoad, load_model, save_model};

/// Chunks per CPU when training in parallel.
const CHUNK_FACTOR: usize = 8;

/// Builds `BigramModel`s from corpora.
///
/// # Responsibilities
/// - Train a token sequence in one pass, or in parallel chunks when it is large
/// - Reuse a cached binary model when one exists for a corpus
/// - Train a whole corpus directory into a model directory
#[derive(Clone, Debug)]
pub struct Trainer {
	min_parallel_tokens: usize,
	model_extension: String,
	corpus_extension: String,
}

impl Default for Trainer {
	fn default() -> Self {
		Self::new(&LangIdConfig::default())
	}
}

impl Trainer {
	pub fn new(config: &LangIdConfig) -> Self {
		Self {
			min_parallel_tokens: config.min_parallel_tokens,
			model_extension: config.model_extension.clone(),
			corpus_extension: config.corpus_extension.clone(),
		}
	}

	/// Trains a model from a flat token sequence.
	///
	/// Sequences with at least `min_parallel_tokens` tokens are split into
	/// chunks that share their boundary token, so every adjacent pair lands
	/// in exactly one chunk. Partial models are built on worker threads and
	/// merged; the result equals a single sequential pass.
	pub fn train<S: AsRef<str> + Sync>(&self, tokens: &[S]) -> BigramModel {
		if tokens.len() < self.min_parallel_tokens.max(2) {
			return BigramModel::train(tokens);
		}

		let pairs = tokens.len() - 1;
		let chunks = num_cpus::get() * CHUNK_FACTOR;
		let pairs_per_chunk = pairs.div_ceil(chunks).max(1);
		debug!("training {} tokens in chunks of {pairs_per_chunk} pairs", tokens.len());

		thread::scope(|scope| {
			let mut handles = Vec::with_capacity(chunks);
			let mut start = 0;
			while start < pairs {
				let end = (start + pairs_per_chunk).min(pairs);
				// Tokens start..=end hold pairs start..end
				let chunk = &tokens[start..=end];
				handles.push(scope.spawn(move || BigramModel::train(chunk)));
				start = end;
			}

			let mut final_model = BigramModel::default();
			for handle in handles {
				let partial_model =
					handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic));
				final_model.merge(&partial_model);
			}
			final_model
		})
	}

	/// Trains a model from a corpus file.
	pub fn train_file<P: AsRef<Path>>(&self, corpus_path: P) -> Result<BigramModel> {
		let tokens = read_corpus(&corpus_path)?;
		let model = self.train(&tokens);
		info!(
			"trained {} tokens from {}: {} words, {} distinct bigrams",
			tokens.len(),
			corpus_path.as_ref().display(),
			model.vocab_size(),
			model.distinct_bigrams()
		);
		Ok(model)
	}

	/// Like `load_or_train`, with the cached model next to the corpus:
	/// `data/english.txt` (or `data/english.txt.gz`) caches to `data/english.bin`.
	pub fn load_or_train_cached<P: AsRef<Path>>(&self, corpus_path: P) -> Result<BigramModel> {
		let model_path = build_output_path(&corpus_path, &self.model_extension)?;
		self.load_or_train(corpus_path, model_path)
	}

	/// Loads `model_path` if it exists, otherwise trains `corpus_path` and
	/// writes the result to `model_path` for the next run.
	pub fn load_or_train<PC, PM>(&self, corpus_path: PC, model_path: PM) -> Result<BigramModel>
	where
		PC: AsRef<Path>,
		PM: AsRef<Path>,
	{
		let model_path = model_path.as_ref();
		if model_path.exists() {
			debug!("using cached model {}", model_path.display());
			return load_model(model_path);
		}
		let model = self.train_file(corpus_path)?;
		save_model(model_path, &model)?;
		Ok(model)
	}

	/// Trains (or loads from cache) one model per corpus file in `corpus_dir`.
	///
	/// Plain (`<language>.txt`) and gzipped (`<language>.txt.gz`) corpora are
	/// accepted. Models are written to `model_dir` under the language label.
	/// A corpus that cannot be read or yields an empty model is logged and
	/// reported as a failure; the others proceed.
	///
	/// # Errors
	/// Returns an error only if `corpus_dir` cannot be listed.
	pub fn train_directory<PC, PM>(&self, corpus_dir: PC, model_dir: PM) -> Result<RegistryLoad>
	where
		PC: AsRef<Path>,
		PM: AsRef<Path>,
	{
		let mut registry = Registry::new();
		let mut failures = Vec::new();

		for (language, corpus_path) in list_corpora(corpus_dir, &self.corpus_extension)? {
			let mut model_path = model_dir.as_ref().join(&language);
			model_path.set_extension(&self.model_extension);

			let outcome = self
				.load_or_train(&corpus_path, &model_path)
				.and_then(|model| registry.insert(&language, model));
			if let Err(e) = outcome {
				let failure = LangIdError::ModelLoad { language, reason: e.to_string() };
				warn!("{failure}");
				failures.push(failure);
			}
		}

		Ok(RegistryLoad { registry, failures })
	}
}
