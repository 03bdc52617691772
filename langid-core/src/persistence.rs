use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{LangIdError, Result};
use crate::io::{get_filename, list_files};
use crate::model::bigram_model::BigramModel;
use crate::model::classifier::Registry;

/// The three parameter tables of a trained model, exactly as stored on disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedModel {
	pub unigram_counts: HashMap<String, usize>,
	pub bigram_counts: HashMap<String, HashMap<String, usize>>,
	pub vocab_size: usize,
}

/// Outcome of loading a set of language models.
///
/// Languages that could not be loaded are excluded from `registry` and
/// reported in `failures` as `LangIdError::ModelLoad`.
#[derive(Debug)]
pub struct RegistryLoad {
	pub registry: Registry,
	pub failures: Vec<LangIdError>,
}

impl RegistryLoad {
	/// Labels of the languages that failed to load.
	pub fn unavailable(&self) -> Vec<String> {
		self.failures
			.iter()
			.filter_map(|failure| match failure {
				LangIdError::ModelLoad { language, .. } => Some(language.clone()),
				_ => None,
			})
			.collect()
	}
}

/// Writes a model as postcard bytes.
///
/// The bytes go to a temporary file in the target directory which is then
/// renamed over `path`, so readers never observe a partial model.
pub fn save_model<P: AsRef<Path>>(path: P, model: &BigramModel) -> Result<()> {
	let path = path.as_ref();
	let parent_dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	fs::create_dir_all(parent_dir)?;

	let bytes = postcard::to_stdvec(&model.to_persistable())?;
	let temp_file = NamedTempFile::new_in(parent_dir)?;
	{
		let mut writer = BufWriter::new(&temp_file);
		writer.write_all(&bytes)?;
		writer.flush()?;
	}
	temp_file.persist(path).map_err(|e| e.error)?;

	info!("saved model ({} words) to {}", model.vocab_size(), path.display());
	Ok(())
}

/// Reads a model written by `save_model`.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<BigramModel> {
	let bytes = fs::read(path)?;
	let data: PersistedModel = postcard::from_bytes(&bytes)?;
	BigramModel::from_persistable(data)
}

fn load_one(language: &str, path: &Path, registry: &mut Registry) -> Result<()> {
	if !path.is_file() {
		return Err(LangIdError::ModelLoad {
			language: language.to_owned(),
			reason: format!("model file not found at {}", path.display()),
		});
	}
	let model = load_model(path).map_err(|e| LangIdError::ModelLoad {
		language: language.to_owned(),
		reason: e.to_string(),
	})?;
	registry.insert(language, model).map_err(|e| LangIdError::ModelLoad {
		language: language.to_owned(),
		reason: e.to_string(),
	})
}

/// Loads one model per `(language, path)` entry, in the given order.
///
/// A missing, corrupt or empty model excludes its language: the failure
/// is logged as a warning and the remaining languages are still loaded.
pub fn load_registry<L, P>(paths: &[(L, P)]) -> RegistryLoad
where
	L: AsRef<str>,
	P: AsRef<Path>,
{
	let mut registry = Registry::new();
	let mut failures = Vec::new();

	for (language, path) in paths {
		let (language, path) = (language.as_ref(), path.as_ref());
		match load_one(language, path, &mut registry) {
			Ok(()) => info!("loaded model for {language} from {}", path.display()),
			Err(e) => {
				warn!("{e}");
				failures.push(e);
			}
		}
	}

	RegistryLoad { registry, failures }
}

/// Loads every model file with the given extension found in `dir`.
///
/// The language label is the file stem. Files are registered in sorted
/// order so that tie-breaking between languages is reproducible.
///
/// # Errors
/// Returns an error only if the directory itself cannot be listed.
pub fn load_registry_dir<P: AsRef<Path>>(dir: P, extension: &str) -> Result<RegistryLoad> {
	let mut paths = Vec::new();
	for path in list_files(dir, extension)? {
		paths.push((get_filename(&path)?, path));
	}
	Ok(load_registry(&paths))
}

/// Saves every model of a registry as `<dir>/<language>.<extension>`.
pub fn save_registry<P: AsRef<Path>>(dir: P, extension: &str, registry: &Registry) -> Result<()> {
	for (language, model) in registry.iter() {
		let mut path = dir.as_ref().join(language);
		path.set_extension(extension);
		save_model(&path, model)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::io::tokenize;
	use crate::model::perplexity::perplexity;

	fn spanish() -> BigramModel {
		BigramModel::train(&tokenize("el gato come el pescado y el perro come la carne"))
	}

	#[test]
	fn save_and_load_keep_scores_identical() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("spanish.bin");
		let model = spanish();
		save_model(&path, &model).unwrap();

		let restored = load_model(&path).unwrap();
		assert_eq!(restored, model);

		let query = tokenize("el perro come el pescado");
		let before = perplexity(&model, &query).unwrap();
		let after = perplexity(&restored, &query).unwrap();
		assert_eq!(before.to_bits(), after.to_bits());
	}

	#[test]
	fn load_registry_skips_missing_and_corrupt() {
		let dir = tempfile::tempdir().unwrap();
		let good = dir.path().join("spanish.bin");
		let corrupt = dir.path().join("german.bin");
		let empty = dir.path().join("latin.bin");
		save_model(&good, &spanish()).unwrap();
		fs::write(&corrupt, [0xff, 0xff, 0xff]).unwrap();
		save_model(&empty, &BigramModel::train::<&str>(&[])).unwrap();

		let load = load_registry(&[
			("Spanish", good),
			("English", dir.path().join("english.bin")),
			("German", corrupt),
			("Latin", empty),
		]);

		assert_eq!(load.registry.languages(), vec!["Spanish"]);
		assert_eq!(load.unavailable(), vec!["English", "German", "Latin"]);
		assert!(load.failures.iter().all(|e| matches!(e, LangIdError::ModelLoad { .. })));
	}

	#[test]
	fn decodable_but_inconsistent_model_is_excluded() {
		let dir = tempfile::tempdir().unwrap();
		let good = dir.path().join("good.bin");
		let bad = dir.path().join("bad.bin");
		save_model(&good, &spanish()).unwrap();

		let mut data = BigramModel::train(&tokenize("a b c")).to_persistable();
		data.bigram_counts.insert("qq".to_owned(), HashMap::from([("zz".to_owned(), 1)]));
		fs::write(&bad, postcard::to_stdvec(&data).unwrap()).unwrap();

		let load = load_registry(&[("Bad", bad), ("Good", good)]);
		assert_eq!(load.registry.languages(), vec!["Good"]);
		assert_eq!(load.unavailable(), vec!["Bad"]);
	}

	#[test]
	fn registry_dir_uses_sorted_file_stems() {
		let dir = tempfile::tempdir().unwrap();
		let mut registry = Registry::new();
		registry.insert("spanish", spanish()).unwrap();
		registry
			.insert("english", BigramModel::train(&tokenize("the cat eats the fish")))
			.unwrap();
		save_registry(dir.path(), "bin", &registry).unwrap();

		let load = load_registry_dir(dir.path(), "bin").unwrap();
		assert!(load.failures.is_empty());
		assert_eq!(load.registry.languages(), vec!["english", "spanish"]);
	}

	#[test]
	fn missing_directory_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(load_registry_dir(dir.path().join("absent"), "bin").is_err());
	}
}
