use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{LangIdError, Result};

/// Runtime configuration shared by the trainer, the classifier and the server.
///
/// Every field has a serde default, so a partial (or empty) JSON object is valid.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LangIdConfig {
	/// Directory holding persisted models, one file per language.
	#[serde(default = "default_model_dir")]
	pub model_dir: PathBuf,
	/// Extension of persisted model files.
	#[serde(default = "default_model_extension")]
	pub model_extension: String,
	/// Directory holding training corpora, one file per language.
	#[serde(default = "default_corpus_dir")]
	pub corpus_dir: PathBuf,
	/// Extension of corpus files.
	#[serde(default = "default_corpus_extension")]
	pub corpus_extension: String,
	/// Score languages on scoped threads instead of sequentially.
	#[serde(default = "default_parallel_scoring")]
	pub parallel_scoring: bool,
	/// Corpora with fewer tokens are trained in a single pass.
	#[serde(default = "default_min_parallel_tokens")]
	pub min_parallel_tokens: usize,
	#[serde(default)]
	pub server: ServerConfig,
}

/// Bind address of the HTTP service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
}

fn default_model_dir() -> PathBuf {
	PathBuf::from("./models")
}

fn default_model_extension() -> String {
	"bin".to_owned()
}

fn default_corpus_dir() -> PathBuf {
	PathBuf::from("./data")
}

fn default_corpus_extension() -> String {
	"txt".to_owned()
}

fn default_parallel_scoring() -> bool {
	true
}

fn default_min_parallel_tokens() -> usize {
	100_000
}

fn default_host() -> String {
	"127.0.0.1".to_owned()
}

fn default_port() -> u16 {
	5000
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { host: default_host(), port: default_port() }
	}
}

impl Default for LangIdConfig {
	fn default() -> Self {
		Self {
			model_dir: default_model_dir(),
			model_extension: default_model_extension(),
			corpus_dir: default_corpus_dir(),
			corpus_extension: default_corpus_extension(),
			parallel_scoring: default_parallel_scoring(),
			min_parallel_tokens: default_min_parallel_tokens(),
			server: ServerConfig::default(),
		}
	}
}

/// Loads the configuration file, or the defaults if the file does not exist.
///
/// # Errors
/// Returns `LangIdError::Config` if the file exists but is not valid JSON
/// for this structure.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<LangIdConfig> {
	let path = path.as_ref();
	if !path.exists() {
		info!("no configuration at {}, using defaults", path.display());
		return Ok(LangIdConfig::default());
	}
	let content = fs::read_to_string(path)?;
	serde_json::from_str(&content)
		.map_err(|e| LangIdError::Config(format!("{}: {e}", path.display())))
}

/// Writes the configuration as pretty JSON, creating parent directories.
pub fn save_config<P: AsRef<Path>>(path: P, config: &LangIdConfig) -> Result<()> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	let json = serde_json::to_string_pretty(config)
		.map_err(|e| LangIdError::Config(e.to_string()))?;
	fs::write(path, json)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_fields_use_defaults() {
		let config: LangIdConfig = serde_json::from_str(r#"{"parallel_scoring": false}"#).unwrap();
		assert!(!config.parallel_scoring);
		assert_eq!(config.model_extension, "bin");
		assert_eq!(config.server.port, 5000);
	}

	#[test]
	fn missing_file_is_default() {
		let dir = tempfile::tempdir().unwrap();
		let config = load_config(dir.path().join("absent.json")).unwrap();
		assert_eq!(config, LangIdConfig::default());
	}

	#[test]
	fn invalid_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("langid.json");
		fs::write(&path, "{ not json").unwrap();
		assert!(matches!(load_config(&path), Err(LangIdError::Config(_))));
	}

	#[test]
	fn save_then_load() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("conf").join("langid.json");
		let mut config = LangIdConfig::default();
		config.server.port = 8080;
		config.model_dir = PathBuf::from("/srv/models");
		save_config(&path, &config).unwrap();
		assert_eq!(load_config(&path).unwrap(), config);
	}
}
