use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LangIdError>;

/// Every failure the language identification core can surface.
#[derive(Error, Debug)]
pub enum LangIdError {
	/// Perplexity needs at least one adjacent pair of tokens.
	#[error("at least two tokens are required, got {got}")]
	InsufficientInput { got: usize },

	/// The model has no vocabulary, so none of the probability tiers is defined.
	#[error("empty model: vocabulary size is 0")]
	EmptyModel,

	/// A language could not be supplied by the persistence layer.
	#[error("failed to load model for '{language}': {reason}")]
	ModelLoad { language: String, reason: String },

	/// Persisted data decoded fine but violates the model invariants.
	#[error("corrupt model data: {0}")]
	CorruptModel(String),

	/// A language label was registered twice.
	#[error("language '{0}' is already registered")]
	DuplicateLanguage(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("codec error: {0}")]
	Codec(#[from] postcard::Error),

	/// Configuration file exists but cannot be used.
	#[error("configuration error: {0}")]
	Config(String),
}
