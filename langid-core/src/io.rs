use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, io};

use flate2::read::GzDecoder;

/// Extension of gzip-compressed corpora, e.g. `english.txt.gz`.
pub const GZIP_EXTENSION: &str = "gz";

fn is_gzip(path: &Path) -> bool {
	path.extension() == Some(OsStr::new(GZIP_EXTENSION))
}

/// Splits a text into whitespace-delimited tokens.
///
/// - Token order is preserved
/// - No case folding or punctuation handling is applied
pub fn tokenize(text: &str) -> Vec<String> {
	text.split_whitespace().map(str::to_owned).collect()
}

/// Tokenizes every line and concatenates the results into one flat sequence.
///
/// Line boundaries are not markers: the last token of a line and the first
/// token of the next line form an ordinary adjacent pair.
pub fn tokenize_lines<I, S>(lines: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut tokens = Vec::new();
	for line in lines {
		tokens.extend(line.as_ref().split_whitespace().map(str::to_owned));
	}
	tokens
}

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory, decompressing `.gz` files
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let path = filename.as_ref();
	let mut contents = String::new();
	let mut file = File::open(path)?;
	if is_gzip(path) {
		GzDecoder::new(file).read_to_string(&mut contents)?;
	} else {
		file.read_to_string(&mut contents)?;
	}
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Reads a UTF-8 corpus file into a flat token sequence.
pub fn read_corpus<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	Ok(tokenize_lines(read_file(filename)?))
}

/// Builds an output path based on an input path and a new extension.
///
/// A `.gz` suffix is dropped together with the extension it wraps.
///
/// Examples:
/// - `data/english.txt` + `"bin"` → `data/english.bin`
/// - `data/english.txt.gz` + `"bin"` → `data/english.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let mut file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;
	if is_gzip(input_path) {
		if let Some(inner) = Path::new(file_stem).file_stem() {
			file_stem = inner;
		}
	}

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./models/french.bin"` → `"french"`
/// - `"french.bin"` → `"french"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Language label of a corpus file: its name without `.<extension>` or
/// `.<extension>.gz`.
///
/// Returns `None` if the file has neither suffix.
pub fn corpus_language<P: AsRef<Path>>(path: P, extension: &str) -> Option<String> {
	let name = path.as_ref().file_name()?.to_str()?;
	let name = name.strip_suffix(".gz").unwrap_or(name);
	let label = name.strip_suffix(extension)?.strip_suffix('.')?;
	(!label.is_empty()).then(|| label.to_owned())
}

/// Lists `(language, path)` for every corpus file in a directory,
/// plain or gzipped, sorted by language.
pub fn list_corpora<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<(String, PathBuf)>> {
	let mut corpora = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if !path.is_file() {
			continue;
		}
		if let Some(language) = corpus_language(&path, extension) {
			corpora.push((language, path));
		}
	}

	corpora.sort();
	Ok(corpora)
}

/// Lists all files with a given extension in a directory.
///
/// Returns full paths, sorted so that callers see a stable order.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
			files.push(path);
		}
	}

	files.sort();
	Ok(files)
}
