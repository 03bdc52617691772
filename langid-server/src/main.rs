use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use log::{error, info, warn};

use serde::{Deserialize, Serialize};
use langid_core::config::{LangIdConfig, load_config};
use langid_core::io::tokenize;
use langid_core::persistence::load_registry_dir;
use langid_core::{Classifier, Identification, LangIdError};

const DEFAULT_CONFIG_PATH: &str = "langid.json";

/// Query parameters for the `/v1/identify` endpoint
#[derive(Deserialize)]
struct IdentifyParams {
	text: Option<String>
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct LanguageScore {
	language: String,
	perplexity: f64
}

/// JSON body of a successful identification, perplexities ranked ascending
#[derive(Serialize, Deserialize, Debug)]
struct IdentifyResponse {
	language: String,
	perplexities: Vec<LanguageScore>
}

/// State shared by every worker.
///
/// Loaded once at startup and never mutated, so no lock is needed.
struct SharedData {
	classifier: Classifier,
	unavailable: Vec<String>
}

/// HTTP GET endpoint `/v1/identify`
///
/// Tokenizes `text` on whitespace and returns the identified language with
/// the ranked perplexity table.
#[get("/v1/identify")]
async fn get_identify(data: web::Data<SharedData>, query: web::Query<IdentifyParams>) -> impl Responder {
	let text = match &query.text {
		Some(s) if !s.trim().is_empty() => s,
		_ => return HttpResponse::BadRequest().body("Missing or empty text")
	};
	let tokens = tokenize(text);

	match data.classifier.identify(&tokens) {
		Ok(Identification::Identified(scores)) => {
			let perplexities = scores
				.ranked()
				.into_iter()
				.map(|(language, perplexity)| LanguageScore { language: language.to_owned(), perplexity })
				.collect();
			HttpResponse::Ok().json(IdentifyResponse { language: scores.language.clone(), perplexities })
		}
		Ok(Identification::NoModels) => HttpResponse::ServiceUnavailable().body("No models available"),
		Err(e @ LangIdError::InsufficientInput { .. }) => HttpResponse::BadRequest().body(e.to_string()),
		Err(e) => {
			error!("identification failed: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

#[get("/v1/languages")]
async fn get_languages(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().body(data.classifier.languages().join("\n"))
}

#[get("/v1/unavailable")]
async fn get_unavailable(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().body(data.unavailable.join("\n"))
}

fn load_shared_data(config: &LangIdConfig) -> std::io::Result<SharedData> {
	let load = load_registry_dir(&config.model_dir, &config.model_extension)
		.map_err(|e| std::io::Error::other(e.to_string()))?;
	let unavailable = load.unavailable();
	if load.registry.is_empty() {
		warn!("no model loaded from {}", config.model_dir.display());
	}
	Ok(SharedData { classifier: Classifier::new(load.registry, config), unavailable })
}

/// Main entry point for the server.
///
/// Loads every model of the configured model directory, shares the
/// classifier read-only between workers and starts an Actix-web server.
///
/// # Notes
/// - The configuration path is the first argument, `langid.json` by default.
/// - Languages whose model fails to load are listed by `/v1/unavailable`.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
	let config = load_config(&config_path).map_err(|e| std::io::Error::other(e.to_string()))?;

	let shared_data = web::Data::new(load_shared_data(&config)?);
	info!(
		"serving {} languages on {}:{}",
		shared_data.classifier.languages().len(),
		config.server.host,
		config.server.port
	);

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET"]))
			.app_data(shared_data.clone())
			.service(get_identify)
			.service(get_languages)
			.service(get_unavailable)
	})
		.bind((config.server.host.as_str(), config.server.port))?
		.run()
		.await
}
