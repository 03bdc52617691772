use langid_core::config::load_config;
use langid_core::io::tokenize;
use langid_core::{Classifier, Identification, LangIdError, Trainer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Missing configuration file means defaults: corpora in ./data, models in ./models
    let config = load_config("langid.json")?;

    // Train one model per ./data/<language>.txt corpus
    // Load automatically ./models/<language>.bin if existing
    let trainer = Trainer::new(&config);
    let load = trainer.train_directory(&config.corpus_dir, &config.model_dir)?;
    for language in load.unavailable() {
        println!("No usable model for '{}'", language);
    }

    let classifier = Classifier::new(load.registry, &config);
    println!("Loaded languages: {}", classifier.languages().join(", "));

    let samples = [
        "the weather is nice today and we are going to the beach",
        "el tiempo es bueno hoy y vamos a la playa",
        "il fait beau aujourd'hui et nous allons à la plage",
        "das Wetter ist heute schön und wir gehen an den Strand",
        "hello",
    ];

    for sample in samples {
        println!("\n> {}", sample);
        match classifier.identify(&tokenize(sample)) {
            Ok(Identification::Identified(scores)) => {
                println!("Identified language: {}", scores.language);
                for (language, perplexity) in scores.ranked() {
                    println!("  {}: {:.4}", language, perplexity);
                }
            }
            Ok(Identification::NoModels) => {
                println!("No models available, put corpora in '{}'", config.corpus_dir.display());
                break;
            }
            // Single words cannot be scored, ask for more text
            Err(e @ LangIdError::InsufficientInput { .. }) => println!("Skipped: {}", e),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
