//! `parley config` — Configuration management commands.

use std::path::PathBuf;

use parley_config::AppConfig;

const REDACTED: &str = "[REDACTED]";

fn config_path() -> PathBuf {
    AppConfig::config_dir().join("config.toml")
}

/// Write the default config file unless one already exists.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if path.exists() {
        println!("⚠️  Config already exists at {}", path.display());
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("✅ Wrote default config to {}", path.display());
    println!();
    println!("   Credentials are read from the environment (or a .env file):");
    println!("     GOOGLE_API_KEY     generation (Gemini)");
    println!("     PINECONE_API_KEY   book search for the muse persona");
    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

pub fn path() {
    println!("{}", config_path().display());
}

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let mut warnings = Vec::new();
    if let Err(e) = config.require_generation_key() {
        warnings.push(e.to_string());
    }
    if let Err(e) = config.require_retrieval_key() {
        warnings.push(format!("{e} (only needed by the muse persona)"));
    }

    if warnings.is_empty() {
        println!("   ✅ All credentials present");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Provider:     {}", config.generation.provider);
    println!(
        "   Model:        {}",
        config.generation.model.as_deref().unwrap_or("(persona default)")
    );
    println!("   Index:        {}", config.retrieval.index_name);
    println!("   Embeddings:   {}", config.retrieval.embedding.api_url);
    println!("   Iterations:   {}", config.agent.max_iterations);
    Ok(())
}

/// Replace every secret with a placeholder before printing.
fn redacted(mut config: AppConfig) -> AppConfig {
    for key in [
        &mut config.generation.api_key,
        &mut config.retrieval.api_key,
        &mut config.retrieval.embedding.api_key,
    ] {
        if key.is_some() {
            *key = Some(REDACTED.into());
        }
    }
    config
}
