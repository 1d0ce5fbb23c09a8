//! `parley chat` — Interactive or single-message conversation with a persona.

use std::sync::Arc;
use std::time::Duration;

use parley_agent::{ConversationDriver, ConversationEnd, Persona, TurnProcessor};
use parley_config::AppConfig;
use parley_core::capability::CapabilityRegistry;
use parley_core::event::EventBus;
use parley_core::message::SessionKey;
use parley_memory::{PineconeIndex, ProviderEmbedder, SessionStore};
use tokio::io::BufReader;
use tracing::{debug, info};

pub async fn run(
    persona: Persona,
    session: String,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Credentials are checked before anything touches the network
    if let Err(e) = config.require_generation_key() {
        return Err(missing_credential(&e.to_string()));
    }
    if persona.uses_book_search
        && let Err(e) = config.require_retrieval_key()
    {
        return Err(missing_credential(&e.to_string()));
    }

    let provider = parley_providers::build_provider(&config)?;
    let registry = if persona.uses_book_search {
        book_registry(&config).await?
    } else {
        CapabilityRegistry::new()
    };

    let model = config
        .generation
        .model
        .clone()
        .unwrap_or_else(|| persona.default_model.to_string());
    let temperature = config
        .generation
        .temperature
        .unwrap_or(persona.default_temperature);

    info!(
        persona = %persona.kind,
        provider = provider.name(),
        model = %model,
        capabilities = registry.len(),
        "Starting conversation"
    );

    let mut processor = TurnProcessor::new(
        provider,
        model,
        temperature,
        persona.system_prompt,
        Arc::new(registry),
        Arc::new(SessionStore::new()),
        Arc::new(EventBus::default()),
    )
    .with_max_iterations(config.agent.max_iterations)
    .with_call_timeout(Duration::from_secs(config.agent.call_timeout_secs))
    .with_history_window(config.agent.history_window);
    if let Some(max) = config.generation.max_tokens {
        processor = processor.with_max_tokens(max);
    }

    let driver = ConversationDriver::new(
        Arc::new(processor),
        persona,
        SessionKey::from(session),
    );
    let mut stdout = tokio::io::stdout();

    if let Some(msg) = message {
        if !driver.single_turn(&msg, &mut stdout).await? {
            return Err("The turn failed. See above for details.".into());
        }
        return Ok(());
    }

    let end = driver
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await?;
    match end {
        ConversationEnd::Exit(reason) => debug!(?reason, "Conversation closed by exit"),
        ConversationEnd::EndOfInput => debug!("Conversation closed by end of input"),
    }

    Ok(())
}

/// Connect to the book index and build the search registry.
///
/// A missing index is fatal: the persona cannot do its job without it.
async fn book_registry(config: &AppConfig) -> Result<CapabilityRegistry, Box<dyn std::error::Error>> {
    let retrieval = &config.retrieval;
    let embedder = Arc::new(ProviderEmbedder::new(
        parley_providers::build_embedding_provider(config),
        retrieval.embedding.model.clone(),
    ));

    let api_key = retrieval.api_key.clone().unwrap_or_default();
    let index = match PineconeIndex::connect(
        api_key,
        &retrieval.control_url,
        retrieval.index_name.clone(),
        embedder,
    )
    .await
    {
        Ok(index) => index,
        Err(e) => {
            eprintln!("❌ {e}");
            return Err(format!("Could not open index '{}'", retrieval.index_name).into());
        }
    };

    Ok(parley_tools::creative_registry(
        Arc::new(index),
        retrieval.top_k,
    )?)
}

fn missing_credential(message: &str) -> Box<dyn std::error::Error> {
    eprintln!();
    eprintln!("  ❌ {message}");
    eprintln!();
    eprintln!("  Set it in your shell, a .env file, or the config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    "Missing credentials. See above for setup instructions.".into()
}
