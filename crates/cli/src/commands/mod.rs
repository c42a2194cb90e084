pub mod chat;
pub mod config_cmd;
pub mod serve;
pub mod tools;

use kubeclaw_agent::Orchestrator;
use kubeclaw_config::AppConfig;
use kubeclaw_core::event::EventBus;
use kubeclaw_sessions::InMemorySessionStore;
use kubeclaw_tools::BackendClient;
use std::sync::Arc;
use tracing::info;

/// Providers that run without an API key.
const LOCAL_PROVIDERS: [&str; 2] = ["ollama", "vllm"];

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Fail early with setup instructions when no API key is configured.
pub fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.has_api_key() || LOCAL_PROVIDERS.contains(&config.default_provider.as_str()) {
        return Ok(());
    }
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    DASHSCOPE_API_KEY=sk-...   (default provider)");
    eprintln!("    OPENAI_API_KEY=sk-...      (with KUBECLAW_PROVIDER=openai)");
    eprintln!("    KUBECLAW_API_KEY=sk-...    (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Wire provider, backend tools, and session store into one orchestrator.
pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let router = kubeclaw_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;

    let backend = Arc::new(BackendClient::from_config(&config.backend));
    let catalog = Arc::new(kubeclaw_tools::default_catalog(
        backend,
        provider.clone(),
        &config.default_model,
    ));

    let sessions = Arc::new(
        InMemorySessionStore::new(&config.agent.persona)
            .with_idle_timeout(config.agent.session_idle_timeout()),
    );

    info!(
        provider = %config.default_provider,
        model = %config.default_model,
        backend = %config.backend.base_url,
        tools = catalog.len(),
        "Orchestrator ready"
    );

    Ok(Orchestrator::new(
        provider,
        &config.default_model,
        catalog,
        sessions,
        Arc::new(EventBus::default()),
    )
    .with_config(config))
}
