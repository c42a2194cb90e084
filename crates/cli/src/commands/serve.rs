//! `kubeclaw serve`: Start the HTTP query server.

use std::sync::Arc;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;
    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    super::require_api_key(&config)?;

    let orchestrator = Arc::new(super::build_orchestrator(&config)?);

    println!("KubeClaw Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.default_provider, config.default_model);
    println!("   Backend:   {}", config.backend.base_url);

    kubeclaw_gateway::start(config, orchestrator).await?;

    Ok(())
}
