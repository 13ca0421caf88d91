//! `campanion serve`: Start the HTTP API server.

use std::path::Path;

pub async fn run(
    explicit: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(explicit)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🎓 Campanion Gateway");
    println!("   Listening:    {}:{}", config.gateway.host, config.gateway.port);
    println!("   Vector store: {} ({})", config.vector_store.backend, config.vector_store.url);

    campanion_gateway::start(config).await?;

    Ok(())
}
