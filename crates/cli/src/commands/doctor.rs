//! `campanion doctor`: Diagnose configuration and connectivity.

use campanion_config::AppConfig;
use std::path::Path;

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Campanion Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = super::config_path(explicit);
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file — using defaults (run `campanion onboard`)");
        issues += 1;
    }

    let config = match super::load_config(explicit) {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    match config.validate() {
        Ok(()) => println!("  ✅ Config valid"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    // Check API key
    if config.has_api_key() || campanion_providers::router::is_local(&config.default_provider) {
        println!("  ✅ API key configured for {}", config.default_provider);
    } else {
        println!("  ⚠️  No API key configured — set GROQ_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    issues += check_providers(&config).await;
    issues += check_store(&config).await;

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

async fn check_providers(config: &AppConfig) -> usize {
    let router = campanion_providers::router::build_from_config(config);
    let mut issues = 0;

    for (role, provider) in [("Completion", router.default()), ("Embedding", router.embedder())] {
        let Some(provider) = provider else {
            println!("  ❌ {role} provider missing");
            issues += 1;
            continue;
        };
        match provider.health_check().await {
            Ok(true) => println!("  ✅ {role} provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ⚠️  {role} provider '{}' responded with an error", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ {role} provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        }
    }

    issues
}

async fn check_store(config: &AppConfig) -> usize {
    let store = match campanion_store::build_from_config(config) {
        Ok(store) => store,
        Err(e) => {
            println!("  ❌ Vector store: {e}");
            return 1;
        }
    };

    match store.health_check().await {
        Ok(true) => {
            println!("  ✅ Vector store '{}' reachable", store.name());
            println!("     Collections: {}", config.collection_names().join(", "));
            0
        }
        Ok(false) => {
            println!("  ⚠️  Vector store '{}' reported unhealthy", store.name());
            1
        }
        Err(e) => {
            println!("  ❌ Vector store '{}' unreachable: {e}", store.name());
            1
        }
    }
}
