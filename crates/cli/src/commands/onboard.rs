//! `campanion onboard`: First-time setup.

use campanion_config::AppConfig;
use std::path::Path;

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_path(explicit);

    println!("🎓 Campanion — First-Time Setup");
    println!("===============================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        } else {
            println!("  Config directory exists: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set GROQ_API_KEY (or add api_key to {})", config_path.display());
    println!("   2. Point [vector_store] at your Qdrant instance (default http://localhost:6333)");
    println!("   3. Run: campanion doctor");
    println!("   4. Run: campanion chat\n");

    Ok(())
}
