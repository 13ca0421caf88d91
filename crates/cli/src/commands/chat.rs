//! `campanion chat`: Interactive or single-message chat mode.

use campanion_pipeline::{Chatbot, Session};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::{self, AsyncBufReadExt, BufReader};

pub async fn run(
    explicit: Option<&Path>,
    message: Option<String>,
    no_stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(explicit)?;

    // Check for an API key early to give a clear error
    let provider_key = config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.api_key.as_ref());
    if !config.has_api_key()
        && provider_key.is_none()
        && !campanion_providers::router::is_local(&config.default_provider)
    {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GROQ_API_KEY=gsk_...        (default provider)");
        eprintln!("    export OPENAI_API_KEY=sk-...       (with CAMPANION_PROVIDER=openai)");
        eprintln!("    export CAMPANION_API_KEY=...       (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", super::config_path(explicit).display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let chatbot = Chatbot::from_config(&config)?;
    let delay = if no_stream {
        Duration::ZERO
    } else {
        Duration::from_millis(config.chat.stream_delay_ms)
    };
    let mut session = Session::new();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let turn = chatbot.turn(&mut session, &msg).await;
        eprint!("\r              \r");
        print_paced(&turn.answer.text, delay).await?;
        println!();
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Campanion — your campus companion     ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Collections:  {}", config.collection_names().join(", "));
    println!();
    println!("  Ask about courses, interviews, campus culture or social life.");
    println!("  Type '/reset' to start over, 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }
        if line == "/reset" {
            session.reset();
            println!("  Conversation cleared.");
            println!();
            continue;
        }

        eprint!("  ...");
        let turn = chatbot.turn(&mut session, line).await;
        eprint!("\r     \r");

        println!();
        print!("  Campanion > ");
        print_paced(&turn.answer.text, delay).await?;
        println!();
        if turn.degraded {
            eprintln!("  (some sources were unavailable for this answer)");
        }
        println!();
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// The pieces an answer is printed in: each word with its trailing whitespace.
fn paced_words(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(char::is_whitespace)
}

/// Print `text` a word at a time, sleeping `delay` between words.
async fn print_paced(text: &str, delay: Duration) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    if delay.is_zero() {
        write!(stdout, "{text}")?;
        return stdout.flush();
    }

    for word in paced_words(text) {
        write!(stdout, "{word}")?;
        stdout.flush()?;
        tokio::time::sleep(delay).await;
    }
    Ok(())
}
