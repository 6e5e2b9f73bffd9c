use anyhow::{Context, Result};
use grammar_relay::config::Config;
use grammar_relay::{logging, server};
use std::path::PathBuf;

fn print_help() {
    println!("Grammar Relay - forwards text to GrammarBot and relays the result");
    println!();
    println!("Usage:");
    println!("  grammar-relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>      - Load configuration from PATH");
    println!("  --generate-config    - Print a commented default config and exit");
    println!("  --help, -h           - Show this help");
    println!();
    println!("Endpoints:");
    println!("  POST /geterror       - body {{\"text\": \"...\"}}, returns the check result");
    println!("  GET  /health         - liveness probe");
    println!();
    println!("Environment (also read from .env):");
    println!("  GRAMMAR_RELAY_HOST, GRAMMAR_RELAY_PORT (or PORT), GRAMMARBOT_API_KEY,");
    println!("  GRAMMARBOT_BASE_URL, GRAMMARBOT_LANGUAGE, GRAMMARBOT_TIMEOUT_SECS,");
    println!("  GRAMMAR_RELAY_ERROR_MODE, RUST_LOG");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config_path: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--generate-config" => {
                print!("{}", Config::create_default_with_comments());
                return Ok(());
            }
            "--config" => {
                let path = iter
                    .next()
                    .context("--config requires a path argument")?;
                config_path = Some(PathBuf::from(path));
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                std::process::exit(2);
            }
        }
    }

    dotenv::dotenv().ok();

    // Tracing must be up before env overrides, which log their warnings.
    let config = Config::load_file_or_default(config_path.as_deref())?;
    logging::init_tracing(&config.logging)?;
    let config = config.finish_with_env()?;

    server::serve(&config).await
}
