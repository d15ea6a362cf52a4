use clap::Parser;
use minutes_core::MinutesConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use minutes_server::{backend, http};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "minutes.toml")]
    config: String,

    /// Validate configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match MinutesConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let completion = match backend::create_backend_from_config(&config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to create completion backend: {} (is GROQ_API_KEY set?)", e);
            std::process::exit(1);
        }
    };

    let upload_dir = match backend::prepare_upload_dir(&config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to prepare upload directory: {}", e);
            std::process::exit(1);
        }
    };

    if args.check {
        println!("✅ Completion backend: {} ({})", completion.name(), config.completion.model);
        println!("✅ Upload directory:   {}", upload_dir.display());
        println!("✅ Listen address:     {}", config.bind_addr());
        println!("✅ Minutes config check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    http::start_http_server(config, completion, tx.subscribe()).await?;

    Ok(())
}
