//! # Farmgate - Marketplace Lifecycle Server
//!
//! The main binary for the farmgate deterministic lifecycle service.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for marketplace operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │              apps/farmgate (THE BINARY)          │
//! │                                                  │
//! │   ┌─────────────┐        ┌─────────────┐         │
//! │   │   CLI       │        │   HTTP API  │         │
//! │   │  (clap)     │        │   (axum)    │         │
//! │   └──────┬──────┘        └──────┬──────┘         │
//! │          │                      │                │
//! │          └──────────┬───────────┘                │
//! │                     ▼                            │
//! │            ┌────────────────┐                    │
//! │            │ farmgate-core  │                    │
//! │            │  (THE POLICY)  │                    │
//! │            └────────────────┘                    │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! farmgate server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! farmgate status
//! farmgate create-order --buyer 10 --farmer 20 --total-cents 4500
//! farmgate transition --order 1 --target confirmed --actor 20 --role farmer
//! ```

use clap::Parser;
use farmgate::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — FARMGATE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("FARMGATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "farmgate=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the farmgate startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗ █████╗ ██████╗ ███╗   ███╗ ██████╗  █████╗ ████████╗███████╗
  ██╔════╝██╔══██╗██╔══██╗████╗ ████║██╔════╝ ██╔══██╗╚══██╔══╝██╔════╝
  █████╗  ███████║██████╔╝██╔████╔██║██║  ███╗███████║   ██║   █████╗
  ██╔══╝  ██╔══██║██╔══██╗██║╚██╔╝██║██║   ██║██╔══██║   ██║   ██╔══╝
  ██║     ██║  ██║██║  ██║██║ ╚═╝ ██║╚██████╔╝██║  ██║   ██║   ███████╗
  ╚═╝     ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝     ╚═╝ ╚═════╝ ╚═╝  ╚═╝   ╚═╝   ╚══════╝

  Marketplace Lifecycle Server v{}

  Deterministic • Role-gated • Auditable
"#,
        env!("CARGO_PKG_VERSION")
    );
}
