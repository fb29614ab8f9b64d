//! # Farmgate CLI Module
//!
//! This module implements the CLI interface for farmgate.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show store status
//! - `create-order` - Create a new pending order
//! - `transition` - Move an order along its fulfilment pipeline
//! - `pay` - Move an order's payment status
//! - `review-product` - Approve/reject a product listing
//! - `review-document` - Verify/reject a verification document
//! - `notify` - Push a notification to a recipient
//! - `events` - Print the lifecycle event log
//! - `export` - Export the store to a canonical file
//! - `import` - Import a canonical file into the store
//! - `init` - Initialize a new database

mod commands;

use clap::{Parser, Subcommand};
use farmgate_core::FarmgateError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Farmgate - Marketplace Lifecycle Server
///
/// The authoritative lifecycle service for an agricultural marketplace.
/// Every status transition is validated against one transition-table
/// module; clients never decide legality themselves.
#[derive(Parser, Debug)]
#[command(name = "farmgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the market database
    #[arg(short = 'D', long, global = true, default_value = "farmgate.db")]
    pub database: PathBuf,

    /// Storage backend: "memory" (volatile) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show store status
    Status,

    /// Create a new pending order
    CreateOrder {
        /// Buyer actor id
        #[arg(long)]
        buyer: u64,

        /// Farmer actor id
        #[arg(long)]
        farmer: u64,

        /// Order total in integer cents
        #[arg(long)]
        total_cents: u64,
    },

    /// Move an order along its fulfilment pipeline
    Transition {
        /// Order id
        #[arg(short, long)]
        order: u64,

        /// Target status (pending, confirmed, preparing, shipped,
        /// delivered, completed, cancelled)
        #[arg(short, long)]
        target: String,

        /// Acting party id
        #[arg(short, long)]
        actor: u64,

        /// Acting party role (buyer, farmer, logistics, admin)
        #[arg(short, long)]
        role: String,
    },

    /// Move an order's payment status
    Pay {
        /// Order id
        #[arg(short, long)]
        order: u64,

        /// Target payment status (pending, paid, failed, refunded)
        #[arg(short, long)]
        target: String,

        /// Acting party id
        #[arg(short, long)]
        actor: u64,

        /// Acting party role (buyer, farmer, logistics, admin)
        #[arg(short, long)]
        role: String,
    },

    /// Approve or reject a product listing
    ReviewProduct {
        /// Product id
        #[arg(short, long)]
        product: u64,

        /// Decision: approve or reject
        #[arg(short, long)]
        decision: String,

        /// Acting party id
        #[arg(short, long)]
        actor: u64,

        /// Acting party role (buyer, farmer, logistics, admin)
        #[arg(short, long)]
        role: String,
    },

    /// Verify or reject a verification document
    ReviewDocument {
        /// Document id
        #[arg(long)]
        document: u64,

        /// Decision: verify or reject
        #[arg(short, long)]
        decision: String,

        /// Acting party id
        #[arg(short, long)]
        actor: u64,

        /// Acting party role (buyer, farmer, logistics, admin)
        #[arg(short, long)]
        role: String,
    },

    /// Push a notification to a recipient
    Notify {
        /// Recipient actor id
        #[arg(long)]
        recipient: u64,

        /// Notification body
        #[arg(short, long)]
        body: String,
    },

    /// Print the lifecycle event log
    Events {
        /// Only events with sequence number greater than this
        #[arg(short, long, default_value = "0")]
        since: u64,
    },

    /// Export the store in canonical format
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import the store from canonical format
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), FarmgateError> {
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, backend, &host, port).await
        }
        Some(Commands::Status) => cmd_status(&cli.database, backend, json_mode),
        Some(Commands::CreateOrder {
            buyer,
            farmer,
            total_cents,
        }) => cmd_create_order(&cli.database, backend, json_mode, buyer, farmer, total_cents),
        Some(Commands::Transition {
            order,
            target,
            actor,
            role,
        }) => cmd_transition(
            &cli.database,
            backend,
            json_mode,
            order,
            &target,
            actor,
            &role,
        ),
        Some(Commands::Pay {
            order,
            target,
            actor,
            role,
        }) => cmd_pay(
            &cli.database,
            backend,
            json_mode,
            order,
            &target,
            actor,
            &role,
        ),
        Some(Commands::ReviewProduct {
            product,
            decision,
            actor,
            role,
        }) => cmd_review_product(
            &cli.database,
            backend,
            json_mode,
            product,
            &decision,
            actor,
            &role,
        ),
        Some(Commands::ReviewDocument {
            document,
            decision,
            actor,
            role,
        }) => cmd_review_document(
            &cli.database,
            backend,
            json_mode,
            document,
            &decision,
            actor,
            &role,
        ),
        Some(Commands::Notify { recipient, body }) => {
            cmd_notify(&cli.database, backend, json_mode, recipient, &body)
        }
        Some(Commands::Events { since }) => cmd_events(&cli.database, backend, json_mode, since),
        Some(Commands::Export { output }) => cmd_export(&cli.database, backend, &output),
        Some(Commands::Import { input }) => cmd_import(&cli.database, backend, &input),
        Some(Commands::Init { force }) => cmd_init(&cli.database, backend, force),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, backend, json_mode)
        }
    }
}
