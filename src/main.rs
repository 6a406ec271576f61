//! # Roomdesk CLI (`rooms`)
//!
//! The `rooms` binary browses the room catalog, adds rooms, and talks to the
//! catalog assistant.
//!
//! ## Usage
//!
//! ```bash
//! rooms --config ./config/rooms.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rooms list` | Fetch one page of rooms |
//! | `rooms add` | Fill the add-room form and submit it |
//! | `rooms ask "<message>"` | One chat turn with the assistant |
//! | `rooms shell` | Interactive console with all three flows |
//!
//! ## Examples
//!
//! ```bash
//! # Second page, five rooms per page
//! rooms list --page 1 --page-size 5
//!
//! # Add a booked room with a picture
//! rooms add --room-number 204 --title "Garden suite" \
//!     --description "Ground floor, garden access" --room-size 32.5 \
//!     --image-url https://img.example.com/204.jpg --booked
//!
//! # Ask the assistant
//! rooms ask "Which rooms are larger than 30 square meters?"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use roomdesk::config;
use roomdesk::http::HttpBackend;
use roomdesk::status::StatusMode;
use roomdesk::submit::RoomInput;
use roomdesk::{chat, feed, shell, submit};
use roomdesk_core::backend::CatalogBackend;
use tracing_subscriber::EnvFilter;

/// Roomdesk CLI: browse, add and ask about rooms in the catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/rooms.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "rooms",
    about = "Roomdesk: a terminal client for the room catalog",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rooms.toml`. A missing file is fine as long as
    /// the backend URL is given another way.
    #[arg(long, global = true, default_value = "./config/rooms.toml")]
    config: PathBuf,

    /// Catalog service base URL. Overrides `backend.base_url`.
    #[arg(long, global = true, env = "ROOMS_BACKEND_URL")]
    backend_url: Option<String>,

    /// Log at debug level (outgoing requests and payloads) on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Busy indicators on stderr: `human`, `json` or `off`.
    ///
    /// Defaults to `human` when stderr is a terminal, `off` otherwise.
    #[arg(long, global = true)]
    status: Option<StatusMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of the catalog and print it as room cards.
    List {
        /// Zero-based page number.
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Records per page. Defaults to `feed.page_size`.
        #[arg(long)]
        page_size: Option<u32>,

        /// Print the records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a room.
    ///
    /// Values are validated before anything is sent: room number, title and
    /// description are required, the size must not be negative, and an image
    /// URL must be an absolute http(s) URL.
    Add {
        #[arg(long)]
        room_number: String,

        /// Title shown on the room card.
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Size in square meters.
        #[arg(long, default_value = "")]
        room_size: String,

        #[arg(long)]
        image_url: Option<String>,

        /// Mark the room as booked.
        #[arg(long)]
        booked: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Send one message to the catalog assistant and print its reply.
    Ask {
        /// The message. Leading and trailing whitespace is ignored.
        message: String,
    },

    /// Interactive console: paging, the add-room form and chat at once.
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::resolve_config(&cli.config, cli.backend_url.as_deref())?;
    let backend: Arc<dyn CatalogBackend> = Arc::new(HttpBackend::new(&cfg.backend)?);
    let reporter = cli
        .status
        .unwrap_or_else(StatusMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::List {
            page,
            page_size,
            json,
        } => {
            feed::run_list(&cfg, backend, page, page_size, json, reporter.as_ref()).await?;
        }
        Commands::Add {
            room_number,
            title,
            description,
            room_size,
            image_url,
            booked,
            json,
        } => {
            let input = RoomInput {
                room_number,
                title,
                description,
                room_size,
                image_url,
                booked,
            };
            submit::run_add(&cfg, backend, input, json, reporter.as_ref()).await?;
        }
        Commands::Ask { message } => {
            chat::run_ask(&cfg, backend, &message, reporter.as_ref()).await?;
        }
        Commands::Shell => {
            shell::run_shell(&cfg, backend).await?;
        }
    }

    Ok(())
}
