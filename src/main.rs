//! # MenúFácil CLI
//!
//! Command-line interface for QR code export and the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! # Export a QR code as PNG into the current directory
//! menufacil export --url https://menufacil.app/menu/42 --name "Table 5"
//!
//! # Table-pinned menu URL built from a menu id
//! menufacil export --menu-id 42 --table 5 --name "Table 5" --format svg
//!
//! # Same, with the public origin taken from a config file
//! menufacil export --menu-id 42 --name "Patio" --config menufacil.toml
//!
//! # Printable PDF sheet with custom colors into ./out
//! menufacil export --url https://menufacil.app/menu/42 --name "Patio" \
//!     --format pdf --fg "#1b4332" --bg "#f1faee" --out out
//!
//! # Serve the HTTP API
//! menufacil serve --config menufacil.toml --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use menufacil::{
    MenuFacilError,
    config::AppConfig,
    export::{DirectorySink, EXPORT_SIZE, Exporter},
    model::ExportFormat,
    payload::{QrPayloadBuilder, menu_url},
    server::{self, ServerConfig},
};

/// MenúFácil - QR codes for digital menus
#[derive(Parser, Debug)]
#[command(name = "menufacil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a single QR code to a file
    Export {
        /// Target URL encoded in the code
        #[arg(long, required_unless_present = "menu_id", conflicts_with = "menu_id")]
        url: Option<String>,

        /// Menu id; the URL is built from the public base URL
        #[arg(long)]
        menu_id: Option<String>,

        /// Table number appended to a menu URL
        #[arg(long, requires = "menu_id")]
        table: Option<u32>,

        /// Public origin for menu URLs (overrides the config file)
        #[arg(long, requires = "menu_id")]
        base_url: Option<String>,

        /// TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Display name (also used for the filename)
        #[arg(long)]
        name: String,

        /// Output format: png, svg or pdf
        #[arg(long, default_value = "png")]
        format: ExportFormat,

        /// Foreground (module) color
        #[arg(long)]
        fg: Option<String>,

        /// Background color
        #[arg(long)]
        bg: Option<String>,

        /// Quiet zone in modules
        #[arg(long)]
        margin: Option<u32>,

        /// Module corner radius (0.0 - 0.5)
        #[arg(long)]
        corner_radius: Option<f32>,

        /// Logo URL or path drawn at the center
        #[arg(long)]
        logo: Option<String>,

        /// Canvas size in pixels for PNG and PDF
        #[arg(long, default_value_t = EXPORT_SIZE)]
        size: u32,

        /// Output directory
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },

    /// Run the HTTP API
    Serve {
        /// TOML configuration file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Listen address (overrides the config file)
        #[arg(long)]
        listen: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("menufacil=info,tower_http=info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), MenuFacilError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            url,
            menu_id,
            table,
            base_url,
            config,
            name,
            format,
            fg,
            bg,
            margin,
            corner_radius,
            logo,
            size,
            out,
        } => {
            let url = match (url, menu_id) {
                (Some(url), _) => url,
                (None, Some(menu_id)) => match base_url {
                    Some(base_url) => menu_url(&base_url, &menu_id, table),
                    None => AppConfig::load_or_default(config.as_deref())?
                        .export
                        .menu_url(&menu_id, table),
                },
                (None, None) => {
                    return Err(MenuFacilError::InvalidPayload(
                        "either --url or --menu-id is required".to_string(),
                    ));
                }
            };

            let mut builder = QrPayloadBuilder::new(name, url);
            if let Some(fg) = fg {
                builder = builder.foreground(fg);
            }
            if let Some(bg) = bg {
                builder = builder.background(bg);
            }
            if let Some(margin) = margin {
                builder = builder.margin(margin);
            }
            if let Some(radius) = corner_radius {
                builder = builder.corner_radius(radius);
            }
            if let Some(logo) = logo {
                builder = builder.logo(logo);
            }
            let payload = builder.build()?;

            let sink = DirectorySink::new(out);
            let artifact = Exporter::new()
                .with_canvas_size(size)
                .export_to(&payload.export_request(format), &sink)?;
            println!("Saved to {}", sink.path_for(&artifact).display());
        }

        Commands::Serve { config, listen } => {
            let app_config = AppConfig::load_or_default(config.as_deref())?;
            let store = app_config.store.build()?;

            let mut server_config = ServerConfig::from(&app_config);
            if let Some(listen) = listen {
                server_config.listen_addr = listen;
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(server_config, store))?;
        }
    }

    Ok(())
}
