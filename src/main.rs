//! Vector Tile Server - serves an MBTiles archive to web map clients.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vector_tile_server::{
    archive::{ArchiveOptions, ArchiveSummary, MbtilesArchive},
    config::{CheckConfig, Cli, Command, ServeConfig},
    font::GlyphResolver,
    server::{create_router, RouterConfig},
    style::StyleRewriter,
    tile::{TileService, VectorLayerSchema},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let public_url = config.public_url_or_default();

    // Print startup banner and info
    print_banner();

    info!("Configuration:");
    info!("  Archive: {}", config.mbtiles.display());
    info!("  Fonts: {}", config.fonts_dir.display());
    info!("  Style: {}", config.style_file.display());
    match config.public_url {
        Some(ref url) => info!("  Public URL: {}", url),
        None => info!("  Public URL: (from Host header, styles use {})", public_url),
    }
    info!(
        "  Archive access: {} connection(s), {}ms read timeout",
        config.pool_size, config.read_timeout_ms
    );

    // Open the archive; without it there is nothing to serve
    info!("");
    info!("Opening archive...");
    let archive = match MbtilesArchive::open(&config.mbtiles, config.archive_options()).await {
        Ok(archive) => archive,
        Err(e) => {
            error!("  Failed to open archive: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - The path points to an existing .mbtiles file");
            error!("    - The file is a readable SQLite database");
            return ExitCode::FAILURE;
        }
    };

    match archive.inspect().await {
        Ok(summary) => log_archive_summary(&summary),
        Err(e) => warn!("  Could not inspect archive: {}", e),
    }

    // Vector layer schema
    let schema = match config.vector_layers {
        Some(ref path) => match VectorLayerSchema::load(path) {
            Ok(schema) => {
                info!(
                    "  Vector layers: {} ({} from {})",
                    schema.version,
                    schema.layers.len(),
                    path.display()
                );
                schema
            }
            Err(e) => {
                error!("Failed to load vector layers: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => VectorLayerSchema::default(),
    };

    if !config.fonts_dir.is_dir() {
        warn!(
            "  Font directory {} does not exist; glyph requests will return 404",
            config.fonts_dir.display()
        );
    }
    if !config.style_file.is_file() {
        warn!(
            "  Style file {} does not exist; style requests will return 404",
            config.style_file.display()
        );
    }

    // Create services
    let tile_service = TileService::new(archive)
        .with_read_timeout(config.read_timeout())
        .with_layer_schema(schema);
    let glyphs = GlyphResolver::new(&config.fonts_dir).with_read_timeout(config.read_timeout());
    let styles =
        StyleRewriter::new(&config.style_file, &public_url).with_read_timeout(config.read_timeout());

    // Create router
    let router = create_router(tile_service, glyphs, styles, build_router_config(&config));

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/tiles/metadata.json", addr);
    info!("    curl http://{}/fonts/", addr);
    info!("    curl http://{}/styles/osm-bright-local.json", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("██╗   ██╗████████╗███████╗");
    info!("██║   ██║╚══██╔══╝██╔════╝");
    info!("██║   ██║   ██║   ███████╗");
    info!("╚██╗ ██╔╝   ██║   ╚════██║");
    info!(" ╚████╔╝    ██║   ███████║");
    info!("  ╚═══╝     ╚═╝   ╚══════╝");
    info!("");
    info!("  vector-tile-server v{}", version);
}

fn log_archive_summary(summary: &ArchiveSummary) {
    if let Some(name) = summary.metadata.get("name") {
        info!("  Tileset: {}", name);
    }
    info!(
        "  Tiles: {} across zoom levels {:?}",
        summary.tile_count, summary.zoom_levels
    );
    if !summary.is_valid() {
        warn!("  Archive looks incomplete; run `vector-tile-server check` for details");
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "vector_tile_server=debug,tower_http=debug"
    } else {
        "vector_tile_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::default()
        .with_tile_cache_max_age(config.tile_cache_max_age)
        .with_asset_cache_max_age(config.asset_cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref url) = config.public_url {
        router_config = router_config.with_public_url(url.trim_end_matches('/'));
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    // Initialize minimal logging for check command
    if config.verbose {
        init_logging(true);
    }

    println!("Vector Tile Server Archive Check");
    println!("═════════════════════════════════");
    println!();

    print!("Opening {}... ", config.mbtiles.display());

    let archive = match MbtilesArchive::open(&config.mbtiles, ArchiveOptions::default()).await {
        Ok(archive) => {
            println!("✓ opened");
            archive
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let summary = match archive.inspect().await {
        Ok(summary) => summary,
        Err(e) => {
            println!();
            println!("Error inspecting archive: {}", e);
            return ExitCode::FAILURE;
        }
    };
    archive.close().await;

    println!();
    print_check(summary.has_metadata_table, "metadata table");
    print_check(summary.has_tiles_table, "tiles table");

    if !summary.metadata.is_empty() {
        println!();
        println!("Metadata:");
        println!("─────────");
        for (name, value) in summary.metadata.iter() {
            println!("  {}: {}", name, value);
        }
        let (minzoom, maxzoom) = summary.metadata.zoom_range();
        println!("  (zoom range {}-{})", minzoom, maxzoom);
    }

    if summary.has_tiles_table {
        println!();
        println!("Tiles: {}", summary.tile_count);
        println!("Zoom levels: {:?}", summary.zoom_levels);

        if !summary.samples.is_empty() {
            println!();
            println!("Sample tiles (z/x/tms_row):");
            println!("───────────────────────────");
            for sample in &summary.samples {
                println!(
                    "  {}/{}/{}  {} bytes",
                    sample.zoom_level, sample.tile_column, sample.tile_row, sample.size
                );
            }
        }
    }

    println!();
    println!("═════════════════════════════════");

    if summary.is_valid() {
        println!("✓ Archive is servable");
        ExitCode::SUCCESS
    } else {
        if summary.has_tiles_table && summary.tile_count == 0 {
            println!("✗ Archive contains no tiles");
        } else {
            println!("✗ Archive is missing required tables");
        }
        ExitCode::FAILURE
    }
}

fn print_check(ok: bool, label: &str) {
    if ok {
        println!("✓ {}", label);
    } else {
        println!("✗ {} missing", label);
    }
}
