use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use object_scanner::camera::default_capture_device;
use object_scanner::config::DEFAULT_CONFIG_TOML;
use object_scanner::detection::NoRuntimeLoader;
use object_scanner::{ScannerApp, ScannerConfig};

#[derive(Parser, Debug)]
#[command(name = "object-scanner")]
#[command(about = "Live camera stream with on-demand object detection over HTTP")]
#[command(version)]
#[command(long_about = "Streams a camera as MJPEG and, while scanning is enabled, runs object \
detection on every frame, overlays the results and exposes them through a JSON API. \
Falls back to a simulated feed when no camera is available.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "scanner.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the scanner")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Override the HTTP port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Override the capture device index
    #[arg(long, value_name = "INDEX")]
    camera_index: Option<u32>,

    /// Override the model loaded at startup
    #[arg(long, value_name = "NAME")]
    model: Option<String>,
}

impl Args {
    fn apply_overrides(&self, config: &mut ScannerConfig) {
        if let Some(port) = self.port {
            config.stream.port = port;
        }
        if let Some(index) = self.camera_index {
            config.camera.index = index;
        }
        if let Some(model) = &self.model {
            config.detection.model = model.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting object scanner v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match ScannerConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    args.apply_overrides(&mut config);

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut app = ScannerApp::new(config, Arc::new(NoRuntimeLoader), default_capture_device())
        .map_err(|e| {
            error!("Failed to create scanner: {}", e);
            e
        })?;

    app.start().await.map_err(|e| {
        error!("Failed to start scanner: {}", e);
        e
    })?;

    let exit_code = app.run().await.map_err(|e| {
        error!("Scanner error during execution: {}", e);
        e
    })?;

    info!("Object scanner exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("object_scanner={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# Object Scanner Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Any value can be overridden with SCANNER__<SECTION>__<KEY>, e.g. SCANNER__STREAM__PORT=9090");
    println!();
    print!("{}", DEFAULT_CONFIG_TOML);
}
