use anyhow::Result;
use clap::{Parser, Subcommand};
use smartcloset::canvas::{OutfitCanvas, Slot};
use smartcloset::config::FrameSourceKind;
use smartcloset::{CaptureRequest, ClosetOrchestrator, PipelineState, SmartClosetConfig};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "smartcloset")]
#[command(about = "Wardrobe capture pipeline: photograph, clean up and upload garments, then assemble outfits")]
#[command(version)]
#[command(long_about = "Captures a garment photo, rotates it upright, removes the background, \
uploads it to the wardrobe storage service and assembles random outfits from the stored garments. \
Shake detection is available on Linux with the `sensors` feature.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "smartcloset.toml", help = "Path to TOML configuration file")]
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
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Act as this user (overrides system.user_id)
    #[arg(long, value_name = "ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a garment and upload it
    Capture {
        /// Image file to use as the camera frame
        #[arg(long)]
        image: Option<String>,

        /// Sensor rotation of the frame in degrees (0, 90, 180, 270)
        #[arg(long)]
        rotation: Option<u16>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        season: Option<String>,

        /// Upload a synthetic red frame instead of a photo
        #[arg(long)]
        placeholder: bool,
    },
    /// List stored garments
    List,
    /// Delete a stored garment by image URL
    Delete { image_url: String },
    /// Show current weather and clothing advice
    Weather {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Assemble an outfit from the wardrobe
    Outfit {
        /// Manual shuffles before listening for shakes
        #[arg(long, default_value_t = 1)]
        shuffles: usize,

        /// Listen for shakes for this many seconds
        #[arg(long, value_name = "SECS")]
        listen: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting SmartCloset v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match SmartClosetConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    if let Some(user) = &args.user {
        config.system.user_id = Some(user.clone());
    }
    if let Some(Command::Capture {
        image,
        rotation,
        placeholder,
        ..
    }) = &args.command
    {
        if let Some(image) = image {
            config.camera.source = FrameSourceKind::Still;
            config.camera.image_path = image.clone();
        }
        if let Some(rotation) = rotation {
            config.camera.rotation = *rotation;
        }
        if *placeholder {
            config.camera.source = FrameSourceKind::Placeholder;
        }
    }

    match config.validate() {
        Ok(()) if args.validate_config => {
            info!("Configuration validation successful");
            println!("✓ Configuration is valid");
            return Ok(());
        }
        Ok(()) => {}
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    }

    let Some(command) = args.command else {
        eprintln!("No command given; see --help");
        std::process::exit(2);
    };

    let mut orchestrator = ClosetOrchestrator::new(config).map_err(|e| {
        error!("Failed to create orchestrator: {}", e);
        e
    })?;
    orchestrator.initialize().await?;

    let exit_code = match run_command(&mut orchestrator, command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("✗ {}", e);
            1
        }
    };

    let shutdown_code = orchestrator.shutdown().await?;
    std::process::exit(exit_code.max(shutdown_code));
}

async fn run_command(orchestrator: &mut ClosetOrchestrator, command: Command) -> Result<i32> {
    match command {
        Command::Capture {
            category, season, ..
        } => {
            let outcome = orchestrator
                .capture_garment(CaptureRequest { category, season })
                .await?;
            match outcome {
                PipelineState::Succeeded => {
                    println!("✓ Saved!");
                    Ok(0)
                }
                PipelineState::Failed(reason) => {
                    println!("✗ Upload failed: {}", reason);
                    Ok(1)
                }
                other => {
                    println!("Pipeline ended in unexpected state: {}", other);
                    Ok(1)
                }
            }
        }
        Command::List => {
            let garments = orchestrator.list_garments().await?;
            if garments.is_empty() {
                println!("The wardrobe is empty");
            }
            for garment in garments {
                println!(
                    "{:>5}  {:<14} {:<8} {}",
                    garment.id, garment.category, garment.season, garment.image_url
                );
            }
            Ok(0)
        }
        Command::Delete { image_url } => {
            orchestrator.delete_garment(&image_url).await?;
            println!("✓ Garment deleted");
            Ok(0)
        }
        Command::Weather { lat, lon } => {
            let report = orchestrator.current_weather(lat.zip(lon)).await?;
            println!("{:.0}°C  {}", report.temperature_c, report.condition);
            println!("{}", report.advice);
            Ok(0)
        }
        Command::Outfit { shuffles, listen } => {
            let canvas = orchestrator
                .run_outfit_session(shuffles, listen.map(Duration::from_secs))
                .await?;
            print_outfit(&canvas);
            Ok(0)
        }
    }
}

fn print_outfit(canvas: &OutfitCanvas) {
    for slot in Slot::ALL {
        let offset = canvas.offset(slot);
        match canvas.garment(slot) {
            Some(garment) => println!(
                "{:<6} {} ({}) at ({:.0}, {:.0})",
                slot, garment.image_url, garment.category, offset.x, offset.y
            ),
            None => println!("{:<6} -", slot),
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
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
        .unwrap_or_else(|_| EnvFilter::new(format!("smartcloset={}", log_level)));

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
fn print_default_config() -> Result<()> {
    println!("# SmartCloset Configuration File");
    println!("# Every value can be overridden with SMARTCLOSET__<SECTION>__<KEY>");
    println!();
    println!("{}", toml::to_string_pretty(&SmartClosetConfig::default())?);
    Ok(())
}
