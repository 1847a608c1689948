//! Padglyph - device-art database tool
//!
//! Packs directory trees of SVG art into binary databases and inspects
//! what a database resolves to.

mod pack;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use padglyph_core::{ArtConfig, ArtDatabase, DeviceKind, CURRENT_VERSION};
use padglyph_render::{BasicSvg, DeviceImages, ParseHints};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "padglyph")]
#[command(about = "Pack and inspect controller art databases")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "padglyph.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pack a directory of device folders into a database file
    Pack {
        /// Directory with one subdirectory per device type
        dir: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "controllerimages.bin")]
        output: PathBuf,

        /// Data format version to write
        #[arg(long, default_value_t = CURRENT_VERSION)]
        format_version: u16,
    },

    /// List every device type in the loaded databases
    Inspect {
        /// Database files to load instead of the configured ones
        #[arg(short, long)]
        data: Vec<PathBuf>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a device type or GUID resolves to
    Resolve {
        /// Device type or 32-character GUID
        id: String,

        #[arg(short, long, default_value = "gamepad")]
        kind: DeviceKind,

        /// Database files to load instead of the configured ones
        #[arg(short, long)]
        data: Vec<PathBuf>,

        /// Print the SVG text for this control instead of a summary
        #[arg(long)]
        svg: Option<String>,

        #[arg(long, default_value_t = 0)]
        variant: usize,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Rasterize one control to a PNG image
    Render {
        /// Device type or 32-character GUID
        id: String,

        /// Control name, e.g. "south" or "Left Ctrl"
        control: String,

        #[arg(short, long, default_value = "gamepad")]
        kind: DeviceKind,

        /// Database files to load instead of the configured ones
        #[arg(short, long)]
        data: Vec<PathBuf>,

        /// Edge length of the square image in pixels
        #[arg(long, default_value_t = 64)]
        size: u32,

        #[arg(long, default_value_t = 0)]
        variant: usize,

        #[arg(short, long)]
        output: PathBuf,
    },
}

fn open_database(mut config: ArtConfig, data: Vec<PathBuf>) -> Result<ArtDatabase> {
    if !data.is_empty() {
        config.database.files = data;
    }
    let db = ArtDatabase::from_config(&config)?;
    info!(
        files = config.database.files.len(),
        devices = db.device_types().len(),
        keys = db.key_count(),
        "Databases loaded"
    );
    Ok(db)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Padglyph v{}", padglyph_core::version());

    let config = ArtConfig::load(&args.config)?;

    match args.command {
        Command::Pack {
            dir,
            output,
            format_version,
        } => {
            let summary = pack::pack(&dir, &output, format_version)?;
            println!(
                "Packed {} devices ({} strings, {} bytes) into {}",
                summary.devices,
                summary.strings,
                summary.bytes,
                summary.output.display()
            );
        }
        Command::Inspect { data, json } => {
            let db = open_database(config, data)?;
            let devices = report::inventory(&db)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else {
                for device in &devices {
                    println!(
                        "{:<24} inherits={:<16} items={:<4} refs={} guids={}",
                        device.device_type,
                        device.inherits.as_deref().unwrap_or("-"),
                        device.items,
                        device.refcount,
                        device.guids.len()
                    );
                }
                println!("{} device types, {} keys", devices.len(), db.key_count());
            }
        }
        Command::Resolve {
            id,
            kind,
            data,
            svg,
            variant,
            json,
        } => {
            let db = open_database(config.clone(), data)?;
            if let Some(control) = svg {
                let backend = BasicSvg::with_hints(ParseHints::from(&config.render));
                let images = DeviceImages::by_id_string(&db, &id, kind, backend)?;
                println!("{}", report::svg_text(&images, kind, &control, variant)?);
                return Ok(());
            }

            let resolved = report::resolve_report(&db, &id, kind)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                println!("{} ({})", resolved.device_type, resolved.kind);
                for art in &resolved.controls {
                    println!("  {:<20} variants {:?}", art.control, art.variants);
                }
                for issue in &resolved.issues {
                    println!("  skipped: {}", issue);
                }
            }
        }
        Command::Render {
            id,
            control,
            kind,
            data,
            size,
            variant,
            output,
        } => {
            let db = open_database(config.clone(), data)?;
            let backend = BasicSvg::with_hints(ParseHints::from(&config.render));
            let mut images = DeviceImages::by_id_string(&db, &id, kind, backend)?;
            report::render_to_file(&mut images, kind, &control, size, variant, &output)?;
            println!("Wrote {}x{} PNG to {}", size, size, output.display());
        }
    }

    Ok(())
}
