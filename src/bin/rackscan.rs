use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rack_scan::config::{DEFAULT_ROW_TOLERANCE, MaxDimension, ScanConfig};
use rack_scan::detector::tiling::{GridLimits, adaptive_grid, plan_tiles};
use rack_scan::export::{OverlayStyle, parse_csv, render_overlay, write_csv};
use rack_scan::grid::infer_grid;
use rack_scan::preprocess::normalize_path;
use rack_scan::{
    DataMatrixDecoder, QrDecoder, RawDetection, Scanner, SymbolDecoder, VialRecord,
};

#[derive(Parser)]
#[command(name = "rackscan", version, about = "Read every coded tube in a rack photo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Symbology {
    DataMatrix,
    Qr,
}

impl Symbology {
    fn decoder(self) -> Box<dyn SymbolDecoder> {
        match self {
            Self::DataMatrix => Box::new(DataMatrixDecoder::new()),
            Self::Qr => Box::new(QrDecoder::new()),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Scan a rack photo and print the inferred grid
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// Code type to read
        #[arg(long, value_enum, default_value_t = Symbology::DataMatrix)]
        symbology: Symbology,
        /// Row grouping tolerance in pixels (50-300)
        #[arg(long, env = "RACKSCAN_TOLERANCE", default_value_t = DEFAULT_ROW_TOLERANCE)]
        tolerance: f32,
        /// Longest side of the working frame (2000, 4000 or 8000)
        #[arg(long, env = "RACKSCAN_MAX_DIM", default_value = "4000")]
        max_dim: MaxDimension,
        /// Write records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write an annotated PNG of the working frame
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Font for overlay labels (defaults to a system font when one is found)
        #[arg(long, requires = "overlay")]
        font: Option<PathBuf>,
        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Re-run grid inference on an exported CSV with another tolerance
    Regrid {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, env = "RACKSCAN_TOLERANCE", default_value_t = DEFAULT_ROW_TOLERANCE)]
        tolerance: f32,
    },
    /// Print the coarse/fine tile plan for a frame size
    Tiles {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        #[arg(long, default_value_t = 300)]
        tile_size: u32,
        #[arg(long, default_value_t = 0.25)]
        overlap: f32,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Scan {
            image,
            symbology,
            tolerance,
            max_dim,
            csv,
            overlay,
            font,
            json,
        } => scan_cmd(
            &image,
            symbology,
            tolerance,
            max_dim,
            csv.as_deref(),
            overlay.as_deref(),
            font.as_deref(),
            json,
        ),
        Command::Regrid { csv, tolerance } => regrid_cmd(&csv, tolerance),
        Command::Tiles {
            width,
            height,
            tile_size,
            overlap,
        } => tiles_cmd(width, height, tile_size, overlap),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn scan_cmd(
    image: &Path,
    symbology: Symbology,
    tolerance: f32,
    max_dim: MaxDimension,
    csv: Option<&Path>,
    overlay: Option<&Path>,
    font: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = ScanConfig::builder()
        .row_tolerance(tolerance)
        .max_dimension(max_dim)
        .build()?;
    let scanner = Scanner::with_config(symbology.decoder(), config)?;

    let frame = normalize_path(image, max_dim.pixels())
        .with_context(|| format!("failed to load {}", image.display()))?;
    let start = Instant::now();
    let report = scanner.scan_frame(&frame).context("scan failed")?;
    let elapsed = start.elapsed();

    if let Some(path) = csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_csv(&report.records, BufWriter::new(file))?;
    }
    if let Some(path) = overlay {
        let style = match font {
            Some(font) => OverlayStyle::with_font_path(font)
                .with_context(|| format!("failed to load font {}", font.display()))?,
            None => OverlayStyle::with_system_font(),
        };
        let annotated = render_overlay(frame.image(), &report.records, &style);
        annotated
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let (w, h) = report.frame_size;
    println!("Image: {} ({}x{}, scale {:.3})", image.display(), w, h, report.scale);
    for pass in &report.passes {
        println!(
            "  {:<10} grid {}x{}  raw {:>3}  unique {:>3}",
            pass.pass.to_string(),
            pass.grid.0,
            pass.grid.1,
            pass.raw_detections,
            pass.unique_after
        );
    }
    if report.is_empty() {
        println!("No codes found ({:.1?})", elapsed);
    } else {
        println!("Found {} codes ({:.1?})", report.len(), elapsed);
        print_records(&report.records);
    }
    Ok(())
}

fn regrid_cmd(csv: &Path, tolerance: f32) -> Result<()> {
    // Validates the tolerance range
    ScanConfig::builder().row_tolerance(tolerance).build()?;

    let text = std::fs::read_to_string(csv)
        .with_context(|| format!("failed to read {}", csv.display()))?;
    let records = parse_csv(&text)?;
    let detections: Vec<RawDetection> = records
        .iter()
        .map(|r| RawDetection {
            value: r.value.clone(),
            bounding_rect: r.bounding_rect,
            center: r.center,
        })
        .collect();
    let regridded = infer_grid(&detections, tolerance);

    if regridded.is_empty() {
        println!("No records in {}", csv.display());
    } else {
        println!("{} records, tolerance {tolerance}px", regridded.len());
        print_records(&regridded);
    }
    Ok(())
}

fn tiles_cmd(width: u32, height: u32, tile_size: u32, overlap: f32) -> Result<()> {
    anyhow::ensure!(width > 0 && height > 0, "frame size must be positive");
    anyhow::ensure!((0.0..1.0).contains(&overlap), "overlap must be within 0..1");

    let (cols, rows) = adaptive_grid(width, height, tile_size, &GridLimits::default());
    let tiles = plan_tiles(width, height, cols, rows, overlap);
    println!("{width}x{height}: {cols} cols x {rows} rows, {} tiles", tiles.len());
    for (i, t) in tiles.iter().enumerate() {
        println!("  {:>3}: x={} y={} w={} h={}", i, t.x, t.y, t.width, t.height);
    }
    Ok(())
}

fn print_records(records: &[VialRecord]) {
    for record in records {
        println!(
            "  [{:>2},{:>2}] {} @ ({:.0}, {:.0})",
            record.row,
            record.col,
            record.value,
            record.center_x(),
            record.center_y()
        );
    }
}
