//! Command-line inspector for NetCDF classic files.
//!
//! Prints the header as CDL (or JSON), the values of a coordinate
//! variable, or a 2-D slice of a variable.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use netcdf_classic::{NetCdfFile, ReaderConfig};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "nc-inspect")]
#[command(about = "Inspect NetCDF classic and 64-bit offset files")]
struct Args {
    /// NetCDF file to read
    file: PathBuf,

    /// Print output as JSON
    #[arg(long)]
    json: bool,

    /// Print the values of the coordinate variable for this dimension
    #[arg(long, conflicts_with = "extract")]
    coords: Option<String>,

    /// Variable to extract a 2-D grid from
    #[arg(long, requires_all = ["x", "y"])]
    extract: Option<String>,

    /// Dimension used for grid columns
    #[arg(short, long)]
    x: Option<String>,

    /// Dimension used for grid rows
    #[arg(short, long)]
    y: Option<String>,

    /// Fixed index for another dimension, as DIM=INDEX (repeatable)
    #[arg(long = "fix", value_parser = parse_fixed_index)]
    fixed: Vec<(String, u64)>,

    /// Decode values equal to _FillValue as NaN
    #[arg(long, env = "NETCDF_MASK_FILL_VALUES")]
    mask_fill: bool,

    /// Skip scale_factor/add_offset
    #[arg(long)]
    raw: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_fixed_index(s: &str) -> Result<(String, u64), String> {
    let (dim, index) = s
        .split_once('=')
        .ok_or_else(|| format!("expected DIM=INDEX, got '{}'", s))?;
    let index = index
        .parse()
        .map_err(|_| format!("index for '{}' is not a non-negative integer", dim))?;
    Ok((dim.to_string(), index))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = ReaderConfig::from_env();
    if args.mask_fill {
        config.mask_fill_values = true;
    }
    if args.raw {
        config.apply_scale_offset = false;
    }
    debug!(?config, "Reader configuration");

    let mut file = NetCdfFile::open_with_config(&args.file, config)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    if let Some(dim) = &args.coords {
        let values = file.read_coordinate_values(dim)?;
        if args.json {
            println!("{}", serde_json::to_string(&values)?);
        } else {
            println!("{}", join(&values));
        }
        return Ok(());
    }

    if let Some(variable) = &args.extract {
        let x = args.x.as_deref().ok_or_else(|| anyhow!("--x is required"))?;
        let y = args.y.as_deref().ok_or_else(|| anyhow!("--y is required"))?;
        let fixed: HashMap<String, u64> = args.fixed.iter().cloned().collect();

        let grid = file.extract_grid(variable, x, y, &fixed)?;
        info!(variable = %variable, width = grid.width, height = grid.height, "Extracted grid");

        if args.json {
            println!("{}", serde_json::to_string(&grid)?);
        } else {
            for row in grid.rows() {
                println!("{}", join(&row));
            }
        }
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(file.header())?);
    } else {
        println!("{}", file.header());
    }
    Ok(())
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t")
}
