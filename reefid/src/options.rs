use clap::{Args, Parser, Subcommand};
use gridid::{Base, GridLayout, DEFAULT_FIELD};
use std::path::PathBuf;

/// Allocate stable, grid-derived identifiers to reef features.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Check grid encoding against known cells and exit.
    #[arg(long)]
    pub test: bool,

    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Give an identifier to every feature which doesn't have one.
    Allocate(Allocate),

    /// Print the grid cell code and bounds of a coordinate.
    Grid(Grid),

    /// Report malformed and duplicate identifiers.
    Check(Check),
}

#[derive(Debug, Clone, Args)]
pub struct Allocate {
    /// Symbol set: B10, B14, B16, B32_CAPS or B32_LOWER.
    #[arg(long, default_value_t = Base::B10)]
    pub base: Base,

    /// Grid digit order: axis or nested.
    #[arg(long, default_value_t = GridLayout::Axis)]
    pub layout: GridLayout,

    /// Name of the identifier property.
    #[arg(long, default_value = DEFAULT_FIELD)]
    pub field: String,

    /// Input GeoJSON feature collection.
    pub input: PathBuf,

    /// Output GeoJSON feature collection.
    pub output: PathBuf,

    /// Feature class prefix, e.g. `R` for reefs.
    pub prefix: String,

    /// Minimum number of counter symbols.
    pub zero_padding: usize,
}

#[derive(Debug, Clone, Args)]
pub struct Grid {
    /// Symbol set: B10, B14, B16, B32_CAPS or B32_LOWER.
    #[arg(long, default_value_t = Base::B10)]
    pub base: Base,

    /// Grid digit order: axis or nested.
    #[arg(long, default_value_t = GridLayout::Axis)]
    pub layout: GridLayout,

    /// Longitude in degrees, [-180, 180).
    #[arg(allow_negative_numbers = true)]
    pub lon: f64,

    /// Latitude in degrees, [-90, 90).
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,
}

#[derive(Debug, Clone, Args)]
pub struct Check {
    /// Symbol set: B10, B14, B16, B32_CAPS or B32_LOWER.
    #[arg(long, default_value_t = Base::B10)]
    pub base: Base,

    /// Name of the identifier property.
    #[arg(long, default_value = DEFAULT_FIELD)]
    pub field: String,

    /// GeoJSON feature collection.
    pub input: PathBuf,
}
