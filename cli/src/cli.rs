use std::path::PathBuf;

/// Rankings export CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "siterank", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Export ranked geographies in tabular and spatial formats
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Run configuration file (JSON)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Output directory, overrides the config
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Formats to write (csv, excel, geojson, kml, kmz), overrides the config
    #[arg(short, long, value_delimiter = ',')]
    pub formats: Option<Vec<String>>,

    /// Geography levels to export (msa, county, tract), overrides the config
    #[arg(short, long, value_delimiter = ',')]
    pub geography: Option<Vec<String>>,

    /// Rankings workbook path, overrides the config
    #[arg(short = 'i', long, value_hint = clap::ValueHint::FilePath)]
    pub ranking_file: Option<PathBuf>,

    /// Simplification tolerance for KML/KMZ output, in degrees
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Skip the frontend JSON sidecars
    #[arg(long)]
    pub no_sidecars: bool,
}
