use anyhow::{Result, bail};
use siterank::{ExportConfig, Format, GeoLevel, RunStatus, run_exports};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ExportArgs) -> Result<()> {
    let mut config = ExportConfig::from_file(&args.config)?;

    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(formats) = &args.formats {
        config.formats = formats
            .iter()
            .map(|name| Format::from_str(name).ok_or_else(|| anyhow::anyhow!("unknown format: {}", name)))
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(levels) = &args.geography {
        config.levels = levels
            .iter()
            .map(|name| GeoLevel::from_str(name).ok_or_else(|| anyhow::anyhow!("unknown level: {}", name)))
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(rankings) = &args.ranking_file {
        config.rankings_workbook = rankings.clone();
    }
    if let Some(tolerance) = args.tolerance {
        config.simplification.kml_tolerance = tolerance;
    }
    if args.no_sidecars {
        config.frontend_sidecars = false;
    }

    let summary = run_exports(&config)?;

    println!("[export] wrote {} files to {}", summary.total_files, summary.exports_dir);
    for failure in &summary.failures {
        println!("[export] failed: {} {} ({})", failure.level, failure.format, failure.error);
    }
    if summary.status == RunStatus::Failed {
        bail!("export run produced no files");
    }
    Ok(())
}
