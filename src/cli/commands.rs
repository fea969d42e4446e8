use crate::analyzers::{format_ranked_table, RankingAnalyzer};
use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::processors::{run_aggregate, run_join, run_rank, CoordinateSource};
use crate::utils::constants::{
    AGGREGATES_CSV, JOINED_SENSORS_CSV, RANKING_CSV, RANKING_GEOJSON, RANKING_PARQUET,
    SENSORS_WITH_PM25_CSV,
};
use crate::writers::ParquetWriter;

pub fn run(cli: Cli) -> Result<()> {
    let mut config = PipelineConfig::load(cli.config.as_deref())?;
    if let Some(output_dir) = cli.output_dir {
        config = config.with_output_dir(output_dir);
    }

    match cli.command {
        Commands::Join => join(&config)?,

        Commands::Aggregate => aggregate(&config)?,

        Commands::Rank { top, compression } => {
            let top = top.unwrap_or(config.ranking.preview_rows);
            rank(&config, top, &compression)?;
        }

        Commands::Run { top, compression } => {
            let top = top.unwrap_or(config.ranking.preview_rows);
            join(&config)?;
            aggregate(&config)?;
            rank(&config, top, &compression)?;
        }

        Commands::Info { file, sample } => {
            let file = file.unwrap_or_else(|| config.output_path(RANKING_PARQUET));
            println!("Analyzing ranking file: {}", file.display());

            let file_info = ParquetWriter::new().get_file_info(&file)?;
            let stats = RankingAnalyzer::new().analyze_parquet(&file, sample)?;

            println!("\n{}", stats.detailed_summary());

            println!("\nFile Details:");
            println!("{}", file_info.summary());
        }
    }

    Ok(())
}

fn join(config: &PipelineConfig) -> Result<()> {
    println!("Joining sensor metadata...");
    println!("Sensors: {}", config.paths.sensors_table.display());
    println!("Locations: {}", config.paths.locations_table.display());

    let outcome = run_join(config)?;

    match &outcome.coordinate_source {
        CoordinateSource::Locations { latitude, longitude } => {
            println!("Coordinates from locations table ({}, {})", latitude, longitude)
        }
        CoordinateSource::Primary { latitude, longitude } => {
            println!("⚠️  Coordinates from sensor table fallback ({}, {})", latitude, longitude)
        }
        CoordinateSource::Unavailable => println!("⚠️  No coordinate columns found"),
    }

    println!(
        "Joined {} sensor rows with {} location rows; dropped {} without coordinates",
        outcome.primary_rows, outcome.secondary_rows, outcome.dropped
    );
    println!("✅ wrote {} ({} rows)", config.output_path(JOINED_SENSORS_CSV).display(), outcome.table.len());
    Ok(())
}

fn aggregate(config: &PipelineConfig) -> Result<()> {
    println!("Aggregating PM2.5 timeseries...");
    println!("Input directory: {}", config.paths.raw_timeseries_dir.display());

    let outcome = run_aggregate(config)?;

    println!("\n{}", outcome.report.generate_summary());
    println!("✅ wrote {}", config.output_path(AGGREGATES_CSV).display());
    println!(
        "✅ wrote {} ({} rows)",
        config.output_path(SENSORS_WITH_PM25_CSV).display(),
        outcome.merged.len()
    );
    Ok(())
}

fn rank(config: &PipelineConfig, top: usize, compression: &str) -> Result<()> {
    println!("Ranking candidate sites...");

    let outcome = run_rank(config, compression)?;
    let ranking = &outcome.ranking;

    println!("Exposure layer: {}", outcome.exposure_path.display());
    println!("\n{}", ranking.summary.generate_summary());

    for name in [RANKING_CSV, RANKING_GEOJSON, RANKING_PARQUET] {
        println!("✅ wrote {}", config.output_path(name).display());
    }

    if top > 0 && !ranking.cells.is_empty() {
        let shown = top.min(ranking.cells.len());
        println!("\n🏁 top {} candidate cells:", shown);
        print!("{}", format_ranked_table(&ranking.cells[..shown]));
    }

    if let Some(distance) = ranking.summary.max_distance_m {
        println!("\n   max dist_to_sensor_m: {:.0} m", distance);
    }

    Ok(())
}
