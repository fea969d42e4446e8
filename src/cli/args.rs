use crate::utils::constants::COMPRESSION_SNAPPY;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aq-siting")]
#[command(about = "Rank candidate air-quality sensor sites from population, PM2.5 and sensor coverage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Directory for all outputs [default: outputs]"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join sensor attributes with sensor locations
    Join,

    /// Aggregate raw PM2.5 timeseries and merge them onto the joined sensors
    Aggregate,

    /// Rank exposure-grid cells inside the boundary
    Rank {
        #[arg(short, long, help = "Rows in the preview [default: from config, 10]")]
        top: Option<usize>,

        #[arg(short, long, default_value = COMPRESSION_SNAPPY)]
        compression: String,
    },

    /// Run join, aggregate and rank in order
    Run {
        #[arg(short, long, help = "Rows in the preview [default: from config, 10]")]
        top: Option<usize>,

        #[arg(short, long, default_value = COMPRESSION_SNAPPY)]
        compression: String,
    },

    /// Display information about a ranking Parquet file
    Info {
        #[arg(
            short,
            long,
            help = "Ranking Parquet file [default: <output-dir>/site_ranking.parquet]"
        )]
        file: Option<PathBuf>,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}
