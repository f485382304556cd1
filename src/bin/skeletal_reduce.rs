use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use skeletal_reduce::{InputConfig, reduction};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "skeletal_reduce")]
#[command(about = "Reduce a detailed kinetic model to a skeletal model")]
struct Args {
    /// Path to a YAML reduction input document
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Override the sampler worker count from the input document
    #[arg(long, value_name = "N")]
    num_threads: Option<usize>,

    /// Logging verbosity (use -v for info, or -v=LEVEL for specific level)
    #[arg(long, short = 'v', value_name = "LEVEL", num_args = 0..=1, default_missing_value = "info", require_equals = true)]
    verbose: Option<Option<LogLevel>>,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
        }
    }
}

fn main() {
    let args = Args::parse();

    // Configure logging:
    // None = not specified, Some(None) = -v without value (info), Some(Some(level)) = -v=level
    let log_level = match args.verbose {
        None => LevelFilter::Warn,
        Some(None) => LevelFilter::Info,
        Some(Some(level)) => level.into(),
    };
    Builder::from_default_env().filter_level(log_level).init();

    let mut input = InputConfig::load(&args.input).unwrap_or_else(|e| {
        eprintln!("Failed to load input document {}: {}", args.input.display(), e);
        std::process::exit(1);
    });
    if let Some(num_threads) = args.num_threads {
        input.num_threads = num_threads;
    }

    match reduction::run(&input) {
        Ok(reduced) => {
            println!(
                "Reduced model: {} species, {} reactions (error {:.2}%).",
                reduced.model.n_species(),
                reduced.model.n_reactions(),
                reduced.error
            );
            if let Some(path) = &reduced.path {
                println!("Written to {}.", path.display());
            }
        }
        Err(e) => {
            eprintln!("Reduction failed: {}", e);
            std::process::exit(1);
        }
    }
}
