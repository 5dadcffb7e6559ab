use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use cachecore::config::load_config;
use cachecore::io::open_trace;
use cachecore::simulator::CacheSimulator;

#[derive(Parser, Debug)]
#[command(about = String::from("Write policy cache simulator"))]
struct Args {
    /// JSON cache configuration
    config: String,
    /// Text trace, one `<R|W> <hex address>` per line
    trace: String,

    #[arg(short, long)]
    performance: bool,

    /// Logs every eviction, and prints the configuration and final line counts
    #[arg(short, long)]
    debug: bool,

    /// Warn about malformed records and carry on, instead of stopping at the first one
    #[arg(short, long)]
    skip_malformed: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let default_level = if args.debug { "debug" } else { "warn" };
    fmt::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config_file = File::open(&args.config).map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let config = load_config(BufReader::new(config_file)).map_err(|e| e.to_string())?;
    let mut simulator = CacheSimulator::new(&config);
    let trace = open_trace(&args.trace, config.address_width()).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let result = if args.skip_malformed {
        let records = trace.filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping record: {e}");
                None
            }
        });
        simulator.run(records)
    } else {
        simulator.try_run(trace).map_err(|e| e.to_string())?
    };
    println!("{}", serde_json::to_string_pretty(&result.report()).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config}");
        println!("Valid cache lines: {} of {}", simulator.valid_line_count(), config.sets() * config.ways());
        println!("Dirty cache lines not yet written back: {}", simulator.dirty_line_count())
    }
    Ok(())
}
