//! Probe Bench CLI
//! Memory-read latency with target polling suspended

use probe_bench::{Config, Harness, LoggingConfig, SimulatedProbe};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&logging.level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if logging.json_output {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let config = Config::embedded()?;
    init_logging(&config.logging)?;

    info!(
        address = config.run.address,
        repetitions = config.run.repetitions.get(),
        "Configuration loaded"
    );

    let probe = SimulatedProbe::new(config.probe.clone());
    Harness::new(&probe, &probe, &probe).run(&config.run)?;
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Benchmark aborted: {:#}", e);
        println!("Exception: {}", e);
    }
}
