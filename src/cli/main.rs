use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use iot_sensor_analytics::{
    adapters::all_targets,
    analytics::{report, SensorAnalytics},
    benchmarks::{io, BenchmarkResult},
    config::Config,
    diagnostics::{check_connection, storage_status},
    models::SensorKind,
    simulator::{reading_to_json, ReadingGenerator, ReadingSender},
    state::create_store,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "iot-sensor-cli")]
#[command(about = "IoT sensor simulator and analytics CLI", long_about = None)]
struct Cli {
    /// Configuration file (defaults to CONFIG_PATH or config/local.toml)
    #[arg(short, long, global = true, env = "CONFIG_PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print generated readings as JSON without storing them
    Generate {
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Only generate this kind (interior or exterior)
        #[arg(short, long)]
        kind: Option<SensorKind>,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Generate readings and insert them into the store
    Send {
        /// Stop after this many readings (defaults to the configured maximum)
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Seconds between readings (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show stored readings
    Query {
        /// Number of most recent readings
        #[arg(short, long)]
        last: Option<usize>,

        /// Only readings of this kind
        #[arg(short, long)]
        kind: Option<SensorKind>,

        /// Only readings from this location
        #[arg(short = 'L', long)]
        location: Option<String>,
    },

    /// Run every analysis and print the reports
    Analyze {
        /// Window of the hourly summary in hours
        #[arg(long)]
        hours: Option<i64>,

        /// Field inspected for outliers
        #[arg(short, long)]
        field: Option<String>,

        /// Z-score threshold for outliers
        #[arg(short = 'z', long)]
        threshold: Option<f64>,
    },

    /// Measure store performance and write the results
    Metrics {
        /// Output directory for results (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only run specific target (by ID)
        #[arg(short, long)]
        target: Option<String>,

        /// Quiet mode - only output results, no progress
        #[arg(short, long)]
        quiet: bool,
    },

    /// Summarize what the store holds
    Status,

    /// Check store connectivity with a write probe
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iot_sensor_analytics=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = create_store(&config.store)
        .await
        .context("failed to open the reading store")?;

    match cli.command {
        Commands::Generate { count, kind, seed } => {
            let mut generator = match seed {
                Some(seed) => ReadingGenerator::seeded(seed),
                None => ReadingGenerator::new(),
            };
            for _ in 0..count {
                let reading = generator.generate(kind);
                println!("{}", reading_to_json(&reading)?);
            }
        }

        Commands::Send { count, interval } => {
            let interval = interval.unwrap_or(config.simulator.interval_secs);
            let max_readings = count.or(config.simulator.max_readings);

            println!(
                "Sending readings every {}s to the {} store (Ctrl+C to stop)",
                interval,
                store.backend_name()
            );
            let mut sender = ReadingSender::new(store, ReadingGenerator::new());
            let summary = sender
                .run(Duration::from_secs(interval), max_readings)
                .await;
            println!("Sent: {}  Failed: {}", summary.sent, summary.failed);
        }

        Commands::Query { last, kind, location } => {
            let analytics = SensorAnalytics::new(store, config.analysis.clone());

            let (readings, title) = match (kind, location) {
                (Some(kind), _) => (
                    analytics.readings_by_kind(kind).await,
                    format!("{} READINGS", kind.to_string().to_uppercase()),
                ),
                (None, Some(location)) => (
                    analytics.readings_by_location(&location).await,
                    format!("READINGS AT {}", location.to_uppercase()),
                ),
                (None, None) => {
                    let n = last.unwrap_or(config.analysis.last_n);
                    (
                        analytics.last_readings(n).await,
                        format!("LAST {} READINGS", n),
                    )
                }
            };
            print!("{}", report::render_readings(&readings, &title));
        }

        Commands::Analyze { hours, field, threshold } => {
            let analytics = SensorAnalytics::new(store, config.analysis.clone());
            let field = field.unwrap_or_else(|| config.analysis.outlier_field.clone());
            let threshold = threshold.unwrap_or(config.analysis.z_threshold);

            let hourly = match hours {
                Some(hours) => analytics.hourly_temperature_summary(hours).await,
                None => analytics.hourly_temperature_summary_default().await,
            };
            print!("{}", report::render_hourly(&hourly));
            println!();

            let counts = analytics.readings_count_by_sensor().await;
            print!("{}", report::render_sensor_counts(&counts));
            println!();

            let by_type = analytics.average_temperature_by_type().await;
            print!("{}", report::render_type_summary(&by_type));
            println!();

            let outliers = analytics.detect_outliers(&field, threshold).await;
            print!("{}", report::render_outliers(&outliers, &field));
            println!();

            let latest = analytics.last_readings(config.analysis.last_n).await;
            print!(
                "{}",
                report::render_readings(&latest, &format!("LAST {} READINGS", config.analysis.last_n))
            );
        }

        Commands::Metrics { output, target, quiet } => {
            let output = output.unwrap_or_else(|| config.benchmarks.output_dir.clone());

            let targets: Vec<_> = all_targets(store.clone(), &config.benchmarks)
                .into_iter()
                .filter(|t| target.as_ref().map_or(true, |id| t.id() == *id))
                .collect();

            if targets.is_empty() {
                let available: Vec<String> = all_targets(store, &config.benchmarks)
                    .iter()
                    .map(|t| t.id())
                    .collect();
                bail!(
                    "no benchmark target found with ID '{}' (available: {})",
                    target.unwrap_or_default(),
                    available.join(", ")
                );
            }

            if !quiet {
                println!("Running {} benchmark targets...", targets.len());
                println!();
            }

            let total_start = Instant::now();
            let mut results: Vec<BenchmarkResult> = Vec::with_capacity(targets.len());

            for t in targets {
                if !quiet {
                    print!("  {} ... ", t.id());
                }

                let start = Instant::now();
                let result = t.run().await;
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

                if !quiet {
                    if result.is_success() {
                        println!("OK ({:.2}ms)", elapsed_ms);
                    } else {
                        println!("FAILED ({:.2}ms)", elapsed_ms);
                        if let Some(error) = result.get_metric("error") {
                            println!("    Error: {}", error);
                        }
                    }
                }

                results.push(result);
            }

            io::save_results(&results, &output)?;

            if quiet {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                let successful = results.iter().filter(|r| r.is_success()).count();
                println!();
                println!(
                    "Completed {} benchmarks in {:.2}s",
                    results.len(),
                    total_start.elapsed().as_secs_f64()
                );
                println!("  Successful: {}", successful);
                println!("  Failed: {}", results.len() - successful);
                println!();
                println!("Results written to: {}", output.display());
            }
        }

        Commands::Status => {
            let status = storage_status(&store).await?;

            println!("Backend: {}", store.backend_name());
            println!("Total readings: {}", status.total);
            println!("  Interior: {}", status.interior);
            println!("  Exterior: {}", status.exterior);
            if let (Some(first), Some(last)) = (&status.first_timestamp, &status.last_timestamp) {
                println!("Time span: {} .. {}", first, last);
            }
            println!();
            print!("{}", report::render_readings(&status.latest, "LATEST READINGS"));
        }

        Commands::Check => {
            let connection = check_connection(&store).await;

            println!("Backend: {}", connection.backend);
            for step in &connection.steps {
                let mark = if step.passed { "OK" } else { "FAILED" };
                println!("  [{}] {}: {}", mark, step.name, step.detail);
            }
            if let Some(sample) = &connection.sample {
                println!();
                println!("Sample document:");
                println!("{}", serde_json::to_string_pretty(sample)?);
            }

            if !connection.is_healthy() {
                bail!("connection check failed for the {} store", connection.backend);
            }
        }
    }

    Ok(())
}
