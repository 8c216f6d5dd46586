//! CLI for the ethscan chart dashboard.
//!
//! Pipeline: fetch historic data -> aggregate -> render charts, every N seconds.

use clap::{Parser, Subcommand};
use ethscan_analyzer::refresh::DEFAULT_PERIOD;
use ethscan_analyzer::reporter::Report;
use ethscan_analyzer::{default_charts, BucketGranularity, MemorySink, NdjsonSink, RefreshCycle, SeriesSink};
use ethscan_core::{EthscanError, EthscanResult};
use ethscan_provider::{HttpGateway, DEFAULT_API_URL};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ethscan", version, about = "Ethereum block chart dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Refresh the dashboard charts on a fixed interval.
    Watch {
        #[arg(short, long, env = "ETHSCAN_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        #[arg(short, long, default_value_t = DEFAULT_PERIOD.as_secs())]
        interval_secs: u64,

        /// Value bucket width: minute, hour or day.
        #[arg(short, long, default_value = "minute")]
        granularity: BucketGranularity,

        /// Sink output: "ndjson" writes NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long, default_value = "ndjson")]
        sink: String,

        /// Stop after this many cycles, failed ones included.
        #[arg(long)]
        max_cycles: Option<u64>,
    },

    /// Run one cycle and print a summary of every chart.
    Snapshot {
        #[arg(short, long, env = "ETHSCAN_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        #[arg(short, long, default_value = "minute")]
        granularity: BucketGranularity,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn open_sink(sink_spec: &str) -> EthscanResult<Box<dyn SeriesSink>> {
    if sink_spec == "ndjson" {
        return Ok(Box::new(NdjsonSink::stdout()));
    }
    if let Some(path) = sink_spec.strip_prefix("ndjson:") {
        let file = std::fs::File::create(path)
            .map_err(|e| EthscanError::Sink(format!("cannot create {path}: {e}")))?;
        return Ok(Box::new(NdjsonSink::new(file)));
    }
    Err(EthscanError::InvalidInput(format!(
        "unknown sink: {sink_spec}. Use 'ndjson' or 'ndjson:/path'"
    )))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            api_url,
            interval_secs,
            granularity,
            sink,
            max_cycles,
        } => {
            if interval_secs == 0 {
                return Err(EthscanError::InvalidInput("--interval-secs must be positive".into()).into());
            }

            let gateway = HttpGateway::new(&api_url)?;
            let sink = open_sink(&sink)?;
            tracing::info!(
                api_url = %gateway.base_url(),
                interval_secs,
                granularity = granularity.as_str(),
                "starting dashboard"
            );

            let mut cycle = RefreshCycle::new_with_charts(gateway, sink, default_charts(granularity));
            if let Some(n) = max_cycles {
                cycle = cycle.with_max_cycles(n);
            }

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "cannot listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            };
            cycle.run(Duration::from_secs(interval_secs), shutdown).await?;

            tracing::info!(
                completed = cycle.completed_cycles(),
                skipped = cycle.skipped_cycles(),
                "dashboard stopped"
            );
        }

        Commands::Snapshot {
            api_url,
            granularity,
            json,
        } => {
            let gateway = HttpGateway::new(&api_url)?;
            let mut cycle = RefreshCycle::new_with_charts(gateway, MemorySink::new(), default_charts(granularity));

            let outcome = cycle.run_cycle().await?;
            let report = Report::build(&outcome, cycle.sink().live_charts());

            if json {
                let charts: Vec<_> = cycle.sink().live_charts().collect();
                println!("{}", serde_json::to_string_pretty(&charts)?);
            } else {
                print!("{}", report.render());
            }
        }
    }

    Ok(())
}
