//! Transaction flood CLI
//!
//! Command-line tool for rate-paced transaction submission against a
//! ledger node.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use txflood::{HttpLedgerClient, NonceMode, Runner, SubmissionPlan, Termination};
use txflood_types::{AccountId, Keypair};

#[derive(Parser)]
#[command(name = "txflood")]
#[command(about = "Rate-paced transaction flooder for a ledger node")]
#[command(version)]
#[command(group = clap::ArgGroup::new("termination").required(true))]
struct Cli {
    /// Node RPC endpoint, e.g. http://127.0.0.1:8080
    #[arg(short, long)]
    endpoint: String,

    /// Sender key seed (64 hex chars)
    #[arg(long)]
    seed: String,

    /// Receiving account (64 hex chars)
    #[arg(short, long)]
    destination: AccountId,

    /// Transfer amount in base units
    #[arg(long, default_value = "1")]
    amount: u64,

    /// Target submissions per second
    #[arg(short, long, default_value = "10")]
    rate: u64,

    /// Run duration (e.g. "30s", "5m"); mutually exclusive with --count
    #[arg(long, group = "termination")]
    duration: Option<humantime::Duration>,

    /// Total number of submissions; mutually exclusive with --duration
    #[arg(long, group = "termination")]
    count: Option<u64>,

    /// Maximum submissions in flight at once
    #[arg(short, long, default_value = "10")]
    concurrency: usize,

    /// Nonce assignment mode (auto, query)
    #[arg(long, default_value = "auto")]
    nonce_mode: String,
}

fn parse_nonce_mode(s: &str) -> Result<NonceMode, String> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(NonceMode::Auto),
        "query" | "query-per-task" => Ok(NonceMode::QueryPerTask),
        _ => Err(format!("Unknown nonce mode: {}", s)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt::init();

    let keypair = Keypair::from_hex(&cli.seed)?;
    let nonce_mode = parse_nonce_mode(&cli.nonce_mode)?;

    let termination = match (cli.duration, cli.count) {
        (_, Some(count)) => Termination::Count(count),
        (Some(duration), None) => Termination::Duration(*duration),
        (None, None) => unreachable!("clap requires one of --duration or --count"),
    };

    let plan = SubmissionPlan::new(cli.destination, termination)
        .with_amount(cli.amount)
        .with_rate(cli.rate)
        .with_concurrency(cli.concurrency)
        .with_nonce_mode(nonce_mode);

    let client = HttpLedgerClient::new(cli.endpoint);
    let runner = Runner::new(plan, keypair, client)?;

    // First Ctrl-C stops issuance; in-flight submissions still drain.
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nInterrupted, draining in-flight submissions...");
            interrupt.cancel();
        }
    });

    let summary = runner.run(cancel).await?;
    summary.print();

    Ok(())
}
