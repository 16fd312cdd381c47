use clap::{Parser, Subcommand, ValueEnum};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use partition_failover::config::{load_config, RegionConfig};
use partition_failover::execution::{RegionRequest, TransportError, TransportResponse};
use partition_failover::observability::logging;
use partition_failover::{
    AvailabilityEngine, ClientConfig, OperationRequest, OperationType, PartitionIdentity, RequestExecutor, Transport,
};

#[derive(Parser)]
#[command(name = "failover-cli")]
#[command(about = "Inspect and exercise partition failover configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and print the effective configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Replay a region outage against an in-memory transport
    Simulate {
        /// Configuration file; a two-region account is used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Region whose responses are replaced by the injected status
        #[arg(long, default_value = "A")]
        failing_region: String,

        #[arg(long, default_value_t = 503)]
        status: u16,

        #[arg(long, default_value_t = 0)]
        sub_status: u32,

        #[arg(short = 'n', long, default_value_t = 12)]
        requests: usize,

        #[arg(long, value_enum, default_value_t = Operation::Read)]
        operation: Operation,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Operation {
    Read,
    Query,
    QueryPlan,
    Create,
    Upsert,
    Replace,
    Delete,
}

impl From<Operation> for OperationType {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Read => OperationType::Read,
            Operation::Query => OperationType::Query,
            Operation::QueryPlan => OperationType::QueryPlan,
            Operation::Create => OperationType::Create,
            Operation::Upsert => OperationType::Upsert,
            Operation::Replace => OperationType::Replace,
            Operation::Delete => OperationType::Delete,
        }
    }
}

/// Answers 200 everywhere except the failing region.
struct FaultInjectingTransport {
    failing_region: String,
    status: u16,
    sub_status: u32,
}

impl Transport for FaultInjectingTransport {
    fn send(
        &self,
        request: &RegionRequest<'_>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        let response = if request.region.name == self.failing_region {
            TransportResponse::new(self.status, self.sub_status)
        } else {
            TransportResponse::new(200, 0).with_body(serde_json::json!({ "region": request.region.name }))
        };
        async move { Ok(response) }
    }
}

fn default_config() -> ClientConfig {
    ClientConfig {
        regions: vec![
            RegionConfig::new("A", "https://account-a.documents.example.com/"),
            RegionConfig::new("B", "https://account-b.documents.example.com/"),
        ],
        preferred_regions: vec!["A".into(), "B".into()],
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => {
            let config = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Simulate {
            config,
            failing_region,
            status,
            sub_status,
            requests,
            operation,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => default_config(),
            };
            logging::init(&config.observability);

            let engine = Arc::new(AvailabilityEngine::new(config)?);
            let executor = RequestExecutor::new(
                engine,
                FaultInjectingTransport {
                    failing_region,
                    status,
                    sub_status,
                },
            );
            let partition = PartitionIdentity::new("simulated-collection", "0");

            for _ in 0..requests {
                let request = OperationRequest::new(partition.clone(), operation.into());
                match executor.execute(request).await {
                    Ok(response) => println!("{}", response.diagnostics.to_json()),
                    Err(err) => {
                        eprintln!("Error: {}", err);
                        if let Some(diagnostics) = err.diagnostics() {
                            println!("{}", diagnostics.to_json());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
