use clap::{Parser, Subcommand};
use packsched_core::{format_memory, Pod};
use packsched_extender::{AppState, Config as ExtenderConfig, ExtenderServer};
use packsched_scheduler::{ClusterSnapshot, PluginRegistry, PodSnapshot, Scheduler, SchedulerPolicy};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "packsched", about = "Packing scheduler plugins for Kubernetes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler extender HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:10262")]
        bind: String,
        /// Path to a YAML or JSON scheduler policy
        #[arg(long, env = "PACKSCHED_POLICY")]
        policy: Option<String>,
    },
    /// Evaluate a pod against a cluster snapshot file and print the placement
    Schedule {
        /// YAML or JSON document of the form `{nodes: [{node, pods}]}`
        #[arg(long)]
        snapshot: String,
        /// YAML or JSON pod manifest
        #[arg(long)]
        pod: String,
        /// Path to a YAML or JSON scheduler policy
        #[arg(long, env = "PACKSCHED_POLICY")]
        policy: Option<String>,
    },
    /// List registered predicates and priorities
    Plugins {
        /// Path to a YAML or JSON scheduler policy
        #[arg(long, env = "PACKSCHED_POLICY")]
        policy: Option<String>,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, policy } => run_serve(&bind, policy.as_deref()).await,
        Commands::Schedule {
            snapshot,
            pod,
            policy,
        } => run_schedule(&snapshot, &pod, policy.as_deref()),
        Commands::Plugins { policy } => run_plugins(policy.as_deref()),
    }
}

/// Run the extender until ctrl-c
async fn run_serve(bind: &str, policy: Option<&str>) -> miette::Result<()> {
    let scheduler = Scheduler::from_policy(&load_policy(policy)?)?;

    let config = ExtenderConfig {
        listen_addr: bind
            .parse()
            .map_err(|e| miette::miette!("Invalid bind address '{}': {}", bind, e))?,
    };

    let server = ExtenderServer::new(config, Arc::new(AppState::new(scheduler)));

    tokio::select! {
        result = server.run() => {
            result.map_err(|e| miette::miette!("Extender server error: {}", e))?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| miette::miette!("Failed to listen for ctrl-c: {}", e))?;
            info!("Shutting down");
        }
    }

    Ok(())
}

/// Filter and score every node in a snapshot file, then print the outcome
fn run_schedule(snapshot: &str, pod: &str, policy: Option<&str>) -> miette::Result<()> {
    let scheduler = Scheduler::from_policy(&load_policy(policy)?)?;
    let cluster = ClusterSnapshot::from_file(snapshot)?;
    let pod: Pod = packsched_core::from_file(pod)?;
    let pod = PodSnapshot::try_from(&pod)?;

    let result = scheduler.schedule(&pod, &cluster)?;

    println!("Pod {}", pod.name);
    for (node_name, decision) in &result.failed {
        let reason = decision.reason.map(|r| r.to_string()).unwrap_or_default();
        println!("  {:<32} rejected: {}", node_name, reason);
    }
    for score in &result.scores {
        println!("  {:<32} score: {}", score.node_name, score.score);
    }
    println!("Selected node: {} (score {})", result.node_name, result.score);

    Ok(())
}

/// Print every registered plugin, marking the ones the policy enables
fn run_plugins(policy: Option<&str>) -> miette::Result<()> {
    let policy = load_policy(policy)?;
    let registry = PluginRegistry::from_policy(&policy);

    println!("Predicates:");
    for name in registry.predicate_names() {
        let enabled = policy.predicates.iter().any(|p| p == name);
        println!("  [{}] {}", if enabled { "x" } else { " " }, name);
    }

    println!("Priorities:");
    for name in registry.priority_names() {
        match policy.priorities.iter().find(|p| p.name == name) {
            Some(p) => println!("  [x] {} (weight {})", name, p.weight),
            None => println!("  [ ] {}", name),
        }
    }

    println!(
        "Default requests: {}m CPU, {} memory",
        policy.default_requests.cpu_millicores,
        format_memory(policy.default_requests.memory_bytes)
    );

    Ok(())
}

/// Load the policy file, or fall back to the built-in defaults
fn load_policy(path: Option<&str>) -> miette::Result<SchedulerPolicy> {
    match path {
        Some(path) => Ok(SchedulerPolicy::from_file(path)?),
        None => {
            info!("No policy file given, using the default policy");
            Ok(SchedulerPolicy::default())
        }
    }
}
