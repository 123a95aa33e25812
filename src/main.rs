//! EvoNet - CLI Entry Point
//!
//! Build, mutate, inspect and evaluate evolvable networks.

use clap::{Parser, Subcommand};
use evonet::checkpoint::NetworkCheckpoint;
use evonet::{seeded_rng, Config, MutationControl, Network, StructuralOperator};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "evonet")]
#[command(version)]
#[command(about = "Evolvable layered neural networks with structural mutation and recurrent delay lines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Build a network and print its topology
    Inspect {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Random seed, overrides the config
        #[arg(long)]
        seed: Option<u64>,

        /// Also list every connection
        #[arg(long)]
        connections: bool,
    },

    /// Initialize a network and apply mutation events
    Mutate {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Random seed, overrides the config
        #[arg(long)]
        seed: Option<u64>,

        /// Number of mutation events
        #[arg(short, long, default_value = "100")]
        events: u64,

        /// Checkpoint file to write
        #[arg(short, long, default_value = "network.bin")]
        output: PathBuf,
    },

    /// Evaluate a saved network
    Run {
        /// Checkpoint file
        #[arg(short, long)]
        network: PathBuf,

        /// Comma-separated input vector
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        inputs: Vec<f32>,

        /// Number of timesteps
        #[arg(short, long, default_value = "1")]
        steps: usize,

        /// Print the outputs of every step
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }
        Commands::Inspect {
            config,
            seed,
            connections,
        } => {
            let config = load_config(config)?;
            inspect(config, seed, connections)
        }
        Commands::Mutate {
            config,
            seed,
            events,
            output,
        } => {
            let config = load_config(config)?;
            mutate(config, seed, events, output)
        }
        Commands::Run {
            network,
            inputs,
            steps,
            trace,
        } => {
            init_logging("info");
            run_network(network, inputs, steps, trace)
        }
    }
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

/// Load the config file (or defaults when it does not exist) and install logging.
fn load_config(path: PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        Config::from_file(&path)?
    } else {
        Config::default()
    };
    init_logging(&config.logging.log_level);
    if path.exists() {
        log::info!("Loaded config from {:?}", path);
    } else {
        log::info!("{:?} not found, using default configuration", path);
    }
    Ok(config)
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Generated default config: {:?}", output);
    Ok(())
}

fn inspect(config: Config, seed: Option<u64>, connections: bool) -> Result<(), Box<dyn std::error::Error>> {
    let seed = seed.or(config.seed);
    let mut rng = seeded_rng(seed);
    let net = Network::initialize(&config.network, &mut rng)?;

    print!("{}", net.summary());
    println!("Parameters: {}", net.parameter_count());

    if connections {
        println!();
        for c in net.connections() {
            let delay = c.delay().map_or_else(|| "-".to_string(), |d| d.to_string());
            println!(
                "  {}: {} -> {} {:?} w={:+.4} delay={}{}",
                c.id,
                c.source,
                c.target,
                c.kind,
                c.weight,
                delay,
                if c.enabled { "" } else { " (disabled)" }
            );
        }
    }
    Ok(())
}

fn mutate(mut config: Config, seed: Option<u64>, events: u64, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let seed = seed.or(config.seed);
    let mut rng = seeded_rng(seed);
    let mut net = Network::initialize(&config.network, &mut rng)?;
    let mut control = config.schedule.clone().map(MutationControl::new);
    if control.as_ref().is_some_and(MutationControl::needs_diversity) {
        log::warn!("adaptive schedule needs population diversity, which a single network lacks; keeping its initial values");
    }

    println!("Initial network");
    print!("{}", net.summary());
    println!();

    let start = Instant::now();
    let mut applied: HashMap<StructuralOperator, usize> = HashMap::new();
    let mut rejected = 0usize;

    for generation in 0..events {
        if let (Some(control), Some(mutation)) = (control.as_mut(), config.network.mutation.as_mut()) {
            if !control.needs_diversity() {
                control.update(generation as u32, None);
            }
            control.apply_to(mutation);
        }

        let outcome = net.mutate(&config.network, &mut rng);
        if let Some(op) = outcome.structure.operator {
            if outcome.structure.changed() {
                *applied.entry(op).or_default() += 1;
            }
        }
        rejected += outcome.structure.rejections.len();
    }

    if let Err(violation) = net.check_invariants() {
        log::error!("network invariant broken after mutation: {}", violation);
        return Err(violation.into());
    }

    println!("=== Mutation Complete ===");
    println!("Events: {} in {:.3}s", events, start.elapsed().as_secs_f64());
    for op in [
        StructuralOperator::AddNeuron,
        StructuralOperator::RemoveNeuron,
        StructuralOperator::AddConnection,
        StructuralOperator::RemoveConnection,
    ] {
        println!("  {:?}: {}", op, applied.get(&op).copied().unwrap_or(0));
    }
    println!("  Rejected edits: {}", rejected);
    println!();
    print!("{}", net.summary());

    NetworkCheckpoint::new(net, events, seed).save(&output)?;
    println!("Saved network: {:?}", output);
    Ok(())
}

fn run_network(path: PathBuf, inputs: Vec<f32>, steps: usize, trace: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut checkpoint = NetworkCheckpoint::load(&path)?;
    log::info!(
        "Loaded network from {:?} (generation {})",
        path,
        checkpoint.generation
    );

    let outputs = checkpoint.network.forward_trace(&inputs, steps)?;
    if trace {
        for (step, out) in outputs.iter().enumerate() {
            println!("step {}: {:?}", step + 1, out);
        }
    } else if let Some(last) = outputs.last() {
        println!("{:?}", last);
    }
    Ok(())
}
