//! tmesh Simulator
//!
//! Runs several tmesh nodes over the simulated air and prints a JSON
//! report of who synchronized with whom.

use anyhow::Context;
use std::path::PathBuf;
use std::process;
use tmesh_core::{logging, TmeshConfig};
use tmesh_radio::Simulation;

struct Args {
    config: Option<PathBuf>,
    cycles: Option<u32>,
    nodes: Option<usize>,
    send: bool,
}

fn parse_args() -> Result<Option<Args>, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut parsed = Args {
        config: None,
        cycles: None,
        nodes: None,
        send: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(None),
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).ok_or("Missing value for --config")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--cycles" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --cycles")?;
                parsed.cycles = Some(value.parse().map_err(|_| "Invalid --cycles")?);
            }
            "--nodes" | "-n" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --nodes")?;
                parsed.nodes = Some(value.parse().map_err(|_| "Invalid --nodes")?);
            }
            "--send" => parsed.send = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(Some(parsed))
}

fn print_usage() {
    println!("tmesh-sim - Simulate tmesh nodes sharing one radio medium");
    println!();
    println!("USAGE:");
    println!("    tmesh-sim [--config <file>] [--cycles <n>] [--nodes <n>] [--send]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config    TOML configuration (defaults built in)");
    println!("        --cycles    Cycles to run, overrides [sim] cycles");
    println!("    -n, --nodes     Node count, overrides [sim] nodes");
    println!("        --send      Have the first node send a packet to every peer");
    println!("    -h, --help      Show this message");
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => TmeshConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => TmeshConfig::default_config(),
    };
    if let Some(cycles) = args.cycles {
        config.sim.cycles = cycles;
    }
    if let Some(nodes) = args.nodes {
        config.sim.nodes = nodes;
    }

    logging::init_with(&config.logging);

    let mut sim = Simulation::new(&config).context("Failed to build simulation")?;
    if args.send {
        sim.greet_all().context("Failed to queue packets")?;
    }
    sim.run(config.sim.cycles);

    let report = serde_json::to_string_pretty(&sim.report())?;
    println!("{}", report);
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            println!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
