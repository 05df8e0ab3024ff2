use pokemon_turn_engine::{run, CliOptions};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- [--scenario scenario.json] [--config engine.json] [--seed SEED] \
[--battles N] [--output PATH] [--verbose]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut scenario_path = PathBuf::from("data/demo_scenario.json");
    let mut config_path = None;
    let mut seed = 0u64;
    let mut battles = 1usize;
    let mut output_path = None;
    let mut verbose = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scenario" => {
                scenario_path = args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--scenario requires a path (e.g. --scenario scenario.json)")
                })?;
            }
            "--config" => {
                config_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--config requires a path (e.g. --config engine.json)")
                })?);
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                seed = val.parse()?;
            }
            "--battles" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--battles requires a number"))?;
                battles = val.parse()?;
            }
            "--output" => {
                output_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--output requires a path (e.g. --output summary.csv)")
                })?);
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok(CliOptions {
        scenario_path,
        config_path,
        seed,
        battles,
        output_path,
        verbose,
    })
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let opts = parse_args()?;
    init_tracing(opts.verbose);
    run(opts)
}
