use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use convdiff::{ArchiveWriter, Driver, ErrorTracker, Logger, Method, Parameters, Simulation};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Integrator {
    /// Fixed step forward Euler
    Euler,
    /// Dormand-Prince 5(4) with error control
    Adaptive,
}

/// Integrate a Gaussian pulse under periodic convection, diffusion and reaction
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Convection speed C
    #[arg(short = 'c', long, default_value_t = Parameters::default().convection)]
    convection: f64,

    /// Diffusion coefficient D
    #[arg(short = 'd', long, default_value_t = Parameters::default().diffusion)]
    diffusion: f64,

    /// Reaction rate S
    #[arg(short = 's', long, allow_negative_numbers = true, default_value_t = Parameters::default().reaction)]
    reaction: f64,

    /// Length of the periodic domain
    #[arg(short = 'l', long, default_value_t = Parameters::default().length)]
    length: f64,

    /// Final time
    #[arg(short = 't', long, default_value_t = Parameters::default().final_time)]
    final_time: f64,

    /// The grid has 2^n nodes
    #[arg(short = 'n', long, default_value_t = Parameters::default().exponent)]
    exponent: u32,

    /// Number of sample times
    #[arg(long, default_value_t = Parameters::default().samples)]
    samples: usize,

    #[arg(short, long, value_enum, default_value_t = Integrator::Adaptive)]
    method: Integrator,

    /// Directory receiving the archive
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

fn run<M: Method>(sim: Simulation<M>, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("couldn't create {}", path.display()))?;
    let mut output = io::BufWriter::new(file);
    let mut errors = ErrorTracker::new();

    println!("{sim}");
    Driver::new(sim)
        .with_observer(Logger)
        .with_observer(&mut errors)
        .with_observer(ArchiveWriter::new(&mut output))
        .run()?;

    if let Some(worst) = errors.worst() {
        println!(
            "worst error against the analytic solution: max {:e}, L2 {:e}",
            worst.max, worst.l2
        );
    }
    println!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args = Args::parse();
    let params = Parameters {
        convection: args.convection,
        diffusion: args.diffusion,
        reaction: args.reaction,
        length: args.length,
        final_time: args.final_time,
        exponent: args.exponent,
        samples: args.samples,
        ..Default::default()
    };

    let sim = params.simulation()?;
    let path = args.output.join(params.output_file_name());
    match args.method {
        Integrator::Adaptive => run(sim, &path),
        Integrator::Euler => run(sim.using(params.forward_euler()), &path),
    }
}
