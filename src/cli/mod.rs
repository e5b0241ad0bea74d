//! Command-line front end: inspect, run and assemble AVM program files.

pub mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::loader::load_machine_from_file;
use crate::runtime::{ProgramImage, ProgramLoader};
use crate::utils::init_logging;
use config::{Listing, LoaderConfig};

/// CLI for loading and running validator machines.
#[derive(Parser, Debug)]
#[clap(name = "avm-loader", version)]
pub struct Cli {
    /// TOML file with a [machine] table supplying defaults
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Args, Debug, Clone)]
pub struct MachineArgs {
    /// machine type: go, cpp or test (case-insensitive)
    #[clap(long = "vm")]
    pub vm_type: Option<String>,

    /// report load and run diagnostics (go and test backends only)
    #[clap(long)]
    pub warn: bool,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Load a program and print its backend, status and hash
    Inspect {
        program: PathBuf,
        #[clap(flatten)]
        machine: MachineArgs,
    },
    /// Load a program and execute it
    Run {
        program: PathBuf,
        #[clap(flatten)]
        machine: MachineArgs,

        #[clap(long)]
        max_steps: Option<u64>,

        /// print the assertion as JSON
        #[clap(long)]
        json: bool,
    },
    /// Write a program image from a TOML instruction listing
    Assemble { input: PathBuf, output: PathBuf },
}

pub async fn run_cli() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let out = dispatch(cli).await?;
    println!("{}", out);
    Ok(())
}

/// Execute a parsed command and return what should be printed.
pub async fn dispatch(cli: Cli) -> Result<String> {
    let cfg = match &cli.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };

    match cli.cmd {
        Cmd::Inspect { program, machine } => {
            let (vm_type, warn) = resolve(&cfg, &machine);
            // backend constructors do blocking file I/O
            tokio::task::spawn_blocking(move || -> Result<String> {
                let m = load_machine_from_file(&program, warn, &vm_type)?;
                Ok(format!(
                    "backend: {}\nstatus: {}\nhash: {}",
                    m.backend(),
                    m.status()?,
                    hex::encode(m.hash()?)
                ))
            })
            .await?
        }
        Cmd::Run { program, machine, max_steps, json } => {
            let (vm_type, warn) = resolve(&cfg, &machine);
            let max_steps = max_steps.unwrap_or(cfg.machine.max_steps);
            tokio::task::spawn_blocking(move || -> Result<String> {
                let mut m = load_machine_from_file(&program, warn, &vm_type)?;
                let assertion = m.execute(max_steps)?;
                if json {
                    return Ok(serde_json::to_string_pretty(&assertion)?);
                }
                Ok(format!(
                    "status: {}\nsteps: {}\ngas: {}\nlogs: {:?}\nhash: {}",
                    m.status()?,
                    assertion.num_steps,
                    assertion.num_gas,
                    assertion.logs,
                    hex::encode(assertion.after_hash)
                ))
            })
            .await?
        }
        Cmd::Assemble { input, output } => {
            let listing = Listing::load(&input)?;
            let image = ProgramImage::new(listing.code);
            let warnings = image.validate()?;
            ProgramLoader::write_image(&output, &image)?;
            let mut out = format!("wrote {} instructions to {}", image.code.len(), output.display());
            for w in warnings {
                out.push_str(&format!("\nwarning: {}", w));
            }
            Ok(out)
        }
    }
}

/// Flags win over the config file.
fn resolve(cfg: &LoaderConfig, args: &MachineArgs) -> (String, bool) {
    let vm_type = args.vm_type.clone().unwrap_or_else(|| cfg.machine.vm_type.clone());
    (vm_type, args.warn || cfg.machine.warn_mode)
}
