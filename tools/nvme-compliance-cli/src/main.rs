use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use nvme_compliance::config::{load_register_map, parse_u64};
use nvme_compliance::sim::{SimQueueController, SimRegisterFile};
use nvme_compliance::{
    boundary_ids, ctlspc, ComplianceValidator, InvalidQidScenario, SpecRevision, MAX_IOQ_ID,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nvme-compliance",
    about = "NVMe controller register and queue identifier compliance checks."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate register defaults and RO attributes against a simulated BAR0
    Registers {
        /// Register map JSON (defaults to the built-in NVMe 1.0b table)
        #[arg(long, value_name = "PATH")]
        map: Option<PathBuf>,

        /// Specification revision whose registers are checked
        #[arg(long, value_name = "REV", default_value = "1.0b")]
        revision: SpecRevision,

        /// Make RO bits of the simulated device writable (e.g. 0x14:0x4)
        #[arg(long = "leak-ro", value_name = "OFFSET:MASK", value_parser = parse_leak)]
        leak_ro: Vec<(u64, u64)>,

        /// Only validate default values
        #[arg(long, action = clap::ArgAction::SetTrue)]
        skip_write_probes: bool,
    },

    /// Print the boundary queue identifiers, one per line
    Qids {
        /// Number of identifiers the controller supports
        #[arg(long, value_name = "N")]
        max_supported: u32,

        /// Ceiling of the identifier space
        #[arg(long, value_name = "N", default_value_t = MAX_IOQ_ID)]
        max_id: u32,
    },

    /// Run the Delete I/O SQ invalid queue identifier scenario against a simulated controller
    InvalidQid {
        /// Highest I/O queue id the simulated controller supports
        #[arg(long, value_name = "N", default_value_t = 64)]
        max_queues: u16,

        /// Simulate a controller that accepts deletes of nonexistent queues
        #[arg(long, action = clap::ArgAction::SetTrue)]
        accept_any_qid: bool,
    },
}

fn parse_leak(arg: &str) -> Result<(u64, u64), String> {
    let (offset, mask) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected OFFSET:MASK, got {arg:?}"))?;
    let offset = parse_u64(offset).map_err(|e| e.to_string())?;
    let mask = parse_u64(mask).map_err(|e| e.to_string())?;
    Ok((offset, mask))
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Registers {
            map,
            revision,
            leak_ro,
            skip_write_probes,
        } => {
            let map = match &map {
                Some(path) => load_register_map(path)
                    .with_context(|| format!("load register map {}", path.display()))?,
                None => ctlspc::nvme_1_0b(),
            };
            if map.is_empty() {
                bail!("register map is empty");
            }

            let mut sim =
                SimRegisterFile::from_map(&map).context("build simulated register space")?;
            for (offset, mask) in leak_ro {
                if offset >= sim.len() as u64 {
                    bail!(
                        "--leak-ro offset {offset:#x} is outside the {:#x}-byte register space",
                        sim.len()
                    );
                }
                tracing::info!(offset, mask, "leaking RO bits on the simulated device");
                sim.leak_ro_bits(offset, mask);
            }

            let mut validator = ComplianceValidator::new(&map, &mut sim, revision);
            let result = if skip_write_probes {
                validator.validate_defaults()
            } else {
                validator.run()
            };
            let checked = result.context("register compliance")?;
            if checked == 0 {
                bail!("no register in the map applies to revision {revision}");
            }

            println!("registers: PASS ({checked} registers, revision {revision})");
        }

        Command::Qids {
            max_supported,
            max_id,
        } => {
            for id in boundary_ids(max_supported, max_id) {
                println!("{id}");
            }
        }

        Command::InvalidQid {
            max_queues,
            accept_any_qid,
        } => {
            let mut ctrl = SimQueueController::new(max_queues);
            if accept_any_qid {
                ctrl = ctrl.accept_any_qid();
            }
            InvalidQidScenario::default()
                .run(&mut ctrl)
                .context("invalid queue identifier scenario")?;

            println!("invalid-qid: PASS ({} commands)", ctrl.submitted());
        }
    }
    Ok(())
}
