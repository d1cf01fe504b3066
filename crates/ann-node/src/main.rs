#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;

use ann_node::{compute_root, load_config, verify_root_file, TxFileFormat};
use ann_types::Hash256;
use clap::{Parser, Subcommand};
use tracing::{error, warn};

#[derive(Debug, Parser)]
#[command(name = "ann-node", about = "Compute and check transaction roots")]
struct Cli {
    /// Chain config (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Layout of the tx file.
    #[arg(long, value_enum, default_value_t = TxFileFormat::Hex, global = true)]
    format: TxFileFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the txs root of a tx file.
    Root {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Recompute the root and compare it with an expected hex digest.
    Verify { file: PathBuf, expected: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("ann-node error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Root { file, json } => {
            let report = compute_root(&file, cli.format, &cfg)?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report.txs_root);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { file, expected } => {
            let expected = Hash256::from_hex(&expected)?;
            if verify_root_file(&file, cli.format, &expected, &cfg)? {
                println!("ok");
                Ok(ExitCode::SUCCESS)
            } else {
                warn!(expected = %expected, "txs root mismatch");
                println!("mismatch");
                Ok(ExitCode::from(2))
            }
        }
    }
}
