use clap::{Parser, Subcommand};
use op2tape::model::ModelManifest;
use op2tape::table::TABLE_ORDER;
use op2tape::writer::{trace_path, Op2Writer, WriteOptions};
use op2tape::{Endian, PostMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "op2tape", about = "Write Fortran-framed OP2 result files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an OP2 file (and its .txt trace) from a JSON model manifest
    Write {
        model: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// PARAM,POST value: -1 or -2
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        post: i32,
        /// Byte order: little (default) or big
        #[arg(short, long, default_value = "little", value_parser = parse_endian)]
        endian: Endian,
        /// Write complex results as magnitude/phase
        #[arg(long)]
        mag_phase: bool,
    },
    /// List the canonical table order
    Tables,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {

        // ── Write ────────────────────────────────────────────────────────────
        Commands::Write { model, output, post, endian, mag_phase } => {
            let opts = WriteOptions {
                is_mag_phase: mag_phase,
                post_mode:    PostMode::try_from(post)?,
                endian,
                ..WriteOptions::default()
            };
            let model = ModelManifest::load(&model)?.into_model();
            let summary = Op2Writer::default().write(&output, &model, &opts)?;

            for (table, cases) in &summary.tables {
                println!("  {:<8} {:>4} case(s)", table, cases);
            }
            let digest = blake3::hash(&std::fs::read(&output)?);
            println!("Created: {} ({} B, {} case(s))",
                     output.display(), summary.bytes_written, summary.total_case_count);
            println!("Trace:   {}", trace_path(&output).display());
            println!("BLAKE3:  {}", hex::encode(digest.as_bytes()));
        }

        // ── Tables ───────────────────────────────────────────────────────────
        Commands::Tables => {
            for (i, table) in TABLE_ORDER.iter().enumerate() {
                println!("{:>3}  {}", i, table);
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_endian(s: &str) -> Result<Endian, String> {
    Endian::from_name(s).ok_or_else(|| format!("unknown endian '{}'; use little or big", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endian_flag_accepts_both_orders() {
        let cli = Cli::try_parse_from(["op2tape", "write", "m.json", "-o", "m.op2", "--endian", "big"]).unwrap();
        match cli.command {
            Commands::Write { endian, post, .. } => {
                assert_eq!(endian, Endian::Big);
                assert_eq!(post, -1);
            }
            Commands::Tables => panic!("parsed the wrong subcommand"),
        }
        assert_eq!(parse_endian("LE"), Ok(Endian::Little));
    }

    #[test]
    fn endian_typo_is_rejected() {
        assert!(parse_endian("bg").is_err());
        let res = Cli::try_parse_from(["op2tape", "write", "m.json", "-o", "m.op2", "--endian", "bg"]);
        assert!(res.is_err());
    }
}
