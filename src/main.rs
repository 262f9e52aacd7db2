use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use oxmatch::{Error, OxmField, ParsedPacket, Result};

#[derive(Parser)]
#[command(name = "oxmatch")]
#[command(author, version, about = "Inspect and rewrite match fields of a raw frame", long_about = None)]
struct Cli {
    /// Hex-encoded frame bytes (whitespace and colons ignored).
    /// Read from --file when omitted.
    frame: Option<String>,

    /// File containing the hex-encoded frame.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Ingress port bound as IN_PORT.
    #[arg(short, long, default_value_t = 1)]
    port: u32,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every bound field and its value (default).
    Fields {
        /// Emit the dump as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print the scanned DHCP option list.
    DhcpOptions,
    /// Apply FIELD=VALUE[/MASK] rewrites, then print the mutated frame as hex.
    Rewrite {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

#[derive(Serialize)]
struct FieldDump {
    field: String,
    bits: u32,
    value: u64,
    hex: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let mut frame = load_frame(&cli)?;
    debug!(bytes = frame.len(), port = cli.port, "loaded frame");

    match cli.command.unwrap_or(Commands::Fields { json: false }) {
        Commands::Fields { json } => {
            let packet = ParsedPacket::parse(&mut frame, cli.port)?;

            let dumps: Vec<FieldDump> = packet
                .bound_fields()
                .map(|field| {
                    let value = packet.value(field)?;
                    Ok(FieldDump {
                        field: field.to_string(),
                        bits: field.bits(),
                        value,
                        hex: format!("{:#x}", value),
                    })
                })
                .collect::<Result<_>>()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dumps)?);
            } else {
                println!("{:<14} {:>5} {:>14} {:>18}", "Field", "Bits", "Value", "Hex");
                println!("{}", "-".repeat(54));
                for dump in &dumps {
                    println!(
                        "{:<14} {:>5} {:>14} {:>18}",
                        dump.field, dump.bits, dump.value, dump.hex
                    );
                }
                println!();
                println!(
                    "{} bytes total, vlan tagged: {}",
                    packet.total_bytes(),
                    packet.vlan_tagged()
                );
            }
            Ok(())
        }
        Commands::DhcpOptions => {
            let packet = ParsedPacket::parse(&mut frame, cli.port)?;

            let mut options: Vec<_> = packet.dhcp_options().collect();
            options.sort_by_key(|option| option.code);

            if options.is_empty() {
                println!("No DHCP options.");
            } else {
                println!("{:<6} {:<8} Value", "Code", "Length");
                println!("{}", "-".repeat(40));
                for option in options {
                    println!(
                        "{:<6} {:<8} {}",
                        option.code,
                        option.length(),
                        to_hex(option.value)
                    );
                }
            }
            Ok(())
        }
        Commands::Rewrite { assignments } => {
            let rewrites = assignments
                .iter()
                .map(|assignment| parse_assignment(assignment))
                .collect::<Result<Vec<_>>>()?;

            let mut packet = ParsedPacket::parse(&mut frame, cli.port)?;
            for (field, value, mask) in rewrites {
                debug!(%field, value, mask, "applying rewrite");
                packet.modify(field, value, mask)?;
            }

            let mut out = vec![0u8; packet.total_bytes()];
            packet.serialize_to(&mut out);
            println!("{}", to_hex(&out));
            Ok(())
        }
    }
}

fn load_frame(cli: &Cli) -> Result<Vec<u8>> {
    let hex = match (&cli.frame, &cli.file) {
        (Some(frame), _) => frame.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            return Err(Error::InvalidFrame(
                "no frame given: pass hex bytes or --file".to_string(),
            ))
        }
    };
    parse_hex(&hex)
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();

    if cleaned.len() % 2 != 0 {
        return Err(Error::InvalidFrame(format!(
            "odd number of hex digits: {}",
            cleaned.len()
        )));
    }

    (0..cleaned.len())
        .step_by(2)
        .map(|index| {
            u8::from_str_radix(&cleaned[index..index + 2], 16)
                .map_err(|_| Error::InvalidFrame(format!("bad hex at offset {}", index)))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Parses `FIELD=VALUE[/MASK]`; values and masks accept 0x-prefixed hex.
fn parse_assignment(assignment: &str) -> Result<(OxmField, u64, u64)> {
    let (name, rest) = assignment
        .split_once('=')
        .ok_or_else(|| Error::InvalidFrame(format!("expected FIELD=VALUE, got {}", assignment)))?;

    let field: OxmField = name
        .parse()
        .map_err(Error::InvalidFrame)?;

    let (value_str, mask_str) = match rest.split_once('/') {
        Some((value, mask)) => (value, Some(mask)),
        None => (rest, None),
    };

    let value = parse_u64(value_str)?;
    let mask = match mask_str {
        Some(mask) => parse_u64(mask)?,
        None => field.full_mask(),
    };

    Ok((field, value, mask))
}

fn parse_u64(input: &str) -> Result<u64> {
    let parsed = if let Some(hex) = input.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        input.parse()
    };
    parsed.map_err(|_| Error::InvalidFrame(format!("bad number: {}", input)))
}
