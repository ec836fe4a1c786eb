use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use redeemer::config::{DEFAULT_CLOCK_SKEW_SECS, DEFAULT_LEDGER_PATH, DEFAULT_MAX_AGE_SECS};
use redeemer::{Redeemer, RedeemerConfig};
use serde::Serialize;
use silvercode::{Codec, SharedKey, Token};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "silvercode")]
#[command(about = "Issue and verify Silver Coin redemption codes")]
struct Cli {
    /// File holding the shared key as hex
    #[arg(long, global = true, value_name = "PATH")]
    key_file: Option<PathBuf>,

    /// Shared key as hex, used when --key-file is not given
    #[arg(long, global = true, env = "SILVERCODE_KEY", hide_env_values = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new 32-byte shared key
    Keygen {
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },
    /// Issue a code for a number of Silver Coins
    Issue {
        #[arg(short, long, value_parser = clap::value_parser!(i32).range(1..))]
        amount: i32,
    },
    /// Verify a code and show its contents without spending it
    Inspect {
        code: String,

        #[arg(long)]
        json: bool,
    },
    /// Verify a code and record it as spent
    Redeem {
        code: String,

        #[arg(long, env = "SILVERCODE_LEDGER_PATH", default_value = DEFAULT_LEDGER_PATH)]
        ledger: PathBuf,

        #[arg(
            long,
            env = "SILVERCODE_MAX_AGE_SECS",
            default_value_t = DEFAULT_MAX_AGE_SECS,
            value_parser = clap::value_parser!(i64).range(1..)
        )]
        max_age_secs: i64,

        #[arg(
            long,
            env = "SILVERCODE_CLOCK_SKEW_SECS",
            default_value_t = DEFAULT_CLOCK_SKEW_SECS,
            value_parser = clap::value_parser!(i64).range(0..)
        )]
        clock_skew_secs: i64,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct Inspection {
    amount: i32,
    issued_at: i64,
    issued_at_utc: String,
    nonce: String,
}

impl Inspection {
    fn new(token: &Token) -> Self {
        Self {
            amount: token.amount,
            issued_at: token.issued_at,
            issued_at_utc: format_timestamp(token.issued_at),
            nonce: token.nonce_hex(),
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "silvercode=info,redeemer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    debug!("{:?}", cli.command);

    match cli.command {
        Command::Keygen { out, force } => keygen(out.as_deref(), force),
        Command::Issue { amount } => {
            let key = load_key(cli.key_file.as_deref(), cli.key.as_deref())?;
            let code = Codec::new(key).encode(amount)?;
            info!("Issued code for {} Silver Coins", amount);
            println!("{}", code);
            Ok(())
        }
        Command::Inspect { code, json } => {
            let key = load_key(cli.key_file.as_deref(), cli.key.as_deref())?;
            let token = Codec::new(key).decode(&code)?;
            print_inspection(&Inspection::new(&token), json)
        }
        Command::Redeem {
            code,
            ledger,
            max_age_secs,
            clock_skew_secs,
            json,
        } => {
            let key = load_key(cli.key_file.as_deref(), cli.key.as_deref())?;
            let config = RedeemerConfig::new(key)
                .with_max_age(max_age_secs)
                .with_clock_skew(clock_skew_secs)
                .with_ledger_path(expand(&ledger));
            let redeemer = Redeemer::new(config)?;
            let redemption = redeemer.redeem_now(&code)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&redemption)?);
            } else {
                println!(
                    "{} {} Silver Coins",
                    "REDEEMED".green().bold(),
                    redemption.amount
                );
                println!("  Issued at:   {}", format_timestamp(redemption.issued_at));
                println!("  Nonce:       {}", redemption.nonce);
                println!("  Fingerprint: {}", redemption.fingerprint);
            }
            Ok(())
        }
    }
}

fn keygen(out: Option<&Path>, force: bool) -> Result<()> {
    let key = SharedKey::generate()?;

    let Some(out) = out else {
        println!("{}", key.to_hex());
        return Ok(());
    };

    let path = expand(out);
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite (codes issued under the old key stop verifying)",
            path.display()
        );
    }
    std::fs::write(&path, format!("{}\n", key.to_hex()))
        .with_context(|| format!("Failed to write key to {}", path.display()))?;

    println!("Wrote {}-byte key to {}", key.len(), path.display());
    Ok(())
}

fn load_key(key_file: Option<&Path>, key_hex: Option<&str>) -> Result<SharedKey> {
    if let Some(path) = key_file {
        let path = expand(path);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read key from {}", path.display()))?;
        return Ok(SharedKey::from_hex(&contents)?);
    }

    match key_hex {
        Some(hex) => Ok(SharedKey::from_hex(hex)?),
        None => Err(anyhow!(
            "No shared key: pass --key-file or set SILVERCODE_KEY"
        )),
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

fn format_timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{} (out of range)", secs))
}

fn print_inspection(inspection: &Inspection, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(inspection)?);
        return Ok(());
    }

    println!("{} signature matches", "VALID".green().bold());
    println!("  Amount:    {} Silver Coins", inspection.amount);
    println!("  Issued at: {}", inspection.issued_at_utc);
    println!("  Nonce:     {}", inspection.nonce);
    if inspection.amount <= 0 {
        println!("  {}", "amount is not positive, redemption will refuse it".red());
    }
    Ok(())
}
