use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
mod auth;
use seedkdf::{KdfParams, derive_key, expand_seed, generate_salt};

#[derive(Debug, clap::Args)]
struct Argon2Args {
    /// Argon2 time cost / iterations (default: 2)
    #[arg(long = "time-cost", env = "SEEDKDF_TIME_COST")]
    time_cost: Option<u32>,

    /// Argon2 memory cost in KiB (default: 102400)
    #[arg(long = "memory-cost", env = "SEEDKDF_MEMORY_COST")]
    mem_cost_kib: Option<u32>,

    /// Argon2 parallelism / lanes (default: 8)
    #[arg(long = "parallelism", env = "SEEDKDF_PARALLELISM")]
    parallelism: Option<u32>,

    /// Derived key length in bytes (default: 32)
    #[arg(long = "hash-len", env = "SEEDKDF_HASH_LEN")]
    hash_len: Option<usize>,
}

impl Argon2Args {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();

        let params = KdfParams::new(
            self.mem_cost_kib.unwrap_or(default.mem_cost_kib()),
            self.time_cost.unwrap_or(default.time_cost()),
            self.parallelism.unwrap_or(default.parallelism()),
            self.hash_len.unwrap_or(default.hash_len()),
        )?;
        Ok(params)
    }
}

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
struct SeedArgs {
    /// Seed as text, e.g. a user id
    #[arg(long, value_name = "TEXT")]
    seed: Option<String>,

    /// Seed as hex-encoded bytes
    #[arg(long = "seed-hex", value_name = "HEX")]
    seed_hex: Option<String>,
}

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
struct SaltSourceArgs {
    /// Seed as text, e.g. a user id
    #[arg(long, value_name = "TEXT")]
    seed: Option<String>,

    /// Seed as hex-encoded bytes
    #[arg(long = "seed-hex", value_name = "HEX")]
    seed_hex: Option<String>,

    /// Use a fresh random salt instead of expanding a seed
    #[arg(long = "random-salt")]
    random_salt: bool,
}

fn decode_seed(seed: Option<&str>, seed_hex: Option<&str>) -> Result<Option<Vec<u8>>> {
    match (seed, seed_hex) {
        (Some(text), _) => Ok(Some(text.as_bytes().to_vec())),
        (None, Some(h)) => Ok(Some(hex::decode(h).context("seed is not valid hex")?)),
        (None, None) => Ok(None),
    }
}

#[derive(Debug, Parser)]
#[command(name = "seedkdf")]
#[command(
    version,
    about = "Derive keys from a password and a user identifier with Argon2id."
)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log derivation steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Expands a seed into a 32-byte salt
    #[command(arg_required_else_help = true)]
    Expand {
        #[command(flatten)]
        seed: SeedArgs,
    },

    /// Derives a key from the password and a seed (or random salt)
    #[command(arg_required_else_help = true)]
    Derive {
        #[command(flatten)]
        source: SaltSourceArgs,

        #[command(flatten)]
        argon2: Argon2Args,
    },
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    derived_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<String>,
    salt: String,
    salt_kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<KdfParams>,
}

impl Report<'_> {
    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        if let Some(key) = self.derived_key {
            println!("Derived key (hex): {key}");
        }
        if let Some(seed) = &self.seed {
            println!("Seed (hex): {seed}");
        }
        match self.salt_kind {
            "random" => println!("Random salt (hex): {}", self.salt),
            _ => println!("Expanded salt (hex): {}", self.salt),
        }
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // A missing .env is fine; flags and the process environment still apply.
    let _ = dotenvy::dotenv();

    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Expand { seed } => {
            let bytes = decode_seed(seed.seed.as_deref(), seed.seed_hex.as_deref())?
                .context("no seed provided")?;
            let salt = expand_seed(&bytes).context("failed to expand seed")?;

            Report {
                derived_key: None,
                seed: Some(hex::encode(&bytes)),
                salt: salt.to_hex(),
                salt_kind: "expanded",
                params: None,
            }
            .print(args.json)?;
        }
        Commands::Derive { source, argon2 } => {
            let params = argon2.to_kdf_params().context("invalid Argon2 parameters")?;
            let seed = decode_seed(source.seed.as_deref(), source.seed_hex.as_deref())?;

            let (salt, salt_kind) = match (&seed, source.random_salt) {
                (Some(bytes), _) => {
                    let salt = expand_seed(bytes).context("failed to expand seed")?;
                    (salt.as_bytes().to_vec(), "expanded")
                }
                (None, true) => (generate_salt()?.to_vec(), "random"),
                (None, false) => bail!("no seed provided"),
            };

            let password = auth::read_password()?;
            let key = derive_key(&password, &salt, params).context("failed to derive key")?;
            drop(password);

            let key_hex = key.to_hex();
            Report {
                derived_key: Some(key_hex.as_str()),
                seed: seed.as_deref().map(hex::encode),
                salt: hex::encode(&salt),
                salt_kind,
                params: Some(params),
            }
            .print(args.json)?;
        }
    }

    Ok(())
}
