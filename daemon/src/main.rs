//! Cadastre daemon: runs the registry node, plus a few offline helpers for
//! operators and client developers.

use std::path::PathBuf;

use anyhow::{bail, Context};
use cadastre_auth::challenge_message;
use cadastre_crypto::{generate_keypair, generate_salt, keypair_from_seed};
use cadastre_node::{init_logging, CadastreNode, LogFormat, NodeConfig, StorageBackend};
use cadastre_proof::compute_commitment;
use cadastre_types::{ChallengeNonce, OwnerAddress, ParcelId, Salt};
use clap::Parser;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "cadastre-daemon", about = "Land parcel registry daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run or inspect the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Generate a secp256k1 wallet key and print its address.
    Keygen,
    /// Compute the ownership commitment for an owner, salt and parcel.
    Commitment {
        #[arg(long)]
        owner: String,
        /// 32-byte salt as hex. A random salt is generated when omitted.
        #[arg(long)]
        salt: Option<String>,
        #[arg(long)]
        parcel: String,
    },
    /// Sign a login challenge nonce with a wallet key.
    SignChallenge {
        /// Hex-encoded 32-byte private key.
        #[arg(long, env = "CADASTRE_WALLET_KEY", hide_env_values = true)]
        key: String,
        #[arg(long)]
        nonce: String,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT/SIGTERM.
    Run(RunArgs),
    /// Print the effective configuration as TOML (secrets omitted).
    Config(RunArgs),
}

/// Settings given on the command line or in the environment override the
/// configuration file.
#[derive(clap::Args)]
struct RunArgs {
    /// Path to a TOML configuration file.
    #[arg(long, env = "CADASTRE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "CADASTRE_BIND")]
    bind: Option<String>,

    #[arg(long, env = "CADASTRE_PORT")]
    port: Option<u16>,

    #[arg(long, env = "CADASTRE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend: "memory" or "lmdb".
    #[arg(long, env = "CADASTRE_STORAGE")]
    storage: Option<String>,

    #[arg(long, env = "CADASTRE_LEDGER_SNAPSHOT")]
    ledger_snapshot: Option<PathBuf>,

    /// Address granted the authority role. Repeatable.
    #[arg(long = "authority", env = "CADASTRE_AUTHORITIES", value_delimiter = ',')]
    authorities: Vec<String>,

    #[arg(long, env = "CADASTRE_PUBLIC_URL")]
    public_url: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CADASTRE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[arg(long, env = "CADASTRE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Disable the Prometheus endpoint.
    #[arg(long)]
    no_metrics: bool,
}

impl RunArgs {
    fn into_config(self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => NodeConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.rpc_port = port;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(storage) = self.storage {
            config.storage = match storage.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "lmdb" => StorageBackend::Lmdb,
                other => bail!("unknown storage backend `{other}`"),
            };
        }
        if let Some(path) = self.ledger_snapshot {
            config.ledger_snapshot = Some(path);
        }
        if !self.authorities.is_empty() {
            config.authority_addresses = self.authorities;
        }
        if let Some(url) = self.public_url {
            config.public_base_url = Some(url);
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.no_metrics {
            config.enable_metrics = false;
        }
        config.apply_env();
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Node { action } => match action {
            NodeAction::Run(args) => {
                let config = args.into_config()?;
                init_logging(config.log_format, &config.log_level)?;
                tracing::info!(
                    version = env!("CARGO_PKG_VERSION"),
                    bind = %config.bind_address,
                    port = config.rpc_port,
                    "starting cadastre daemon"
                );
                let node = CadastreNode::new(config)?;
                node.run().await?;
                tracing::info!("cadastre daemon exited cleanly");
            }
            NodeAction::Config(args) => {
                cadastre_utils::init_tracing("warn");
                print!("{}", args.into_config()?.to_toml_string()?);
            }
        },
        Command::Keygen => {
            let key = generate_keypair();
            let secret = Zeroizing::new(key.secret_hex());
            println!("address:     {}", key.address());
            println!("private key: {}", secret.as_str());
        }
        Command::Commitment {
            owner,
            salt,
            parcel,
        } => {
            let owner = OwnerAddress::parse(&owner)?;
            let parcel: ParcelId = parcel.parse()?;
            let salt = match salt {
                Some(raw) => Salt::from_hex(&raw)?,
                None => generate_salt(),
            };
            println!("salt:       {}", salt.to_hex());
            println!("commitment: {}", compute_commitment(&owner, &salt, parcel));
        }
        Command::SignChallenge { key, nonce } => {
            let raw = Zeroizing::new(
                hex::decode(key.trim_start_matches("0x")).context("private key is not hex")?,
            );
            let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
                raw.as_slice()
                    .try_into()
                    .context("private key must be 32 bytes")?,
            );
            let wallet = keypair_from_seed(&seed)?;
            let nonce: ChallengeNonce = nonce.parse()?;
            let message = challenge_message(nonce);
            println!("address:   {}", wallet.address());
            println!("message:   {message}");
            println!("signature: {}", wallet.sign_personal_hex(message.as_bytes())?);
        }
    }

    Ok(())
}
