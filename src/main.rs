use clap::{Parser, Subcommand};

use passnexus_core::codec;
use passnexus_core::crypto::envelope;
use passnexus_core::crypto::kdf::{self, DerivationMode};
use passnexus_core::crypto::sensitive::MasterKey;
use passnexus_core::error::Result;
use passnexus_core::master;

#[derive(Parser)]
#[command(name = "passnexus-core")]
#[command(about = "Envelope encryption core for the PassNexus vault")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a master key from an identity and signature
    DeriveKey {
        /// Identity id (e.g. wallet address)
        #[arg(long)]
        identity: String,
        /// Session signature from the external signer
        #[arg(long)]
        signature: String,
        /// Derivation mode: standard | argon2 | legacy
        #[arg(long, default_value = "standard")]
        mode: String,
    },
    /// Generate a random 16-byte salt
    GenerateSalt,
    /// Encrypt a string payload under a hex-encoded key
    Encrypt {
        /// 64-hex-character key
        #[arg(long)]
        key: String,
        /// Plaintext payload
        payload: String,
    },
    /// Decrypt an envelope under a hex-encoded key
    Decrypt {
        /// 64-hex-character key
        #[arg(long)]
        key: String,
        /// Envelope string produced by `encrypt`
        envelope: String,
    },
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::DeriveKey {
            identity,
            signature,
            mode,
        } => {
            let mode: DerivationMode = mode.parse()?;
            let key = master::derive_master_key(&identity, &signature, mode)?;
            println!("{}", key.to_hex());
        }
        Commands::GenerateSalt => {
            println!("{}", codec::to_hex(&kdf::generate_salt()));
        }
        Commands::Encrypt { key, payload } => {
            let key = MasterKey::from_hex(&key)?;
            println!("{}", envelope::encrypt(&payload, &key)?);
        }
        Commands::Decrypt { key, envelope } => {
            let key = MasterKey::from_hex(&key)?;
            let payload: String = envelope::decrypt(&envelope, &key)?;
            println!("{payload}");
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
