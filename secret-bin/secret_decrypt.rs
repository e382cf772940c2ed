use anyhow::{Context, Result};
use base64::{prelude::BASE64_STANDARD, Engine};
use clap::{Parser, Subcommand, ValueEnum};
use secret_confidential::EncryptedBlob;
use secret_decrypt::{reconstruct, telemetry, CommittedTx, SecretDecryptConfig};
use tracing::info;

#[derive(Parser)]
#[command(about = "Decrypts confidential contract transactions sent by the local tx key")]
struct DecryptArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decrypts the inputs, outputs, logs and error of a committed transaction
    Tx {
        #[arg(short, long)]
        config_path: String,
        /// JSON file holding the committed transaction
        #[arg(short, long)]
        tx_file: String,
    },
    /// Prints the header of an encrypted blob given as hex or base64
    ParseBlob {
        blob: String,
        /// Encoding of the blob, base64 unless the blob starts with `0x`
        #[arg(short, long, value_enum)]
        encoding: Option<BlobEncoding>,
    },
    /// Prints the public key of the tx sender
    PublicKey {
        #[arg(short, long)]
        config_path: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BlobEncoding {
    Hex,
    Base64,
}

/// Decodes a blob given on the command line.
///
/// Hex is only used when asked for or when the blob carries a `0x` prefix, a
/// base64 blob made of hex digits alone is still read as base64.
fn decode_blob(blob: &str, encoding: Option<BlobEncoding>) -> Result<Vec<u8>> {
    let blob = blob.trim();
    let prefixed = blob.strip_prefix("0x");
    match (encoding, prefixed) {
        (Some(BlobEncoding::Hex), _) | (None, Some(_)) => {
            hex::decode(prefixed.unwrap_or(blob)).context("Blob is not valid hex")
        }
        (Some(BlobEncoding::Base64) | None, _) => {
            BASE64_STANDARD.decode(blob).context("Blob is not valid base64")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _file_guard = telemetry::setup_logging().context("Failed to setup logging")?;

    let args = DecryptArgs::parse();
    match args.command {
        Command::Tx {
            config_path,
            tx_file,
        } => {
            let config = SecretDecryptConfig::from_file_path(&config_path)
                .context("Failed to load secret-decrypt configuration")?;
            let ctx = config
                .crypto_context()
                .context("Failed to load the tx sender key")?;
            let contents = tokio::fs::read_to_string(&tx_file)
                .await
                .with_context(|| format!("Failed to read transaction file {tx_file}"))?;
            let tx: CommittedTx =
                serde_json::from_str(&contents).context("Failed to parse committed transaction")?;

            info!(
                target = "secret-decrypt",
                event = "secret-decrypt-tx",
                "Decrypting transaction from {tx_file}"
            );
            let answers = reconstruct(&tx, &ctx, &config.status_classifier())?;
            println!("{}", answers.to_json_pretty()?);
        }
        Command::ParseBlob { blob, encoding } => {
            let bytes = decode_blob(&blob, encoding)?;
            let blob = EncryptedBlob::decode(&bytes)?;
            let summary = serde_json::json!({
                "nonce": hex::encode(blob.nonce),
                "sender_public_key": hex::encode(blob.sender_public_key),
                "ciphertext_length": blob.ciphertext.len(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::PublicKey { config_path } => {
            let config = SecretDecryptConfig::from_file_path(&config_path)
                .context("Failed to load secret-decrypt configuration")?;
            let ctx = config
                .crypto_context()
                .context("Failed to load the tx sender key")?;
            println!("{}", hex::encode(ctx.get_public_key().as_bytes()));
        }
    }

    Ok(())
}
