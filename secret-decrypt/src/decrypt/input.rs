use secret_confidential::{CryptoContext, EncryptedBlob};
use tracing::instrument;

use crate::{
    error::SecretDecryptError,
    nonces::NonceLedger,
    types::{DecryptedAnswer, TxMessage},
};

type Result<T> = std::result::Result<T, SecretDecryptError>;

/// Decrypts the input of every message and records the nonce each one was
/// encrypted under.
///
/// `answers` receives one entry per message, in message order. Messages
/// without an encrypted input keep an empty `input` and an empty nonce slot.
///
/// # Errors
///
/// Fails the whole transaction, leaving no partial answers, if:
/// - an input is not a well formed encrypted blob
/// - an input was encrypted by a key other than the tx sender's
/// - an input does not decrypt under its own nonce
#[instrument(level = "trace", skip_all, fields(messages = messages.len()))]
pub fn decrypt_inputs<C: CryptoContext + ?Sized>(
    messages: &[TxMessage],
    ctx: &C,
    answers: &mut Vec<DecryptedAnswer>,
) -> Result<NonceLedger> {
    let (_, public_key) = ctx
        .get_tx_sender_keypair()
        .map_err(SecretDecryptError::KeyPairUnavailable)?;
    let public_key = public_key.to_bytes();

    let mut nonces = NonceLedger::with_capacity(messages.len());
    let mut decrypted = Vec::with_capacity(messages.len());

    for (index, message) in messages.iter().enumerate() {
        let mut answer = DecryptedAnswer {
            kind: message.kind(),
            ..Default::default()
        };

        if let Some(input) = message.encrypted_input() {
            let blob = EncryptedBlob::decode(input)?;
            if blob.sender_public_key != public_key {
                tracing::error!(
                    target = "secret-decrypt",
                    event = "not_original_sender",
                    message_index = index,
                    "Message was encrypted by {}, not by the tx sender {}",
                    hex::encode(blob.sender_public_key),
                    hex::encode(public_key)
                );
                return Err(SecretDecryptError::NotOriginalSender {
                    message_index: index,
                });
            }

            let plaintext = if blob.ciphertext.is_empty() {
                Vec::new()
            } else {
                ctx.decrypt(&blob.ciphertext, &blob.nonce).map_err(|e| {
                    tracing::error!(
                        target = "secret-decrypt",
                        event = "input_decryption_error",
                        message_index = index,
                        error = %e,
                        "Failed to decrypt message input"
                    );
                    SecretDecryptError::DecryptionFailed {
                        what: "message input",
                        source: e,
                    }
                })?
            };
            answer.input = String::from_utf8_lossy(&plaintext).into_owned();
            nonces.insert(index, blob.nonce);
        }

        decrypted.push(answer);
    }

    answers.extend(decrypted);
    Ok(nonces)
}
