use base64::{prelude::BASE64_STANDARD, Engine};
use secret_confidential::CryptoContext;
use tracing::instrument;

use super::first_successful_nonce;
use crate::{nonces::NonceLedger, types::Event};

/// Type of the events emitted by contracts
pub const WASM_EVENT_TYPE: &str = "wasm";

/// Attribute the chain adds to every contract event, never encrypted
pub const CONTRACT_ADDRESS_KEY: &str = "contract_address";

/// Decrypts the attributes of contract events.
///
/// Keys and values are decrypted independently. A string that is not base64
/// is plaintext and kept as is, an encrypted one is replaced by the plaintext
/// of the first nonce it decrypts under, or kept if none works. Events of any
/// other type are returned untouched, in their original order.
#[instrument(level = "trace", skip_all, fields(events = events.len()))]
pub fn decrypt_logs<C: CryptoContext + ?Sized>(
    events: &[Event],
    nonces: &NonceLedger,
    ctx: &C,
) -> Vec<Event> {
    events
        .iter()
        .map(|event| {
            let mut event = event.clone();
            if event.kind == WASM_EVENT_TYPE {
                for attribute in &mut event.attributes {
                    if attribute.key == CONTRACT_ADDRESS_KEY {
                        continue;
                    }
                    decrypt_attribute(&mut attribute.key, nonces, ctx);
                    decrypt_attribute(&mut attribute.value, nonces, ctx);
                }
            }
            event
        })
        .collect()
}

fn decrypt_attribute<C: CryptoContext + ?Sized>(
    field: &mut String,
    nonces: &NonceLedger,
    ctx: &C,
) {
    if field.is_empty() {
        return;
    }
    let Ok(ciphertext) = BASE64_STANDARD.decode(field.as_bytes()) else {
        return;
    };
    if let Some((index, plaintext)) =
        first_successful_nonce(nonces, |nonce| ctx.decrypt(&ciphertext, nonce))
    {
        tracing::trace!(
            target = "secret-decrypt",
            event = "log_attribute_decrypted",
            message_index = index,
            "Decrypted log attribute"
        );
        *field = String::from_utf8_lossy(&plaintext).into_owned();
    }
}
