//! Decryptors for the four encrypted payload shapes of a committed transaction.

pub mod input;
pub mod logs;
pub mod output;
pub mod status;

use secret_confidential::{CryptoContextError, Nonce};

use crate::nonces::NonceLedger;

/// Tries every recorded nonce in message index order and returns the first
/// result that succeeds, together with the index of the nonce that produced it.
pub(crate) fn first_successful_nonce<T, F>(
    nonces: &NonceLedger,
    mut attempt: F,
) -> Option<(usize, T)>
where
    F: FnMut(&Nonce) -> Result<T, CryptoContextError>,
{
    for (index, nonce) in nonces.iter() {
        match attempt(nonce) {
            Ok(plaintext) => return Some((index, plaintext)),
            Err(e) => {
                tracing::trace!(
                    target = "secret-decrypt",
                    event = "nonce_attempt_failed",
                    message_index = index,
                    error = %e,
                    "Ciphertext did not decrypt under the nonce of this message"
                );
            }
        }
    }
    None
}
