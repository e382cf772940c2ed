use secret_confidential::CryptoContext;
use tracing::instrument;

use crate::{
    decrypt::{
        input::decrypt_inputs,
        logs::decrypt_logs,
        output::decrypt_output_data,
        status::{decrypt_status_error, StatusClassifier},
    },
    error::SecretDecryptError,
    ledger::LedgerService,
    types::{CommittedTx, DecryptedAnswers},
};

type Result<T> = std::result::Result<T, SecretDecryptError>;

/// Recovers the plaintext of a committed transaction sent by the holder of `ctx`.
///
/// Inputs are decrypted first and fix the nonce of every message. Output data,
/// log attributes and the status error are then decrypted against those
/// nonces. Only the input stage and a malformed output container can fail the
/// reconstruction, any other undecryptable payload is left as it is.
///
/// # Errors
///
/// Returns an error if an input is malformed, was not encrypted by the tx
/// sender or does not decrypt, or if the output data container is malformed.
#[instrument(level = "trace", skip_all, fields(messages = tx.messages.len()))]
pub fn reconstruct<C: CryptoContext + ?Sized>(
    tx: &CommittedTx,
    ctx: &C,
    classifier: &StatusClassifier,
) -> Result<DecryptedAnswers> {
    let mut answers = Vec::with_capacity(tx.messages.len());
    let nonces = decrypt_inputs(&tx.messages, ctx, &mut answers)?;

    decrypt_output_data(&tx.raw_output_data, &nonces, ctx, &mut answers)?;
    let output_logs = decrypt_logs(&tx.events, &nonces, ctx);
    let status = decrypt_status_error(
        tx.status_code,
        &tx.raw_status_text,
        &nonces,
        ctx,
        classifier,
    );

    tracing::info!(
        target = "secret-decrypt",
        event = "transaction_reconstructed",
        messages = answers.len(),
        failed = !status.output_error.is_empty() || !status.plaintext_error.is_empty(),
        "Reconstructed committed transaction"
    );

    Ok(DecryptedAnswers {
        answers,
        output_logs,
        output_error: status.output_error,
        plaintext_error: status.plaintext_error,
    })
}

/// Fetches a committed transaction from the ledger and reconstructs it.
///
/// # Errors
///
/// Returns `SecretDecryptError::TransactionNotFound` if the ledger does not
/// know the transaction, and any error of [`reconstruct`].
#[instrument(level = "trace", skip_all, fields(hash = %hash))]
pub async fn decrypt_tx_by_hash<L, C>(
    ledger: &L,
    hash: &str,
    ctx: &C,
    classifier: &StatusClassifier,
) -> Result<DecryptedAnswers>
where
    L: LedgerService + ?Sized,
    C: CryptoContext + ?Sized,
{
    let tx = ledger
        .get_committed_transaction(hash)
        .await?
        .ok_or_else(|| SecretDecryptError::TransactionNotFound(hash.to_string()))?;
    reconstruct(&tx, ctx, classifier)
}
