use std::collections::BTreeMap;

use base64::{prelude::BASE64_STANDARD, Engine};
use secret_confidential::{CryptoContext, EncryptedBlob, Nonce};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    decrypt::status::StatusClassifier,
    error::SecretDecryptError,
    ledger::{LedgerError, LedgerService},
    types::SecretMessage,
};

type Result<T> = std::result::Result<T, SecretDecryptError>;

/// Contract standard error rendered without its kind
const GENERIC_ERROR_KIND: &str = "generic_err";

/// The query is encrypted and ready to be submitted
pub struct Building {
    blob: Vec<u8>,
}

/// The ledger answered with an encrypted response
pub struct Sent {
    response: Vec<u8>,
}

/// The response was decrypted
pub struct Decoded {
    plaintext: Vec<u8>,
}

/// A query to a confidential contract.
///
/// The nonce generated when encrypting the query is kept for the whole round
/// trip, it is the only key to the response and to any error the contract
/// reports.
pub struct QueryRequest<S> {
    contract_address: String,
    nonce: Nonce,
    state: S,
}

impl QueryRequest<Building> {
    /// Encrypts `query` for the contract at `contract_address`.
    ///
    /// # Errors
    ///
    /// Returns `SecretDecryptError::ContractNotFound` if the ledger cannot
    /// resolve the contract code hash, or an error if encryption fails.
    pub async fn new<C, L>(
        ctx: &C,
        ledger: &L,
        contract_address: &str,
        query: &[u8],
    ) -> Result<Self>
    where
        C: CryptoContext + ?Sized,
        L: LedgerService + ?Sized,
    {
        let code_hash = ledger
            .get_code_hash(contract_address)
            .await
            .map_err(|e| {
                tracing::error!(
                    target = "secret-decrypt",
                    event = "code_hash_lookup_error",
                    contract_address = %contract_address,
                    error = %e,
                    "Failed to resolve contract code hash"
                );
                SecretDecryptError::ContractNotFound {
                    address: contract_address.to_string(),
                    source: e,
                }
            })?;

        let message = SecretMessage::new(&code_hash, query.to_vec())?;
        let blob = ctx
            .encrypt(&message.serialize())
            .map_err(SecretDecryptError::EncryptionFailed)?;
        let nonce = EncryptedBlob::decode(&blob)?.nonce;

        Ok(Self {
            contract_address: contract_address.to_string(),
            nonce,
            state: Building { blob },
        })
    }

    /// The nonce the query was encrypted under
    #[must_use]
    pub const fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Submits the encrypted query.
    ///
    /// # Errors
    ///
    /// Returns `SecretDecryptError::QueryFailed` with the decrypted reason if
    /// the contract rejected the query, or the ledger error otherwise.
    pub async fn send<C, L>(
        self,
        ctx: &C,
        ledger: &L,
        classifier: &StatusClassifier,
    ) -> Result<QueryRequest<Sent>>
    where
        C: CryptoContext + ?Sized,
        L: LedgerService + ?Sized,
    {
        let Self {
            contract_address,
            nonce,
            state: Building { blob },
        } = self;

        match ledger.submit_query(&contract_address, blob).await {
            Ok(response) => Ok(QueryRequest {
                contract_address,
                nonce,
                state: Sent { response },
            }),
            Err(e) => Err(decrypt_query_error(e, &nonce, ctx, classifier)),
        }
    }
}

impl QueryRequest<Sent> {
    /// Decrypts the response of the contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the response does not decrypt under the query nonce
    /// or is not base64 once decrypted.
    pub fn decode<C: CryptoContext + ?Sized>(self, ctx: &C) -> Result<QueryRequest<Decoded>> {
        let decrypted = ctx
            .decrypt(&self.state.response, &self.nonce)
            .map_err(|e| SecretDecryptError::DecryptionFailed {
                what: "query response",
                source: e,
            })?;
        let plaintext = BASE64_STANDARD.decode(&decrypted)?;
        Ok(QueryRequest {
            contract_address: self.contract_address,
            nonce: self.nonce,
            state: Decoded { plaintext },
        })
    }
}

impl QueryRequest<Decoded> {
    #[must_use]
    pub fn into_plaintext(self) -> Vec<u8> {
        self.state.plaintext
    }
}

impl<S> QueryRequest<S> {
    #[must_use]
    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }
}

/// Sends `query` to the confidential contract at `contract_address` and
/// returns the decrypted response.
///
/// # Errors
///
/// See [`QueryRequest::new`], [`QueryRequest::send`] and [`QueryRequest::decode`].
#[instrument(level = "trace", skip_all, fields(contract_address = %contract_address))]
pub async fn query_contract<C, L>(
    ctx: &C,
    ledger: &L,
    contract_address: &str,
    query: &[u8],
    classifier: &StatusClassifier,
) -> Result<Vec<u8>>
where
    C: CryptoContext + ?Sized,
    L: LedgerService + ?Sized,
{
    let request = QueryRequest::new(ctx, ledger, contract_address, query).await?;
    tracing::debug!(
        target = "secret-decrypt",
        event = "query_encrypted",
        contract_address = %request.contract_address(),
        nonce = %hex::encode(request.nonce()),
        "Submitting encrypted query"
    );
    let plaintext = request
        .send(ctx, ledger, classifier)
        .await?
        .decode(ctx)?
        .into_plaintext();
    Ok(plaintext)
}

/// Turns a failed query into the contract's own error when it can be decrypted
fn decrypt_query_error<C: CryptoContext + ?Sized>(
    error: LedgerError,
    nonce: &Nonce,
    ctx: &C,
    classifier: &StatusClassifier,
) -> SecretDecryptError {
    let text = error.to_string();
    if !classifier.contains_query_error(&text) {
        return SecretDecryptError::Ledger(error);
    }
    match ctx.decrypt_error(&text, nonce) {
        Ok(plaintext) => {
            let message = parse_contract_error(&plaintext)
                .unwrap_or_else(|| String::from_utf8_lossy(&plaintext).into_owned());
            SecretDecryptError::QueryFailed { message }
        }
        Err(e) => {
            tracing::debug!(
                target = "secret-decrypt",
                event = "query_error_not_decrypted",
                error = %e,
                "Failed to decrypt query error, returning it as is"
            );
            SecretDecryptError::Ledger(error)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContractErrorPayload {
    Message { error: String },
    Standard(BTreeMap<String, StandardErrorBody>),
}

#[derive(Deserialize)]
struct StandardErrorBody {
    msg: Option<String>,
    kind: Option<String>,
}

/// Extracts the message of a JSON contract error, if it follows a known schema
fn parse_contract_error(plaintext: &[u8]) -> Option<String> {
    match serde_json::from_slice::<ContractErrorPayload>(plaintext).ok()? {
        ContractErrorPayload::Message { error } => Some(error),
        ContractErrorPayload::Standard(errors) => {
            if errors.len() != 1 {
                return None;
            }
            let (kind, body) = errors.into_iter().next()?;
            let msg = body.msg.or(body.kind)?;
            if kind == GENERIC_ERROR_KIND {
                Some(msg)
            } else {
                Some(format!("{kind}: {msg}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contract_error_schemas() {
        assert_eq!(
            parse_contract_error(br#"{"error":"insufficient funds"}"#),
            Some("insufficient funds".to_string())
        );
        assert_eq!(
            parse_contract_error(br#"{"generic_err":{"msg":"overflow"}}"#),
            Some("overflow".to_string())
        );
        assert_eq!(
            parse_contract_error(br#"{"not_found":{"kind":"cw20::state::TokenInfo"}}"#),
            Some("not_found: cw20::state::TokenInfo".to_string())
        );
        assert_eq!(
            parse_contract_error(br#"{"parse_err":{"target_type":"u64","msg":"bad number"}}"#),
            Some("parse_err: bad number".to_string())
        );
    }

    #[test]
    fn test_parse_contract_error_rejects_unknown_shapes() {
        assert_eq!(parse_contract_error(b"out of gas"), None);
        assert_eq!(parse_contract_error(br#"{"error":42}"#), None);
        assert_eq!(parse_contract_error(br#"{}"#), None);
        assert_eq!(
            parse_contract_error(br#"{"a":{"msg":"x"},"b":{"msg":"y"}}"#),
            None
        );
        assert_eq!(parse_contract_error(br#"["error"]"#), None);
    }
}
