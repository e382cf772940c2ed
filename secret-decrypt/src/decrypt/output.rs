use base64::{prelude::BASE64_STANDARD, Engine};
use prost::Message;
use secret_confidential::CryptoContext;
use tracing::instrument;

use crate::{
    error::SecretDecryptError,
    nonces::NonceLedger,
    proto::{
        Any, MsgExecuteContractResponse, MsgInstantiateContractResponse, TxMsgData,
        EXECUTE_CONTRACT_RESPONSE_TYPE_URL, INSTANTIATE_CONTRACT_RESPONSE_TYPE_URL,
    },
    types::DecryptedAnswer,
};

type Result<T> = std::result::Result<T, SecretDecryptError>;

/// Decrypts the per message output data of a transaction into `answers`.
///
/// `raw_output_data` is the hex encoded `TxMsgData` of the transaction. Each
/// response is decrypted with the nonce of the message at the same index. A
/// response that is empty, of an unknown type, malformed, or that does not
/// decrypt is skipped and leaves its answer untouched.
///
/// # Errors
///
/// Returns `SecretDecryptError::MalformedOutputData` if the container itself
/// is not hex encoded protobuf.
#[instrument(level = "trace", skip_all)]
pub fn decrypt_output_data<C: CryptoContext + ?Sized>(
    raw_output_data: &str,
    nonces: &NonceLedger,
    ctx: &C,
    answers: &mut [DecryptedAnswer],
) -> Result<()> {
    if raw_output_data.is_empty() {
        return Ok(());
    }
    let bytes = hex::decode(raw_output_data)
        .map_err(|e| SecretDecryptError::MalformedOutputData(e.to_string()))?;
    let tx_msg_data = TxMsgData::decode(bytes.as_slice())
        .map_err(|e| SecretDecryptError::MalformedOutputData(e.to_string()))?;

    for (index, response) in tx_msg_data.msg_responses.iter().enumerate() {
        if response.value.is_empty() {
            continue;
        }
        let Some(data) = response_data(index, response) else {
            continue;
        };
        let (Some(answer), Some(nonce)) = (answers.get_mut(index), nonces.get(index)) else {
            tracing::debug!(
                target = "secret-decrypt",
                event = "output_data_without_message",
                message_index = index,
                "No encrypted message matches this output data, skipping"
            );
            continue;
        };
        let plaintext = match ctx.decrypt(&data, nonce) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::debug!(
                    target = "secret-decrypt",
                    event = "output_data_decryption_error",
                    message_index = index,
                    error = %e,
                    "Failed to decrypt output data, skipping"
                );
                continue;
            }
        };

        answer.output_data = String::from_utf8_lossy(&plaintext).into_owned();
        if let Ok(decoded) = BASE64_STANDARD.decode(answer.output_data.as_bytes()) {
            answer.output_data_as_string = String::from_utf8_lossy(&decoded).into_owned();
        }
    }

    Ok(())
}

/// Extracts the encrypted data of a recognized contract response
fn response_data(index: usize, response: &Any) -> Option<Vec<u8>> {
    let decoded = match response.type_url.as_str() {
        INSTANTIATE_CONTRACT_RESPONSE_TYPE_URL => {
            MsgInstantiateContractResponse::decode(response.value.as_slice()).map(|r| r.data)
        }
        EXECUTE_CONTRACT_RESPONSE_TYPE_URL => {
            MsgExecuteContractResponse::decode(response.value.as_slice()).map(|r| r.data)
        }
        _ => return None,
    };
    decoded
        .map_err(|e| {
            tracing::debug!(
                target = "secret-decrypt",
                event = "output_data_decode_error",
                message_index = index,
                type_url = %response.type_url,
                error = %e,
                "Failed to decode contract response, skipping"
            );
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any(type_url: &str, value: Vec<u8>) -> Any {
        Any {
            type_url: type_url.to_string(),
            value,
        }
    }

    #[test]
    fn test_response_data_by_type_url() {
        let execute = MsgExecuteContractResponse { data: vec![1, 2] }.encode_to_vec();
        let instantiate = MsgInstantiateContractResponse {
            address: "secret1contract".to_string(),
            data: vec![3, 4],
        }
        .encode_to_vec();

        assert_eq!(
            response_data(0, &any(EXECUTE_CONTRACT_RESPONSE_TYPE_URL, execute.clone())),
            Some(vec![1, 2])
        );
        assert_eq!(
            response_data(0, &any(INSTANTIATE_CONTRACT_RESPONSE_TYPE_URL, instantiate)),
            Some(vec![3, 4])
        );
        assert_eq!(
            response_data(0, &any("/cosmos.bank.v1beta1.MsgSendResponse", execute)),
            None
        );
    }

    #[test]
    fn test_response_data_malformed_shape() {
        // length delimited field claiming 5 bytes with only one present
        let malformed = any(EXECUTE_CONTRACT_RESPONSE_TYPE_URL, vec![0x0a, 0x05, 0x01]);
        assert_eq!(response_data(0, &malformed), None);
    }
}
