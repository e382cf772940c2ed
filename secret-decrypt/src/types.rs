use serde::{Deserialize, Serialize};

use crate::error::SecretDecryptError;

/// Length of a hex encoded contract code hash
pub const CODE_HASH_HEX_LENGTH: usize = 64;

/// A message of a committed transaction, tagged by its protobuf type url.
///
/// Only contract executions and instantiations carry an encrypted payload,
/// every other message type is kept as [`TxMessage::Unrecognized`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum TxMessage {
    #[serde(rename = "/secret.compute.v1beta1.MsgExecuteContract")]
    ExecuteContract {
        #[serde(default)]
        sender: String,
        #[serde(default)]
        contract: String,
        /// Encrypted blob of the execute message
        #[serde(default, with = "base64_bytes")]
        msg: Vec<u8>,
    },
    #[serde(rename = "/secret.compute.v1beta1.MsgInstantiateContract")]
    InstantiateContract {
        #[serde(default)]
        sender: String,
        #[serde(default)]
        label: String,
        /// Encrypted blob of the init message
        #[serde(default, with = "base64_bytes")]
        init_msg: Vec<u8>,
    },
    #[serde(other)]
    Unrecognized,
}

impl TxMessage {
    /// The kind reported for this message in the decrypted answers
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::ExecuteContract { .. } => MessageKind::Execute,
            Self::InstantiateContract { .. } => MessageKind::Instantiate,
            Self::Unrecognized => MessageKind::Unrecognized,
        }
    }

    /// The encrypted blob carried by this message, if any
    #[must_use]
    pub fn encrypted_input(&self) -> Option<&[u8]> {
        let input = match self {
            Self::ExecuteContract { msg, .. } => msg,
            Self::InstantiateContract { init_msg, .. } => init_msg,
            Self::Unrecognized => return None,
        };
        (!input.is_empty()).then_some(input.as_slice())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "execute")]
    Execute,
    #[serde(rename = "instantiate")]
    Instantiate,
    #[default]
    #[serde(rename = "")]
    Unrecognized,
}

/// A single key/value attribute of a transaction event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// A transaction event, in the order the ledger emitted it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

/// A transaction as committed to the ledger, still encrypted
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedTx {
    /// The messages of the transaction, in order
    #[serde(default)]
    pub messages: Vec<TxMessage>,
    /// Hex encoded protobuf `TxMsgData`, with one response per message
    #[serde(default)]
    pub raw_output_data: String,
    /// Events emitted while executing the transaction
    #[serde(default)]
    pub events: Vec<Event>,
    /// ABCI status code, 0 on success
    #[serde(default)]
    pub status_code: u32,
    /// Raw log of the transaction, carrying the error on failure
    #[serde(default)]
    pub raw_status_text: String,
}

/// Plaintext recovered for a single message of a transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedAnswer {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Decrypted message input
    pub input: String,
    /// Decrypted output data, base64 encoded by the contract
    pub output_data: String,
    /// Output data decoded from base64, empty if it was not base64
    pub output_data_as_string: String,
}

/// Everything recovered from a committed transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedAnswers {
    pub answers: Vec<DecryptedAnswer>,
    pub output_logs: Vec<Event>,
    pub output_error: String,
    pub plaintext_error: String,
}

impl DecryptedAnswers {
    /// Renders the answers as JSON indented with four spaces
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut bytes = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The plaintext of a confidential contract call: the code hash of the target
/// contract followed by the message body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretMessage {
    code_hash: String,
    msg: Vec<u8>,
}

impl SecretMessage {
    /// Creates a new message for the contract with the given code hash.
    ///
    /// The code hash may carry a `0x` prefix and is normalized to lowercase.
    ///
    /// # Errors
    /// Returns `SecretDecryptError::InvalidCodeHash` if the code hash is not 64 hex characters.
    pub fn new(code_hash: &str, msg: Vec<u8>) -> Result<Self, SecretDecryptError> {
        let trimmed = code_hash.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if trimmed.len() != CODE_HASH_HEX_LENGTH
            || !trimmed.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(SecretDecryptError::InvalidCodeHash(code_hash.to_string()));
        }
        Ok(Self {
            code_hash: trimmed.to_ascii_lowercase(),
            msg,
        })
    }

    #[must_use]
    pub fn code_hash(&self) -> &str {
        &self.code_hash
    }

    #[must_use]
    pub fn msg(&self) -> &[u8] {
        &self.msg
    }

    /// Serializes the message as `code_hash || msg`
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.code_hash.len() + self.msg.len());
        bytes.extend_from_slice(self.code_hash.as_bytes());
        bytes.extend_from_slice(&self.msg);
        bytes
    }
}

mod base64_bytes {
    use base64::{prelude::BASE64_STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE_HASH: &str = "0ab1d6b3e1a2c5f4e8d7c6b5a4f3e2d1c0b9a8f7e6d5c4b3a2f1e0d9c8b7a6f5";

    #[test]
    fn test_committed_tx_from_json() {
        let json = r#"{
            "messages": [
                {"@type": "/secret.compute.v1beta1.MsgExecuteContract", "sender": "secret1a", "contract": "secret1c", "msg": "AQID", "sent_funds": []},
                {"@type": "/secret.compute.v1beta1.MsgInstantiateContract", "init_msg": "BAUG", "code_id": "7"},
                {"@type": "/cosmos.bank.v1beta1.MsgSend", "amount": []}
            ],
            "raw_output_data": "0a00",
            "events": [{"type": "wasm", "attributes": [{"key": "contract_address", "value": "secret1c"}]}],
            "status_code": 5,
            "raw_status_text": "failed"
        }"#;
        let tx: CommittedTx = serde_json::from_str(json).unwrap();

        assert_eq!(tx.messages.len(), 3);
        assert_eq!(tx.messages[0].kind(), MessageKind::Execute);
        assert_eq!(tx.messages[0].encrypted_input(), Some([1u8, 2, 3].as_slice()));
        assert_eq!(tx.messages[1].kind(), MessageKind::Instantiate);
        assert_eq!(tx.messages[1].encrypted_input(), Some([4u8, 5, 6].as_slice()));
        assert_eq!(tx.messages[2], TxMessage::Unrecognized);
        assert_eq!(tx.messages[2].encrypted_input(), None);
        assert_eq!(tx.events[0].kind, "wasm");
        assert_eq!(tx.status_code, 5);
    }

    #[test]
    fn test_missing_encrypted_input_is_none() {
        let message: TxMessage =
            serde_json::from_str(r#"{"@type": "/secret.compute.v1beta1.MsgExecuteContract"}"#)
                .unwrap();
        assert_eq!(message.kind(), MessageKind::Execute);
        assert_eq!(message.encrypted_input(), None);
    }

    #[test]
    fn test_decrypted_answers_json_layout() {
        let answers = DecryptedAnswers {
            answers: vec![
                DecryptedAnswer {
                    kind: MessageKind::Execute,
                    input: "{}".to_string(),
                    ..Default::default()
                },
                DecryptedAnswer::default(),
            ],
            ..Default::default()
        };
        let json = answers.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["answers"][0]["type"], "execute");
        assert_eq!(value["answers"][0]["input"], "{}");
        assert_eq!(value["answers"][1]["type"], "");
        assert_eq!(value["output_logs"], serde_json::json!([]));
        assert_eq!(value["output_error"], "");
        assert_eq!(value["plaintext_error"], "");
        assert!(json.contains("\n    \"answers\""));
    }

    #[test]
    fn test_secret_message_serialization() {
        let message = SecretMessage::new(CODE_HASH, br#"{"get_count":{}}"#.to_vec()).unwrap();
        assert_eq!(message.msg(), br#"{"get_count":{}}"#);
        let bytes = message.serialize();
        assert_eq!(&bytes[..CODE_HASH_HEX_LENGTH], CODE_HASH.as_bytes());
        assert_eq!(&bytes[CODE_HASH_HEX_LENGTH..], br#"{"get_count":{}}"#);
    }

    #[test]
    fn test_secret_message_normalizes_code_hash() {
        let message =
            SecretMessage::new(&format!("0x{}", CODE_HASH.to_ascii_uppercase()), vec![]).unwrap();
        assert_eq!(message.code_hash(), CODE_HASH);
    }

    #[test]
    fn test_secret_message_rejects_invalid_code_hash() {
        assert!(matches!(
            SecretMessage::new("abcd", vec![]),
            Err(SecretDecryptError::InvalidCodeHash(_))
        ));
        let not_hex = "z".repeat(CODE_HASH_HEX_LENGTH);
        assert!(matches!(
            SecretMessage::new(&not_hex, vec![]),
            Err(SecretDecryptError::InvalidCodeHash(_))
        ));
    }
}
