use std::path::{Path, PathBuf};

use config::{Config, ConfigError};
use secret_confidential::{KeyManagementError, WasmCryptoContext, X25519KeyPairManager};
use serde::{Deserialize, Serialize};

use crate::decrypt::status::{
    StatusClassifier, DEFAULT_ENCLAVE_ERROR_MARKER, DEFAULT_ENCRYPTED_ERROR_CODES,
    DEFAULT_ENCRYPTED_ERROR_MARKER, DEFAULT_QUERY_ERROR_MARKER,
};

/// Configuration of the decryption tool
///
/// Read from the `secret_decrypt` section of the configuration file, every
/// field can be overridden by a `SECRET_DECRYPT__<FIELD>` environment variable.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SecretDecryptConfig {
    /// Path to the file holding the hex encoded x25519 secret key of the tx sender
    pub tx_key_path: PathBuf,

    /// Hex encoded io public key of the enclave
    pub io_public_key: String,

    /// Status codes reporting an encrypted contract error
    #[serde(default = "default_encrypted_error_codes")]
    pub encrypted_error_codes: Vec<u32>,

    #[serde(default = "default_encrypted_error_marker")]
    pub encrypted_error_marker: String,

    #[serde(default = "default_enclave_error_marker")]
    pub enclave_error_marker: String,

    #[serde(default = "default_query_error_marker")]
    pub query_error_marker: String,
}

fn default_encrypted_error_codes() -> Vec<u32> {
    DEFAULT_ENCRYPTED_ERROR_CODES.to_vec()
}

fn default_encrypted_error_marker() -> String {
    DEFAULT_ENCRYPTED_ERROR_MARKER.to_string()
}

fn default_enclave_error_marker() -> String {
    DEFAULT_ENCLAVE_ERROR_MARKER.to_string()
}

fn default_query_error_marker() -> String {
    DEFAULT_QUERY_ERROR_MARKER.to_string()
}

impl SecretDecryptConfig {
    /// Loads the configuration from a file path
    ///
    /// # Arguments
    ///
    /// * `config_file_path` - Path to the configuration file. The file should be in a format
    ///                        supported by the `config` crate (e.g., TOML, JSON, YAML) and
    ///                        contain a "secret_decrypt" section.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// "secret_decrypt" section is missing or incomplete.
    pub fn from_file_path<P: AsRef<Path>>(config_file_path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::from(config_file_path.as_ref()))
            .add_source(
                config::Environment::with_prefix("SECRET_DECRYPT")
                    .keep_prefix(true)
                    .separator("__"),
            );
        let config = builder.build()?;
        config.get::<Self>("secret_decrypt")
    }

    /// The status classifier described by this configuration
    #[must_use]
    pub fn status_classifier(&self) -> StatusClassifier {
        StatusClassifier {
            encrypted_error_codes: self.encrypted_error_codes.clone(),
            encrypted_error_marker: self.encrypted_error_marker.clone(),
            enclave_error_marker: self.enclave_error_marker.clone(),
            query_error_marker: self.query_error_marker.clone(),
        }
    }

    /// Builds the crypto context of the tx sender, looking for encrypted
    /// errors behind the configured marker
    ///
    /// # Errors
    ///
    /// Returns an error if the key file cannot be loaded or the io public key
    /// is not a 32 byte hex string.
    pub fn crypto_context(&self) -> Result<WasmCryptoContext, KeyManagementError> {
        let key_manager = X25519KeyPairManager::from_file_path(&self.tx_key_path)?;
        let io_public_key = self.io_public_key.trim();
        let io_public_key = io_public_key.strip_prefix("0x").unwrap_or(io_public_key);
        let io_public_key = hex::decode(io_public_key)?;
        let io_public_key = io_public_key
            .as_slice()
            .try_into()
            .map_err(|_| KeyManagementError::InvalidKeyLength(io_public_key.len()))?;
        Ok(WasmCryptoContext::new(key_manager, io_public_key)
            .with_encrypted_error_marker(self.encrypted_error_marker.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use base64::{prelude::BASE64_STANDARD, Engine};
    use secret_confidential::CryptoContext;
    use serial_test::serial;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_from_file_path_with_defaults() {
        let file = write_config(
            r#"
            [secret_decrypt]
            tx_key_path = "keys/id_tx_io.key"
            io_public_key = "0x0101010101010101010101010101010101010101010101010101010101010101"
            "#,
        );
        let config = SecretDecryptConfig::from_file_path(file.path()).unwrap();
        assert_eq!(config.tx_key_path, PathBuf::from("keys/id_tx_io.key"));
        assert_eq!(config.status_classifier(), StatusClassifier::default());
    }

    #[test]
    #[serial]
    fn test_from_file_path_with_overrides() {
        let file = write_config(
            r#"
            [secret_decrypt]
            tx_key_path = "id_tx_io.key"
            io_public_key = "00"
            encrypted_error_codes = [2, 3]
            enclave_error_marker = "TeeFault"
            "#,
        );
        std::env::set_var("SECRET_DECRYPT__QUERY_ERROR_MARKER", "query failed");
        let config = SecretDecryptConfig::from_file_path(file.path());
        std::env::remove_var("SECRET_DECRYPT__QUERY_ERROR_MARKER");

        let classifier = config.unwrap().status_classifier();
        assert_eq!(classifier.encrypted_error_codes, vec![2, 3]);
        assert_eq!(classifier.enclave_error_marker, "TeeFault");
        assert_eq!(classifier.encrypted_error_marker, DEFAULT_ENCRYPTED_ERROR_MARKER);
        assert_eq!(classifier.query_error_marker, "query failed");
    }

    #[test]
    #[serial]
    fn test_missing_section_is_an_error() {
        let file = write_config("[other]\nkey = 1\n");
        assert!(SecretDecryptConfig::from_file_path(file.path()).is_err());
    }

    #[test]
    fn test_crypto_context_from_key_file() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(key_file, "{}", hex::encode([7u8; 32])).unwrap();
        let enclave = X25519KeyPairManager::from_secret_bytes([8u8; 32]);
        let config = SecretDecryptConfig {
            tx_key_path: key_file.path().to_path_buf(),
            io_public_key: hex::encode(enclave.get_public_key().as_bytes()),
            encrypted_error_codes: default_encrypted_error_codes(),
            encrypted_error_marker: default_encrypted_error_marker(),
            enclave_error_marker: default_enclave_error_marker(),
            query_error_marker: default_query_error_marker(),
        };

        let context = config.crypto_context().unwrap();
        assert_eq!(
            context.get_public_key(),
            X25519KeyPairManager::from_secret_bytes([7u8; 32]).get_public_key()
        );

        let config = SecretDecryptConfig {
            io_public_key: "abcd".to_string(),
            ..config
        };
        assert!(matches!(
            config.crypto_context(),
            Err(KeyManagementError::InvalidKeyLength(2))
        ));
    }

    #[test]
    fn test_crypto_context_uses_configured_error_marker() {
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(key_file, "{}", hex::encode([7u8; 32])).unwrap();
        let enclave = X25519KeyPairManager::from_secret_bytes([8u8; 32]);
        let config = SecretDecryptConfig {
            tx_key_path: key_file.path().to_path_buf(),
            io_public_key: hex::encode(enclave.get_public_key().as_bytes()),
            encrypted_error_codes: default_encrypted_error_codes(),
            encrypted_error_marker: "sealed:".to_string(),
            enclave_error_marker: default_enclave_error_marker(),
            query_error_marker: default_query_error_marker(),
        };
        let context = config.crypto_context().unwrap();

        let nonce = [9u8; 32];
        let sender = context.get_public_key().to_bytes();
        let ciphertext = enclave.encrypt_plaintext(sender, b"unauthorized", &nonce).unwrap();
        let raw_log = format!(
            "message index: 0: sealed:{}: execute contract failed",
            BASE64_STANDARD.encode(&ciphertext)
        );
        assert_eq!(context.decrypt_error(&raw_log, &nonce).unwrap(), b"unauthorized");
    }
}
