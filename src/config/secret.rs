//! Database credentials held in memory
//!
//! A connection string carries the database password, so it is wrapped in
//! [`SecretString`]: zeroized on drop and redacted in `Debug` output.
//!
//! ```rust
//! use dora_roi::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let dsn = secret_string("postgresql://roi:pw@localhost/roi".to_string());
//! assert!(dsn.expose_secret().as_str().starts_with("postgresql://"));
//! assert!(!format!("{dsn:?}").contains("pw"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret text; read it through [`SecretText::as_str`] after `expose_secret`
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretText(String);

impl CloneableSecret for SecretText {}
impl DebugSecret for SecretText {}
impl SerializableSecret for SecretText {}

impl SecretText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A connection string or password: zeroized on drop, redacted in `Debug`
pub type SecretString = Secret<SecretText>;

pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretText(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_debug_output_hides_password() {
        let dsn = secret_string("postgresql://roi:hunter2@db/roi".to_string());
        assert_eq!(dsn.expose_secret().as_str(), "postgresql://roi:hunter2@db/roi");
        assert!(!format!("{dsn:?}").contains("hunter2"));
    }

    #[test]
    fn test_connection_string_reads_from_toml() {
        #[derive(Deserialize)]
        struct Source {
            connection_string: SecretString,
        }

        let source: Source =
            toml::from_str(r#"connection_string = "postgresql://localhost/roi""#).unwrap();
        assert_eq!(
            source.connection_string.expose_secret().as_str(),
            "postgresql://localhost/roi"
        );
    }
}
