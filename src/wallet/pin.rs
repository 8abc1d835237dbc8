//! PIN → encryption context derivation.

use sha2::{Digest, Sha512};

/// Lowercase hex SHA-512 of the user's PIN.
///
/// The signing service only ever sees this digest, never the PIN.
pub fn derive_encryption_context(pin: &str) -> String {
    hex::encode(Sha512::digest(pin.as_bytes()))
}
