//! Content checksums used for drift detection.

use sha2::{Digest, Sha256};

/// Compute the checksum of a migration's statements.
///
/// The statements are joined with `;` (no trailing separator) and hashed
/// with SHA-256; the digest is returned as 64 lowercase hex characters.
/// The byte layout must stay stable: history tables written by earlier
/// releases are compared against it.
pub fn checksum<S: AsRef<str>>(statements: &[S]) -> String {
    let mut hasher = Sha256::new();
    for (i, stmt) in statements.iter().enumerate() {
        if i > 0 {
            hasher.update(b";");
        }
        hasher.update(stmt.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}
