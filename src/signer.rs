use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{PollerError, Result};
use crate::types::Credential;

type HmacSha256 = Hmac<Sha256>;

/// Header values authenticating one feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    /// `X-Auth`: the public key, passed through unmodified.
    pub auth: String,
    /// `X-Auth-Hash`: hex HMAC-SHA256 of an empty message, keyed by the
    /// private key. The scheme authenticates the key, not the request body.
    pub auth_hash: String,
}

/// Computes the signature headers for a request. Deterministic for a given
/// key pair; the only failure mode is empty key material, rejected here so a
/// misconfigured source never reaches the network.
pub fn sign(credential: &Credential) -> Result<SignatureHeaders> {
    credential.validate()?;

    let mut mac = HmacSha256::new_from_slice(credential.private_key.as_bytes())
        .map_err(|e| PollerError::Config(format!("private key rejected by HMAC: {e}")))?;
    // Empty message: no body is signed in this feed's scheme.
    mac.update(b"");
    let digest = mac.finalize().into_bytes();

    Ok(SignatureHeaders {
        auth: credential.public_key.clone(),
        auth_hash: hex::encode(digest),
    })
}
