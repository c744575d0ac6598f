//! Process-wide RSA key material.
//!
//! [`KeyMaterial`] holds the keypair used to sign and verify tokens. It is
//! created once at startup (generated, or loaded from PEM) and shared by
//! reference into the validator, the issuer, and the metadata publisher.
//! The private half never leaves the process boundary; the public half is
//! exported as an RFC 7517 JWK for the JWKS document.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// RSA key size for generated keypairs (2048-bit minimum for RS256).
const RSA_KEY_BITS: usize = 2048;

/// A single public key in RFC 7517 JWK form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type; always `RSA` here.
    pub kty: String,
    /// Intended use; always `sig`.
    #[serde(rename = "use")]
    pub key_use: String,
    /// Signing algorithm; always `RS256`.
    pub alg: String,
    /// Key identifier matching the `kid` of issued tokens.
    pub kid: String,
    /// RSA modulus, base64url without padding.
    pub n: String,
    /// RSA public exponent, base64url without padding.
    pub e: String,
}

/// JWK Set document served at `/.well-known/jwks.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwkSet {
    /// The keys currently valid for verification.
    pub keys: Vec<Jwk>,
}

/// RSA keypair (or verify-only public key) plus its key identifier.
///
/// Read-only after construction; safe to share across concurrent
/// validations without synchronization.
pub struct KeyMaterial {
    kid: String,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    public_jwk: Jwk,
}

impl KeyMaterial {
    /// Generate a fresh RSA-2048 keypair.
    ///
    /// Intended for development servers; production deployments load a
    /// persistent key with [`from_private_pem`](Self::from_private_pem) so
    /// tokens survive restarts.
    pub fn generate() -> Result<Self, ConfigError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS)
            .map_err(|e| ConfigError::Key(format!("keypair generation failed: {e}")))?;
        Self::from_keypair(private)
    }

    /// Load key material from a PKCS#8 PEM-encoded RSA private key.
    pub fn from_private_pem(pem: &str) -> Result<Self, ConfigError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| ConfigError::Key(format!("unreadable private key: {e}")))?;
        Self::from_keypair(private)
    }

    /// Load verify-only key material from an SPKI PEM-encoded public key.
    ///
    /// Use this when tokens are issued by an external authorization server.
    /// The resulting material cannot sign, so the development token endpoint
    /// is unavailable.
    pub fn from_public_pem(pem: &str) -> Result<Self, ConfigError> {
        let public = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| ConfigError::Key(format!("unreadable public key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| ConfigError::Key(format!("unusable public key: {e}")))?;
        let kid = uuid::Uuid::new_v4().to_string();
        let public_jwk = jwk_from_public(&public, &kid);
        Ok(Self {
            kid,
            encoding_key: None,
            decoding_key,
            public_jwk,
        })
    }

    fn from_keypair(private: RsaPrivateKey) -> Result<Self, ConfigError> {
        let public = RsaPublicKey::from(&private);

        let private_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| ConfigError::Key(format!("private key encoding failed: {e}")))?;
        let public_pem = public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| ConfigError::Key(format!("public key encoding failed: {e}")))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| ConfigError::Key(format!("unusable private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| ConfigError::Key(format!("unusable public key: {e}")))?;

        let kid = uuid::Uuid::new_v4().to_string();
        let public_jwk = jwk_from_public(&public, &kid);

        Ok(Self {
            kid,
            encoding_key: Some(encoding_key),
            decoding_key,
            public_jwk,
        })
    }

    /// Key identifier carried in issued token headers and the JWKS document.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Verification key for token signatures.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Signing key, if this material carries a private half.
    pub fn signing_key(&self) -> Option<&EncodingKey> {
        self.encoding_key.as_ref()
    }

    /// The public key as a JWK.
    pub fn public_jwk(&self) -> &Jwk {
        &self.public_jwk
    }

    /// The JWKS document for this key material.
    ///
    /// Exactly one key: rotation with multiple concurrently valid keys is
    /// not supported.
    pub fn jwk_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.public_jwk.clone()],
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key bytes stay out of debug output
        f.debug_struct("KeyMaterial")
            .field("kid", &self.kid)
            .field("can_sign", &self.encoding_key.is_some())
            .finish()
    }
}

fn jwk_from_public(public: &RsaPublicKey, kid: &str) -> Jwk {
    Jwk {
        kty: "RSA".to_string(),
        key_use: "sig".to_string(),
        alg: "RS256".to_string(),
        kid: kid.to_string(),
        n: URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
        e: URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_signing_material() {
        let key = KeyMaterial::generate().unwrap();
        assert!(key.signing_key().is_some());
        assert!(!key.kid().is_empty());

        let jwk = key.public_jwk();
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.kid, key.kid());
        // 2048-bit modulus, base64url: 342 chars + no padding
        assert!(!jwk.n.is_empty());
        assert!(!jwk.n.contains('='));
    }

    #[test]
    fn test_jwk_set_holds_single_key() {
        let key = KeyMaterial::generate().unwrap();
        let set = key.jwk_set();
        assert_eq!(set.keys.len(), 1);
        assert_eq!(set.keys[0].kid, key.kid());
    }

    #[test]
    fn test_public_pem_roundtrip_is_verify_only() {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let public_pem = RsaPublicKey::from(&private)
            .to_public_key_pem(LineEnding::LF)
            .unwrap();

        let key = KeyMaterial::from_public_pem(&public_pem).unwrap();
        assert!(key.signing_key().is_none());
        assert_eq!(key.public_jwk().kty, "RSA");
    }

    #[test]
    fn test_garbage_pem_rejected() {
        assert!(matches!(
            KeyMaterial::from_private_pem("not a pem"),
            Err(ConfigError::Key(_))
        ));
        assert!(matches!(
            KeyMaterial::from_public_pem("not a pem"),
            Err(ConfigError::Key(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key_bytes() {
        let key = KeyMaterial::generate().unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("kid"));
        assert!(!debug.contains(&key.public_jwk().n));
    }
}
