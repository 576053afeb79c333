//! # Key Provider Abstraction
//!
//! Abstracts operator-key storage and signing behind a trait so the
//! workflow never touches raw key bytes:
//!
//! - [`LocalKeyProvider`]: in-memory key for development and testing.
//! - [`EnvKeyProvider`]: loads a hex-encoded 32-byte secp256k1 secret from
//!   an environment variable. Suitable for container deployments where
//!   secrets are injected via environment.
//!
//! ## Security Invariants
//!
//! - The secret scalar is held in [`Zeroizing`] memory.
//! - A [`SigningKey`] is materialized only for the duration of one
//!   signature and is zeroized when it drops.
//! - `Debug` output shows the derived address, never the secret.
//! - `KeyProvider` is `Send + Sync` for use across async tasks.

use std::fmt;

use k256::ecdsa::SigningKey;
use zeroize::Zeroizing;

use tribunal_core::{Address, Bytes32, CryptoError};

use crate::secp256k1::{address_from_verifying_key, sign_prehash, RecoverableSignature};

/// Trait for operator-key storage and signing backends.
pub trait KeyProvider: Send + Sync {
    /// Sign a prehashed 32-byte digest with the managed key.
    fn sign_prehash(&self, digest: &Bytes32) -> Result<RecoverableSignature, CryptoError>;

    /// The address derived from the managed key.
    fn address(&self) -> Address;

    /// Human-readable name for this provider (for diagnostics/logging).
    fn provider_name(&self) -> &str;
}

// ─── LocalKeyProvider ────────────────────────────────────────────────────

/// In-memory secp256k1 key provider.
pub struct LocalKeyProvider {
    secret: Zeroizing<[u8; 32]>,
    address: Address,
}

impl LocalKeyProvider {
    /// Create from a raw 32-byte secret. Fails if the scalar is zero or not
    /// below the curve order.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, CryptoError> {
        let key = SigningKey::from_slice(secret)
            .map_err(|_| CryptoError::Key("secret is not a valid secp256k1 scalar".into()))?;
        let address = address_from_verifying_key(key.verifying_key());
        Ok(Self {
            secret: Zeroizing::new(*secret),
            address,
        })
    }

    /// Parse a 64-character hex secret, with or without `0x`.
    pub fn from_hex(hex_secret: &str) -> Result<Self, CryptoError> {
        let secret = decode_secret(hex_secret)?;
        Self::from_bytes(&secret)
    }

    /// Generate a new random key using the OS CSPRNG.
    pub fn generate() -> Self {
        let key = SigningKey::random(&mut rand_core::OsRng);
        let address = address_from_verifying_key(key.verifying_key());
        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(&key.to_bytes());
        Self { secret, address }
    }

    fn signing_key(&self) -> Result<SigningKey, CryptoError> {
        SigningKey::from_slice(&self.secret[..])
            .map_err(|_| CryptoError::Key("stored secret is no longer a valid scalar".into()))
    }
}

impl KeyProvider for LocalKeyProvider {
    fn sign_prehash(&self, digest: &Bytes32) -> Result<RecoverableSignature, CryptoError> {
        let key = self.signing_key()?;
        sign_prehash(&key, digest)
    }

    fn address(&self) -> Address {
        self.address
    }

    fn provider_name(&self) -> &str {
        "LocalKeyProvider"
    }
}

impl fmt::Debug for LocalKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeyProvider")
            .field("address", &self.address)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn decode_secret(hex_secret: &str) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let trimmed = hex_secret.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    // Error messages must not echo the input.
    let bytes = Zeroizing::new(
        hex::decode(stripped).map_err(|_| CryptoError::Key("secret is not valid hex".into()))?,
    );
    if bytes.len() != 32 {
        return Err(CryptoError::Key(format!(
            "expected 32 bytes (64 hex chars), got {} bytes",
            bytes.len()
        )));
    }
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&bytes);
    Ok(out)
}

// ─── EnvKeyProvider ──────────────────────────────────────────────────────

/// Loads the operator key from an environment variable.
///
/// The variable must contain a 64-character hex string (optionally
/// `0x`-prefixed) encoding the 32-byte secp256k1 secret. The key is loaded
/// once at construction.
///
/// ## Example
///
/// ```bash
/// export TRIBUNAL_OPERATOR_KEY="0xac09..."  # 64 hex chars
/// ```
pub struct EnvKeyProvider {
    inner: LocalKeyProvider,
    var_name: String,
}

impl EnvKeyProvider {
    /// Load the key from the named environment variable.
    ///
    /// Returns `CryptoError::ProviderUnavailable` if the variable is not set
    /// and `CryptoError::Key` if it does not hold a valid secret.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(std::env::var(var_name).map_err(|_| {
            CryptoError::ProviderUnavailable(format!("environment variable {var_name} not set"))
        })?);
        let inner = LocalKeyProvider::from_hex(&raw)
            .map_err(|e| CryptoError::Key(format!("{var_name}: {e}")))?;
        tracing::debug!(var = var_name, address = %inner.address(), "loaded operator key");
        Ok(Self {
            inner,
            var_name: var_name.to_string(),
        })
    }

    /// The environment variable this provider was loaded from.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign_prehash(&self, digest: &Bytes32) -> Result<RecoverableSignature, CryptoError> {
        self.inner.sign_prehash(digest)
    }

    fn address(&self) -> Address {
        self.inner.address()
    }

    fn provider_name(&self) -> &str {
        "EnvKeyProvider"
    }
}

impl fmt::Debug for EnvKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvKeyProvider")
            .field("var_name", &self.var_name)
            .field("address", &self.inner.address())
            .finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────
