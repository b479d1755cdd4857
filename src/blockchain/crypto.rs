use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use utoipa::ToSchema;

use std::fmt;
use std::str::FromStr;

/// Version byte prepended to WIF-encoded private keys
const WIF_VERSION: u8 = 0x80;

/// Trailing marker of a WIF key flagged as compressed
const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Represents a wallet address (public key in base58 format)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Address(pub String);

impl Address {
    /// Creates a new address from a public key
    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        let bytes = public_key.as_bytes();
        let encoded = bs58::encode(bytes).into_string();
        Address(encoded)
    }

    /// Converts the address to a public key
    pub fn to_public_key(&self) -> Result<VerifyingKey, CryptoError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        VerifyingKey::from_bytes(&bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey("Invalid public key bytes".to_string())
        })?)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        bs58::decode(s)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        Ok(Address(s.to_string()))
    }
}

/// Represents a digital signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DigitalSignature(pub String);

impl DigitalSignature {
    /// Creates a new digital signature from a signature
    pub fn from_signature(signature: &Signature) -> Self {
        let bytes = signature.to_bytes();
        let encoded = bs58::encode(bytes).into_string();
        DigitalSignature(encoded)
    }

    /// Converts the digital signature to a signature
    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        let signature_bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature("Invalid signature length".to_string())
        })?;

        Ok(Signature::from_bytes(&signature_bytes))
    }
}

/// Represents a wallet with a keypair
#[derive(Debug, Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random keypair
    pub fn new() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        Self::from_signing_key(signing_key)
    }

    /// Recovers a wallet from a private key
    ///
    /// Accepts either the 64-character hex encoding of the 32 secret bytes or
    /// a WIF string (base58check, version `0x80`, optional compression flag).
    pub fn from_private_key(private_key: &str) -> Result<Self, CryptoError> {
        let private_key = private_key.trim();

        let secret = if private_key.len() == 64 && private_key.chars().all(|c| c.is_ascii_hexdigit()) {
            hex::decode(private_key).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?
        } else {
            decode_wif(private_key)?
        };

        Self::from_secret_key(&secret)
    }

    /// Creates a wallet from an existing secret key
    pub fn from_secret_key(secret_key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_array: [u8; 32] = secret_key_bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey("Invalid private key length".to_string())
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes_array)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = Address::from_public_key(&verifying_key);

        Wallet {
            signing_key,
            verifying_key,
            address,
        }
    }

    /// Gets the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Gets the wallet's public key
    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Signs a payload hash with the wallet's private key
    ///
    /// Ed25519 signatures are deterministic, so the same key and payload
    /// always produce the same signature.
    pub fn sign(&self, payload: &str) -> DigitalSignature {
        let signature = self.signing_key.sign(payload.as_bytes());
        DigitalSignature::from_signature(&signature)
    }

    /// Exports the wallet's private key as hex
    pub fn export_private_key(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Exports the wallet's private key in WIF (compressed flag set)
    pub fn export_wif(&self) -> String {
        let mut payload = Vec::with_capacity(34);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.signing_key.to_bytes());
        payload.push(WIF_COMPRESSED_FLAG);

        bs58::encode(payload).with_check().into_string()
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_wif(wif: &str) -> Result<Vec<u8>, CryptoError> {
    // Checksum is verified and stripped, the version byte is kept
    let decoded = bs58::decode(wif)
        .with_check(None)
        .into_vec()
        .map_err(|e| CryptoError::InvalidPrivateKey(format!("Invalid WIF: {}", e)))?;

    match decoded.as_slice() {
        [WIF_VERSION, key @ ..] if key.len() == 32 => Ok(key.to_vec()),
        [WIF_VERSION, key @ .., WIF_COMPRESSED_FLAG] if key.len() == 32 => Ok(key.to_vec()),
        _ => Err(CryptoError::InvalidPrivateKey(
            "Unsupported WIF version or length".to_string(),
        )),
    }
}

/// Verifies a signature against a message and public key
pub fn verify_signature(
    message: &[u8],
    signature: &DigitalSignature,
    public_key: &VerifyingKey,
) -> Result<bool, CryptoError> {
    let signature = signature.to_signature()?;

    match public_key.verify(message, &signature) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// SHA-256 of a payload as lowercase hex
pub fn sha256_hex(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hashing and signature verification used by the ledger rules
///
/// Every hash and signature check in the ledger goes through a provider, so
/// tests can pin hashes or accept signatures without touching real keys.
pub trait CryptoProvider: Send + Sync {
    /// Hashes a canonical payload to a hex string
    fn digest(&self, payload: &str) -> String;

    /// Returns true when `signature` over `payload` was made by `signer`
    fn verify(&self, payload: &str, signature: &DigitalSignature, signer: &Address) -> bool;
}

/// The production provider: SHA-256 hashes, ed25519 signatures
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Ed25519;

impl CryptoProvider for Sha256Ed25519 {
    fn digest(&self, payload: &str) -> String {
        sha256_hex(payload)
    }

    fn verify(&self, payload: &str, signature: &DigitalSignature, signer: &Address) -> bool {
        let public_key = match signer.to_public_key() {
            Ok(key) => key,
            Err(_) => return false,
        };

        verify_signature(payload.as_bytes(), signature, &public_key).unwrap_or(false)
    }
}
