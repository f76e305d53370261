//! Addresses, public keys and derived on-chain identifiers.
//!
//! User addresses are bech32 over `RIPEMD160(SHA256(pubkey))`; push-key IDs
//! are bech32 over `RIPEMD160(pubkey)`. Transfer recipients may also be
//! expressed as prefixed identifiers (`a/<addr>`, `r/<repo>`) or namespace
//! URIs (`<ns>/<domain>`), which the coin-transfer path resolves in a
//! cascade.

use bech32::{FromBase32, ToBase32, Variant};
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Human-readable part of bech32 user addresses.
pub const ACCOUNT_HRP: &str = "fg";
/// Human-readable part of bech32 push-key IDs.
pub const PUSH_KEY_HRP: &str = "fpk";

/// Prefix marking an address operand as a user address (`a/<addr>`).
pub const USER_ADDR_PREFIX: &str = "a/";
/// Prefix marking an address operand as a repository (`r/<name>`).
pub const REPO_ADDR_PREFIX: &str = "r/";

/// A 32-byte Ed25519 public key. Signature verification is external to the
/// engine; the key is carried only to derive identities and for replication.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        PublicKey(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Derives the bech32 user address bound to this key.
    pub fn to_address(&self) -> Address {
        let sha = Sha256::digest(self.0);
        let ripe = Ripemd160::digest(sha);
        let enc = bech32::encode(ACCOUNT_HRP, ripe.to_base32(), Variant::Bech32)
            .expect("static hrp is valid");
        Address(enc)
    }

    /// Derives the bech32 push-key ID bound to this key.
    pub fn to_push_key_id(&self) -> String {
        let ripe = Ripemd160::digest(self.0);
        bech32::encode(PUSH_KEY_HRP, ripe.to_base32(), Variant::Bech32)
            .expect("static hrp is valid")
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Checks that a string is a well-formed push-key ID.
pub fn is_push_key_id(s: &str) -> bool {
    matches!(bech32::decode(s), Ok((hrp, _, Variant::Bech32)) if hrp == PUSH_KEY_HRP)
}

/// An account or recipient identifier.
///
/// Besides the canonical bech32 user form this may carry a prefixed
/// identifier or a namespace URI; the accessors below classify the variant.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Address(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the address is the canonical bech32 user form.
    pub fn is_user_address(&self) -> bool {
        matches!(
            bech32::decode(&self.0),
            Ok((hrp, data, Variant::Bech32))
                if hrp == ACCOUNT_HRP
                    && Vec::<u8>::from_base32(&data).map(|b| b.len() == 20).unwrap_or(false)
        )
    }

    /// True for `a/<addr>` operands.
    pub fn is_prefixed_user_address(&self) -> bool {
        self.0.starts_with(USER_ADDR_PREFIX)
    }

    /// True for `r/<name>` operands.
    pub fn is_prefixed_repo_address(&self) -> bool {
        self.0.starts_with(REPO_ADDR_PREFIX)
    }

    /// True for `<ns>/<domain>` operands that are not prefixed identifiers.
    pub fn is_namespace_uri(&self) -> bool {
        self.0.contains('/')
            && !self.is_prefixed_user_address()
            && !self.is_prefixed_repo_address()
    }

    /// Strips the `a/` or `r/` prefix, returning the bare identifier.
    pub fn strip_prefix(&self) -> &str {
        self.0
            .strip_prefix(USER_ADDR_PREFIX)
            .or_else(|| self.0.strip_prefix(REPO_ADDR_PREFIX))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(fill: u8) -> PublicKey {
        PublicKey([fill; 32])
    }

    #[test]
    fn address_derivation_is_stable() {
        let a1 = pk(1).to_address();
        let a2 = pk(1).to_address();
        assert_eq!(a1, a2);
        assert!(a1.as_str().starts_with(ACCOUNT_HRP));
        assert!(a1.is_user_address());
        assert_ne!(a1, pk(2).to_address());
    }

    #[test]
    fn push_key_id_is_distinct_from_address() {
        let id = pk(3).to_push_key_id();
        assert!(id.starts_with(PUSH_KEY_HRP));
        assert!(is_push_key_id(&id));
        assert!(!is_push_key_id(pk(3).to_address().as_str()));
    }

    #[test]
    fn classifies_operand_forms() {
        assert!(Address::new("a/fg1qqq").is_prefixed_user_address());
        assert!(Address::new("r/helm").is_prefixed_repo_address());
        assert!(Address::new("myns/web").is_namespace_uri());
        assert!(!Address::new("r/helm").is_namespace_uri());
        assert_eq!(Address::new("r/helm").strip_prefix(), "helm");
        assert!(!Address::new("garbage").is_user_address());
    }
}
