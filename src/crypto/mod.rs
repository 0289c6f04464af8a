//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing
//! - Canonical (key-sorted) block serialization and digest

pub mod hash;

pub use hash::{canonical_json, hash_block, sha256, sha256_hex, CanonicalFormatter};
