//! Cryptographic hashing utilities for the ledger
//!
//! Provides SHA-256 helpers and the canonical block digest that every
//! hash-link and proof-of-work check is computed over.

use crate::core::Block;
use serde::Serialize;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};
use std::io;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// JSON formatter producing the canonical byte layout used for hashing.
///
/// Items are separated by `", "`, keys from values by `": "`, and any
/// non-ASCII character is written as lowercase `\uXXXX` UTF-16 escapes.
/// Key ordering is handled by round-tripping through `serde_json::Value`,
/// whose object map is sorted.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Serializes any value into its canonical, key-sorted byte form
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    // Value's object map is a BTreeMap, so keys come out sorted at every level
    let sorted = serde_json::to_value(value)?;

    let mut out = Vec::with_capacity(256);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
    sorted.serialize(&mut serializer)?;
    Ok(out)
}

/// Computes the canonical SHA-256 digest of a block as a 64-char hex string
pub fn hash_block(block: &Block) -> String {
    // A Block is plain strings and numbers; serializing it cannot fail
    let bytes = canonical_json(block).unwrap_or_default();
    sha256_hex(&bytes)
}
