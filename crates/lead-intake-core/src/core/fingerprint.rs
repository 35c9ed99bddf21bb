// crates/lead-intake-core/src/core/fingerprint.rs
// ============================================================================
// Module: Phone Fingerprinting
// Description: Deterministic SHA-256 fingerprints of raw phone strings.
// Purpose: Provide the dedupe key shared by record lookups and follow-up jobs.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! The fingerprint is the lowercase hex SHA-256 digest of the phone string
//! exactly as submitted. No normalization is applied here, so `"555-0100"`
//! and `"5550100"` produce different fingerprints even though the contact
//! directory may treat them as the same number.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

use crate::core::identifiers::PhoneFingerprint;

// ============================================================================
// SECTION: Fingerprint
// ============================================================================

/// Computes the fingerprint for a raw phone string.
#[must_use]
pub fn fingerprint(phone: &str) -> PhoneFingerprint {
    let digest = Sha256::digest(phone.as_bytes());
    PhoneFingerprint::new(hex_encode(&digest))
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
