// crates/lead-intake-core/tests/fingerprint.rs
// ============================================================================
// Module: Fingerprint Tests
// Description: Determinism and the no-normalization contract.
// ============================================================================

//! Determinism and the no-normalization contract.

use lead_intake_core::fingerprint;

#[test]
fn fingerprint_is_deterministic_lowercase_hex() {
    let first = fingerprint("+1 (555) 010-0100");
    let second = fingerprint("+1 (555) 010-0100");
    assert_eq!(first, second);
    assert_eq!(first.as_str().len(), 64);
    assert!(first.as_str().chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn fingerprint_matches_known_sha256() {
    assert_eq!(
        fingerprint("abc").as_str(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn formatting_variants_produce_different_fingerprints() {
    let variants = ["555-0100", "5550100", "(555) 0100", "1 555 0100"];
    for (i, a) in variants.iter().enumerate() {
        for b in &variants[i + 1..] {
            assert_ne!(fingerprint(a), fingerprint(b), "{a} vs {b}");
        }
    }
}
