use ahash::RandomState;
use std::hash::BuildHasher;

/// Width of the similarity fingerprint in bits.
pub const SIMILARITY_BITS: u32 = 128;

lazy_static! {
    static ref EXACT_STATE: RandomState = RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    );
    static ref FEATURE_LO_STATE: RandomState = RandomState::with_seeds(
        0x4528_21e6_38d0_1377,
        0xbe54_66cf_34e9_0c6c,
        0xc0ac_29b7_c97c_50dd,
        0x3f84_d5b5_b547_0917,
    );
    static ref FEATURE_HI_STATE: RandomState = RandomState::with_seeds(
        0x9216_d5d9_8979_fb1b,
        0xd131_0ba6_98df_b5ac,
        0x2ffd_72db_d01a_dfb7,
        0xb8e1_afed_6a26_7e96,
    );
}

/// Outcome of offering one page's content to the duplicate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// New informative content, recorded for future comparisons.
    Accepted,
    /// Byte-identical text was already recorded.
    ExactDuplicate,
    /// Fingerprint within the near-duplicate distance of recorded content.
    NearDuplicate,
    /// Too little visible text relative to the raw body.
    LowInformation,
}

/// Hash the extracted text of a page into a stable 64-bit fingerprint.
/// Seeds are fixed so equal text maps to equal fingerprints across workers
/// and runs.
pub fn exact_fingerprint(text: &str) -> u64 {
    EXACT_STATE.hash_one(text)
}

/// Fold a page's tokens into a similarity fingerprint.
///
/// Each token votes its feature bits up and the complement down, occurrence
/// by occurrence, so repeated words weigh proportionally. Bits with a
/// positive tally survive into the fingerprint. Pages sharing most of their
/// vocabulary land within a few bits of each other.
pub fn simhash(tokens: &[String]) -> u128 {
    let mut weights = [0i32; SIMILARITY_BITS as usize];

    for token in tokens {
        let feature = feature_bits(token);

        for (bit, weight) in weights.iter_mut().enumerate() {
            if feature >> bit & 1 == 1 {
                *weight += 1;
            } else {
                *weight -= 1;
            }
        }
    }

    let mut fingerprint = 0u128;

    for (bit, weight) in weights.iter().enumerate() {
        if *weight > 0 {
            fingerprint |= 1u128 << bit;
        }
    }

    fingerprint
}

/// Number of differing bits between two fingerprints.
pub fn hamming(a: u128, b: u128) -> u32 {
    (a ^ b).count_ones()
}

/// Hamming distance scaled by the fingerprint width into `0.0..=1.0`.
pub fn normalized_distance(a: u128, b: u128) -> f64 {
    f64::from(hamming(a, b)) / f64::from(SIMILARITY_BITS)
}

/// Whether two fingerprints fall strictly within the near-duplicate bound.
pub fn is_near(a: u128, b: u128, threshold: f64) -> bool {
    normalized_distance(a, b) < threshold
}

fn feature_bits(token: &str) -> u128 {
    let lo = FEATURE_LO_STATE.hash_one(token) as u128;
    let hi = FEATURE_HI_STATE.hash_one(token) as u128;

    hi << 64 | lo
}

#[test]
fn test_exact_fingerprint_stable() {
    assert_eq!(exact_fingerprint("same text"), exact_fingerprint("same text"));
    assert_ne!(exact_fingerprint("same text"), exact_fingerprint("same text."));
    assert_ne!(exact_fingerprint(""), exact_fingerprint(" "));
}

#[test]
fn test_simhash_identity() {
    let tokens: Vec<String> = (0..40).map(|i| format!("token{i}")).collect();

    assert_eq!(simhash(&tokens), simhash(&tokens));
    assert_eq!(normalized_distance(simhash(&tokens), simhash(&tokens)), 0.0);
}

#[test]
fn test_simhash_separation() {
    let base: Vec<String> = (0..100).map(|i| format!("token{i}")).collect();
    let mut tweaked = base.clone();
    tweaked[50] = "changed".to_string();
    let disjoint: Vec<String> = (0..100).map(|i| format!("other{i}")).collect();

    let near = normalized_distance(simhash(&base), simhash(&tweaked));
    let far = normalized_distance(simhash(&base), simhash(&disjoint));

    assert!(near < 0.2, "one-word edit moved fingerprint too far: {near}");
    assert!(far > 0.25, "disjoint vocabularies landed too close: {far}");
    assert!(near < far);
}

#[test]
fn test_hamming() {
    assert_eq!(hamming(0, 0), 0);
    assert_eq!(hamming(0, u128::MAX), 128);
    assert_eq!(hamming(0b1011, 0b1000), 2);
}

#[test]
fn test_is_near_strict_bound() {
    let three_bits = 0b111u128;

    // distance exactly at the threshold is not near
    assert!(!is_near(0, three_bits, 3.0 / 128.0));
    assert!(is_near(0, three_bits, 3.5 / 128.0));

    // default 0.025 admits up to three differing bits out of 128
    let threshold = crate::configuration::DEFAULT_NEAR_DUPLICATE_THRESHOLD;
    assert!(is_near(0, 0b111, threshold));
    assert!(!is_near(0, 0b1111, threshold));
}
