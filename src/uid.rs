//! Short random correlation identifiers.

use rand::rngs::OsRng;
use rand::RngCore;

const ID_LEN: usize = 8;
const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

// Alphabet length rounded up to a power of two, minus one.
const MASK: u8 = (ALPHABET.len().next_power_of_two() - 1) as u8;

/// Generate an 8 character identifier from the operating system RNG.
///
/// Each random byte is masked to six bits and folded into the alphabet, so
/// the first two symbols are slightly more likely than the rest.
///
/// # Panics
///
/// Panics if the operating system random source fails.
pub fn new_id() -> String {
    let mut bytes = [0u8; ID_LEN];
    if let Err(err) = OsRng.try_fill_bytes(&mut bytes) {
        panic!("sqlog: random source failure: {err}");
    }

    bytes
        .iter()
        .map(|b| ALPHABET[usize::from(b & MASK) % ALPHABET.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_shape() {
        let id = new_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_ids_differ() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_mask_covers_alphabet() {
        assert_eq!(MASK, 0x3f);
    }
}
