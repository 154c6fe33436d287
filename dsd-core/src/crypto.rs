//! Cryptographic keystream generators as pure byte-stream producers.
//!
//! AES-256, DES/DES-XL, RC4, and vendor scramblers are external
//! collaborators: this module specifies the keystream interface the
//! speech/signalling layer XORs against, not a from-scratch cipher
//! implementation. `-H <hex>` and `-1 <hex>` CLI keys resolve to a
//! [`KeySource`] which a provider turns into a [`Keystream`].

/// A provisioned key, as parsed from the CLI or config (`-H` for AES-256,
/// `-1` for RC4, accepting an optional `0x` prefix and internal whitespace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Aes256(Vec<u8>),
    Rc4(Vec<u8>),
    VendorScrambler { algorithm_id: u16, key: Vec<u8> },
}

/// Parse a CLI/config hex key string, stripping an optional `0x` prefix and
/// any internal whitespace.
pub fn parse_hex_key(raw: &str) -> Result<Vec<u8>, String> {
    let trimmed = raw.trim();
    let without_prefix = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    let cleaned: String = without_prefix.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        return Err(format!("key must be an even number of hex digits, got {}", cleaned.len()));
    }
    cleaned
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).map_err(|_| "invalid hex digit".to_string())?;
            u8::from_str_radix(s, 16).map_err(|_| format!("invalid hex digit in {s}"))
        })
        .collect()
}

/// A keystream generator: advances internal state and emits bytes to XOR
/// against ciphertext. Pure in the sense that the same key and call
/// sequence always produce the same bytes.
pub trait Keystream {
    /// Fill `out` with the next `out.len()` keystream bytes.
    fn next_bytes(&mut self, out: &mut [u8]);
    fn reset(&mut self);
}

/// Identity keystream (all-zero bytes): used when no key is provisioned, so
/// XOR-against-keystream degrades to a pass-through rather than a panic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullKeystream;

impl Keystream for NullKeystream {
    fn next_bytes(&mut self, out: &mut [u8]) {
        out.fill(0);
    }

    fn reset(&mut self) {}
}

/// XOR `data` in place against a keystream, advancing it by `data.len()`
/// bytes.
pub fn xor_in_place(keystream: &mut dyn Keystream, data: &mut [u8]) {
    let mut stream_bytes = vec![0u8; data.len()];
    keystream.next_bytes(&mut stream_bytes);
    for (byte, stream_byte) in data.iter_mut().zip(stream_bytes.iter()) {
        *byte ^= stream_byte;
    }
}
