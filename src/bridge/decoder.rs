//! Base64 decoder for the embedded library payload
//!
//! Lenient about layout, strict about content: any byte outside the standard
//! alphabet (line breaks, NUL terminators, spaces) is skipped, but the
//! significant symbols must come in complete groups of four, and decoding
//! stops after the first group carrying `=` padding.

use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PAD: u8 = b'=';
const SKIP: u8 = 0x80;

/// Reverse lookup: symbol value, `0` for padding, `SKIP` for everything else.
const DECODE_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [SKIP; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table[PAD as usize] = 0;
    table
}

/// Decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Significant symbol count is zero or not a multiple of four
    #[error("malformed encoding: {count} significant symbols is not a non-zero multiple of 4")]
    SymbolCount {
        /// Number of alphabet and padding symbols found
        count: usize,
    },

    /// A group carried three or more padding symbols
    #[error("malformed encoding: {pad} padding symbols in final group")]
    Padding {
        /// Padding symbols seen in the group
        pad: usize,
    },

    /// The output buffer could not be allocated
    #[error("cannot allocate {len} bytes for decoded output")]
    OutOfMemory {
        /// Requested capacity
        len: usize,
    },
}

/// Decode `input`, returning a newly allocated buffer owned by the caller.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let count = input
        .iter()
        .filter(|&&byte| DECODE_TABLE[byte as usize] != SKIP)
        .count();
    if count == 0 || count % 4 != 0 {
        return Err(DecodeError::SymbolCount { count });
    }

    let capacity = count / 4 * 3;
    let mut out = Vec::new();
    out.try_reserve_exact(capacity)
        .map_err(|_| DecodeError::OutOfMemory { len: capacity })?;

    let mut block = [0u8; 4];
    let mut filled = 0;
    let mut pad = 0;
    for &byte in input {
        let value = DECODE_TABLE[byte as usize];
        if value == SKIP {
            continue;
        }
        if byte == PAD {
            pad += 1;
        }
        block[filled] = value;
        filled += 1;
        if filled < 4 {
            continue;
        }

        out.push((block[0] << 2) | (block[1] >> 4));
        out.push((block[1] << 4) | (block[2] >> 2));
        out.push((block[2] << 6) | block[3]);
        filled = 0;

        if pad > 0 {
            match pad {
                1 => out.truncate(out.len() - 1),
                2 => out.truncate(out.len() - 2),
                _ => return Err(DecodeError::Padding { pad }),
            }
            break;
        }
    }

    Ok(out)
}
