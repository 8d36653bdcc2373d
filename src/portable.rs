use crate::{BlockWords, CVWords, BLOCK_LEN, IV, OUT_LEN};
use arrayref::{array_refs, mut_array_refs};

// The message words are shuffled by this fixed permutation between rounds.
const MSG_PERMUTATION: [usize; 16] = [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8];

const ROUNDS: usize = 7;

#[inline(always)]
pub fn counter_low(counter: u64) -> u32 {
    counter as u32
}

#[inline(always)]
pub fn counter_high(counter: u64) -> u32 {
    (counter >> 32) as u32
}

#[inline(always)]
pub fn words_from_le_bytes_32(bytes: &[u8; 32]) -> CVWords {
    let refs = array_refs!(bytes, 4, 4, 4, 4, 4, 4, 4, 4);
    [
        u32::from_le_bytes(*refs.0),
        u32::from_le_bytes(*refs.1),
        u32::from_le_bytes(*refs.2),
        u32::from_le_bytes(*refs.3),
        u32::from_le_bytes(*refs.4),
        u32::from_le_bytes(*refs.5),
        u32::from_le_bytes(*refs.6),
        u32::from_le_bytes(*refs.7),
    ]
}

#[inline(always)]
pub fn words_from_le_bytes_64(bytes: &[u8; BLOCK_LEN]) -> BlockWords {
    let (low, high) = array_refs!(bytes, 32, 32);
    let mut words = [0; 16];
    words[..8].copy_from_slice(&words_from_le_bytes_32(low));
    words[8..].copy_from_slice(&words_from_le_bytes_32(high));
    words
}

#[inline(always)]
pub fn le_bytes_from_words_32(words: &CVWords) -> [u8; OUT_LEN] {
    let mut out = [0; OUT_LEN];
    {
        let refs = mut_array_refs!(&mut out, 4, 4, 4, 4, 4, 4, 4, 4);
        *refs.0 = words[0].to_le_bytes();
        *refs.1 = words[1].to_le_bytes();
        *refs.2 = words[2].to_le_bytes();
        *refs.3 = words[3].to_le_bytes();
        *refs.4 = words[4].to_le_bytes();
        *refs.5 = words[5].to_le_bytes();
        *refs.6 = words[6].to_le_bytes();
        *refs.7 = words[7].to_le_bytes();
    }
    out
}

#[inline(always)]
pub fn le_bytes_from_words_64(words: &BlockWords) -> [u8; BLOCK_LEN] {
    let (low, high) = array_refs!(words, 8, 8);
    let mut out = [0; BLOCK_LEN];
    {
        let (out_low, out_high) = mut_array_refs!(&mut out, 32, 32);
        *out_low = le_bytes_from_words_32(low);
        *out_high = le_bytes_from_words_32(high);
    }
    out
}

#[inline(always)]
pub fn first_8_words(state: &BlockWords) -> CVWords {
    let mut words = [0; 8];
    words.copy_from_slice(&state[..8]);
    words
}

// The mixing function, G, which mixes either a column or a diagonal.
#[inline(always)]
fn g(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, x: u32, y: u32) {
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(x);
    state[d] = (state[d] ^ state[a]).rotate_right(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(12);
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(y);
    state[d] = (state[d] ^ state[a]).rotate_right(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(7);
}

#[inline(always)]
fn round(state: &mut [u32; 16], msg: &BlockWords) {
    // Mix the columns.
    g(state, 0, 4, 8, 12, msg[0], msg[1]);
    g(state, 1, 5, 9, 13, msg[2], msg[3]);
    g(state, 2, 6, 10, 14, msg[4], msg[5]);
    g(state, 3, 7, 11, 15, msg[6], msg[7]);

    // Mix the diagonals.
    g(state, 0, 5, 10, 15, msg[8], msg[9]);
    g(state, 1, 6, 11, 12, msg[10], msg[11]);
    g(state, 2, 7, 8, 13, msg[12], msg[13]);
    g(state, 3, 4, 9, 14, msg[14], msg[15]);
}

#[inline(always)]
fn permute(msg: &mut BlockWords) {
    let mut permuted = [0; 16];
    for (dest, &src) in permuted.iter_mut().zip(MSG_PERMUTATION.iter()) {
        *dest = msg[src];
    }
    *msg = permuted;
}

/// Compress one block against an input chaining value. The first 8 words of
/// the result are the new chaining value. All 16 words are root output.
pub fn compress(
    cv: &CVWords,
    block: &BlockWords,
    block_len: u32,
    counter: u64,
    flags: u32,
) -> BlockWords {
    debug_assert!(block_len as usize <= BLOCK_LEN);
    let mut state = [
        cv[0],
        cv[1],
        cv[2],
        cv[3],
        cv[4],
        cv[5],
        cv[6],
        cv[7],
        IV[0],
        IV[1],
        IV[2],
        IV[3],
        counter_low(counter),
        counter_high(counter),
        block_len,
        flags,
    ];
    let mut msg = *block;

    for r in 0..ROUNDS {
        round(&mut state, &msg);
        // No permutation after the last round.
        if r + 1 < ROUNDS {
            permute(&mut msg);
        }
    }

    for i in 0..8 {
        state[i] ^= state[i + 8];
        state[i + 8] ^= cv[i];
    }

    state
}
