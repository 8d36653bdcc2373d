//! A streaming implementation of the [BLAKE3] cryptographic hash function.
//!
//! BLAKE3 splits its input into 1 KiB chunks, hashes each chunk, and merges
//! the chunk hashes pairwise up a binary tree. This crate builds that tree
//! incrementally: a [`Hasher`] absorbs input of any length across any number
//! of calls, keeps at most one partial chunk plus one pending chaining value
//! per level of the tree, and at the end expands the root node into as many
//! output bytes as you ask for.
//!
//! Three modes are supported, and their outputs never collide:
//!
//! - the default hash, [`hash`] and [`Hasher::new`]
//! - the keyed hash (a MAC), [`keyed_hash`] and [`Hasher::new_keyed`]
//! - key derivation, [`derive_key`] and [`Hasher::new_derive_key`]
//!
//! Every output is bit-for-bit identical to other BLAKE3 implementations,
//! including ones that hash chunks in parallel.
//!
//! # Examples
//!
//! ```
//! # fn main() -> Result<(), blake3_stream::Error> {
//! // Hash an input all at once.
//! let hash1 = blake3_stream::hash(b"foobarbaz");
//!
//! // Hash an input incrementally.
//! let mut hasher = blake3_stream::Hasher::new();
//! hasher.update(b"foo")?;
//! hasher.update(b"bar")?;
//! hasher.update(b"baz")?;
//! let hash2 = hasher.finalize()?;
//! assert_eq!(hash1, hash2);
//!
//! // Extended output. OutputReader also implements Read and Seek.
//! let mut hasher = blake3_stream::Hasher::new();
//! hasher.update(b"foobarbaz")?;
//! let mut output = [0; 1000];
//! let mut output_reader = hasher.finalize_xof()?;
//! output_reader.fill(&mut output);
//! assert_eq!(hash1, output[..32]);
//!
//! // Print a hash as hex.
//! println!("{}", hash1);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! The `std` feature (enabled by default) provides `std::io` integration. The
//! `traits-preview` feature implements the RustCrypto `digest` and
//! `crypto-mac` traits, and the `zeroize` feature implements
//! `zeroize::Zeroize` for the types that can hold secrets.
//!
//! [BLAKE3]: https://github.com/BLAKE3-team/BLAKE3-specs/blob/master/blake3.pdf

#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;

mod error;
mod portable;
#[cfg(test)]
mod test;

#[cfg(feature = "traits-preview")]
pub mod traits;

pub use crate::error::Error;

use alloc::vec::Vec;
use arrayvec::{ArrayString, ArrayVec};
use core::cmp;
use core::fmt;
use core::str::FromStr;
use tracing::{debug, trace};

/// The number of bytes in a [`Hash`], 32.
pub const OUT_LEN: usize = 32;

/// The number of bytes in a key, 32.
pub const KEY_LEN: usize = 32;

/// The maximum number of pending subtree chaining values a [`Hasher`] holds.
/// 2<sup>54</sup> chunks of 1 KiB cover the full 2<sup>64</sup> byte input
/// space.
pub const MAX_DEPTH: usize = 54;

// These are pub for tests and the test_vectors crate. Callers don't need them.
#[doc(hidden)]
pub const BLOCK_LEN: usize = 64;
#[doc(hidden)]
pub const CHUNK_LEN: usize = 1024;

type CVWords = [u32; 8];
type BlockWords = [u32; 16];

const IV: &CVWords = &[
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

// These are the internal flags that we use to domain separate root/non-root,
// chunk/parent, and chunk beginning/middle/end. They land in the last word of
// the compression state.
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Flags: u32 {
        const CHUNK_START = 1 << 0;
        const CHUNK_END = 1 << 1;
        const PARENT = 1 << 2;
        const ROOT = 1 << 3;
        const KEYED_HASH = 1 << 4;
        const DERIVE_KEY_CONTEXT = 1 << 5;
        const DERIVE_KEY_MATERIAL = 1 << 6;
    }
}

/// An output of the default size, 32 bytes, which provides constant-time
/// equality checking.
///
/// `Hash` implements [`From`] and [`Into`] for `[u8; 32]`, and it provides
/// [`from_hex`] and [`to_hex`] for converting to and from hexadecimal. It also
/// implements [`Display`] and [`FromStr`].
///
/// `Hash` implements [`PartialEq`] and [`Eq`] in constant time, for both
/// `Hash` and `[u8; 32]`. If you need a non-constant-time comparison, use
/// [`as_bytes`].
///
/// [`from_hex`]: #method.from_hex
/// [`to_hex`]: #method.to_hex
/// [`Display`]: https://doc.rust-lang.org/std/fmt/trait.Display.html
/// [`FromStr`]: https://doc.rust-lang.org/std/str/trait.FromStr.html
/// [`as_bytes`]: #method.as_bytes
#[derive(Clone, Copy, Hash)]
pub struct Hash([u8; OUT_LEN]);

impl Hash {
    /// The raw bytes of the `Hash`. Note that byte arrays don't provide
    /// constant-time equality checking, so if you need to compare hashes,
    /// prefer the `Hash` type.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; OUT_LEN] {
        &self.0
    }

    /// Create a `Hash` from its raw bytes representation.
    pub const fn from_bytes(bytes: [u8; OUT_LEN]) -> Self {
        Self(bytes)
    }

    /// Encode a `Hash` in lowercase hexadecimal.
    ///
    /// The returned [`ArrayString`] is a fixed size and doesn't allocate
    /// memory on the heap.
    ///
    /// [`ArrayString`]: https://docs.rs/arrayvec/0.7/arrayvec/struct.ArrayString.html
    pub fn to_hex(&self) -> ArrayString<{ 2 * OUT_LEN }> {
        let mut s = ArrayString::new();
        let table = b"0123456789abcdef";
        for &b in self.0.iter() {
            s.push(table[(b >> 4) as usize] as char);
            s.push(table[(b & 0xf) as usize] as char);
        }
        s
    }

    /// Decode a `Hash` from hexadecimal. Both uppercase and lowercase ASCII
    /// bytes are supported.
    ///
    /// Any byte outside the ranges `'0'...'9'`, `'a'...'f'`, and `'A'...'F'`
    /// results in an error. An input length other than 64 also results in an
    /// error.
    ///
    /// Note that `Hash` also implements `FromStr`, so `Hash::from_hex("...")`
    /// is equivalent to `"...".parse()`.
    pub fn from_hex(hex: impl AsRef<[u8]>) -> Result<Self, Error> {
        fn hex_val(byte: u8) -> Result<u8, Error> {
            match byte {
                b'A'..=b'F' => Ok(byte - b'A' + 10),
                b'a'..=b'f' => Ok(byte - b'a' + 10),
                b'0'..=b'9' => Ok(byte - b'0'),
                _ => Err(Error::InvalidHexCharacter(byte as char)),
            }
        }
        let hex_bytes: &[u8] = hex.as_ref();
        if hex_bytes.len() != OUT_LEN * 2 {
            return Err(Error::InvalidHexLength(hex_bytes.len()));
        }
        let mut hash_bytes: [u8; OUT_LEN] = [0; OUT_LEN];
        for (byte, pair) in hash_bytes.iter_mut().zip(hex_bytes.chunks_exact(2)) {
            *byte = 16 * hex_val(pair[0])? + hex_val(pair[1])?;
        }
        Ok(Hash::from(hash_bytes))
    }
}

impl From<[u8; OUT_LEN]> for Hash {
    #[inline]
    fn from(bytes: [u8; OUT_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Hash> for [u8; OUT_LEN] {
    #[inline]
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

/// This implementation is constant-time.
impl PartialEq for Hash {
    #[inline]
    fn eq(&self, other: &Hash) -> bool {
        constant_time_eq::constant_time_eq_32(&self.0, &other.0)
    }
}

/// This implementation is constant-time.
impl PartialEq<[u8; OUT_LEN]> for Hash {
    #[inline]
    fn eq(&self, other: &[u8; OUT_LEN]) -> bool {
        constant_time_eq::constant_time_eq_32(&self.0, other)
    }
}

/// This implementation is constant-time if the target is 32 bytes long.
impl PartialEq<[u8]> for Hash {
    #[inline]
    fn eq(&self, other: &[u8]) -> bool {
        constant_time_eq::constant_time_eq(&self.0, other)
    }
}

impl Eq for Hash {}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Formatting field as `&str` to reduce code size since the `Display`
        // dynamic dispatch table for `&str` is likely needed elsewhere already,
        // but that for `ArrayString<[u8; 64]>` is not.
        let hex = self.to_hex();
        let hex: &str = hex.as_str();

        f.write_str(hex)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Formatting field as `&str` to reduce code size since the `Debug`
        // dynamic dispatch table for `&str` is likely needed elsewhere already,
        // but that for `ArrayString<[u8; 64]>` is not.
        let hex = self.to_hex();
        let hex: &str = hex.as_str();

        f.debug_tuple("Hash").field(&hex).finish()
    }
}

#[cfg(feature = "zeroize")]
impl zeroize::Zeroize for Hash {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

// Each chunk or parent node can produce either a 32-byte chaining value or, by
// setting the ROOT flag, any number of final output bytes. The Output struct
// captures the state just prior to choosing between those two possibilities.
#[derive(Clone)]
struct Output {
    input_chaining_value: CVWords,
    block: BlockWords,
    block_len: u32,
    counter: u64,
    flags: Flags,
}

impl Output {
    fn chaining_value(&self) -> CVWords {
        let state = portable::compress(
            &self.input_chaining_value,
            &self.block,
            self.block_len,
            self.counter,
            self.flags.bits(),
        );
        portable::first_8_words(&state)
    }

    // The root node is compressed once per 64-byte block of output. The
    // output block counter takes the place of the chunk counter, which is
    // always 0 for a root anyway.
    fn root_output_block(&self, output_block_counter: u64) -> [u8; BLOCK_LEN] {
        let state = portable::compress(
            &self.input_chaining_value,
            &self.block,
            self.block_len,
            output_block_counter,
            (self.flags | Flags::ROOT).bits(),
        );
        portable::le_bytes_from_words_64(&state)
    }

    fn root_hash(&self) -> Hash {
        debug_assert_eq!(self.counter, 0);
        let state = portable::compress(
            &self.input_chaining_value,
            &self.block,
            self.block_len,
            0,
            (self.flags | Flags::ROOT).bits(),
        );
        Hash(portable::le_bytes_from_words_32(&portable::first_8_words(&state)))
    }

    // Append exactly `byte_count` root output bytes. A shorter request is
    // always a prefix of a longer one.
    fn write_root_bytes(&self, output: &mut Vec<u8>, byte_count: usize) {
        debug_assert_eq!(self.counter, 0);
        output.reserve(byte_count);
        let mut remaining = byte_count;
        let mut output_block_counter = 0;
        while remaining > 0 {
            let block = self.root_output_block(output_block_counter);
            let take = cmp::min(remaining, block.len());
            output.extend_from_slice(&block[..take]);
            remaining -= take;
            output_block_counter += 1;
        }
    }
}

#[cfg(feature = "zeroize")]
impl zeroize::Zeroize for Output {
    fn zeroize(&mut self) {
        // Destructuring to trigger compile error as a reminder to update this
        // impl if a new field is added.
        let Self {
            input_chaining_value,
            block,
            block_len,
            counter,
            flags,
        } = self;

        input_chaining_value.zeroize();
        block.zeroize();
        block_len.zeroize();
        counter.zeroize();
        *flags = Flags::empty();
    }
}

fn parent_output(
    left_child_cv: &CVWords,
    right_child_cv: &CVWords,
    key: &CVWords,
    flags: Flags,
) -> Output {
    let mut block = [0; 16];
    block[..8].copy_from_slice(left_child_cv);
    block[8..].copy_from_slice(right_child_cv);
    Output {
        input_chaining_value: *key,
        block,
        block_len: BLOCK_LEN as u32, // Always BLOCK_LEN (64) for parent nodes.
        counter: 0,                  // Always 0 for parent nodes.
        flags: flags | Flags::PARENT,
    }
}

#[derive(Clone)]
struct ChunkState {
    cv: CVWords,
    chunk_counter: u64,
    buf: [u8; BLOCK_LEN],
    buf_len: u8,
    blocks_compressed: u8,
    flags: Flags,
}

impl ChunkState {
    fn new(key: &CVWords, chunk_counter: u64, flags: Flags) -> Self {
        Self {
            cv: *key,
            chunk_counter,
            buf: [0; BLOCK_LEN],
            buf_len: 0,
            blocks_compressed: 0,
            flags,
        }
    }

    fn reset(&mut self, key: &CVWords, chunk_counter: u64) {
        self.cv = *key;
        self.chunk_counter = chunk_counter;
        self.buf = [0; BLOCK_LEN];
        self.buf_len = 0;
        self.blocks_compressed = 0;
    }

    fn len(&self) -> usize {
        BLOCK_LEN * self.blocks_compressed as usize + self.buf_len as usize
    }

    fn fill_buf(&mut self, input: &mut &[u8]) {
        let want = BLOCK_LEN - self.buf_len as usize;
        let take = cmp::min(want, input.len());
        self.buf[self.buf_len as usize..][..take].copy_from_slice(&input[..take]);
        self.buf_len += take as u8;
        *input = &input[take..];
    }

    fn start_flag(&self) -> Flags {
        if self.blocks_compressed == 0 {
            Flags::CHUNK_START
        } else {
            Flags::empty()
        }
    }

    // A full buffered block is only compressed once more input shows up,
    // because the last block of the chunk needs the CHUNK_END flag and that
    // isn't known until then.
    fn update(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            if self.buf_len as usize == BLOCK_LEN {
                let block_flags = self.flags | self.start_flag(); // borrowck
                let state = portable::compress(
                    &self.cv,
                    &portable::words_from_le_bytes_64(&self.buf),
                    BLOCK_LEN as u32,
                    self.chunk_counter,
                    block_flags.bits(),
                );
                self.cv = portable::first_8_words(&state);
                self.blocks_compressed += 1;
                self.buf = [0; BLOCK_LEN];
                self.buf_len = 0;
            }
            self.fill_buf(&mut input);
        }
        debug_assert!(self.len() <= CHUNK_LEN);
    }

    fn output(&self) -> Output {
        let block_flags = self.flags | self.start_flag() | Flags::CHUNK_END;
        Output {
            input_chaining_value: self.cv,
            block: portable::words_from_le_bytes_64(&self.buf),
            block_len: self.buf_len as u32,
            counter: self.chunk_counter,
            flags: block_flags,
        }
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ChunkState")
            .field("len", &self.len())
            .field("chunk_counter", &self.chunk_counter)
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(feature = "zeroize")]
impl zeroize::Zeroize for ChunkState {
    fn zeroize(&mut self) {
        // Destructuring to trigger compile error as a reminder to update this
        // impl if a new field is added.
        let Self {
            cv,
            chunk_counter,
            buf,
            buf_len,
            blocks_compressed,
            flags,
        } = self;

        cv.zeroize();
        chunk_counter.zeroize();
        buf.zeroize();
        buf_len.zeroize();
        blocks_compressed.zeroize();
        *flags = Flags::empty();
    }
}

/// An incremental hash state that can accept any number of writes.
///
/// A `Hasher` starts out absorbing input. Any of the finalize methods moves
/// it into a finalized state, after which [`update`](Hasher::update) and the
/// finalize methods return [`Error::UseAfterFinalize`] until
/// [`reset`](Hasher::reset) is called. Splitting the input across calls
/// doesn't change the result.
///
/// When the `std` feature is enabled, `Hasher` implements
/// [`std::io::Write`], so it can be the target of
/// [`std::io::copy`](https://doc.rust-lang.org/std/io/fn.copy.html).
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), blake3_stream::Error> {
/// // Hash an input incrementally.
/// let mut hasher = blake3_stream::Hasher::new();
/// hasher.update(b"foo")?.update(b"bar")?.update(b"baz")?;
/// assert_eq!(hasher.finalize()?, blake3_stream::hash(b"foobarbaz"));
///
/// // A finalized hasher refuses more input.
/// assert_eq!(
///     hasher.update(b"more").err(),
///     Some(blake3_stream::Error::UseAfterFinalize),
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Hasher {
    key: CVWords,
    flags: Flags,
    chunk_state: ChunkState,
    // Chaining values of completed subtrees that haven't been merged yet,
    // oldest (and largest) first. The length is the number of 1 bits in the
    // count of completed chunks.
    cv_stack: ArrayVec<CVWords, MAX_DEPTH>,
    finalized: bool,
}

impl Hasher {
    fn new_internal(key: &CVWords, flags: Flags) -> Self {
        trace!(flags = flags.bits(), "new hasher");
        Self {
            key: *key,
            flags,
            chunk_state: ChunkState::new(key, 0, flags),
            cv_stack: ArrayVec::new(),
            finalized: false,
        }
    }

    /// Construct a new `Hasher` for the regular hash function.
    pub fn new() -> Self {
        Self::new_internal(IV, Flags::empty())
    }

    /// Construct a new `Hasher` for the keyed hash function. See
    /// [`keyed_hash`].
    ///
    /// Returns [`Error::InvalidKeyLength`] unless the key is exactly
    /// [`KEY_LEN`] bytes long.
    ///
    /// [`keyed_hash`]: fn.keyed_hash.html
    pub fn new_keyed(key: &[u8]) -> Result<Self, Error> {
        let key: &[u8; KEY_LEN] = key.try_into().map_err(|_| {
            let err = Error::InvalidKeyLength(key.len());
            debug!(%err, "rejected key");
            err
        })?;
        Ok(Self::new_keyed_array(key))
    }

    /// Construct a new `Hasher` for the keyed hash function from a key whose
    /// length is already known to be right.
    pub fn new_keyed_array(key: &[u8; KEY_LEN]) -> Self {
        let key_words = portable::words_from_le_bytes_32(key);
        Self::new_internal(&key_words, Flags::KEYED_HASH)
    }

    /// Construct a new `Hasher` for the key derivation function. See
    /// [`derive_key`]. The context string should be hardcoded, globally
    /// unique, and application-specific.
    ///
    /// [`derive_key`]: fn.derive_key.html
    pub fn new_derive_key(context: &str) -> Self {
        let mut context_hasher = Self::new_internal(IV, Flags::DERIVE_KEY_CONTEXT);
        context_hasher.absorb(context.as_bytes());
        let context_key = context_hasher.final_output().root_hash();
        let context_key_words = portable::words_from_le_bytes_32(context_key.as_bytes());
        Self::new_internal(&context_key_words, Flags::DERIVE_KEY_MATERIAL)
    }

    /// Reset the `Hasher` to its initial state, with the same key and mode.
    ///
    /// This is the only way to reuse a finalized `Hasher`, and it's
    /// equivalent to constructing a new one, without repeating the key
    /// derivation step in the derive_key mode.
    pub fn reset(&mut self) -> &mut Self {
        self.chunk_state.reset(&self.key, 0);
        self.cv_stack.clear();
        self.finalized = false;
        self
    }

    /// The total number of input bytes absorbed so far.
    pub fn count(&self) -> u64 {
        self.chunk_state
            .chunk_counter
            .wrapping_mul(CHUNK_LEN as u64)
            .wrapping_add(self.chunk_state.len() as u64)
    }

    /// Whether one of the finalize methods has already been called.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    // A chunk has been filled and more input is arriving, so it can be
    // finalized as a non-root node. Its chaining value completes one subtree
    // for every trailing 0 bit in the new chunk count. For each of those, pop
    // the left sibling off the stack and merge. Then push what's left.
    fn complete_chunk(&mut self) {
        debug_assert_eq!(self.chunk_state.len(), CHUNK_LEN);
        let chunk_cv = self.chunk_state.output().chaining_value();
        let new_chunk_counter = self.chunk_state.chunk_counter + 1;
        let merges = new_chunk_counter.trailing_zeros() as usize;
        debug_assert!(merges <= self.cv_stack.len(), "subtree stack too shallow");

        let key = self.key;
        let flags = self.flags;
        let first_merged = self.cv_stack.len().saturating_sub(merges);
        let subtree_cv = self
            .cv_stack
            .drain(first_merged..)
            .rev()
            .fold(chunk_cv, |right_child, left_child| {
                parent_output(&left_child, &right_child, &key, flags).chaining_value()
            });
        self.cv_stack.push(subtree_cv);
        trace!(
            chunk_counter = new_chunk_counter,
            merges,
            stack_len = self.cv_stack.len(),
            "completed chunk"
        );

        self.chunk_state.reset(&self.key, new_chunk_counter);
    }

    fn absorb(&mut self, mut input: &[u8]) {
        while !input.is_empty() {
            // Completing the chunk is lazy: the last chunk has to stay in the
            // chunk state until finalization, which might make it the root.
            if self.chunk_state.len() == CHUNK_LEN {
                self.complete_chunk();
            }

            let want = CHUNK_LEN - self.chunk_state.len();
            let take = cmp::min(want, input.len());
            self.chunk_state.update(&input[..take]);
            input = &input[take..];
        }
    }

    fn check_not_finalized(&self) -> Result<(), Error> {
        if self.finalized {
            let err = Error::UseAfterFinalize;
            debug!(%err, count = self.count(), "rejected call");
            return Err(err);
        }
        Ok(())
    }

    /// Add input bytes to the hash state. You can call this any number of
    /// times.
    ///
    /// Returns [`Error::UseAfterFinalize`], and absorbs nothing, if the
    /// `Hasher` has already been finalized.
    #[doc(alias = "absorb")]
    pub fn update(&mut self, input: &[u8]) -> Result<&mut Self, Error> {
        self.check_not_finalized()?;
        self.absorb(input);
        Ok(self)
    }

    /// Add a single byte to the hash state. This is the same as calling
    /// [`update`](Hasher::update) with a one-byte slice.
    pub fn update_byte(&mut self, byte: u8) -> Result<&mut Self, Error> {
        self.update(&[byte])
    }

    // Fold the stack into the current chunk's output, newest subtree first.
    // The stack entry is always the left child, since it covers earlier input.
    // With no stack entries the chunk itself is the root.
    fn final_output(&self) -> Output {
        self.cv_stack
            .iter()
            .rev()
            .fold(self.chunk_state.output(), |output, left_child| {
                parent_output(left_child, &output.chaining_value(), &self.key, self.flags)
            })
    }

    // Move to the finalized state and hand back the root node.
    fn take_root(&mut self, output_byte_count: Option<usize>) -> Result<Output, Error> {
        self.check_not_finalized()?;
        if output_byte_count == Some(0) {
            let err = Error::InvalidOutputLength;
            debug!(%err, "rejected finalize");
            return Err(err);
        }
        trace!(
            count = self.count(),
            output_byte_count,
            stack_len = self.cv_stack.len(),
            "finalizing"
        );
        let root = self.final_output();
        self.cv_stack.clear();
        self.finalized = true;
        Ok(root)
    }

    /// Finalize the hash state and return the [`Hash`] of the input.
    ///
    /// This is equivalent to [`finalize_to_vec`](Hasher::finalize_to_vec)
    /// with the default length of [`OUT_LEN`] bytes.
    pub fn finalize(&mut self) -> Result<Hash, Error> {
        Ok(self.take_root(Some(OUT_LEN))?.root_hash())
    }

    /// Finalize the hash state and return exactly `output_byte_count` bytes
    /// of output.
    ///
    /// Any output length is allowed except 0, which returns
    /// [`Error::InvalidOutputLength`] and leaves the `Hasher` unfinalized.
    /// Shorter outputs are prefixes of longer ones, and the first 32 bytes
    /// are the same as [`finalize`](Hasher::finalize).
    pub fn finalize_to_vec(&mut self, output_byte_count: usize) -> Result<Vec<u8>, Error> {
        let mut output = Vec::new();
        self.finalize_into(&mut output, output_byte_count)?;
        Ok(output)
    }

    /// Finalize the hash state and append exactly `output_byte_count` bytes
    /// of output to `output`. Bytes already in `output` are left alone.
    pub fn finalize_into(
        &mut self,
        output: &mut Vec<u8>,
        output_byte_count: usize,
    ) -> Result<(), Error> {
        self.take_root(Some(output_byte_count))?
            .write_root_bytes(output, output_byte_count);
        Ok(())
    }

    /// Finalize the hash state and return an [`OutputReader`], which can
    /// supply any number of output bytes.
    ///
    /// [`OutputReader`]: struct.OutputReader.html
    pub fn finalize_xof(&mut self) -> Result<OutputReader, Error> {
        Ok(OutputReader::new(self.take_root(None)?))
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("flags", &self.flags)
            .field("chunk_state", &self.chunk_state)
            .field("stack_len", &self.cv_stack.len())
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl Default for Hasher {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl std::io::Write for Hasher {
    /// This is equivalent to [`update`](#method.update), except that a
    /// finalized `Hasher` turns into an [`std::io::Error`].
    #[inline]
    fn write(&mut self, input: &[u8]) -> std::io::Result<usize> {
        self.update(input)?;
        Ok(input.len())
    }

    #[inline]
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(feature = "zeroize")]
impl zeroize::Zeroize for Hasher {
    fn zeroize(&mut self) {
        // Destructuring to trigger compile error as a reminder to update this
        // impl if a new field is added.
        let Self {
            key,
            flags,
            chunk_state,
            cv_stack,
            finalized,
        } = self;

        key.zeroize();
        *flags = Flags::empty();
        chunk_state.zeroize();
        for cv in cv_stack.iter_mut() {
            cv.zeroize();
        }
        cv_stack.clear();
        *finalized = false;
    }
}

/// An incremental reader for extended output, returned by
/// [`Hasher::finalize_xof`](struct.Hasher.html#method.finalize_xof).
///
/// Shorter BLAKE3 outputs are prefixes of longer ones, and explicitly
/// requesting a short output is equivalent to truncating the default-length
/// output. Note that this is a difference between BLAKE2 and BLAKE3.
///
/// The output stream is 2<sup>64</sup> blocks of 64 bytes long. Reading never
/// fails, and reads can start anywhere, see
/// [`set_position`](#method.set_position).
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), blake3_stream::Error> {
/// let mut hasher = blake3_stream::Hasher::new();
/// hasher.update(b"foobarbaz")?;
/// let mut reader = hasher.finalize_xof()?;
///
/// let mut first = [0; 10];
/// let mut rest = [0; 90];
/// reader.fill(&mut first);
/// reader.fill(&mut rest);
/// assert_eq!(100, reader.position());
///
/// let all = blake3_stream::hash_xof(b"foobarbaz", 100)?;
/// assert_eq!(&all[..10], &first[..]);
/// assert_eq!(&all[10..], &rest[..]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OutputReader {
    inner: Output,
    output_block_counter: u64,
    position_within_block: u8,
}

impl OutputReader {
    fn new(inner: Output) -> Self {
        Self {
            inner,
            output_block_counter: 0,
            position_within_block: 0,
        }
    }

    /// Fill a buffer with output bytes and advance the position of the
    /// `OutputReader`.
    pub fn fill(&mut self, mut buf: &mut [u8]) {
        while !buf.is_empty() {
            let block = self.inner.root_output_block(self.output_block_counter);
            let output_bytes = &block[self.position_within_block as usize..];
            let take = cmp::min(buf.len(), output_bytes.len());
            buf[..take].copy_from_slice(&output_bytes[..take]);
            buf = &mut buf[take..];
            self.position_within_block += take as u8;
            if self.position_within_block as usize == BLOCK_LEN {
                self.output_block_counter = self.output_block_counter.wrapping_add(1);
                self.position_within_block = 0;
            }
        }
    }

    /// Return the current read position in the output stream. The position
    /// starts at 0, and each call to [`fill`] advances it by the length of
    /// the buffer.
    ///
    /// [`fill`]: #method.fill
    pub fn position(&self) -> u64 {
        self.output_block_counter
            .wrapping_mul(BLOCK_LEN as u64)
            .wrapping_add(self.position_within_block as u64)
    }

    /// Seek to a new read position in the output stream. This is equivalent
    /// to calling [`fill`] with an empty buffer of length `position`.
    ///
    /// [`fill`]: #method.fill
    pub fn set_position(&mut self, position: u64) {
        self.position_within_block = (position % BLOCK_LEN as u64) as u8;
        self.output_block_counter = position / BLOCK_LEN as u64;
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for OutputReader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OutputReader")
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(feature = "std")]
impl std::io::Read for OutputReader {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.fill(buf);
        Ok(buf.len())
    }
}

#[cfg(feature = "std")]
impl std::io::Seek for OutputReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        let max_position = u64::MAX as i128;
        let target_position: i128 = match pos {
            std::io::SeekFrom::Start(x) => x as i128,
            std::io::SeekFrom::Current(x) => self.position() as i128 + x as i128,
            std::io::SeekFrom::End(_) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "seek from end not supported",
                ));
            }
        };
        if target_position < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start",
            ));
        }
        self.set_position(cmp::min(target_position, max_position) as u64);
        Ok(self.position())
    }
}

#[cfg(feature = "zeroize")]
impl zeroize::Zeroize for OutputReader {
    fn zeroize(&mut self) {
        // Destructuring to trigger compile error as a reminder to update this
        // impl if a new field is added.
        let Self {
            inner,
            output_block_counter,
            position_within_block,
        } = self;

        inner.zeroize();
        output_block_counter.zeroize();
        position_within_block.zeroize();
    }
}

/// The default hash function.
///
/// For an incremental version that accepts multiple writes, see
/// [`Hasher::update`]. For extended output, see [`hash_xof`].
///
/// # Examples
///
/// ```
/// let hash = blake3_stream::hash(b"");
/// assert_eq!(
///     "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262",
///     hash.to_hex().as_str(),
/// );
/// ```
pub fn hash(input: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.absorb(input);
    hasher.final_output().root_hash()
}

/// The default hash function with an output of `output_byte_count` bytes.
///
/// Returns [`Error::InvalidOutputLength`] if `output_byte_count` is 0.
pub fn hash_xof(input: &[u8], output_byte_count: usize) -> Result<Vec<u8>, Error> {
    let mut hasher = Hasher::new();
    hasher.absorb(input);
    hasher.finalize_to_vec(output_byte_count)
}

/// The keyed hash function.
///
/// This is suitable for use as a message authentication code, for example to
/// replace an HMAC instance. In that use case, the constant-time equality
/// checking provided by [`Hash`](struct.Hash.html) is almost always a
/// security requirement, and callers need to be careful not to compare MACs
/// as raw bytes.
///
/// Returns [`Error::InvalidKeyLength`] unless the key is exactly [`KEY_LEN`]
/// bytes long.
///
/// For output sizes other than 32 bytes, see [`keyed_hash_xof`].
#[doc(alias = "hash_with_key")]
pub fn keyed_hash(key: &[u8], input: &[u8]) -> Result<Hash, Error> {
    let mut hasher = Hasher::new_keyed(key)?;
    hasher.absorb(input);
    Ok(hasher.final_output().root_hash())
}

/// The keyed hash function with an output of `output_byte_count` bytes.
pub fn keyed_hash_xof(
    key: &[u8],
    input: &[u8],
    output_byte_count: usize,
) -> Result<Vec<u8>, Error> {
    let mut hasher = Hasher::new_keyed(key)?;
    hasher.absorb(input);
    hasher.finalize_to_vec(output_byte_count)
}

/// The key derivation function.
///
/// Given cryptographic key material of any length and a context string of any
/// length, this function outputs a 32-byte derived subkey. **The context
/// string should be hardcoded, globally unique, and application-specific.** A
/// good default format for such strings is `"[application] [commit
/// timestamp] [purpose]"`, e.g., `"example.com 2019-12-25 16:18:03 session
/// tokens v1"`.
///
/// Internally the context string is hashed on its own first, and that hash
/// keys the hash of the key material. The two steps use different flags, so
/// neither collides with the other modes.
///
/// For output sizes other than 32 bytes, see [`derive_key_xof`].
///
/// # Examples
///
/// ```
/// let key = blake3_stream::derive_key(
///     "example.com 2019-12-25 16:18:03 session tokens v1",
///     b"some input key material",
/// );
/// assert_eq!(32, key.len());
/// ```
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; OUT_LEN] {
    let mut hasher = Hasher::new_derive_key(context);
    hasher.absorb(key_material);
    hasher.final_output().root_hash().0
}

/// The key derivation function with an output of `output_byte_count` bytes.
pub fn derive_key_xof(
    context: &str,
    key_material: &[u8],
    output_byte_count: usize,
) -> Result<Vec<u8>, Error> {
    let mut hasher = Hasher::new_derive_key(context);
    hasher.absorb(key_material);
    hasher.finalize_to_vec(output_byte_count)
}
