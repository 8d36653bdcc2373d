use crate::{Error, Hash, Hasher, BLOCK_LEN, CHUNK_LEN, KEY_LEN, OUT_LEN};
use core::cmp;
use rand::prelude::*;
use rand::rngs::StdRng;

pub const TEST_CASES: &[usize] = &[
    0,
    1,
    2,
    BLOCK_LEN - 1,
    BLOCK_LEN,
    BLOCK_LEN + 1,
    2 * BLOCK_LEN - 1,
    2 * BLOCK_LEN,
    2 * BLOCK_LEN + 1,
    CHUNK_LEN - 1,
    CHUNK_LEN,
    CHUNK_LEN + 1,
    2 * CHUNK_LEN - 1,
    2 * CHUNK_LEN,
    2 * CHUNK_LEN + 1,
    3 * CHUNK_LEN - 1,
    3 * CHUNK_LEN,
    3 * CHUNK_LEN + 1,
    4 * CHUNK_LEN - 1,
    4 * CHUNK_LEN,
    4 * CHUNK_LEN + 1,
    5 * CHUNK_LEN,
    7 * CHUNK_LEN + 1,
    8 * CHUNK_LEN,
    8 * CHUNK_LEN + 1,
    16 * CHUNK_LEN - 1,
    16 * CHUNK_LEN,
    16 * CHUNK_LEN + 1,
    31 * CHUNK_LEN, // 16 + 8 + 4 + 2 + 1
    100 * CHUNK_LEN + 1,
];

pub const TEST_CASES_MAX: usize = 100 * CHUNK_LEN + 1;

// There's nothing special about this key or context, other than that they're
// the ones in the official test vectors.
pub const TEST_KEY: [u8; KEY_LEN] = *b"whats the Elvish word for friend";
pub const TEST_CONTEXT: &str = "BLAKE3 2019-12-27 16:29:52 test vectors context";

// A non-multiple of 4 and of BLOCK_LEN, since one possible bug is to fail to
// emit partial words or partial blocks.
const XOF_LEN: usize = 2 * BLOCK_LEN + 3;

// Paint a byte pattern that won't repeat, so that we don't accidentally
// miss buffer offset bugs.
pub fn paint_test_input(buf: &mut [u8]) {
    let mut offset = 0;
    let mut counter: u32 = 1;
    while offset < buf.len() {
        let bytes = counter.to_le_bytes();
        let take = cmp::min(bytes.len(), buf.len() - offset);
        buf[offset..][..take].copy_from_slice(&bytes[..take]);
        counter += 1;
        offset += take;
    }
}

fn reference_xof(reference: &blake3::Hasher, len: usize) -> Vec<u8> {
    let mut out = vec![0; len];
    reference.finalize_xof().fill(&mut out);
    out
}

fn xof_via_reader(hasher: &mut Hasher, len: usize) -> Vec<u8> {
    let mut out = vec![0; len];
    hasher.finalize_xof().unwrap().fill(&mut out);
    out
}

#[test]
fn test_compare_reference_impl() {
    let mut input_buf = vec![0; TEST_CASES_MAX];
    paint_test_input(&mut input_buf);
    for &case in TEST_CASES {
        let input = &input_buf[..case];
        dbg!(case);

        // regular
        {
            let mut reference = blake3::Hasher::new();
            reference.update(input);
            let expected = reference_xof(&reference, XOF_LEN);

            assert_eq!(&expected[..OUT_LEN], crate::hash(input).as_bytes());
            assert_eq!(expected, crate::hash_xof(input, XOF_LEN).unwrap());

            let mut hasher = Hasher::new();
            hasher.update(input).unwrap();
            assert_eq!(expected, xof_via_reader(&mut hasher, XOF_LEN));
        }

        // keyed
        {
            let mut reference = blake3::Hasher::new_keyed(&TEST_KEY);
            reference.update(input);
            let expected = reference_xof(&reference, XOF_LEN);

            let keyed = crate::keyed_hash(&TEST_KEY, input).unwrap();
            assert_eq!(&expected[..OUT_LEN], keyed.as_bytes());
            assert_eq!(
                expected,
                crate::keyed_hash_xof(&TEST_KEY, input, XOF_LEN).unwrap()
            );

            let mut hasher = Hasher::new_keyed(&TEST_KEY).unwrap();
            hasher.update(input).unwrap();
            assert_eq!(expected, xof_via_reader(&mut hasher, XOF_LEN));
        }

        // derive_key
        {
            let mut reference = blake3::Hasher::new_derive_key(TEST_CONTEXT);
            reference.update(input);
            let expected = reference_xof(&reference, XOF_LEN);

            assert_eq!(&expected[..OUT_LEN], &crate::derive_key(TEST_CONTEXT, input));
            assert_eq!(
                expected,
                crate::derive_key_xof(TEST_CONTEXT, input, XOF_LEN).unwrap()
            );

            let mut hasher = Hasher::new_derive_key(TEST_CONTEXT);
            hasher.update(input).unwrap();
            assert_eq!(expected, xof_via_reader(&mut hasher, XOF_LEN));
        }
    }
}

#[test]
fn test_empty_input_vector() {
    let expected = "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";
    assert_eq!(expected, crate::hash(b"").to_hex().as_str());
    let mut hasher = Hasher::new();
    hasher.update(&[]).unwrap();
    assert_eq!(
        hex::decode(expected).unwrap(),
        hasher.finalize_to_vec(OUT_LEN).unwrap()
    );
}

#[test]
fn test_abc_vector() {
    let expected = "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85";
    assert_eq!(expected, crate::hash(b"abc").to_hex().as_str());
}

#[test]
fn test_chunking_independence() {
    let mut input_buf = vec![0; 5 * CHUNK_LEN + 7];
    paint_test_input(&mut input_buf);
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for &case in TEST_CASES.iter().filter(|&&case| case <= input_buf.len()) {
        let input = &input_buf[..case];
        let expected = crate::hash_xof(input, XOF_LEN).unwrap();
        for _ in 0..10 {
            let mut hasher = Hasher::new_keyed(&TEST_KEY).unwrap();
            let mut keyed_expected = Hasher::new_keyed(&TEST_KEY).unwrap();
            keyed_expected.update(input).unwrap();
            let keyed_expected = keyed_expected.finalize_to_vec(XOF_LEN).unwrap();

            let mut plain = Hasher::new();
            let mut remaining = input;
            while !remaining.is_empty() {
                let take = rng.gen_range(0..=cmp::min(remaining.len(), 2 * CHUNK_LEN));
                plain.update(&remaining[..take]).unwrap();
                hasher.update(&remaining[..take]).unwrap();
                remaining = &remaining[take..];
            }
            assert_eq!(expected, plain.finalize_to_vec(XOF_LEN).unwrap());
            assert_eq!(keyed_expected, hasher.finalize_to_vec(XOF_LEN).unwrap());
        }
    }
}

#[test]
fn test_byte_at_a_time_matches_bulk() {
    let mut input_buf = vec![0; 3 * CHUNK_LEN + 7];
    paint_test_input(&mut input_buf);
    for &case in &[0, 1, 63, 64, 65, 1023, 1024, 1025, 2048, input_buf.len()] {
        let input = &input_buf[..case];
        let mut hasher = Hasher::new_derive_key(TEST_CONTEXT);
        for &byte in input {
            hasher.update_byte(byte).unwrap();
        }
        assert_eq!(hasher.count(), case as u64);
        let expected = crate::derive_key(TEST_CONTEXT, input);
        assert_eq!(expected, *hasher.finalize().unwrap().as_bytes());
    }
}

#[test]
fn test_xof_prefixes() {
    let input = b"some input that is shorter than a block";
    let long = crate::hash_xof(input, 1000).unwrap();
    for &len in &[1, 31, 32, 33, 63, 64, 65, 127, 128, 129, 999] {
        assert_eq!(&long[..len], &crate::hash_xof(input, len).unwrap()[..]);
    }
    assert_eq!(&long[..OUT_LEN], crate::hash(input).as_bytes());
}

#[test]
fn test_xof_seek() {
    let mut out = [0; 533];
    let mut hasher = Hasher::new();
    hasher.update(b"foo").unwrap();
    let mut reader = hasher.finalize_xof().unwrap();
    reader.fill(&mut out);
    assert_eq!(533, reader.position());

    for &seek in &[0, 1, 63, 64, 65, 200, 300, 532] {
        let mut reader2 = reader.clone();
        reader2.set_position(seek);
        assert_eq!(seek, reader2.position());
        let mut out2 = vec![0; out.len() - seek as usize];
        reader2.fill(&mut out2);
        assert_eq!(&out[seek as usize..], &out2[..]);
    }
}

#[test]
fn test_xof_fill_in_pieces() {
    let expected = crate::hash_xof(b"pieces", 300).unwrap();
    let mut hasher = Hasher::new();
    hasher.update(b"pieces").unwrap();
    let mut reader = hasher.finalize_xof().unwrap();
    let mut actual = Vec::new();
    for &piece_len in &[0, 1, 62, 1, 64, 100, 72] {
        let mut piece = vec![0; piece_len];
        reader.fill(&mut piece);
        actual.extend_from_slice(&piece);
    }
    assert_eq!(expected, actual);
}

#[test]
fn test_mode_separation() {
    let input = b"the same input in every mode";
    let plain = crate::hash(input);
    let keyed = crate::keyed_hash(&TEST_KEY, input).unwrap();
    let derived = Hash::from(crate::derive_key(TEST_CONTEXT, input));
    assert_ne!(plain, keyed);
    assert_ne!(plain, derived);
    assert_ne!(keyed, derived);

    // Keying with the IV bytes doesn't reproduce the plain hash, because the
    // KEYED_HASH flag still differs.
    let mut iv_bytes = [0; KEY_LEN];
    for (word, bytes) in crate::IV.iter().zip(iv_bytes.chunks_exact_mut(4)) {
        bytes.copy_from_slice(&word.to_le_bytes());
    }
    assert_ne!(plain, crate::keyed_hash(&iv_bytes, input).unwrap());
}

#[test]
fn test_key_length_validation() {
    for &len in &[0, 1, 31, 33, 64] {
        let key = vec![7; len];
        assert_eq!(Some(Error::InvalidKeyLength(len)), Hasher::new_keyed(&key).err());
        assert_eq!(
            Some(Error::InvalidKeyLength(len)),
            crate::keyed_hash(&key, b"foo").err()
        );
        assert_eq!(
            Some(Error::InvalidKeyLength(len)),
            crate::keyed_hash_xof(&key, b"foo", 64).err()
        );
    }
    let mut from_slice = Hasher::new_keyed(&TEST_KEY[..]).unwrap();
    let mut from_array = Hasher::new_keyed_array(&TEST_KEY);
    assert_eq!(from_slice.finalize().unwrap(), from_array.finalize().unwrap());
}

#[test]
fn test_use_after_finalize() {
    let mut hasher = Hasher::new();
    hasher.update(b"foo").unwrap();
    let hash = hasher.finalize().unwrap();
    assert!(hasher.is_finalized());
    assert_eq!(crate::hash(b"foo"), hash);

    assert_eq!(Some(Error::UseAfterFinalize), hasher.update(b"bar").err());
    assert_eq!(Some(Error::UseAfterFinalize), hasher.update_byte(0).err());
    assert_eq!(Some(Error::UseAfterFinalize), hasher.finalize().err());
    assert_eq!(Some(Error::UseAfterFinalize), hasher.finalize_to_vec(10).err());
    assert_eq!(Some(Error::UseAfterFinalize), hasher.finalize_xof().err());
    let mut out = vec![1, 2, 3];
    assert_eq!(
        Some(Error::UseAfterFinalize),
        hasher.finalize_into(&mut out, 10).err()
    );
    assert_eq!(vec![1, 2, 3], out);

    // A rejected update doesn't count any input.
    assert_eq!(3, hasher.count());
}

#[test]
fn test_zero_output_length() {
    let mut hasher = Hasher::new();
    hasher.update(b"foo").unwrap();
    assert_eq!(Some(Error::InvalidOutputLength), hasher.finalize_to_vec(0).err());
    let mut out = Vec::new();
    assert_eq!(
        Some(Error::InvalidOutputLength),
        hasher.finalize_into(&mut out, 0).err()
    );
    assert!(out.is_empty());
    assert_eq!(Some(Error::InvalidOutputLength), crate::hash_xof(b"foo", 0).err());

    // The rejected calls didn't finalize anything.
    assert!(!hasher.is_finalized());
    hasher.update(b"bar").unwrap();
    assert_eq!(crate::hash(b"foobar"), hasher.finalize().unwrap());
}

#[test]
fn test_finalize_into_appends() {
    let mut out = b"prefix".to_vec();
    let mut hasher = Hasher::new();
    hasher.update(b"foo").unwrap();
    hasher.finalize_into(&mut out, 100).unwrap();
    assert_eq!(b"prefix", &out[..6]);
    assert_eq!(crate::hash_xof(b"foo", 100).unwrap(), &out[6..]);
}

#[test]
fn test_reset() {
    let mut input_buf = vec![0; 3 * CHUNK_LEN + 1];
    paint_test_input(&mut input_buf);

    let mut hasher = Hasher::new();
    hasher.update(&input_buf).unwrap();
    hasher.reset();
    assert_eq!(0, hasher.count());
    hasher.update(&input_buf).unwrap();
    let hash1 = hasher.finalize().unwrap();

    hasher.reset();
    assert!(!hasher.is_finalized());
    hasher.update(&input_buf).unwrap();
    let hash2 = hasher.finalize().unwrap();
    assert_eq!(hash1, hash2);
    assert_eq!(crate::hash(&input_buf), hash1);

    // The derived key survives a reset.
    let mut hasher = Hasher::new_derive_key(TEST_CONTEXT);
    hasher.update(b"stuff").unwrap();
    hasher.finalize().unwrap();
    hasher.reset().update(&input_buf).unwrap();
    assert_eq!(
        crate::derive_key(TEST_CONTEXT, &input_buf),
        *hasher.finalize().unwrap().as_bytes()
    );
}

#[test]
fn test_clone_forks_the_state() {
    let mut input_buf = vec![0; 2 * CHUNK_LEN + 100];
    paint_test_input(&mut input_buf);
    let (first, second) = input_buf.split_at(CHUNK_LEN + 50);

    let mut hasher = Hasher::new();
    hasher.update(first).unwrap();
    let mut fork = hasher.clone();
    assert_eq!(crate::hash(first), fork.finalize().unwrap());
    hasher.update(second).unwrap();
    assert_eq!(crate::hash(&input_buf), hasher.finalize().unwrap());
}

#[test]
fn test_count() {
    let mut hasher = Hasher::new();
    assert_eq!(0, hasher.count());
    hasher.update(&[0; 1000]).unwrap();
    assert_eq!(1000, hasher.count());
    hasher.update(&[0; 1000]).unwrap();
    assert_eq!(2000, hasher.count());
    hasher.update(&[0; 48]).unwrap();
    assert_eq!(2048, hasher.count());
}

// 2^54 chunks is the whole 2^64 byte input space, so the count wraps there
// rather than overflowing.
#[test]
fn test_count_wraps_at_input_limit() {
    let mut hasher = Hasher::new();
    hasher.chunk_state.chunk_counter = 1 << 54;
    hasher.update(&[0; 5]).unwrap();
    assert_eq!(5, hasher.count());

    hasher.chunk_state.chunk_counter = (1 << 54) - 1;
    assert_eq!(u64::MAX - (CHUNK_LEN as u64 - 1) + 5, hasher.count());
}

#[test]
fn test_chunk_boundaries_at_many_output_lengths() {
    let mut input_buf = vec![0; 9 * CHUNK_LEN + 1];
    paint_test_input(&mut input_buf);
    for k in 1..=9 {
        for &len in &[k * CHUNK_LEN - 1, k * CHUNK_LEN, k * CHUNK_LEN + 1] {
            let input = &input_buf[..len];
            let mut reference = blake3::Hasher::new_keyed(&TEST_KEY);
            reference.update(input);
            for &out_len in &[1, OUT_LEN, XOF_LEN, CHUNK_LEN + 1] {
                let mut hasher = Hasher::new_keyed(&TEST_KEY).unwrap();
                hasher.update(input).unwrap();
                assert_eq!(
                    reference_xof(&reference, out_len),
                    hasher.finalize_to_vec(out_len).unwrap(),
                    "input {} output {}",
                    len,
                    out_len,
                );
            }
        }
    }
    // The published vector for a single zero byte.
    assert_eq!(
        "2d3adedff11b61f14c886e35afa036736dcd87a74d27b5c1510225d0f592e213",
        crate::hash(&[0]).to_hex().as_str(),
    );
}

// The block buffer holds at most one block, and a full block is only
// compressed when the next byte arrives.
#[test]
fn test_chunk_state_buffers_one_block() {
    let mut hasher = Hasher::new();
    hasher.update(&[9; BLOCK_LEN]).unwrap();
    assert_eq!(BLOCK_LEN, hasher.chunk_state.buf_len as usize);
    assert_eq!(0, hasher.chunk_state.blocks_compressed);

    hasher.update_byte(9).unwrap();
    assert_eq!(1, hasher.chunk_state.buf_len);
    assert_eq!(1, hasher.chunk_state.blocks_compressed);

    hasher.update(&[9; CHUNK_LEN - BLOCK_LEN - 1]).unwrap();
    assert_eq!(CHUNK_LEN, hasher.chunk_state.len());
    assert_eq!(0, hasher.chunk_state.chunk_counter);
    assert!(hasher.cv_stack.is_empty());

    // One more byte closes out chunk 0.
    hasher.update_byte(9).unwrap();
    assert_eq!(1, hasher.chunk_state.chunk_counter);
    assert_eq!(1, hasher.chunk_state.len());
    assert_eq!(1, hasher.cv_stack.len());
}

// After every completed chunk, the stack holds one subtree per 1 bit in the
// number of completed chunks.
#[test]
fn test_stack_len_is_popcount_of_completed_chunks() {
    let mut chunk = [0; CHUNK_LEN];
    paint_test_input(&mut chunk);
    let mut hasher = Hasher::new();
    for completed in 0..70u64 {
        hasher.update(&chunk).unwrap();
        assert_eq!(completed, hasher.chunk_state.chunk_counter);
        assert_eq!(CHUNK_LEN, hasher.chunk_state.len());
        assert_eq!(completed.count_ones() as usize, hasher.cv_stack.len());
    }
}

// Two full chunks make one parent, which sits on the stack as the left child
// of everything that follows.
#[test]
fn test_stack_holds_subtree_chaining_values() {
    let mut input = vec![0; 2 * CHUNK_LEN + 1];
    paint_test_input(&mut input);
    let mut hasher = Hasher::new();
    hasher.update(&input).unwrap();
    assert_eq!(1, hasher.cv_stack.len());

    let mut left = crate::ChunkState::new(crate::IV, 0, crate::Flags::empty());
    left.update(&input[..CHUNK_LEN]);
    let mut right = crate::ChunkState::new(crate::IV, 1, crate::Flags::empty());
    right.update(&input[CHUNK_LEN..2 * CHUNK_LEN]);
    let parent = crate::parent_output(
        &left.output().chaining_value(),
        &right.output().chaining_value(),
        crate::IV,
        crate::Flags::empty(),
    );
    assert_eq!(parent.chaining_value(), hasher.cv_stack[0]);
}

#[test]
fn test_hex_encoding_decoding() {
    let digest_str = "04e0bb39f30b1a3feb89f536c93be15055482df748674b00d26e5a75777702e9";
    let mut hash_bytes = [0; OUT_LEN];
    hash_bytes.copy_from_slice(&hex::decode(digest_str).unwrap());
    let hash = Hash::from(hash_bytes);
    assert_eq!(digest_str, hash.to_hex().as_str());
    assert_eq!(digest_str, hash.to_string());

    // Test round trip
    let hash = Hash::from_hex(digest_str).unwrap();
    assert_eq!(hash.as_bytes(), &hash_bytes);

    // Test uppercase
    let hash = Hash::from_hex(digest_str.to_uppercase()).unwrap();
    assert_eq!(hash.as_bytes(), &hash_bytes);

    // Test string parsing via FromStr
    let hash: Hash = digest_str.parse().unwrap();
    assert_eq!(hash.as_bytes(), &hash_bytes);

    // Test errors
    let bad_len = "04e0bb39f30b1";
    assert_eq!(
        Error::InvalidHexLength(bad_len.len()),
        Hash::from_hex(bad_len).unwrap_err()
    );
    let bad_char = "Z4e0bb39f30b1a3feb89f536c93be15055482df748674b00d26e5a75777702e9";
    assert_eq!(
        Error::InvalidHexCharacter('Z'),
        Hash::from_hex(bad_char).unwrap_err()
    );
}

#[test]
fn test_hash_conversions_and_equality() {
    let hash = crate::hash(b"foo");
    let bytes: [u8; OUT_LEN] = hash.into();
    assert_eq!(hash, bytes);
    assert_eq!(hash, bytes[..]);
    assert_eq!(hash, Hash::from_bytes(bytes));
    assert_ne!(hash, bytes[..31]);
    let debug = format!("{:?}", hash);
    assert_eq!(format!("Hash({:?})", hash.to_hex().as_str()), debug);
}

#[test]
fn test_debug_hides_state() {
    let mut hasher = Hasher::new_keyed_array(&TEST_KEY);
    hasher.update(b"secret input").unwrap();
    let debug = format!("{:?}", hasher);
    assert!(debug.contains("finalized: false"), "{}", debug);
    assert!(!debug.contains("whats"), "{}", debug);
    let reader = hasher.finalize_xof().unwrap();
    assert_eq!("OutputReader { position: 0 }", format!("{:?}", reader));
}

#[test]
#[cfg(feature = "std")]
fn test_io_write() {
    let mut input = vec![0; 10 * CHUNK_LEN + 3];
    paint_test_input(&mut input);
    let mut hasher = Hasher::new();
    let copied = std::io::copy(&mut &input[..], &mut hasher).unwrap();
    assert_eq!(input.len() as u64, copied);
    assert_eq!(crate::hash(&input), hasher.finalize().unwrap());

    use std::io::Write;
    let err = hasher.write(b"more").unwrap_err();
    assert_eq!(std::io::ErrorKind::Other, err.kind());
}

#[test]
#[cfg(feature = "std")]
fn test_io_read_and_seek() {
    use std::io::{Read, Seek, SeekFrom};
    let expected = crate::hash_xof(b"seekable", 200).unwrap();
    let mut hasher = Hasher::new();
    hasher.update(b"seekable").unwrap();
    let mut reader = hasher.finalize_xof().unwrap();

    let mut buf = [0; 50];
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(&expected[..50], &buf[..]);

    assert_eq!(120, reader.seek(SeekFrom::Current(70)).unwrap());
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(&expected[120..170], &buf[..]);

    assert_eq!(10, reader.seek(SeekFrom::Start(10)).unwrap());
    reader.read_exact(&mut buf).unwrap();
    assert_eq!(&expected[10..60], &buf[..]);

    assert!(reader.seek(SeekFrom::Current(-100)).is_err());
    assert!(reader.seek(SeekFrom::End(0)).is_err());
    assert_eq!(60, reader.position());
}
