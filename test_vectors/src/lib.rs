use anyhow::{ensure, Context, Result};
use blake3_stream::{Hasher, BLOCK_LEN, CHUNK_LEN, KEY_LEN, OUT_LEN};
use serde::{Deserialize, Serialize};
use tracing::debug;

// A non-multiple of 4 is important, since one possible bug is to fail to emit
// partial words.
pub const OUTPUT_LEN: usize = 2 * BLOCK_LEN + 3;

pub const TEST_CASES: &[usize] = &[
    0,
    1,
    2,
    3,
    4,
    5,
    6,
    7,
    8,
    BLOCK_LEN - 1,
    BLOCK_LEN,
    BLOCK_LEN + 1,
    2 * BLOCK_LEN - 1,
    2 * BLOCK_LEN,
    2 * BLOCK_LEN + 1,
    CHUNK_LEN - 1,
    CHUNK_LEN,
    CHUNK_LEN + 1,
    2 * CHUNK_LEN,
    2 * CHUNK_LEN + 1,
    3 * CHUNK_LEN,
    3 * CHUNK_LEN + 1,
    4 * CHUNK_LEN,
    4 * CHUNK_LEN + 1,
    5 * CHUNK_LEN,
    5 * CHUNK_LEN + 1,
    6 * CHUNK_LEN,
    6 * CHUNK_LEN + 1,
    7 * CHUNK_LEN,
    7 * CHUNK_LEN + 1,
    8 * CHUNK_LEN,
    8 * CHUNK_LEN + 1,
    16 * CHUNK_LEN,
    31 * CHUNK_LEN, // 16 + 8 + 4 + 2 + 1
    100 * CHUNK_LEN,
];

pub const TEST_KEY: &[u8; KEY_LEN] = b"whats the Elvish word for friend";
pub const TEST_CONTEXT: &str = "BLAKE3 2019-12-27 16:29:52 test vectors context";

const COMMENT: &str = r#"
Each test is an input length and three outputs, one for each of the hash,
keyed_hash, and derive_key modes. The input in each case is filled with a
repeating sequence of 251 bytes: 0, 1, 2, ..., 249, 250, 0, 1, ..., and so on.
The key used with keyed_hash is the 32-byte ASCII string "whats the Elvish word
for friend", also given in the `key` field below. The context string used with
derive_key is the ASCII string "BLAKE3 2019-12-27 16:29:52 test vectors
context", also given in the `context_string` field below. Outputs are encoded
as hexadecimal. Each case is an extended output, and implementations should
also check that the first 32 bytes match their default-length output.
"#;

// Paint the input with a repeating byte pattern. We use a cycle length of 251,
// because that's the largest prime number less than 256. This makes it
// unlikely that swapping any two adjacent input blocks or chunks will give the
// same answer.
pub fn paint_test_input(buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Cases {
    pub _comment: String,
    pub key: String,
    pub context_string: String,
    pub cases: Vec<Case>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Case {
    pub input_len: usize,
    pub hash: String,
    pub keyed_hash: String,
    pub derive_key: String,
}

pub fn generate_cases() -> Result<Cases> {
    let mut cases = Vec::new();
    for &input_len in TEST_CASES {
        debug!(input_len, "generating case");
        let mut input = vec![0; input_len];
        paint_test_input(&mut input);

        let hash_out = Hasher::new().update(&input)?.finalize_to_vec(OUTPUT_LEN)?;
        let keyed_hash_out = Hasher::new_keyed(TEST_KEY)?
            .update(&input)?
            .finalize_to_vec(OUTPUT_LEN)?;
        let derive_key_out = Hasher::new_derive_key(TEST_CONTEXT)
            .update(&input)?
            .finalize_to_vec(OUTPUT_LEN)?;

        cases.push(Case {
            input_len,
            hash: hex::encode(&hash_out[..]),
            keyed_hash: hex::encode(&keyed_hash_out[..]),
            derive_key: hex::encode(&derive_key_out[..]),
        });
    }

    Ok(Cases {
        _comment: COMMENT.trim().replace('\n', " "),
        key: std::str::from_utf8(TEST_KEY)?.to_string(),
        context_string: TEST_CONTEXT.to_string(),
        cases,
    })
}

pub fn generate_json() -> Result<String> {
    let json = serde_json::to_string_pretty(&generate_cases()?)?;
    Ok(json)
}

pub fn parse_test_cases(json: &str) -> Result<Cases> {
    serde_json::from_str(json).context("malformed test vectors")
}

fn check_output(
    mode: &str,
    input_len: usize,
    expected_hex: &str,
    default: &[u8],
    mut hasher: Hasher,
) -> Result<()> {
    let expected = hex::decode(expected_hex)
        .with_context(|| format!("{mode} output for input_len {input_len} isn't hex"))?;
    ensure!(!expected.is_empty(), "empty {mode} output for input_len {input_len}");
    let actual = hasher.finalize_to_vec(expected.len())?;
    ensure!(expected == actual, "{mode} mismatch for input_len {input_len}");
    ensure!(
        expected.len() < OUT_LEN || default == &expected[..OUT_LEN],
        "{mode} default-length mismatch for input_len {input_len}",
    );
    Ok(())
}

/// Check every case in a vector file against this crate, in all three modes,
/// at the extended length and at the default length.
pub fn check_cases(cases: &Cases) -> Result<()> {
    let key = cases.key.as_bytes();
    let max_len = cases.cases.iter().map(|case| case.input_len).max().unwrap_or(0);
    let mut input_buf = vec![0; max_len];
    paint_test_input(&mut input_buf);

    for case in &cases.cases {
        let input = &input_buf[..case.input_len];
        debug!(input_len = case.input_len, "checking case");

        let mut hasher = Hasher::new();
        hasher.update(input)?;
        let default = blake3_stream::hash(input);
        check_output("hash", case.input_len, &case.hash, default.as_bytes(), hasher)?;

        let mut hasher = Hasher::new_keyed(key)?;
        hasher.update(input)?;
        let default = blake3_stream::keyed_hash(key, input)?;
        check_output(
            "keyed_hash",
            case.input_len,
            &case.keyed_hash,
            default.as_bytes(),
            hasher,
        )?;

        let mut hasher = Hasher::new_derive_key(&cases.context_string);
        hasher.update(input)?;
        let default = blake3_stream::derive_key(&cases.context_string, input);
        check_output("derive_key", case.input_len, &case.derive_key, &default, hasher)?;
    }
    Ok(())
}
