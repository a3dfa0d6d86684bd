use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

const READ_CHUNK_BYTES: usize = 1024 * 1024;

pub fn sha256_hex(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

pub fn sha256_hex_reader(reader: &mut impl Read) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let read = reader
            .read(&mut buffer)
            .context("failed to read payload while hashing")?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_hex_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;
    sha256_hex_reader(&mut file)
}

pub fn verify_sha256(payload: &[u8], expected_hex: &str) -> bool {
    sha256_hex(payload).eq_ignore_ascii_case(expected_hex.trim())
}

pub fn verify_sha256_file(path: &Path, expected_hex: &str) -> Result<bool> {
    let actual = sha256_hex_file(path)?;
    Ok(actual.eq_ignore_ascii_case(expected_hex.trim()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn sha256_hex_matches_known_vectors() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
        assert_eq!(sha256_hex(b"abc"), ABC_SHA256);
    }

    #[test]
    fn sha256_hex_reader_matches_in_memory_digest() {
        let payload = vec![0xabu8; READ_CHUNK_BYTES + 17];
        let mut cursor = Cursor::new(payload.clone());

        let streamed = sha256_hex_reader(&mut cursor).expect("hashing must complete");

        assert_eq!(streamed, sha256_hex(&payload));
    }

    #[test]
    fn verify_sha256_is_case_insensitive() {
        assert!(verify_sha256(b"abc", &ABC_SHA256.to_uppercase()));
        assert!(verify_sha256(b"abc", &format!("  {ABC_SHA256}\n")));
        assert!(!verify_sha256(b"abcd", ABC_SHA256));
    }

    #[test]
    fn verify_sha256_rejects_single_flipped_digit() {
        let mut flipped = ABC_SHA256.to_string();
        flipped.replace_range(..1, "c");
        assert_ne!(flipped, ABC_SHA256);
        assert!(!verify_sha256(b"abc", &flipped));
    }

    #[test]
    fn verify_sha256_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "condaboot-checksum-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock after epoch")
                .subsec_nanos()
        ));
        std::fs::write(&path, b"abc").expect("test file must be written");

        let verified = verify_sha256_file(&path, ABC_SHA256).expect("verification must complete");
        let mismatched =
            verify_sha256_file(&path, EMPTY_SHA256).expect("verification must complete");
        std::fs::remove_file(&path).ok();

        assert!(verified);
        assert!(!mismatched);
    }

    #[test]
    fn verify_sha256_file_errors_for_missing_file() {
        let missing = std::env::temp_dir().join("condaboot-checksum-test-missing");
        assert!(verify_sha256_file(&missing, ABC_SHA256).is_err());
    }
}
