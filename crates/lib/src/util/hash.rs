//! MD5 checksums for artifact verification.
//!
//! Artifacts on the CI server carry `.md5` sidecar files, so checksums here are MD5
//! rather than anything stronger. Digests are lowercase hexadecimal.

use std::fs;
use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

/// A 32-character lowercase hexadecimal MD5 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Md5Hash(pub String);

impl std::fmt::Display for Md5Hash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash a file's contents, streaming it in chunks.
pub fn hash_file(path: &Path) -> std::io::Result<Md5Hash> {
  let mut file = fs::File::open(path)?;
  let mut hasher = Md5::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(Md5Hash(hex::encode(hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> Md5Hash {
  Md5Hash(hex::encode(Md5::digest(data)))
}

/// First whitespace-separated token of a checksum file (`<digest>  <file name>` or just `<digest>`).
pub fn parse_checksum_line(content: &str) -> Option<&str> {
  content.split_whitespace().next()
}
