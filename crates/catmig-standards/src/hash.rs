#![deny(unsafe_code)]

use sha2::Digest;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    hex::encode(digest)
}

/// Fingerprint of a reference table: hash over its rows in code order, so
/// two loads of the same content agree whatever the row order on disk.
pub fn table_fingerprint<'a, I>(rows: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
{
    let mut lines: Vec<String> = rows
        .into_iter()
        .map(|(code, id, name)| format!("{code}\t{id}\t{name}\n"))
        .collect();
    lines.sort();
    sha256_hex(lines.concat().as_bytes())
}
