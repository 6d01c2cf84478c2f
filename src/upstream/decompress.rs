//! Response body decoding.

use std::io::{self, Read};

use flate2::read::GzDecoder;

/// Upper bound on an inflated body.
pub const MAX_DECODED_BYTES: u64 = 32 * 1024 * 1024;

/// Inflate a gzip-encoded body of at most [`MAX_DECODED_BYTES`].
pub fn gunzip(data: &[u8]) -> io::Result<Vec<u8>> {
    gunzip_limited(data, MAX_DECODED_BYTES)
}

fn gunzip_limited(data: &[u8], limit: u64) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data).take(limit + 1).read_to_end(&mut out)?;
    if out.len() as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("decoded body exceeds {limit} bytes"),
        ));
    }
    Ok(out)
}

/// Whether a `Content-Encoding` value says the body is gzip-compressed.
pub fn is_gzip(content_encoding: &str) -> bool {
    content_encoding.to_ascii_lowercase().contains("gzip")
}
