//! Core compression functionality

use crate::policy::CompressionLevel;
use bytes::Bytes;
use flate2::write::{DeflateEncoder, GzEncoder};
use squeeze_core::{Error, Result};
use std::io::Write;

/// Content codings the pipeline can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// gzip member (RFC 1952)
    Gzip,
    /// Raw DEFLATE stream (RFC 1951)
    Deflate,
}

impl Encoding {
    /// Get the Content-Encoding header value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    /// Parse a single Accept-Encoding coding
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Deflate),
            _ => None,
        }
    }
}

/// Compressor for response bodies
#[derive(Debug)]
pub struct Compressor;

impl Compressor {
    /// Compress data using the specified encoding and level
    ///
    /// The encoder is finished before returning, so the result always carries
    /// the complete trailer.
    pub fn compress(data: &[u8], encoding: Encoding, level: CompressionLevel) -> Result<Bytes> {
        let compressed = match encoding {
            Encoding::Gzip => Self::compress_gzip(data, level),
            Encoding::Deflate => Self::compress_deflate(data, level),
        }
        .map_err(|e| Error::compression(encoding.as_str(), e))?;

        Ok(Bytes::from(compressed))
    }

    /// Compress using gzip
    fn compress_gzip(data: &[u8], level: CompressionLevel) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), level.to_flate2());
        encoder.write_all(data)?;
        encoder.finish()
    }

    /// Compress using raw deflate
    fn compress_deflate(data: &[u8], level: CompressionLevel) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            DeflateEncoder::new(Vec::with_capacity(data.len() / 2), level.to_flate2());
        encoder.write_all(data)?;
        encoder.finish()
    }
}
