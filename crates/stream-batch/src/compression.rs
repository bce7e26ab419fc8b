// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Payload compression applied to every record before it is batched.

use std::io::Write;
use std::str::FromStr;

use flate2::write::{GzEncoder, ZlibEncoder};
use serde::Deserialize;
use zstd::stream::write::Encoder;
use zstd::zstd_safe::CompressionLevel;

use crate::errors::Error;

const DEFAULT_ZSTD_LEVEL: CompressionLevel = 3;
const DEFAULT_FLATE_LEVEL: u32 = 6;
const MAX_FLATE_LEVEL: u32 = 9;

/// Compresses a record payload. Implementations must be deterministic
/// and never return an empty buffer for a non-empty input.
pub trait Compressor: Send + Sync {
    fn compress(&self, data: Vec<u8>) -> Result<Vec<u8>, Error>;
}

/// Identity compressor, the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCompressor;

impl Compressor for NoopCompressor {
    fn compress(&self, data: Vec<u8>) -> Result<Vec<u8>, Error> {
        Ok(data)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: CompressionLevel,
}

impl ZstdCompressor {
    #[must_use]
    pub fn new(level: CompressionLevel) -> Self {
        Self { level }
    }
}

impl Compressor for ZstdCompressor {
    fn compress(&self, data: Vec<u8>) -> Result<Vec<u8>, Error> {
        let mut encoder = Encoder::new(Vec::new(), self.level)?;
        encoder.write_all(&data)?;
        Ok(encoder.finish()?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: flate2::Compression,
}

impl GzipCompressor {
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level.min(MAX_FLATE_LEVEL)),
        }
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, data: Vec<u8>) -> Result<Vec<u8>, Error> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(&data)?;
        Ok(encoder.finish()?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    level: flate2::Compression,
}

impl ZlibCompressor {
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level.min(MAX_FLATE_LEVEL)),
        }
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, data: Vec<u8>) -> Result<Vec<u8>, Error> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(&data)?;
        Ok(encoder.finish()?)
    }
}

/// Compression codec selected in [`crate::config::BatchConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Zstd,
    Gzip,
    Zlib,
}

impl Compression {
    /// Builds the compressor for this codec. `level` falls back to the
    /// codec's default when unset; flate levels are capped at 9.
    #[must_use]
    pub fn compressor(self, level: Option<i32>) -> Box<dyn Compressor> {
        match self {
            Compression::None => Box::new(NoopCompressor),
            Compression::Zstd => {
                Box::new(ZstdCompressor::new(level.unwrap_or(DEFAULT_ZSTD_LEVEL)))
            }
            Compression::Gzip => Box::new(GzipCompressor::new(flate_level(level))),
            Compression::Zlib => Box::new(ZlibCompressor::new(flate_level(level))),
        }
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "noop" => Ok(Compression::None),
            "zstd" => Ok(Compression::Zstd),
            "gzip" => Ok(Compression::Gzip),
            "zlib" => Ok(Compression::Zlib),
            other => Err(Error::InvalidConfig(format!(
                "unknown compression '{other}'. Must be one of: none, zstd, gzip, zlib"
            ))),
        }
    }
}

fn flate_level(level: Option<i32>) -> u32 {
    level
        .and_then(|l| u32::try_from(l).ok())
        .unwrap_or(DEFAULT_FLATE_LEVEL)
}
