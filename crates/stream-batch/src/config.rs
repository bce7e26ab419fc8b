// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use std::env;

use crate::compression::Compression;
use crate::constants::{MAX_BATCHED_RECORDS, MAX_RECORD_SIZE};
use crate::errors::Error;

/// Limits and features of a [`crate::batch::Batch`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum records per request, capped at 500
    pub max_records_per_batch: usize,
    /// Maximum size of a physical record in bytes, capped at 1 MiB
    pub max_record_size: usize,
    /// Whether small records are packed into aggregated containers
    pub enable_aggregation: bool,
    pub compression: Compression,
    /// Codec specific level; the codec default is used when unset
    pub compression_level: Option<i32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_records_per_batch: MAX_BATCHED_RECORDS,
            max_record_size: MAX_RECORD_SIZE,
            enable_aggregation: false,
            compression: Compression::None,
            compression_level: None,
        }
    }
}

impl BatchConfig {
    /// Creates a configuration with the given limits, clamped to the
    /// ingestion API ceilings.
    #[must_use]
    pub fn new(max_records_per_batch: usize, max_record_size: usize) -> Self {
        Self {
            max_records_per_batch,
            max_record_size,
            ..Default::default()
        }
        .clamped()
    }

    #[must_use]
    pub fn with_aggregation(mut self, enable_aggregation: bool) -> Self {
        self.enable_aggregation = enable_aggregation;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression, level: Option<i32>) -> Self {
        self.compression = compression;
        self.compression_level = level;
        self
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();

        let max_records_per_batch = env::var("STREAM_BATCH_MAX_RECORDS_PER_BATCH")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_records_per_batch);
        let max_record_size = env::var("STREAM_BATCH_MAX_RECORD_SIZE")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_record_size);
        let enable_aggregation = env::var("STREAM_BATCH_ENABLE_AGGREGATION")
            .map(|val| val.trim().to_lowercase() == "true")
            .unwrap_or(defaults.enable_aggregation);
        let compression = match env::var("STREAM_BATCH_COMPRESSION") {
            Ok(val) => val.parse::<Compression>()?,
            Err(_) => defaults.compression,
        };
        let compression_level = env::var("STREAM_BATCH_COMPRESSION_LEVEL")
            .ok()
            .and_then(|val| val.trim().parse::<i32>().ok());

        let config = Self {
            max_records_per_batch,
            max_record_size,
            enable_aggregation,
            compression,
            compression_level,
        }
        .clamped();

        config.validate()?;
        Ok(config)
    }

    /// Caps the limits at what the ingestion API accepts.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.max_records_per_batch = self.max_records_per_batch.min(MAX_BATCHED_RECORDS);
        self.max_record_size = self.max_record_size.min(MAX_RECORD_SIZE);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_records_per_batch == 0 {
            return Err(Error::InvalidConfig(
                "max_records_per_batch must be greater than 0".to_string(),
            ));
        }

        if self.max_record_size == 0 {
            return Err(Error::InvalidConfig(
                "max_record_size must be greater than 0".to_string(),
            ));
        }

        if self.max_records_per_batch > MAX_BATCHED_RECORDS {
            return Err(Error::InvalidConfig(format!(
                "max_records_per_batch {} exceeds {MAX_BATCHED_RECORDS}",
                self.max_records_per_batch
            )));
        }

        if self.max_record_size > MAX_RECORD_SIZE {
            return Err(Error::InvalidConfig(format!(
                "max_record_size {} exceeds {MAX_RECORD_SIZE}",
                self.max_record_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 5] = [
        "STREAM_BATCH_MAX_RECORDS_PER_BATCH",
        "STREAM_BATCH_MAX_RECORD_SIZE",
        "STREAM_BATCH_ENABLE_AGGREGATION",
        "STREAM_BATCH_COMPRESSION",
        "STREAM_BATCH_COMPRESSION_LEVEL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = BatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_records_per_batch, 500);
        assert_eq!(config.max_record_size, 1 << 20);
        assert!(!config.enable_aggregation);
        assert_eq!(config.compression, Compression::None);
    }

    #[test]
    fn test_new_clamps_limits() {
        let config = BatchConfig::new(10_000, 8 << 20);
        assert_eq!(config.max_records_per_batch, MAX_BATCHED_RECORDS);
        assert_eq!(config.max_record_size, MAX_RECORD_SIZE);

        let config = BatchConfig::new(1, 1024);
        assert_eq!(config.max_records_per_batch, 1);
        assert_eq!(config.max_record_size, 1024);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        assert!(matches!(
            BatchConfig::new(0, 1024).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            BatchConfig::new(10, 0).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unclamped_limits() {
        let config = BatchConfig {
            max_records_per_batch: 501,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(config.clamped().validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_document() {
        let config: BatchConfig = serde_json::from_str(
            r#"{"max_records_per_batch": 100, "enable_aggregation": true, "compression": "zstd"}"#,
        )
        .unwrap();

        assert_eq!(
            config,
            BatchConfig::new(100, MAX_RECORD_SIZE)
                .with_aggregation(true)
                .with_compression(Compression::Zstd, None)
        );
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        assert_eq!(BatchConfig::from_env().unwrap(), BatchConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var("STREAM_BATCH_MAX_RECORDS_PER_BATCH", "1000");
        env::set_var("STREAM_BATCH_MAX_RECORD_SIZE", "4096");
        env::set_var("STREAM_BATCH_ENABLE_AGGREGATION", "TRUE");
        env::set_var("STREAM_BATCH_COMPRESSION", "gzip");
        env::set_var("STREAM_BATCH_COMPRESSION_LEVEL", "9");

        let config = BatchConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.max_records_per_batch, MAX_BATCHED_RECORDS);
        assert_eq!(config.max_record_size, 4096);
        assert!(config.enable_aggregation);
        assert_eq!(config.compression, Compression::Gzip);
        assert_eq!(config.compression_level, Some(9));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unknown_compression() {
        clear_env();
        env::set_var("STREAM_BATCH_COMPRESSION", "lz4");
        let result = BatchConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_batch_size() {
        clear_env();
        env::set_var("STREAM_BATCH_MAX_RECORDS_PER_BATCH", "0");
        let result = BatchConfig::from_env();
        clear_env();

        assert!(result.is_err());
    }
}
