// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while validating, packing or reading records.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("partition key length {0} is outside 1..=256 bytes")]
    PartitionKeyLength(usize),

    #[error("record length {0} is empty or exceeds the maximum record size")]
    RecordLength(usize),

    #[error("failed to encode aggregated record: {0}")]
    Encoding(#[from] prost::EncodeError),

    #[error("aggregated record checksum mismatch")]
    Integrity,

    #[error("failed to decode aggregated record: {0}")]
    Decoding(String),

    #[error("failed to compress record: {0}")]
    Compression(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether retrying the same input can never succeed.
    ///
    /// Transport layers should drop (or report) records failing with a
    /// permanent error and only retry the rest.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !matches!(self, Error::Compression(_))
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::Decoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::PartitionKeyLength(257);
        assert_eq!(
            error.to_string(),
            "partition key length 257 is outside 1..=256 bytes"
        );

        let error = Error::InvalidConfig("max_record_size must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "invalid configuration: max_record_size must be greater than 0"
        );
    }

    #[test]
    fn test_caller_data_errors_are_permanent() {
        assert!(Error::PartitionKeyLength(0).is_permanent());
        assert!(Error::RecordLength(0).is_permanent());
        assert!(Error::Integrity.is_permanent());
        assert!(Error::Decoding("truncated".into()).is_permanent());
    }

    #[test]
    fn test_compression_errors_are_retryable() {
        let error = Error::from(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "interrupted",
        ));
        assert!(!error.is_permanent());
    }
}
