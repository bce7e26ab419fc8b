// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::aggregator::Aggregator;
use crate::errors::Error;
use crate::record::PhysicalRecord;

/// Aggregator installed when aggregation is disabled: every record is
/// handed back unchanged and nothing is ever buffered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAggregator;

impl Aggregator for NoopAggregator {
    fn set_max_record_size(&mut self, _size: usize) {}

    fn is_aggregative(&self, _data: &[u8], _partition_key: &str) -> bool {
        false
    }

    fn would_overflow(&self, _data: &[u8], _partition_key: &str) -> bool {
        false
    }

    fn put(
        &mut self,
        data: Vec<u8>,
        partition_key: &str,
    ) -> Result<Option<PhysicalRecord>, Error> {
        Ok(Some(PhysicalRecord::new(data, partition_key)))
    }

    fn drain(&mut self) -> Result<Option<PhysicalRecord>, Error> {
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_put_returns_record_unchanged() {
        let mut aggregator = NoopAggregator;
        for (data, key) in [(&b"a"[..], "k"), (&[0_u8; 2048][..], "another-key")] {
            assert_eq!(
                aggregator.put(data.to_vec(), key).unwrap(),
                Some(PhysicalRecord::new(data.to_vec(), key))
            );
            assert!(!aggregator.is_aggregative(data, key));
            assert!(!aggregator.would_overflow(data, key));
        }
        assert!(aggregator.drain().unwrap().is_none());
    }
}
