// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Accumulation of records for one export cycle and their partitioning
//! into PutRecords-sized requests.
//!
//! # Lifecycle
//!
//! 1. Create a [`Batch`] from a [`BatchConfig`]
//! 2. Feed it with [`Batch::add_record`]
//! 3. Finalize with [`Batch::into_chunks`] (or [`Batch::flush`] followed by
//!    [`Batch::chunk`]) and hand the chunks to the transport
//!
//! A `Batch` is not meant to be shared between producers; see
//! [`crate::batch_service`] for that.

use std::fmt::Debug;

use tracing::debug;

use crate::aggregator::{Aggregator, RecordAggregator};
use crate::compression::Compressor;
use crate::config::BatchConfig;
use crate::constants::MAX_PARTITION_KEY_LENGTH;
use crate::errors::Error;
use crate::noop_aggregator::NoopAggregator;
use crate::record::PhysicalRecord;

pub struct Batch {
    max_batch_size: usize,
    max_record_size: usize,
    compressor: Box<dyn Compressor>,
    aggregator: Box<dyn Aggregator>,
    records: Vec<PhysicalRecord>,
}

impl Batch {
    /// Creates a batch using the compressor selected by `config`.
    pub fn new(config: BatchConfig) -> Result<Self, Error> {
        let compressor = config.compression.compressor(config.compression_level);
        Self::with_compressor(config, compressor)
    }

    /// Creates a batch with a caller supplied compressor, ignoring the
    /// compression settings of `config`.
    pub fn with_compressor(
        config: BatchConfig,
        compressor: Box<dyn Compressor>,
    ) -> Result<Self, Error> {
        let config = config.clamped();
        config.validate()?;

        let mut aggregator: Box<dyn Aggregator> = if config.enable_aggregation {
            Box::new(RecordAggregator::default())
        } else {
            Box::new(NoopAggregator)
        };
        aggregator.set_max_record_size(config.max_record_size);

        Ok(Batch {
            max_batch_size: config.max_records_per_batch,
            max_record_size: config.max_record_size,
            compressor,
            aggregator,
            records: Vec::new(),
        })
    }

    /// Validates, compresses and stores a record.
    ///
    /// With aggregation enabled the record may be held by the aggregator
    /// and only show up in [`Batch::records`] after a later call or a
    /// [`Batch::flush`].
    ///
    /// # Errors
    ///
    /// - [`Error::PartitionKeyLength`] if the key is empty or longer than 256 bytes
    /// - [`Error::RecordLength`] if the payload is empty or, once compressed,
    ///   larger than the maximum record size
    /// - [`Error::Compression`] or [`Error::Encoding`] from the codecs
    pub fn add_record(&mut self, data: Vec<u8>, partition_key: &str) -> Result<(), Error> {
        let key_len = partition_key.len();
        if key_len == 0 || key_len > MAX_PARTITION_KEY_LENGTH {
            return Err(Error::PartitionKeyLength(key_len));
        }

        if data.is_empty() {
            return Err(Error::RecordLength(0));
        }

        let data = self.compressor.compress(data)?;
        if data.is_empty() || data.len() > self.max_record_size {
            return Err(Error::RecordLength(data.len()));
        }

        if let Some(record) = self.aggregator.put(data, partition_key)? {
            self.records.push(record);
        }
        Ok(())
    }

    /// Moves whatever the aggregator still buffers into the stored records.
    pub fn flush(&mut self) -> Result<(), Error> {
        if let Some(record) = self.aggregator.drain()? {
            self.records.push(record);
        }
        Ok(())
    }

    /// Splits the stored records into consecutive groups of at most
    /// `max_records_per_batch`, preserving order.
    ///
    /// Records still buffered by the aggregator are not included; call
    /// [`Batch::flush`] first.
    #[must_use]
    pub fn chunk(&self) -> Vec<&[PhysicalRecord]> {
        let chunks: Vec<&[PhysicalRecord]> = self.records.chunks(self.max_batch_size).collect();
        debug!(
            "Split {} records into {} chunks of at most {}",
            self.records.len(),
            chunks.len(),
            self.max_batch_size
        );
        chunks
    }

    /// Flushes the aggregator and consumes the batch into owned chunks.
    pub fn into_chunks(mut self) -> Result<Vec<Vec<PhysicalRecord>>, Error> {
        self.flush()?;

        let size = self.max_batch_size;
        let mut chunks = Vec::with_capacity(self.records.len().div_ceil(size));
        let mut records = self.records.into_iter().peekable();
        while records.peek().is_some() {
            chunks.push(records.by_ref().take(size).collect());
        }
        Ok(chunks)
    }

    #[must_use]
    pub fn records(&self) -> &[PhysicalRecord] {
        &self.records
    }

    /// Number of stored physical records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("max_batch_size", &self.max_batch_size)
            .field("max_record_size", &self.max_record_size)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}
