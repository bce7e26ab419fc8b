// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Packing of many small logical records into one physical record.
//!
//! # Buffering
//!
//! [`RecordAggregator`] keeps one container in memory. Every call to
//! [`Aggregator::put`] either:
//! 1. hands the record straight back when it can never share a container,
//! 2. flushes the buffered container when the record would push it past
//!    the maximum record size, then starts the next container with it, or
//! 3. appends the record to the buffered container.
//!
//! # Size accounting
//!
//! Two running totals are kept side by side:
//! - `bytes_count`: first partition key + 8 bytes per record + payloads
//! - `encoded_len`: exact protobuf size of the buffered container
//!
//! A record overflows the container when either total, plus the record and
//! the 20 byte envelope, exceeds the maximum record size. The estimate alone
//! undercounts varint framing for payloads of 16 KiB and more.

use prost::encoding::{encoded_len_varint, key_len};
use tracing::{debug, warn};

use crate::constants::{
    CHECKSUM_SIZE, ENVELOPE_OVERHEAD, MAGIC_NUMBER, MAX_AGGREGATION_COUNT, MAX_RECORD_SIZE,
    PARTITION_KEY_INDEX_SIZE,
};
use crate::container;
use crate::errors::Error;
use crate::proto::{AggregatedRecord, Record};
use crate::record::PhysicalRecord;

const PARTITION_KEY_TABLE_TAG: u32 = 1;
const RECORDS_TAG: u32 = 3;
const RECORD_KEY_INDEX_TAG: u32 = 1;
const RECORD_DATA_TAG: u32 = 3;

/// Capability shared by the real and the pass-through aggregator, so a
/// [`crate::batch::Batch`] drives both the same way.
pub trait Aggregator: Send {
    /// Reconfigures the ceiling used by the size checks.
    fn set_max_record_size(&mut self, size: usize);

    /// Whether the record is small enough to ever share a container.
    fn is_aggregative(&self, data: &[u8], partition_key: &str) -> bool;

    /// Whether adding the record to the buffered container would push it
    /// past the maximum record size or the maximum record count.
    fn would_overflow(&self, data: &[u8], partition_key: &str) -> bool;

    /// Offers a record to the aggregator.
    ///
    /// Returns the physical record that is ready to be sent, if any. `None`
    /// means the record is buffered and will come out of a later `put` or
    /// [`Aggregator::drain`].
    fn put(&mut self, data: Vec<u8>, partition_key: &str)
        -> Result<Option<PhysicalRecord>, Error>;

    /// Encodes and returns the buffered container, leaving the buffer empty.
    fn drain(&mut self) -> Result<Option<PhysicalRecord>, Error>;
}

/// Aggregator producing containers in the magic number / MD5 envelope.
///
/// Only the partition key of the first record of each container is kept;
/// every record buffered after it references key index 0.
#[derive(Debug)]
pub struct RecordAggregator {
    records: Vec<Record>,
    partition_keys: Vec<String>,
    bytes_count: usize,
    encoded_len: usize,
    max_record_size: usize,
}

impl Default for RecordAggregator {
    fn default() -> Self {
        Self::new(MAX_RECORD_SIZE)
    }
}

impl RecordAggregator {
    #[must_use]
    pub fn new(max_record_size: usize) -> Self {
        RecordAggregator {
            records: Vec::new(),
            partition_keys: Vec::new(),
            bytes_count: 0,
            encoded_len: 0,
            max_record_size,
        }
    }

    /// Bytes accounted to the buffered container.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.bytes_count
    }

    #[must_use]
    pub fn buffered_records(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn exceeds_limits(
        &self,
        buffered_bytes: usize,
        buffered_encoded_len: usize,
        has_key: bool,
        data: &[u8],
        partition_key: &str,
    ) -> bool {
        let estimated = buffered_bytes
            + data.len()
            + partition_key.len()
            + CHECKSUM_SIZE
            + MAGIC_NUMBER.len()
            + PARTITION_KEY_INDEX_SIZE;
        let exact = ENVELOPE_OVERHEAD
            + buffered_encoded_len
            + encoded_growth(has_key, data, partition_key);

        estimated > self.max_record_size || exact > self.max_record_size
    }

    /// Whether the record fits in an otherwise empty container.
    fn fits_alone(&self, data: &[u8], partition_key: &str) -> bool {
        !self.exceeds_limits(0, 0, false, data, partition_key)
    }

    fn append(&mut self, data: Vec<u8>, partition_key: &str) {
        let has_key = !self.partition_keys.is_empty();
        self.encoded_len += encoded_growth(has_key, &data, partition_key);

        if !has_key {
            self.partition_keys.push(partition_key.to_string());
            self.bytes_count += partition_key.len();
        }

        self.bytes_count += PARTITION_KEY_INDEX_SIZE + data.len();
        self.records.push(Record::new(data, 0));
    }

    fn reset(&mut self) {
        self.records.clear();
        self.partition_keys.clear();
        self.bytes_count = 0;
        self.encoded_len = 0;
    }
}

impl Aggregator for RecordAggregator {
    fn set_max_record_size(&mut self, size: usize) {
        self.max_record_size = size;
    }

    fn is_aggregative(&self, data: &[u8], partition_key: &str) -> bool {
        data.len() + partition_key.len() <= self.max_record_size
    }

    fn would_overflow(&self, data: &[u8], partition_key: &str) -> bool {
        self.records.len() >= MAX_AGGREGATION_COUNT
            || self.exceeds_limits(
                self.bytes_count,
                self.encoded_len,
                !self.partition_keys.is_empty(),
                data,
                partition_key,
            )
    }

    fn put(
        &mut self,
        data: Vec<u8>,
        partition_key: &str,
    ) -> Result<Option<PhysicalRecord>, Error> {
        if !self.is_aggregative(&data, partition_key) || !self.fits_alone(&data, partition_key) {
            warn!(
                "Record of {} bytes is too large to aggregate, sending it standalone",
                data.len()
            );
            return Ok(Some(PhysicalRecord::new(data, partition_key)));
        }

        if !self.would_overflow(&data, partition_key) {
            self.append(data, partition_key);
            return Ok(None);
        }

        let flushed = self.drain()?;
        // The record that triggered the flush opens the next container.
        self.append(data, partition_key);
        Ok(flushed)
    }

    fn drain(&mut self) -> Result<Option<PhysicalRecord>, Error> {
        let Some(partition_key) = self.partition_keys.first().cloned() else {
            return Ok(None);
        };

        let aggregated = AggregatedRecord {
            partition_key_table: std::mem::take(&mut self.partition_keys),
            explicit_hash_key_table: Vec::new(),
            records: std::mem::take(&mut self.records),
        };

        match container::encode(&aggregated) {
            Ok(data) => {
                debug!(
                    "Drained {} records into an aggregated record of {} bytes",
                    aggregated.records.len(),
                    data.len()
                );
                self.reset();
                Ok(Some(PhysicalRecord::new(data, partition_key)))
            }
            Err(e) => {
                self.partition_keys = aggregated.partition_key_table;
                self.records = aggregated.records;
                Err(e)
            }
        }
    }
}

/// Growth of the encoded container when a record is appended to it.
fn encoded_growth(has_key: bool, data: &[u8], partition_key: &str) -> usize {
    let key_entry = if has_key {
        0
    } else {
        length_delimited_len(PARTITION_KEY_TABLE_TAG, partition_key.len())
    };

    let record = key_len(RECORD_KEY_INDEX_TAG)
        + encoded_len_varint(0)
        + length_delimited_len(RECORD_DATA_TAG, data.len());

    key_entry + length_delimited_len(RECORDS_TAG, record)
}

fn length_delimited_len(tag: u32, len: usize) -> usize {
    key_len(tag) + encoded_len_varint(len as u64) + len
}
