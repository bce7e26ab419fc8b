// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Aggregated container codec.
//!
//! ```text
//! offset 0    : 4 bytes  magic number F3 89 9A C2
//! offset 4    : N bytes  protobuf-encoded AggregatedRecord
//! offset 4+N  : 16 bytes MD5 of the N payload bytes
//! ```

use md5::{Digest, Md5};
use prost::Message;

use crate::constants::{CHECKSUM_SIZE, ENVELOPE_OVERHEAD, MAGIC_NUMBER};
use crate::errors::Error;
use crate::proto::AggregatedRecord;
use crate::record::PhysicalRecord;

/// Serializes `container` and wraps it in the magic number / checksum envelope.
pub fn encode(container: &AggregatedRecord) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(ENVELOPE_OVERHEAD + container.encoded_len());
    out.extend_from_slice(&MAGIC_NUMBER);
    container.encode(&mut out)?;

    let checksum = Md5::digest(&out[MAGIC_NUMBER.len()..]);
    out.extend_from_slice(&checksum);
    Ok(out)
}

/// Verifies the envelope of `data` and deserializes the container inside it.
pub fn decode(data: &[u8]) -> Result<AggregatedRecord, Error> {
    if data.len() < ENVELOPE_OVERHEAD {
        return Err(Error::Decoding(format!(
            "{} bytes is shorter than the {ENVELOPE_OVERHEAD} byte envelope",
            data.len()
        )));
    }

    let (prefix, rest) = data.split_at(MAGIC_NUMBER.len());
    if prefix != MAGIC_NUMBER {
        return Err(Error::Decoding("missing magic number".to_string()));
    }

    let (payload, checksum) = rest.split_at(rest.len() - CHECKSUM_SIZE);
    if Md5::digest(payload).as_slice() != checksum {
        return Err(Error::Integrity);
    }

    Ok(AggregatedRecord::decode(payload)?)
}

/// Whether `data` carries the aggregated container prefix.
#[must_use]
pub fn is_aggregated(data: &[u8]) -> bool {
    data.len() >= ENVELOPE_OVERHEAD && data.starts_with(&MAGIC_NUMBER)
}

/// Recovers the logical records carried by `record`.
///
/// Plain records are returned as-is. Aggregated ones are verified, decoded
/// and every key index is resolved against the container's key table.
pub fn deaggregate(record: &PhysicalRecord) -> Result<Vec<PhysicalRecord>, Error> {
    if !is_aggregated(&record.data) {
        return Ok(vec![record.clone()]);
    }

    let container = decode(&record.data)?;
    let keys = container.partition_key_table;
    container
        .records
        .into_iter()
        .map(|r| -> Result<PhysicalRecord, Error> {
            let key = usize::try_from(r.partition_key_index)
                .ok()
                .and_then(|index| keys.get(index))
                .ok_or_else(|| {
                    Error::Decoding(format!(
                        "partition key index {} is outside a table of {} keys",
                        r.partition_key_index,
                        keys.len()
                    ))
                })?;
            Ok(PhysicalRecord::new(r.data, key.clone()))
        })
        .collect()
}
