// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Limits imposed by the streaming ingestion API and the aggregated
//! container envelope.

/// Maximum size of a single record accepted by the ingestion API (1 MiB).
pub const MAX_RECORD_SIZE: usize = 1 << 20;

/// Maximum number of records accepted by a single PutRecords-style request.
pub const MAX_BATCHED_RECORDS: usize = 500;

/// Maximum length of a partition key, in bytes.
pub const MAX_PARTITION_KEY_LENGTH: usize = 256;

/// Prefix identifying an aggregated container to downstream consumers.
pub const MAGIC_NUMBER: [u8; 4] = [0xF3, 0x89, 0x9A, 0xC2];

/// Size of the MD5 digest appended to every aggregated container.
pub const CHECKSUM_SIZE: usize = 16;

/// Bytes reserved per buffered record for its partition key index.
pub const PARTITION_KEY_INDEX_SIZE: usize = 8;

/// Maximum number of logical records packed into one container.
pub const MAX_AGGREGATION_COUNT: usize = u32::MAX as usize;

/// Envelope bytes that wrap every encoded container.
pub(crate) const ENVELOPE_OVERHEAD: usize = MAGIC_NUMBER.len() + CHECKSUM_SIZE;
