// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Protobuf schema of the aggregated container payload.
//!
//! Field numbers and labels follow the aggregation format understood by
//! aggregation-aware stream consumers, so containers produced here can be
//! de-aggregated by existing readers.

use prost::Message;

/// A set of logical records sharing one physical record.
#[derive(Clone, PartialEq, Message)]
pub struct AggregatedRecord {
    #[prost(string, repeated, tag = "1")]
    pub partition_key_table: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    pub explicit_hash_key_table: Vec<String>,
    #[prost(message, repeated, tag = "3")]
    pub records: Vec<Record>,
}

/// One logical record; its partition key is an index into
/// [`AggregatedRecord::partition_key_table`].
#[derive(Clone, PartialEq, Message)]
pub struct Record {
    #[prost(uint64, required, tag = "1")]
    pub partition_key_index: u64,
    #[prost(uint64, optional, tag = "2")]
    pub explicit_hash_key_index: Option<u64>,
    #[prost(bytes = "vec", required, tag = "3")]
    pub data: Vec<u8>,
    #[prost(message, repeated, tag = "4")]
    pub tags: Vec<Tag>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Tag {
    #[prost(string, required, tag = "1")]
    pub key: String,
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

impl Record {
    pub fn new(data: Vec<u8>, partition_key_index: u64) -> Self {
        Self {
            partition_key_index,
            explicit_hash_key_index: None,
            data,
            tags: Vec::new(),
        }
    }
}
