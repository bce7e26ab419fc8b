// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// The unit handed to the transport: one entry of a PutRecords-style request.
///
/// `data` is either a caller payload passed through untouched or an
/// aggregated container (see [`crate::container`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalRecord {
    pub data: Vec<u8>,
    pub partition_key: String,
}

impl PhysicalRecord {
    pub fn new(data: Vec<u8>, partition_key: impl Into<String>) -> Self {
        Self {
            data,
            partition_key: partition_key.into(),
        }
    }
}
