// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Record aggregation and request chunking for size limited streaming
//! ingestion APIs.
//!
//! Caller payloads go through [`batch::Batch::add_record`], which validates
//! them, compresses them, and optionally packs small ones into aggregated
//! containers ([`aggregator`], [`container`]). [`batch::Batch::into_chunks`]
//! then yields groups of at most 500 records ready for a PutRecords-style
//! request.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod aggregator;
pub mod batch;
pub mod batch_service;
pub mod compression;
pub mod config;
pub mod constants;
pub mod container;
pub mod errors;
pub mod noop_aggregator;
pub mod proto;
pub mod record;

pub use batch::Batch;
pub use config::BatchConfig;
pub use errors::Error;
pub use record::PhysicalRecord;
