// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Actor owning the [`Batch`] of the current export cycle.
//!
//! Producers hold cloneable [`BatchHandle`]s and send commands over a
//! channel; the [`BatchService`] task applies them one at a time, so the
//! batch and its aggregator are never mutated concurrently.
//!
//! ```text
//!  handles ──commands──> service task ──owns──> Batch (one per cycle)
//! ```
//!
//! ```rust,ignore
//! let (service, handle) = BatchService::new(BatchConfig::default())?;
//! tokio::spawn(service.run());
//!
//! handle.add_records(vec![(payload, "key".to_string())]).await?;
//! let chunks = handle.flush().await??;
//! ```

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::batch::Batch;
use crate::config::BatchConfig;
use crate::errors::Error;
use crate::record::PhysicalRecord;

pub type Chunks = Vec<Vec<PhysicalRecord>>;

#[derive(Debug)]
pub enum BatchCommand {
    /// Add `(payload, partition key)` pairs; replies with the rejected ones' errors.
    AddRecords(Vec<(Vec<u8>, String)>, oneshot::Sender<Vec<Error>>),
    /// Close the current cycle and reply with its chunks.
    Flush(oneshot::Sender<Result<Chunks, Error>>),
    Shutdown,
}

#[derive(Clone, Debug)]
pub struct BatchHandle {
    tx: mpsc::UnboundedSender<BatchCommand>,
}

impl BatchHandle {
    /// Adds records to the current cycle.
    ///
    /// Returns the errors of the records that were rejected, in input order;
    /// an empty vector means every record was accepted.
    pub async fn add_records(
        &self,
        records: Vec<(Vec<u8>, String)>,
    ) -> Result<Vec<Error>, String> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(BatchCommand::AddRecords(records, response_tx))
            .map_err(|e| format!("Failed to send add records command: {e}"))?;

        response_rx
            .await
            .map_err(|e| format!("Failed to receive add records response: {e}"))
    }

    /// Finalizes the current cycle and returns its request-sized chunks.
    /// The service starts a fresh batch for the next cycle.
    pub async fn flush(&self) -> Result<Result<Chunks, Error>, String> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send(BatchCommand::Flush(response_tx))
            .map_err(|e| format!("Failed to send flush command: {e}"))?;

        response_rx
            .await
            .map_err(|e| format!("Failed to receive flush response: {e}"))
    }

    pub fn shutdown(&self) -> Result<(), mpsc::error::SendError<BatchCommand>> {
        self.tx.send(BatchCommand::Shutdown)
    }
}

pub struct BatchService {
    config: BatchConfig,
    batch: Batch,
    rx: mpsc::UnboundedReceiver<BatchCommand>,
}

impl BatchService {
    pub fn new(config: BatchConfig) -> Result<(Self, BatchHandle), Error> {
        let batch = Batch::new(config.clone())?;
        let (tx, rx) = mpsc::unbounded_channel();

        let service = Self { config, batch, rx };
        let handle = BatchHandle { tx };

        Ok((service, handle))
    }

    pub async fn run(mut self) {
        debug!("Batch service started");

        while let Some(command) = self.rx.recv().await {
            match command {
                BatchCommand::AddRecords(records, response_tx) => {
                    let errors: Vec<Error> = records
                        .into_iter()
                        .filter_map(|(data, key)| self.batch.add_record(data, &key).err())
                        .collect();
                    if !errors.is_empty() {
                        warn!("Total of {} records were rejected", errors.len());
                    }
                    if response_tx.send(errors).is_err() {
                        error!("Failed to send add records response - receiver dropped");
                    }
                }

                BatchCommand::Flush(response_tx) => {
                    let response = self.rotate();
                    if response_tx.send(response).is_err() {
                        error!("Failed to send flush response - receiver dropped");
                    }
                }

                BatchCommand::Shutdown => {
                    debug!("Batch service shutting down");
                    break;
                }
            }
        }

        debug!("Batch service stopped");
    }

    /// Swaps in a fresh batch and consumes the finished one.
    fn rotate(&mut self) -> Result<Chunks, Error> {
        let fresh = Batch::new(self.config.clone())?;
        std::mem::replace(&mut self.batch, fresh).into_chunks()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::container;

    fn records(n: usize, key: &str) -> Vec<(Vec<u8>, String)> {
        (0..n)
            .map(|i| (format!("record-{i}").into_bytes(), key.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_batch_service_basic_flow() {
        let (service, handle) = BatchService::new(BatchConfig::default()).unwrap();
        let service_task = tokio::spawn(service.run());

        let errors = handle.add_records(records(948, "key")).await.unwrap();
        assert!(errors.is_empty());

        let chunks = handle.flush().await.unwrap().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 448);

        // the next cycle starts empty
        let chunks = handle.flush().await.unwrap().unwrap();
        assert!(chunks.is_empty());

        handle.shutdown().unwrap();
        service_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_service_reports_rejected_records() {
        let (service, handle) = BatchService::new(BatchConfig::default()).unwrap();
        let service_task = tokio::spawn(service.run());

        let mut input = records(2, "key");
        input.push((b"data".to_vec(), String::new()));
        input.push((Vec::new(), "key".to_string()));

        let errors = handle.add_records(input).await.unwrap();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], Error::PartitionKeyLength(0)));
        assert!(matches!(errors[1], Error::RecordLength(0)));

        let chunks = handle.flush().await.unwrap().unwrap();
        assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), 2);

        handle.shutdown().unwrap();
        service_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_service_flushes_aggregated_records() {
        let config = BatchConfig::default().with_aggregation(true);
        let (service, handle) = BatchService::new(config).unwrap();
        let service_task = tokio::spawn(service.run());

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    handle
                        .add_records(records(50, &format!("producer-{p}")))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for producer in producers {
            assert!(producer.await.unwrap().is_empty());
        }

        let chunks = handle.flush().await.unwrap().unwrap();
        let mut total = 0;
        for record in chunks.iter().flatten() {
            total += container::deaggregate(record).unwrap().len();
        }
        assert_eq!(total, 200);

        handle.shutdown().unwrap();
        service_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_fails_after_shutdown() {
        let (service, handle) = BatchService::new(BatchConfig::default()).unwrap();
        let service_task = tokio::spawn(service.run());

        handle.shutdown().unwrap();
        service_task.await.unwrap();

        assert!(handle.flush().await.is_err());
        assert!(handle.add_records(records(1, "key")).await.is_err());
    }
}
