//! gRPC facade over the record repository.
//!
//! [`RecordService`] implements the [`Records`] service from
//! `proto/quire.proto`. Each unary call maps to one repository operation;
//! `ListRecords` opens a scan and hands it to a spawned task running
//! [`emit_batches`], which feeds the response stream.
//!
//! Outcomes are translated to status codes through
//! [`quire_tonic_core::Error`]: malformed ids and store failures become
//! `INTERNAL`, missing records become `NOT_FOUND`.

use crate::server::{
    config::ServerConfig,
    streaming::emitter::emit_batches,
    telemetry::{
        decrement_streams_inflight, increment_errors, increment_requests,
        increment_streams_inflight, record_stream_duration,
    },
};
use core::pin::Pin;
use quire_tonic_core::{
    Error,
    proto::{
        CreateRecordRequest, CreateRecordResponse, DeleteRecordRequest, DeleteRecordResponse,
        ListRecordsRequest, ListRecordsResponse, ReadRecordRequest, ReadRecordResponse,
        UpdateRecordRequest, UpdateRecordResponse, records_server::Records,
    },
    quire::{RecordRepository, RecordStore},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status};
use tracing::Instrument;

/// gRPC service for record storage.
///
/// Cheap to clone: clones share the repository and therefore the single
/// store connection. No locking happens here; consistency is left to the
/// store's per-document atomicity.
pub struct RecordService<S> {
    repository: RecordRepository<S>,
    list_batch_size: usize,
    stream_buffer_size: usize,
}

impl<S> Clone for RecordService<S> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            list_batch_size: self.list_batch_size,
            stream_buffer_size: self.stream_buffer_size,
        }
    }
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
        Self {
            repository: RecordRepository::new(store),
            list_batch_size: config.list_batch_size,
            stream_buffer_size: config.stream_buffer_size,
        }
    }
}

/// Counts the failure and converts it for the wire.
fn failed(method: &'static str, err: impl Into<Error>) -> Status {
    increment_errors(method);
    let err: Error = err.into();
    err.into()
}

#[tonic::async_trait]
impl<S: RecordStore> Records for RecordService<S> {
    type ListRecordsStream = Pin<Box<dyn Stream<Item = Result<ListRecordsResponse, Status>> + Send>>;

    #[tracing::instrument(skip_all, fields(author_id = %req.get_ref().author_id))]
    async fn create_record(
        &self,
        req: Request<CreateRecordRequest>,
    ) -> Result<Response<CreateRecordResponse>, Status> {
        increment_requests("create");
        let record = self
            .repository
            .create(req.into_inner().into())
            .await
            .map_err(|e| failed("create", e))?;

        tracing::debug!("Created record {}", record.id);
        Ok(Response::new(CreateRecordResponse {
            record: Some(record.into()),
        }))
    }

    #[tracing::instrument(skip_all, fields(id = %req.get_ref().id))]
    async fn read_record(
        &self,
        req: Request<ReadRecordRequest>,
    ) -> Result<Response<ReadRecordResponse>, Status> {
        increment_requests("read");
        let record = self
            .repository
            .read(&req.get_ref().id)
            .await
            .map_err(|e| failed("read", e))?;

        Ok(Response::new(ReadRecordResponse {
            record: Some(record.into()),
        }))
    }

    /// Replaces every field of an existing record.
    ///
    /// A request without a record body is rejected with `INVALID_ARGUMENT`.
    #[tracing::instrument(skip_all, fields(id = tracing::field::Empty))]
    async fn update_record(
        &self,
        req: Request<UpdateRecordRequest>,
    ) -> Result<Response<UpdateRecordResponse>, Status> {
        increment_requests("update");
        let Some(record) = req.into_inner().record else {
            return Err(failed(
                "update",
                Error::InvalidRequest {
                    reason: "UpdateRecord requires a record".to_string(),
                },
            ));
        };

        let (id, fields) = record.into_parts();
        tracing::Span::current().record("id", id.as_str());
        let record = self
            .repository
            .update(&id, fields)
            .await
            .map_err(|e| failed("update", e))?;

        Ok(Response::new(UpdateRecordResponse {
            record: Some(record.into()),
        }))
    }

    #[tracing::instrument(skip_all, fields(id = %req.get_ref().id))]
    async fn delete_record(
        &self,
        req: Request<DeleteRecordRequest>,
    ) -> Result<Response<DeleteRecordResponse>, Status> {
        increment_requests("delete");
        let id = self
            .repository
            .delete(&req.get_ref().id)
            .await
            .map_err(|e| failed("delete", e))?;

        tracing::debug!("Deleted record {id}");
        Ok(Response::new(DeleteRecordResponse { id: id.encode() }))
    }

    /// Streams every record in batches of `list_batch_size`.
    ///
    /// Failing to open the scan fails the call itself. Once streaming has
    /// started, a store failure is delivered as the last stream item.
    #[tracing::instrument(skip_all)]
    async fn list_records(
        &self,
        _req: Request<ListRecordsRequest>,
    ) -> Result<Response<Self::ListRecordsStream>, Status> {
        let start = std::time::Instant::now();
        increment_requests("list");

        let cursor = self
            .repository
            .scan_all()
            .await
            .map_err(|e| failed("list", e))?;

        increment_streams_inflight();
        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<ListRecordsResponse, Status>>(self.stream_buffer_size);
        let batch_size = self.list_batch_size;

        let fut = async move {
            match emit_batches(cursor, batch_size, &resp_tx).await {
                Ok(summary) => {
                    tracing::debug!(
                        "Streamed {} records in {} batches",
                        summary.records,
                        summary.batches
                    );
                    record_stream_duration(start.elapsed().as_millis() as f64);
                }
                Err(e) => {
                    increment_errors("list");
                    tracing::warn!("Listing ended early: {e}");
                }
            }
            decrement_streams_inflight();
        };
        tokio::spawn(fut.instrument(tracing::info_span!("streaming")));

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }
}
