use crate::server::telemetry::record_batch_streamed;
use quire_tonic_core::{
    Error,
    proto::{ListRecordsResponse, Record},
    quire::ScanCursor,
};
use tokio::sync::mpsc;
use tonic::Status;

/// Totals for one completed listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub records: usize,
    pub batches: usize,
}

/// Drains a scan handle into `ListRecordsResponse` batches.
///
/// Records are buffered in scan order. Each time the buffer holds
/// `batch_size` records it is sent as one message and reset; once the scan
/// is exhausted any remaining records are sent as a final, smaller batch. An
/// empty batch is never sent.
///
/// # Arguments
///
/// - `cursor`: Scan handle owned by this call. It is closed before this
///   function returns, on every path.
/// - `batch_size`: Maximum number of records per message. Values below 1 are
///   treated as 1.
/// - `resp_tx`: Channel feeding the gRPC response stream.
///
/// # Errors
///
/// - A store failure mid-scan is forwarded to the client (best effort) as
///   the final stream item and returned. Batches already sent are not
///   resent.
/// - [`Error::RequestCancelled`] if the client goes away while the next
///   record is being pulled; the pull is abandoned.
/// - [`Error::ChannelError`] if a batch cannot be handed to the stream.
pub async fn emit_batches<C: ScanCursor>(
    mut cursor: C,
    batch_size: usize,
    resp_tx: &mpsc::Sender<Result<ListRecordsResponse, Status>>,
) -> quire_tonic_core::Result<EmitSummary> {
    let res = pump(&mut cursor, batch_size.max(1), resp_tx).await;
    cursor.close().await;
    res
}

async fn pump<C: ScanCursor>(
    cursor: &mut C,
    batch_size: usize,
    resp_tx: &mpsc::Sender<Result<ListRecordsResponse, Status>>,
) -> quire_tonic_core::Result<EmitSummary> {
    let mut summary = EmitSummary::default();
    let mut batch: Vec<Record> = Vec::with_capacity(batch_size);

    loop {
        let next = tokio::select! {
            biased;
            () = resp_tx.closed() => return Err(Error::RequestCancelled),
            next = cursor.next() => next,
        };

        match next {
            Some(Ok(record)) => {
                batch.push(record.into());
                if batch.len() == batch_size {
                    flush(&mut batch, batch_size, resp_tx, &mut summary).await?;
                }
            }
            Some(Err(e)) => {
                let err = Error::from(e);
                if let Err(e) = resp_tx.send(Err(err.clone().into())).await {
                    tracing::warn!("Failed to forward err: {e}");
                }
                return Err(err);
            }
            None => break,
        }
    }

    if !batch.is_empty() {
        flush(&mut batch, batch_size, resp_tx, &mut summary).await?;
    }

    Ok(summary)
}

async fn flush(
    batch: &mut Vec<Record>,
    batch_size: usize,
    resp_tx: &mpsc::Sender<Result<ListRecordsResponse, Status>>,
    summary: &mut EmitSummary,
) -> quire_tonic_core::Result<()> {
    let records = core::mem::replace(batch, Vec::with_capacity(batch_size));
    let count = records.len();

    resp_tx
        .send(Ok(ListRecordsResponse { records }))
        .await
        .map_err(|e| Error::ChannelError {
            context: format!("Failed to send batch: {e}"),
        })?;

    summary.records += count;
    summary.batches += 1;
    record_batch_streamed(count as u64);
    Ok(())
}
