mod common;

use common::{config, connect, create, spawn};
use quire::{MemoryStore, NewRecord, RecordStore};
use quire_tonic_core::proto::{ListRecordsRequest, records_client::RecordsClient};
use std::time::Duration;
use tokio_stream::StreamExt;
use quire_tonic_server::server::lifecycle::{Lifecycle, Phase};

#[tokio::test]
async fn phases_advance_in_order() {
    let lifecycle = Lifecycle::new(MemoryStore::new());
    assert_eq!(lifecycle.phase(), Phase::Unstarted);
    let mut phases = lifecycle.subscribe();

    let running = lifecycle.start(&config("127.0.0.1:0")).await.unwrap();
    assert_eq!(running.phase(), Phase::Listening);
    assert_eq!(*phases.borrow_and_update(), Phase::Listening);

    running.shutdown().await.unwrap();
    assert_eq!(*phases.borrow_and_update(), Phase::Stopped);
}

#[tokio::test]
async fn shutdown_closes_store_after_listener() {
    let running = spawn().await;
    let mut client = connect(&running).await;
    create(&mut client, "John", "record0", "").await;

    let store = running.store().clone();
    assert!(!store.is_closed());

    running.shutdown().await.unwrap();
    assert!(store.is_closed());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn new_connections_are_refused_after_shutdown() {
    let running = spawn().await;
    let addr = running.local_addr();
    running.shutdown().await.unwrap();

    assert!(RecordsClient::connect(format!("http://{addr}")).await.is_err());
}

#[tokio::test]
async fn bind_failure_stays_unstarted() {
    let running = spawn().await;
    let taken = running.local_addr().to_string();

    let lifecycle = Lifecycle::new(MemoryStore::new());
    let phases = lifecycle.subscribe();
    assert!(lifecycle.start(&config(&taken)).await.is_err());
    assert_eq!(*phases.borrow(), Phase::Unstarted);

    running.shutdown().await.unwrap();
}

#[tokio::test]
async fn in_flight_listing_drains_before_store_closes() {
    const RECORDS: usize = 2000;

    // Large enough that the stream cannot sit entirely in transport buffers.
    let store = MemoryStore::new();
    let content = "x".repeat(20 * 1024);
    for n in 0..RECORDS {
        store
            .insert(NewRecord::new("John", format!("record{n}"), content.clone()))
            .await
            .unwrap();
    }

    let mut config = config("127.0.0.1:0");
    config.stream_buffer_size = 1;
    let running = Lifecycle::new(store).start(&config).await.unwrap();
    let store = running.store().clone();
    let mut client = connect(&running).await;

    let mut stream = client
        .list_records(ListRecordsRequest {})
        .await
        .unwrap()
        .into_inner();
    let mut received = stream.next().await.unwrap().unwrap().records.len();

    let shutdown = tokio::spawn(running.shutdown());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!store.is_closed(), "store closed while a listing was in flight");

    while let Some(batch) = stream.next().await {
        received += batch.unwrap().records.len();
    }
    assert_eq!(received, RECORDS);

    shutdown.await.unwrap().unwrap();
    assert!(store.is_closed());
}
