#![allow(dead_code)]

use quire::MemoryStore;
use quire_tonic_core::proto::{CreateRecordRequest, Record, records_client::RecordsClient};
use quire_tonic_server::server::{
    config::{ServerConfig, StoreBackend},
    lifecycle::{Lifecycle, Running},
};
use tonic::transport::Channel;

pub fn config(server_addr: &str) -> ServerConfig {
    ServerConfig {
        server_addr: server_addr.to_string(),
        store: StoreBackend::Memory,
        mongo_uri: String::new(),
        mongo_database: "test".to_string(),
        mongo_collection: "records".to_string(),
        list_batch_size: 2,
        stream_buffer_size: 8,
    }
}

/// Starts a server on an ephemeral port backed by a fresh [`MemoryStore`].
pub async fn spawn() -> Running<MemoryStore> {
    Lifecycle::new(MemoryStore::new())
        .start(&config("127.0.0.1:0"))
        .await
        .expect("server starts")
}

pub async fn connect(running: &Running<MemoryStore>) -> RecordsClient<Channel> {
    RecordsClient::connect(format!("http://{}", running.local_addr()))
        .await
        .expect("client connects")
}

pub fn new_record(author_id: &str, title: &str, content: &str) -> CreateRecordRequest {
    CreateRecordRequest {
        author_id: author_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
    }
}

pub async fn create(
    client: &mut RecordsClient<Channel>,
    author_id: &str,
    title: &str,
    content: &str,
) -> Record {
    client
        .create_record(new_record(author_id, title, content))
        .await
        .expect("create succeeds")
        .into_inner()
        .record
        .expect("created record is returned")
}
