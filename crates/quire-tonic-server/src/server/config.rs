use anyhow::bail;
use clap::{Parser, ValueEnum};

/// Runtime configuration for the `quire-tonic-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults suitable for a local
/// deployment next to a MongoDB instance.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "quire-tonic-server",
    version,
    about = "A gRPC service for storing and streaming records"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Example: "0.0.0.0:50051"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Backing store for records.
    ///
    /// `mongo` connects to `MONGO_URI`; `memory` keeps records in process and
    /// loses them on exit.
    ///
    /// Environment variable: `STORE_BACKEND`
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Mongo)]
    pub store: StoreBackend,

    /// Connection string for the document store, credentials included.
    ///
    /// Environment variable: `MONGO_URI`
    #[arg(long, env = "MONGO_URI", default_value_t = String::from("mongodb://localhost:27017"))]
    pub mongo_uri: String,

    /// Database holding the record collection.
    ///
    /// Environment variable: `MONGO_DATABASE`
    #[arg(long, env = "MONGO_DATABASE", default_value_t = String::from("mydb"))]
    pub mongo_database: String,

    /// Collection holding one document per record.
    ///
    /// Environment variable: `MONGO_COLLECTION`
    #[arg(long, env = "MONGO_COLLECTION", default_value_t = String::from("records"))]
    pub mongo_collection: String,

    /// Number of records per `ListRecords` response message.
    ///
    /// A batch is sent as soon as it fills; the last one may be smaller.
    ///
    /// Environment variable: `LIST_BATCH_SIZE`
    #[arg(long, env = "LIST_BATCH_SIZE", default_value_t = 2)]
    pub list_batch_size: usize,

    /// Capacity of the response buffer between the scan task and the gRPC
    /// stream.
    ///
    /// Lower values make the scan wait on slow clients sooner; higher values
    /// allow deeper pipelining.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,
}

/// Which [`quire::RecordStore`] the server runs against.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// MongoDB through the official driver.
    Mongo,
    /// In-process store; contents are lost on exit.
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub store: StoreBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_collection: String,
    pub list_batch_size: usize,
    pub stream_buffer_size: usize,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.list_batch_size == 0 {
            bail!("LIST_BATCH_SIZE must be greater than 0");
        }

        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        if args.mongo_database.is_empty() || args.mongo_collection.is_empty() {
            bail!("MONGO_DATABASE and MONGO_COLLECTION must not be empty");
        }

        Ok(Self {
            server_addr: args.server_addr,
            store: args.store,
            mongo_uri: args.mongo_uri,
            mongo_database: args.mongo_database,
            mongo_collection: args.mongo_collection,
            list_batch_size: args.list_batch_size,
            stream_buffer_size: args.stream_buffer_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        let argv = ["quire-tonic-server"].iter().chain(extra);
        ServerConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn explicit_flags_are_applied() {
        let config = parse(&[
            "--server-addr",
            "127.0.0.1:6000",
            "--store",
            "memory",
            "--list-batch-size",
            "5",
            "--stream-buffer-size",
            "3",
        ])
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:6000");
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.list_batch_size, 5);
        assert_eq!(config.stream_buffer_size, 3);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = parse(&["--list-batch-size", "0"]).unwrap_err();
        assert!(err.to_string().contains("LIST_BATCH_SIZE"));
    }

    #[test]
    fn zero_stream_buffer_is_rejected() {
        let err = parse(&["--stream-buffer-size", "0"]).unwrap_err();
        assert!(err.to_string().contains("STREAM_BUFFER_SIZE"));
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        assert!(parse(&["--store", "postgres"]).is_err());
    }
}
