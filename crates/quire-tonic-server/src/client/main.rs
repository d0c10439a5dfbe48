use clap::{Parser, Subcommand};
use quire_tonic_core::proto::{
    CreateRecordRequest, DeleteRecordRequest, ListRecordsRequest, ReadRecordRequest, Record,
    UpdateRecordRequest, records_client::RecordsClient,
};
use tokio_stream::StreamExt;
use tonic::{codec::CompressionEncoding, transport::Channel};

/// Command-line client for the record service.
#[derive(Parser, Debug)]
#[command(name = "quire-tonic-client", version, about = "Talk to a quire record server")]
struct Cli {
    /// Server to connect to.
    ///
    /// Environment variable: `SERVER_URI`
    #[arg(long, env = "SERVER_URI", default_value_t = String::from("http://127.0.0.1:50051"))]
    server_uri: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a record and print it.
    Create {
        #[arg(long)]
        author_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = String::new())]
        content: String,
    },
    /// Print one record.
    Read { id: String },
    /// Replace every field of a record.
    Update {
        id: String,
        #[arg(long)]
        author_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = String::new())]
        content: String,
    },
    /// Delete a record.
    Delete { id: String },
    /// Print every record, one batch per line.
    List,
    /// Create, read, update and delete a record, then create three more and
    /// list everything.
    Demo,
}

type Client = RecordsClient<Channel>;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut client = RecordsClient::connect(cli.server_uri)
        .await?
        .accept_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Zstd);

    match cli.command {
        Command::Create {
            author_id,
            title,
            content,
        } => {
            create(&mut client, author_id, title, content).await?;
        }
        Command::Read { id } => read(&mut client, id).await?,
        Command::Update {
            id,
            author_id,
            title,
            content,
        } => {
            let record = Record {
                id,
                author_id,
                title,
                content,
            };
            update(&mut client, record).await?;
        }
        Command::Delete { id } => delete(&mut client, id).await?,
        Command::List => list(&mut client).await?,
        Command::Demo => demo(&mut client).await?,
    }

    Ok(())
}

async fn demo(client: &mut Client) -> Result<(), tonic::Status> {
    let content = "Content of John's record.".to_string();
    let mut record = create(client, "John".into(), "record0".into(), content.clone()).await?;

    read(client, record.id.clone()).await?;

    record.title = format!("updated - {}", record.title);
    update(client, record.clone()).await?;

    delete(client, record.id).await?;

    for title in ["record1", "record2", "record3"] {
        create(client, "John".into(), title.into(), content.clone()).await?;
    }
    list(client).await
}

async fn create(
    client: &mut Client,
    author_id: String,
    title: String,
    content: String,
) -> Result<Record, tonic::Status> {
    println!("Create record");
    let res = client
        .create_record(CreateRecordRequest {
            author_id,
            title,
            content,
        })
        .await?
        .into_inner();
    let record = res.record.unwrap_or_default();
    println!("{record:?}");
    Ok(record)
}

async fn read(client: &mut Client, id: String) -> Result<(), tonic::Status> {
    println!("Read record: {id}");
    let res = client
        .read_record(ReadRecordRequest { id })
        .await?
        .into_inner();
    println!("{:?}", res.record.unwrap_or_default());
    Ok(())
}

async fn update(client: &mut Client, record: Record) -> Result<(), tonic::Status> {
    println!("Update record: {}", record.id);
    let res = client
        .update_record(UpdateRecordRequest {
            record: Some(record),
        })
        .await?
        .into_inner();
    println!("{:?}", res.record.unwrap_or_default());
    Ok(())
}

async fn delete(client: &mut Client, id: String) -> Result<(), tonic::Status> {
    println!("Delete record: {id}");
    let res = client
        .delete_record(DeleteRecordRequest { id })
        .await?
        .into_inner();
    println!("{}", res.id);
    Ok(())
}

async fn list(client: &mut Client) -> Result<(), tonic::Status> {
    println!("List records");
    let mut stream = client
        .list_records(ListRecordsRequest {})
        .await?
        .into_inner();
    while let Some(batch) = stream.next().await {
        println!("{:?}", batch?.records);
    }
    Ok(())
}
