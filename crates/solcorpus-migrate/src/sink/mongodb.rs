//! MongoDB sink.
//!
//! Connects with the official driver from a `mongodb://` or `mongodb+srv://`
//! connection string. Documents are serialized to BSON straight from
//! [`Document`].

use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document as BsonDocument};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{validate_uri, DestinationConfig};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::sink::DocumentSink;

/// Server selection timeout applied when the connection string sets none.
pub const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

const APP_NAME: &str = "solcorpus-migrate";

struct Connection {
    client: Client,
    collection: Collection<Document>,
}

/// Sink writing to a MongoDB collection.
pub struct MongoSink {
    config: DestinationConfig,
    connection: Option<Connection>,
}

impl MongoSink {
    /// Creates a sink; nothing is contacted until [`connect`](DocumentSink::connect).
    pub fn new(config: DestinationConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Filter matching the deduplication key.
    fn key_filter(repo_id: i64, sha: &str) -> BsonDocument {
        doc! { "repo.repo_id": repo_id, "sha": sha }
    }

    fn collection(&self) -> Result<&Collection<Document>> {
        self.connection
            .as_ref()
            .map(|c| &c.collection)
            .ok_or_else(|| Error::Loading("MongoDB sink used before connect".to_string()))
    }

    async fn open(&self) -> Result<Connection> {
        validate_uri(&self.config.uri)?;

        let mut options = ClientOptions::parse(&self.config.uri)
            .await
            .map_err(|e| Error::Config(format!("invalid MongoDB connection string: {}", e)))?;
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_string());
        }
        if options.server_selection_timeout.is_none() {
            options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
        }

        let client = Client::with_options(options)
            .map_err(|e| Error::DestinationConnection(e.to_string()))?;

        let database = client.database(&self.config.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| match *e.kind {
                ErrorKind::Authentication { .. } => {
                    Error::Authentication(format!("MongoDB rejected the credentials: {}", e))
                }
                _ => Error::DestinationConnection(format!("MongoDB ping failed: {}", e)),
            })?;

        let collection = database.collection::<Document>(&self.config.collection);
        Ok(Connection { client, collection })
    }
}

/// Renders an `inserted_id`; object ids become their hex form.
fn inserted_id_string(value: &Bson) -> Option<String> {
    match value {
        Bson::Null | Bson::Undefined => None,
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl DocumentSink for MongoSink {
    fn sink_type(&self) -> &'static str {
        "mongodb"
    }

    async fn connect(&mut self) -> Result<()> {
        let connection = self.open().await.map_err(|e| match e {
            Error::Authentication(_) | Error::DestinationConnection(_) => e,
            other => Error::DestinationConnection(other.to_string()),
        })?;

        info!(
            "Connected to MongoDB collection {}.{}",
            self.config.database, self.config.collection
        );
        self.connection = Some(connection);
        Ok(())
    }

    async fn exists(&self, repo_id: i64, sha: &str) -> Result<bool> {
        let found = self
            .collection()?
            .clone_with_type::<BsonDocument>()
            .find_one(Self::key_filter(repo_id, sha))
            .projection(doc! { "_id": 1 })
            .await
            .map_err(|e| Error::Loading(format!("MongoDB lookup failed: {}", e)))?;
        Ok(found.is_some())
    }

    async fn insert(&self, document: &Document) -> Result<Option<String>> {
        let result = self
            .collection()?
            .insert_one(document)
            .await
            .map_err(|e| Error::Loading(format!("MongoDB insert failed: {}", e)))?;

        let id = inserted_id_string(&result.inserted_id);
        debug!("Inserted {}/{} as {:?}", document.repo.repo_id, document.sha, id);
        Ok(id)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.client.shutdown().await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mongodb_tests.rs"]
mod tests;
