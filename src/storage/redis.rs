//! RediSearch backend for the product index.
//!
//! Documents are stored as RedisJSON values under `{prefix}{id}`, so the
//! index picks them up automatically:
//! ```text
//! JSON.SET product:7 $ '{"id":7,"name":"AirPods Pro 2","price":6490000,...}'
//! FT.SEARCH idx:products '@name|description:(airpods)' NOCONTENT LIMIT 0 12
//! ```

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, from_redis_value, pipe, Client, RedisError, Value};
use tracing::{debug, warn};

use super::traits::{BulkWriteResult, DocumentFailure, SearchBackend, StorageError};
use crate::product::IndexDocument;
use crate::resilience::retry::{retry, RetryConfig};
use crate::search::{Query, RediSearchTranslator, SearchIndex, SortKey, Window};

pub struct RediSearchBackend {
    connection: ConnectionManager,
}

impl RediSearchBackend {
    /// Connect with startup-mode retry (fails fast if the URL is wrong).
    pub async fn connect(connection_string: &str) -> Result<Self, StorageError> {
        let client = Client::open(connection_string)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let connection = retry("redis_connect", &RetryConfig::startup(), || async {
            ConnectionManager::new(client.clone()).await
        })
        .await
        .map_err(|e: RedisError| StorageError::Connection(e.to_string()))?;

        Ok(Self { connection })
    }

    fn to_json(doc: &IndexDocument) -> Result<String, StorageError> {
        serde_json::to_string(doc).map_err(|e| StorageError::Backend(e.to_string()))
    }

    async fn ft_search(&self, args: Vec<String>) -> Result<Vec<Value>, StorageError> {
        let mut conn = self.connection.clone();
        cmd("FT.SEARCH")
            .arg(&args)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_error(e, &args[0]))
    }
}

/// Classify a redis error: lost connections abort bulk work, a missing index
/// is reported as such, everything else is a plain backend error.
fn map_error(e: RedisError, index_name: &str) -> StorageError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        return StorageError::Connection(e.to_string());
    }
    let msg = e.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("no such index") || lower.contains("unknown index name") {
        StorageError::IndexMissing(index_name.to_string())
    } else {
        StorageError::Backend(msg)
    }
}

/// Parse a NOCONTENT reply: `[total, key1, key2, ...]`.
fn parse_search_reply(index: &SearchIndex, reply: &[Value]) -> Result<(u64, Vec<i64>), StorageError> {
    let (total, keys) = reply
        .split_first()
        .ok_or_else(|| StorageError::Backend("Empty FT.SEARCH reply".into()))?;
    let total: u64 = from_redis_value(total).map_err(|e| StorageError::Backend(e.to_string()))?;

    let mut ids = Vec::with_capacity(keys.len());
    for key in keys {
        let key: String = from_redis_value(key).map_err(|e| StorageError::Backend(e.to_string()))?;
        match index.id_from_key(&key) {
            Some(id) => ids.push(id),
            None => warn!(key = %key, "Ignoring search hit with unexpected key"),
        }
    }
    Ok((total, ids))
}

#[async_trait]
impl SearchBackend for RediSearchBackend {
    async fn index_exists(&self, index: &SearchIndex) -> Result<bool, StorageError> {
        let mut conn = self.connection.clone();
        let names: Vec<String> = cmd("FT._LIST")
            .query_async(&mut conn)
            .await
            .map_err(|e| map_error(e, &index.index_name()))?;
        Ok(names.contains(&index.index_name()))
    }

    async fn create_index(&self, index: &SearchIndex) -> Result<(), StorageError> {
        let args = index.to_ft_create_args();
        let mut conn = self.connection.clone();
        match cmd("FT.CREATE").arg(&args).query_async::<()>(&mut conn).await {
            Ok(()) => Ok(()),
            // Lost a race with another creator
            Err(e) if e.to_string().contains("Index already exists") => {
                debug!(index = %args[0], "Index already exists");
                Ok(())
            }
            Err(e) => Err(map_error(e, &args[0])),
        }
    }

    async fn upsert(&self, index: &SearchIndex, doc: &IndexDocument) -> Result<(), StorageError> {
        let key = index.document_key(doc.id);
        let json = Self::to_json(doc)?;
        let conn = self.connection.clone();

        retry("redis_json_set", &RetryConfig::query(), || {
            let mut conn = conn.clone();
            let key = key.clone();
            let json = json.clone();
            async move {
                cmd("JSON.SET")
                    .arg(&key)
                    .arg("$")
                    .arg(&json)
                    .query_async::<()>(&mut conn)
                    .await
            }
        })
        .await
        .map_err(|e| map_error(e, &index.index_name()))
    }

    async fn delete(&self, index: &SearchIndex, id: i64) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        cmd("DEL")
            .arg(index.document_key(id))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_error(e, &index.index_name()))
    }

    /// One pipeline per call. If the pipeline is rejected for a reason other
    /// than the connection, documents are retried one by one so a single bad
    /// document cannot fail its neighbours.
    async fn upsert_batch(
        &self,
        index: &SearchIndex,
        docs: &[IndexDocument],
    ) -> Result<BulkWriteResult, StorageError> {
        let mut result = BulkWriteResult::default();
        let mut prepared = Vec::with_capacity(docs.len());
        for doc in docs {
            match Self::to_json(doc) {
                Ok(json) => prepared.push((doc, json)),
                Err(e) => result.failures.push(DocumentFailure {
                    id: doc.id,
                    reason: e.to_string(),
                }),
            }
        }
        if prepared.is_empty() {
            return Ok(result);
        }

        let mut pipeline = pipe();
        for (doc, json) in &prepared {
            pipeline
                .cmd("JSON.SET")
                .arg(index.document_key(doc.id))
                .arg("$")
                .arg(json)
                .ignore();
        }

        let mut conn = self.connection.clone();
        match pipeline.query_async::<()>(&mut conn).await {
            Ok(()) => {
                result.written.extend(prepared.iter().map(|(doc, _)| doc.id));
                Ok(result)
            }
            Err(e) => {
                let err = map_error(e, &index.index_name());
                if err.is_connection() {
                    return Err(err);
                }
                warn!(error = %err, docs = prepared.len(), "Pipelined upsert rejected, retrying per document");
                for (doc, _) in prepared {
                    match self.upsert(index, doc).await {
                        Ok(()) => result.written.push(doc.id),
                        Err(e) if e.is_connection() => return Err(e),
                        Err(e) => result.failures.push(DocumentFailure {
                            id: doc.id,
                            reason: e.to_string(),
                        }),
                    }
                }
                Ok(result)
            }
        }
    }

    async fn search_ids(
        &self,
        index: &SearchIndex,
        query: &Query,
        sort: SortKey,
        window: Window,
        cap: usize,
    ) -> Result<Vec<i64>, StorageError> {
        let args = RediSearchTranslator::search_args(index, query, sort, window, cap);
        debug!(args = ?args, "FT.SEARCH");
        let reply = self.ft_search(args).await?;
        Ok(parse_search_reply(index, &reply)?.1)
    }

    async fn count(&self, index: &SearchIndex, query: &Query) -> Result<u64, StorageError> {
        let reply = self.ft_search(RediSearchTranslator::count_args(index, query)).await?;
        Ok(parse_search_reply(index, &reply)?.0)
    }

    async fn list_ids(&self, index: &SearchIndex) -> Result<Vec<i64>, StorageError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", index.prefix);
        let mut cursor: u64 = 0;
        let mut ids = Vec::new();

        loop {
            let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(500)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_error(e, &index.index_name()))?;

            ids.extend(keys.iter().filter_map(|k| index.id_from_key(k)));
            if next == 0 {
                break;
            }
            cursor = next;
        }

        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
