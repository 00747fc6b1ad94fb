//! Single-call readers feeding the query cache.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::{
    api_client::{ApiClient, ApiError},
    query_key::QueryKey,
    resources::Resource,
};

/// One remote read identified by a [`QueryKey`].
///
/// A fetch performs exactly one request (plus the client's configured read
/// retries) and never writes any cache key itself.
#[async_trait]
pub trait Fetcher: Clone + Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn key(&self) -> QueryKey;

    async fn fetch(&self) -> Result<Self::Output, ApiError>;
}

/// Reads a whole collection, optionally narrowed by filters.
pub struct ListFetcher<R> {
    client: ApiClient,
    key: QueryKey,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ListFetcher<R> {
    pub fn new(client: &ApiClient) -> Self {
        Self {
            client: client.clone(),
            key: R::list_key(),
            _resource: PhantomData,
        }
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.key = self.key.filter(name, value);
        self
    }
}

impl<R> Clone for ListFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            key: self.key.clone(),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> Fetcher for ListFetcher<R> {
    type Output = Vec<R>;

    fn key(&self) -> QueryKey {
        self.key.clone()
    }

    async fn fetch(&self) -> Result<Vec<R>, ApiError> {
        let records: Vec<R> = self.client.get_json(&self.key).await?;
        debug!(key = %self.key, count = records.len(), "fetched collection");
        Ok(records)
    }
}

/// Reads one record by id.
pub struct RecordFetcher<R> {
    client: ApiClient,
    id: Uuid,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> RecordFetcher<R> {
    pub fn new(client: &ApiClient, id: Uuid) -> Self {
        Self {
            client: client.clone(),
            id,
            _resource: PhantomData,
        }
    }
}

impl<R> Clone for RecordFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            id: self.id,
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> Fetcher for RecordFetcher<R> {
    type Output = R;

    fn key(&self) -> QueryKey {
        R::record_key(self.id)
    }

    async fn fetch(&self) -> Result<R, ApiError> {
        self.client.get_json(&R::record_key(self.id)).await
    }
}

/// Reads any JSON document, e.g. server-computed stats.
pub struct JsonFetcher<T> {
    client: ApiClient,
    key: QueryKey,
    _output: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + Send + Sync + 'static> JsonFetcher<T> {
    pub fn new(client: &ApiClient, key: QueryKey) -> Self {
        Self {
            client: client.clone(),
            key,
            _output: PhantomData,
        }
    }
}

impl<T> Clone for JsonFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            key: self.key.clone(),
            _output: PhantomData,
        }
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + Sync + 'static> Fetcher for JsonFetcher<T> {
    type Output = T;

    fn key(&self) -> QueryKey {
        self.key.clone()
    }

    async fn fetch(&self) -> Result<T, ApiError> {
        self.client.get_json(&self.key).await
    }
}
