use serde::{de::DeserializeOwned, Serialize};

use crate::database::store::{DocumentStore, Filter, StoreError, Table, Transaction};
use crate::types::Id;

/// A typed document stored in one table
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Sized {
    const TABLE: Table;

    fn id(&self) -> Id<Self>;
}

/// Typed view over a store transaction.
pub struct Tx {
    inner: Box<dyn Transaction>,
}

impl Tx {
    pub async fn begin(store: &dyn DocumentStore) -> Result<Self, StoreError> {
        Ok(Self {
            inner: store.begin().await?,
        })
    }

    pub async fn get<T: Document>(&mut self, id: Id<T>) -> Result<Option<T>, StoreError> {
        match self.inner.get(T::TABLE, id.as_uuid()).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    pub async fn find<T: Document>(&mut self, filter: Filter) -> Result<Vec<T>, StoreError> {
        self.inner
            .query(T::TABLE, &filter)
            .await?
            .into_iter()
            .map(|body| serde_json::from_value(body).map_err(StoreError::from))
            .collect()
    }

    pub async fn first<T: Document>(&mut self, filter: Filter) -> Result<Option<T>, StoreError> {
        Ok(self.find(filter.take(1)).await?.into_iter().next())
    }

    pub async fn insert<T: Document>(&mut self, doc: &T) -> Result<(), StoreError> {
        let body = serde_json::to_value(doc)?;
        self.inner.insert(T::TABLE, doc.id().as_uuid(), body).await
    }

    /// Overwrite an existing document with its new state.
    pub async fn save<T: Document>(&mut self, doc: &T) -> Result<(), StoreError> {
        let body = serde_json::to_value(doc)?;
        self.inner.replace(T::TABLE, doc.id().as_uuid(), body).await
    }

    pub async fn delete<T: Document>(&mut self, id: Id<T>) -> Result<bool, StoreError> {
        self.inner.delete(T::TABLE, id.as_uuid()).await
    }

    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.inner.commit().await
    }
}
