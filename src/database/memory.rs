use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::database::store::{DocumentStore, Filter, StoreError, Table, Transaction};

type Tables = HashMap<Table, Vec<(Uuid, Value)>>;

/// In-process document store for development and tests.
///
/// A transaction holds the store lock from `begin` until it is committed or
/// dropped, so transactions run strictly one after another and never
/// conflict. Writes go to a private copy that replaces the shared state on
/// commit.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard: Some(guard),
            staged,
        }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTransaction {
    guard: Option<OwnedMutexGuard<Tables>>,
    staged: Tables,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        match self.guard {
            Some(_) => Ok(()),
            None => Err(StoreError::Finished),
        }
    }

    fn rows(&mut self, table: Table) -> &mut Vec<(Uuid, Value)> {
        self.staged.entry(table).or_default()
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&mut self, table: Table, id: Uuid) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .rows(table)
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, body)| body.clone()))
    }

    async fn query(&mut self, table: Table, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.ensure_open()?;
        let matches = self
            .rows(table)
            .iter()
            .filter(|(_, body)| filter.matches(body))
            .map(|(_, body)| body.clone());
        Ok(match filter.limit {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        })
    }

    async fn insert(&mut self, table: Table, id: Uuid, body: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        let rows = self.rows(table);
        if rows.iter().any(|(row_id, _)| *row_id == id) {
            return Err(StoreError::Conflict(format!(
                "duplicate id {} in {}",
                id,
                table.name()
            )));
        }
        rows.push((id, body));
        Ok(())
    }

    async fn replace(&mut self, table: Table, id: Uuid, body: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        match self.rows(table).iter_mut().find(|(row_id, _)| *row_id == id) {
            Some((_, existing)) => {
                *existing = body;
                Ok(())
            }
            None => Err(StoreError::Missing {
                table: table.name(),
                id,
            }),
        }
    }

    async fn delete(&mut self, table: Table, id: Uuid) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let rows = self.rows(table);
        let before = rows.len();
        rows.retain(|(row_id, _)| *row_id != id);
        Ok(rows.len() != before)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut guard = self.guard.take().ok_or(StoreError::Finished)?;
        *guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}
