//! In-memory record store. Tables are ordered row lists keyed by table name.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use rollcall_core::config::StoreConfig;
use rollcall_core::error::{Result, RollcallError};
use rollcall_core::traits::RecordStore;
use rollcall_core::types::{Row, Student, value_as_string};

use crate::student_from_row;

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Row>>,
    failing: HashSet<String>,
}

/// Record store held entirely in memory.
pub struct MemoryStore {
    layout: StoreConfig,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(layout: StoreConfig) -> Self {
        Self {
            layout,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Build from a JSON object of `{ "table": [row, ...] }`.
    pub fn from_json(layout: StoreConfig, value: serde_json::Value) -> Result<Self> {
        let tables: HashMap<String, Vec<Row>> = serde_json::from_value(value)?;
        let store = Self::new(layout);
        for (table, rows) in tables {
            for row in rows {
                store.insert(&table, row);
            }
        }
        Ok(store)
    }

    /// Load a fixtures file in the `from_json` shape.
    pub fn load_fixtures(layout: StoreConfig, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json(layout, serde_json::from_str(&content)?)?;
        tracing::info!("Loaded fixtures from {}", path.display());
        Ok(store)
    }

    /// Insert a row, replacing any existing row with the same roll number.
    pub fn insert(&self, table: &str, row: Row) {
        let roll = row.get(&self.layout.roll_column).and_then(value_as_string);
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let rows = tables.rows.entry(table.to_string()).or_default();
        let existing = roll.and_then(|r| {
            rows.iter()
                .position(|existing| self.roll_of(existing).as_deref() == Some(r.as_str()))
        });
        match existing {
            Some(idx) => rows[idx] = row,
            None => rows.push(row),
        }
    }

    /// Make every lookup against `table` fail, to simulate a store outage.
    pub fn fail_table(&self, table: &str) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.failing.insert(table.to_string());
    }

    fn roll_of(&self, row: &Row) -> Option<String> {
        row.get(&self.layout.roll_column).and_then(value_as_string)
    }

    fn find(&self, table: &str, roll_no: &str) -> Result<Option<Row>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        if tables.failing.contains(table) {
            return Err(RollcallError::Store(format!("{table}: unavailable")));
        }
        Ok(tables.rows.get(table).and_then(|rows| {
            rows.iter()
                .find(|row| self.roll_of(row).as_deref() == Some(roll_no))
                .cloned()
        }))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn student(&self, roll_no: &str) -> Result<Option<Student>> {
        let row = self.find(&self.layout.identity_table, roll_no)?;
        Ok(row.and_then(|r| student_from_row(&r, &self.layout)))
    }

    async fn subject_row(&self, table: &str, roll_no: &str) -> Result<Option<Row>> {
        self.find(table, roll_no)
    }

    async fn list_recipients(&self) -> Result<Vec<Student>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let identity = &self.layout.identity_table;
        if tables.failing.contains(identity) {
            return Err(RollcallError::Store(format!("{identity}: unavailable")));
        }
        Ok(tables
            .rows
            .get(identity)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| student_from_row(row, &self.layout))
                    .filter(|s| s.address.is_some())
                    .collect()
            })
            .unwrap_or_default())
    }
}
