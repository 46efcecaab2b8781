//! Supabase record store over the PostgREST HTTP API.

use async_trait::async_trait;
use rollcall_core::config::StoreConfig;
use rollcall_core::error::{Result, RollcallError};
use rollcall_core::traits::RecordStore;
use rollcall_core::types::{Row, Student};

use crate::student_from_row;

/// Rows requested per page when listing a whole table. The server's
/// `max-rows` may cap pages lower, so listing stops on an empty page.
const PAGE_SIZE: usize = 1000;

/// PostgREST client for a Supabase project.
pub struct SupabaseStore {
    layout: StoreConfig,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(layout: StoreConfig) -> Self {
        Self {
            layout,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.layout.url.trim_end_matches('/'), table)
    }

    /// GET rows from `table` with PostgREST query parameters.
    async fn select(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Row>> {
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.layout.key)
            .header("Authorization", format!("Bearer {}", self.layout.key))
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| RollcallError::Store(format!("{table}: request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RollcallError::Store(format!("{table}: HTTP {status}: {text}")));
        }

        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| RollcallError::Store(format!("{table}: invalid response: {e}")))
    }

    /// GET every matching row of `table`, one `limit`/`offset` page at a time,
    /// ordered by roll number so pages stay stable.
    async fn select_all(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        loop {
            let mut paged = query.to_vec();
            paged.extend(self.page_query(rows.len()));
            let page = self.select(table, &paged).await?;
            if page.is_empty() {
                break;
            }
            tracing::debug!("{table}: fetched {} rows at offset {}", page.len(), rows.len());
            rows.extend(page);
        }
        Ok(rows)
    }

    fn page_query(&self, offset: usize) -> [(&'static str, String); 3] {
        [
            ("order", format!("{}.asc", self.layout.roll_column)),
            ("limit", PAGE_SIZE.to_string()),
            ("offset", offset.to_string()),
        ]
    }

    fn identity_columns(&self) -> String {
        format!(
            "{},{},{}",
            self.layout.roll_column, self.layout.name_column, self.layout.address_column
        )
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn ping(&self) -> Result<()> {
        self.select(
            &self.layout.identity_table,
            &[
                ("select", self.layout.roll_column.clone()),
                ("limit", "1".to_string()),
            ],
        )
        .await?;
        tracing::info!("Supabase: connected ({})", self.layout.url);
        Ok(())
    }

    async fn student(&self, roll_no: &str) -> Result<Option<Student>> {
        let rows = self
            .select(
                &self.layout.identity_table,
                &[
                    ("select", self.identity_columns()),
                    (self.layout.roll_column.as_str(), format!("eq.{roll_no}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.first().and_then(|row| student_from_row(row, &self.layout)))
    }

    async fn subject_row(&self, table: &str, roll_no: &str) -> Result<Option<Row>> {
        let mut rows = self
            .select(
                table,
                &[
                    ("select", "*".to_string()),
                    (self.layout.roll_column.as_str(), format!("eq.{roll_no}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    async fn list_recipients(&self) -> Result<Vec<Student>> {
        let rows = self
            .select_all(
                &self.layout.identity_table,
                &[
                    ("select", self.identity_columns()),
                    (self.layout.address_column.as_str(), "not.is.null".to_string()),
                ],
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| student_from_row(row, &self.layout))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let store = SupabaseStore::new(StoreConfig {
            url: "https://abc.supabase.co/".into(),
            ..StoreConfig::default()
        });
        assert_eq!(
            store.table_url("digital_electronics"),
            "https://abc.supabase.co/rest/v1/digital_electronics"
        );
    }

    #[test]
    fn test_identity_columns() {
        let store = SupabaseStore::new(StoreConfig::default());
        assert_eq!(store.identity_columns(), "Roll_No,Name,whatsapp_no");
    }

    #[test]
    fn test_page_query_orders_by_roll() {
        let store = SupabaseStore::new(StoreConfig::default());
        let query = store.page_query(2000);
        assert_eq!(query[0], ("order", "Roll_No.asc".to_string()));
        assert_eq!(query[1], ("limit", PAGE_SIZE.to_string()));
        assert_eq!(query[2], ("offset", "2000".to_string()));
    }
}
