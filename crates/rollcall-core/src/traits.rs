//! Seams to the external collaborators: the record store and the messaging gateway.
//! Both are injected as trait objects so tests can substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Row, Student};

/// Read access to the relational record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Verify the store is reachable. Failure at boot is fatal.
    async fn ping(&self) -> Result<()>;

    /// Look up a student's identity record by roll number.
    async fn student(&self, roll_no: &str) -> Result<Option<Student>>;

    /// Fetch the row for `roll_no` from one subject table.
    /// `Ok(None)` is the normal outcome for a student not enrolled in that subject.
    async fn subject_row(&self, table: &str, roll_no: &str) -> Result<Option<Row>>;

    /// Every student with a non-null address, in listing order.
    async fn list_recipients(&self) -> Result<Vec<Student>>;
}

/// Outbound text delivery.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Gateway name for logs.
    fn name(&self) -> &str;

    /// Verify credentials. Failure at boot is fatal.
    async fn ping(&self) -> Result<()>;

    /// Submit one text message. Returns the gateway's message id.
    async fn send_text(&self, to: &str, body: &str) -> Result<String>;
}
