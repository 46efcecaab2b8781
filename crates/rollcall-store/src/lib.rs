//! # Rollcall Store
//!
//! Record store clients. `SupabaseStore` talks to a Supabase project over its
//! PostgREST API; `MemoryStore` keeps tables in memory for tests and dry runs.

pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use rollcall_core::config::StoreConfig;
use rollcall_core::types::{Row, Student, value_as_string};

/// Map an identity-table row to a `Student` using the configured column names.
pub fn student_from_row(row: &Row, layout: &StoreConfig) -> Option<Student> {
    let roll_no = row.get(&layout.roll_column).and_then(value_as_string)?;
    let name = row
        .get(&layout.name_column)
        .and_then(value_as_string)
        .unwrap_or_default();
    let address = row.get(&layout.address_column).and_then(value_as_string);
    Some(Student {
        roll_no,
        name,
        address,
    })
}
