//! # dataops-store
//!
//! SQLite access for DataOps.
//!
//! The ticket database under the data root is an external, pre-populated
//! file; this crate only reads it.  [`Database`] keeps the `rusqlite`
//! connection behind a mutex and runs every closure on tokio's blocking
//! pool so request handlers never block on disk.
//!
//! ```ignore
//! use dataops_store::{Database, TicketSales};
//!
//! let db = Database::connect_read_only("/data/ticket-sales.db").await?;
//! let gold = TicketSales::new(db).total_for_type("Gold").await?;
//! ```

pub mod db;
pub mod error;
pub mod tickets;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use tickets::TicketSales;
