//! Ticket sales aggregation.
//!
//! The ticket database holds a single `tickets(type, units, price)` table.

use rusqlite::params;
use tracing::debug;

use crate::db::Database;
use crate::error::StoreResult;

/// Read-only queries over the `tickets` table.
#[derive(Clone)]
pub struct TicketSales {
    db: Database,
}

impl TicketSales {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Total revenue (`SUM(units * price)`) for one ticket type.
    ///
    /// Returns `0.0` when no row matches.
    pub async fn total_for_type(&self, ticket_type: &str) -> StoreResult<f64> {
        let ticket_type = ticket_type.to_owned();
        let total = self
            .db
            .execute(move |conn| {
                let total: f64 = conn.query_row(
                    "SELECT COALESCE(SUM(units * price), 0.0) FROM tickets WHERE type = ?1",
                    params![ticket_type],
                    |row| row.get(0),
                )?;
                Ok(total)
            })
            .await?;
        debug!(total, "ticket sales aggregated");
        Ok(total)
    }
}
