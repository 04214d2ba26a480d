//! Total Gold ticket sales from `ticket-sales.db`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dataops_store::{Database, TicketSales};
use tracing::info;

use crate::config::TaskConfig;
use crate::error::Result;
use crate::fsio::write_file;
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

pub struct TicketSalesHandler {
    db_path: PathBuf,
    output: PathBuf,
    ticket_type: String,
}

impl TicketSalesHandler {
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            db_path: config.path("ticket-sales.db"),
            output: config.path("ticket-sales-gold.txt"),
            ticket_type: "Gold".into(),
        }
    }
}

#[async_trait]
impl TaskHandler for TicketSalesHandler {
    fn operation(&self) -> Operation {
        Operation::TicketSales
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let db = Database::connect_read_only(&self.db_path).await?;
        let total = TicketSales::new(db).total_for_type(&self.ticket_type).await?;

        write_file(&self.output, &total.to_string()).await?;

        info!(ticket_type = %self.ticket_type, total, "ticket sales summed");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("{} ticket sales total {total}", self.ticket_type),
        ))
    }
}
