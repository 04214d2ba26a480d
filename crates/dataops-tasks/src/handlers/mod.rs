//! The nine fixed-path task handlers.
//!
//! Every handler owns one input and one output path under the data root.
//! Handlers that need a model (credit card OCR, comment similarity) receive
//! it as an `Arc<dyn LanguageModel>`.

use std::sync::Arc;

use dataops_agent::LanguageModel;

use crate::config::TaskConfig;
use crate::traits::TaskHandler;

pub mod comments;
pub mod contacts;
pub mod credit_card;
pub mod docs;
pub mod email;
pub mod logs;
pub mod markdown;
pub mod tickets;
pub mod weekdays;

pub use comments::CommentsSimilarityHandler;
pub use contacts::SortContactsHandler;
pub use credit_card::CreditCardHandler;
pub use docs::IndexDocsHandler;
pub use email::ExtractEmailHandler;
pub use logs::LogsRecentHandler;
pub use markdown::FormatMarkdownHandler;
pub use tickets::TicketSalesHandler;
pub use weekdays::CountWeekdaysHandler;

/// Build one instance of every handler, in [`Operation::ALL`] order.
///
/// [`Operation::ALL`]: crate::operation::Operation::ALL
pub fn default_handlers(
    config: &TaskConfig,
    model: Arc<dyn LanguageModel>,
) -> Vec<Arc<dyn TaskHandler>> {
    vec![
        Arc::new(FormatMarkdownHandler::new(config)),
        Arc::new(CountWeekdaysHandler::new(config)),
        Arc::new(SortContactsHandler::new(config)),
        Arc::new(LogsRecentHandler::new(config)),
        Arc::new(IndexDocsHandler::new(config)),
        Arc::new(ExtractEmailHandler::new(config)),
        Arc::new(CreditCardHandler::new(config, Arc::clone(&model))),
        Arc::new(CommentsSimilarityHandler::new(config, model)),
        Arc::new(TicketSalesHandler::new(config)),
    ]
}
