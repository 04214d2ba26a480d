//! Operation identifiers.
//!
//! [`Operation`] is the closed set of tasks the service can run.  Model
//! output is mapped onto it with [`Operation::from_key`], which only strips
//! formatting noise (whitespace, code fences, quotes, trailing punctuation)
//! and case before requiring an exact key match.

use serde::{Deserialize, Serialize};

/// One handler-backed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    FormatMarkdown,
    CountWeekdays,
    SortContacts,
    LogsRecent,
    IndexDocs,
    ExtractEmail,
    CreditCard,
    CommentsSimilarity,
    TicketSales,
}

impl Operation {
    /// Every operation, in prompt order.
    pub const ALL: [Operation; 9] = [
        Self::FormatMarkdown,
        Self::CountWeekdays,
        Self::SortContacts,
        Self::LogsRecent,
        Self::IndexDocs,
        Self::ExtractEmail,
        Self::CreditCard,
        Self::CommentsSimilarity,
        Self::TicketSales,
    ];

    /// The canonical key the model is asked to answer with.
    pub fn key(self) -> &'static str {
        match self {
            Self::FormatMarkdown => "format_markdown",
            Self::CountWeekdays => "count_weekdays",
            Self::SortContacts => "sort_contacts",
            Self::LogsRecent => "logs_recent",
            Self::IndexDocs => "index_docs",
            Self::ExtractEmail => "extract_email",
            Self::CreditCard => "credit_card",
            Self::CommentsSimilarity => "comments_similarity",
            Self::TicketSales => "ticket_sales",
        }
    }

    /// A sample task description used in the classification prompt.
    pub fn example(self) -> &'static str {
        match self {
            Self::FormatMarkdown => {
                "Format the contents of /data/format.md using prettier, updating the file in-place"
            }
            Self::CountWeekdays => {
                "The file /data/dates.txt contains a list of dates. Count the Wednesdays and write the number to /data/dates-wednesdays.txt"
            }
            Self::SortContacts => {
                "Sort the array of contacts in /data/contacts.json by last_name, then first_name, and write the result to /data/contacts-sorted.json"
            }
            Self::LogsRecent => {
                "Write the first line of the 10 most recent .log files in /data/logs/ to /data/logs-recent.txt, most recent first"
            }
            Self::IndexDocs => {
                "Find all Markdown files in /data/docs/, extract the first H1 of each, and write an index to /data/docs/index.json"
            }
            Self::ExtractEmail => {
                "/data/email.txt contains an email message. Extract the sender's email address and write it to /data/email-sender.txt"
            }
            Self::CreditCard => {
                "/data/credit_card.png contains a credit card number. Extract it and write it without spaces to /data/credit-card.txt"
            }
            Self::CommentsSimilarity => {
                "/data/comments.txt contains a list of comments. Using embeddings, find the most similar pair and write them to /data/comments-similar.txt"
            }
            Self::TicketSales => {
                "The SQLite database /data/ticket-sales.db has a tickets table. What is the total sales of all the items in the Gold ticket type? Write the number to /data/ticket-sales-gold.txt"
            }
        }
    }

    /// Resolve model output to an operation.
    ///
    /// Accepts the canonical key or `<key>_task`, case-insensitively, after
    /// stripping surrounding whitespace, code fences, quotes and trailing
    /// punctuation.  Anything else is `None`.
    pub fn from_key(raw: &str) -> Option<Self> {
        let normalized = normalize_key(raw);
        let key = normalized.strip_suffix("_task").unwrap_or(&normalized);
        Self::ALL.into_iter().find(|op| op.key() == key)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Strip formatting noise a model may wrap its answer in.
fn normalize_key(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(inner) = s.strip_prefix("```") {
        // Drop an optional language tag on the opening fence.
        let inner = inner.split_once('\n').map_or(inner, |(_, rest)| rest);
        s = inner.strip_suffix("```").unwrap_or(inner).trim();
    }
    s.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '`' | '"' | '\'' | '*' | '.' | '!' | ';' | ':')
    })
    .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_round_trips() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_key(op.key()), Some(op));
            assert_eq!(op.to_string(), op.key());
        }
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = Operation::ALL.iter().map(|op| op.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Operation::ALL.len());
    }

    #[test]
    fn case_and_noise_are_normalized() {
        assert_eq!(
            Operation::from_key("  Count_Weekdays\n"),
            Some(Operation::CountWeekdays)
        );
        assert_eq!(
            Operation::from_key("`sort_contacts`."),
            Some(Operation::SortContacts)
        );
        assert_eq!(
            Operation::from_key("\"ticket_sales\""),
            Some(Operation::TicketSales)
        );
        assert_eq!(
            Operation::from_key("```text\nindex_docs\n```"),
            Some(Operation::IndexDocs)
        );
    }

    #[test]
    fn task_suffix_alias_is_accepted() {
        assert_eq!(
            Operation::from_key("extract_email_task"),
            Some(Operation::ExtractEmail)
        );
    }

    #[test]
    fn no_fuzzy_matching() {
        assert_eq!(Operation::from_key("count weekdays"), None);
        assert_eq!(Operation::from_key("count_weekday"), None);
        assert_eq!(Operation::from_key("The answer is sort_contacts"), None);
        assert_eq!(Operation::from_key(""), None);
        assert_eq!(Operation::from_key("etc"), None);
    }

    #[test]
    fn serializes_as_key() {
        let v = serde_json::to_value(Operation::CommentsSimilarity).unwrap();
        assert_eq!(v, "comments_similarity");
    }
}
