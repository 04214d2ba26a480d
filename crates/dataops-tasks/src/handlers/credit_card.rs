//! Read the card number from `credit_card.png` with a vision model.
//!
//! The model transcribes the image; the number itself is taken from its
//! answer with a digit-run regex and validated with the Luhn checksum, so
//! chatter around the number or a misread digit never reaches the output.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dataops_agent::{ChatRequest, ImageData, LanguageModel, Message};
use regex::Regex;
use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::error::{Result, TaskError};
use crate::fsio::{read_bytes, write_file};
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

/// 13 to 19 digits, optionally grouped by single spaces or dashes.
static CARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d(?:[ -]?\d){12,18}").expect("card regex is valid"));

const OCR_PROMPT: &str = "This image contains a payment card. \
Transcribe the long card number exactly as printed. \
Respond with the digits only, no other text.";

pub struct CreditCardHandler {
    input: PathBuf,
    output: PathBuf,
    model: Arc<dyn LanguageModel>,
}

impl CreditCardHandler {
    pub fn new(config: &TaskConfig, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            input: config.path("credit_card.png"),
            output: config.path("credit-card.txt"),
            model,
        }
    }
}

/// The first 13-19 digit run in `text` that passes the Luhn check, with
/// separators removed.
///
/// A regex match can swallow neighbouring digit groups (a CVV, an expiry
/// date, a reference number), so each match is searched for a run of whole
/// groups that passes Luhn, earliest start first, then shortest.
pub fn extract_card_number(text: &str) -> Option<String> {
    CARD_RE
        .find_iter(text)
        .find_map(|m| luhn_run_in_groups(m.as_str()))
}

fn luhn_run_in_groups(candidate: &str) -> Option<String> {
    let groups: Vec<&str> = candidate.split([' ', '-']).collect();
    for start in 0..groups.len() {
        let mut digits = String::new();
        for group in &groups[start..] {
            digits.push_str(group);
            if digits.len() > 19 {
                break;
            }
            if digits.len() >= 13 && luhn_valid(&digits) {
                return Some(digits);
            }
        }
    }
    None
}

/// Luhn checksum over an all-digit string.
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

#[async_trait]
impl TaskHandler for CreditCardHandler {
    fn operation(&self) -> Operation {
        Operation::CreditCard
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let bytes = read_bytes(&self.input).await?;
        let image = ImageData {
            mime_type: mime_type(&self.input).to_owned(),
            base64: STANDARD.encode(&bytes),
        };

        let request = ChatRequest {
            model: String::new(),
            messages: vec![Message::user_with_image(OCR_PROMPT, image)],
            temperature: Some(0.0),
            max_tokens: Some(64),
        };
        let response = self.model.complete(&request).await?;
        debug!(answer = %response.text, "vision model answered");

        let number = extract_card_number(&response.text).ok_or_else(|| TaskError::NoMatch {
            what: "valid card number",
            path: self.input.clone(),
        })?;

        write_file(&self.output, &number).await?;

        info!(digits = number.len(), "card number extracted");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("extracted a {}-digit card number", number.len()),
        ))
    }
}
