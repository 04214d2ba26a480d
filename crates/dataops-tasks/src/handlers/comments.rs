//! Find the two most similar comments in `comments.txt` using embeddings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dataops_agent::LanguageModel;
use tracing::info;

use crate::config::TaskConfig;
use crate::error::{Result, TaskError};
use crate::fsio::{read_file, write_file};
use crate::operation::Operation;
use crate::traits::{TaskHandler, TaskOutcome};

pub struct CommentsSimilarityHandler {
    input: PathBuf,
    output: PathBuf,
    model: Arc<dyn LanguageModel>,
}

impl CommentsSimilarityHandler {
    pub fn new(config: &TaskConfig, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            input: config.path("comments.txt"),
            output: config.path("comments-similar.txt"),
            model,
        }
    }
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Indices `(i, j)` with `i < j` of the most similar pair.  The first pair
/// in scan order wins ties.  `None` with fewer than two vectors.
pub fn most_similar_pair(vectors: &[Vec<f32>]) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f32)> = None;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            let score = cosine_similarity(&vectors[i], &vectors[j]);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some(((i, j), score));
            }
        }
    }
    best.map(|(pair, _)| pair)
}

#[async_trait]
impl TaskHandler for CommentsSimilarityHandler {
    fn operation(&self) -> Operation {
        Operation::CommentsSimilarity
    }

    fn output_path(&self) -> &Path {
        &self.output
    }

    async fn run(&self, _task: &str) -> Result<TaskOutcome> {
        let text = read_file(&self.input).await?;
        let comments: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect();

        if comments.len() < 2 {
            return Err(TaskError::InvalidInput {
                path: self.input.clone(),
                reason: format!("need at least 2 comments, found {}", comments.len()),
            });
        }

        let vectors = self.model.embed(&comments).await?;
        if vectors.len() != comments.len() {
            return Err(TaskError::InvalidInput {
                path: self.input.clone(),
                reason: format!(
                    "model returned {} embeddings for {} comments",
                    vectors.len(),
                    comments.len()
                ),
            });
        }

        let Some((i, j)) = most_similar_pair(&vectors) else {
            return Err(TaskError::InvalidInput {
                path: self.input.clone(),
                reason: "no comment pair to compare".into(),
            });
        };

        write_file(&self.output, &format!("{}\n{}", comments[i], comments[j])).await?;

        info!(comments = comments.len(), first = i, second = j, "similar comments found");
        Ok(TaskOutcome::new(
            self.operation(),
            &self.output,
            format!("comments {} and {} are the closest pair", i + 1, j + 1),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{FailingModel, MockModel};

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn picks_the_closest_pair() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.1, 1.0]];
        assert_eq!(most_similar_pair(&vectors), Some((1, 2)));
    }

    #[test]
    fn first_pair_wins_ties() {
        let vectors = vec![vec![1.0, 0.0]; 3];
        assert_eq!(most_similar_pair(&vectors), Some((0, 1)));
    }

    #[test]
    fn fewer_than_two_vectors_has_no_pair() {
        assert_eq!(most_similar_pair(&[]), None);
        assert_eq!(most_similar_pair(&[vec![1.0]]), None);
    }

    /// Embeds by topic keyword so the expected pair is unambiguous.
    fn topic_embedding(text: &str) -> Vec<f32> {
        if text.contains("slow") {
            vec![1.0, 0.1, 0.0]
        } else if text.contains("price") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        }
    }

    #[tokio::test]
    async fn writes_the_pair_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("comments.txt"),
            "The app is slow\nGreat price\n\nLove the colors\nPages load slow today\n",
        )
        .unwrap();

        let model = Arc::new(MockModel::embedding(topic_embedding));
        let handler = CommentsSimilarityHandler::new(&TaskConfig::with_root(dir.path()), model);
        handler.run("similar comments").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("comments-similar.txt")).unwrap();
        assert_eq!(written, "The app is slow\nPages load slow today");
    }

    #[tokio::test]
    async fn single_comment_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("comments.txt"), "only one\n\n").unwrap();

        let model = Arc::new(MockModel::embedding(topic_embedding));
        let handler = CommentsSimilarityHandler::new(&TaskConfig::with_root(dir.path()), model);
        let err = handler.run("").await.unwrap_err();

        assert!(matches!(err, TaskError::InvalidInput { .. }));
        assert!(!dir.path().join("comments-similar.txt").exists());
    }

    #[tokio::test]
    async fn embedding_failure_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("comments.txt"), "a\nb\n").unwrap();

        let handler =
            CommentsSimilarityHandler::new(&TaskConfig::with_root(dir.path()), Arc::new(FailingModel));
        assert!(matches!(handler.run("").await.unwrap_err(), TaskError::Model(_)));
    }
}
