//! Offline `index` and `query` commands.
//!
//! Index files hold `{"nodesWithEmbedding": [...]}`. Saved
//! `/api/splitandembed` responses (wrapped in `payload`) are accepted too.

use crate::llm::ModelParams;
use crate::rag::{nodes_from_index, Answer, QueryRequest, RagPipeline};
use crate::types::{AppError, NodeWithEmbedding, SplitAndEmbedPayload, SplitAndEmbedResponse};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid index file {path}: {source}")]
    InvalidIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize index: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexFile {
    Response(SplitAndEmbedResponse),
    Payload(SplitAndEmbedPayload),
}

/// Read, chunk and embed the document at `input`.
pub async fn build_index_file(
    pipeline: &RagPipeline,
    input: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<SplitAndEmbedPayload, CommandError> {
    let document = fs::read_to_string(input).map_err(|source| CommandError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let index = pipeline
        .build_index(&document, chunk_size, chunk_overlap)
        .await?;

    Ok(SplitAndEmbedPayload {
        nodes_with_embedding: nodes_from_index(&index),
    })
}

/// Write `payload` as pretty JSON to `output`, or stdout when `None`.
pub fn write_index(payload: &SplitAndEmbedPayload, output: Option<&Path>) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(payload)?;

    match output {
        Some(path) => fs::write(path, json).map_err(|source| CommandError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).map_err(|source| CommandError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })
        }
    }
}

pub fn read_index(path: &Path) -> Result<Vec<NodeWithEmbedding>, CommandError> {
    let content = fs::read_to_string(path).map_err(|source| CommandError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let file: IndexFile =
        serde_json::from_str(&content).map_err(|source| CommandError::InvalidIndex {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(match file {
        IndexFile::Response(response) => response.payload.nodes_with_embedding,
        IndexFile::Payload(payload) => payload.nodes_with_embedding,
    })
}

pub async fn query_index(
    pipeline: &RagPipeline,
    nodes: &[NodeWithEmbedding],
    question: &str,
    top_k: usize,
    params: ModelParams,
) -> Result<Answer, CommandError> {
    let index = pipeline.index_from_nodes(nodes)?;
    let request = QueryRequest {
        query_text: question.to_string(),
        top_k,
        params,
    };
    Ok(pipeline.answer_query(&index, &request).await?)
}
