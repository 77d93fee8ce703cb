//! CLI module for the RAG playground
//!
//! Provides command-line interface parsing for the `rag-playground` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RAG Playground - chunk, embed and query documents
#[derive(Parser, Debug)]
#[command(
    name = "rag-playground",
    version,
    about = "RAG Playground - retrieval-augmented question answering over a document",
    long_about = "Split a document into overlapping chunks, embed them, and answer questions\n\
                  grounded in the most similar chunks.\n\n\
                  Run without arguments to start the HTTP server, or use 'index' and 'query'\n\
                  to work with files offline.",
    after_help = "EXAMPLES:\n    \
                  rag-playground                                  # Start the server\n    \
                  rag-playground index notes.txt -o notes.json    # Build an index file\n    \
                  rag-playground query notes.json \"Who wrote it?\" # Ask a question"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "playground.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Host address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Chunk and embed a document, writing the index as JSON
    Index {
        /// Document to index
        input: PathBuf,

        /// Words per chunk (defaults to rag.default_chunk_size)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Words shared by consecutive chunks (defaults to rag.default_chunk_overlap)
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Answer a question against an index file
    Query {
        /// Index file produced by `index` or `/api/splitandembed`
        index: PathBuf,

        /// The question
        question: String,

        /// Number of chunks to retrieve (defaults to rag.default_top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Sampling temperature
        #[arg(long, default_value_t = 0.0)]
        temperature: f32,

        /// Nucleus sampling probability mass
        #[arg(long, default_value_t = 1.0)]
        top_p: f32,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
