use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::info;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thai_relocation_rag::config::{
    RagSettings, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_DOCS_DIR, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS, DEFAULT_TOP_K,
};
use thai_relocation_rag::form::run_form;
use thai_relocation_rag::knowledge::KnowledgeBase;
use thai_relocation_rag::openai::{
    OpenAiClient, OpenAiConfig, DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL,
};
use thai_relocation_rag::session::Session;

/// Thailand relocation assistant: answers questions from local documents using OpenAI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory with the .txt source documents
    #[arg(long, env = "RAG_DOCS_DIR", default_value = DEFAULT_DOCS_DIR)]
    docs_dir: PathBuf,

    /// Maximum characters per passage
    #[arg(long, env = "RAG_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive passages
    #[arg(long, env = "RAG_CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Passages retrieved per question
    #[arg(long, env = "RAG_TOP_K", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Sampling temperature of the chat model
    #[arg(long, env = "RAG_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Timeout for every remote call, in seconds
    #[arg(long, env = "RAG_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, env = "OPENAI_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    #[arg(long, env = "OPENAI_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    chat_model: String,

    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let settings = RagSettings {
        docs_dir: args.docs_dir,
        chunk_size: args.chunk_size,
        chunk_overlap: args.chunk_overlap,
        top_k: args.top_k,
        temperature: args.temperature,
        request_timeout: Duration::from_secs(args.timeout_secs),
    };
    settings.validate().context("Invalid settings")?;

    let mut openai_config = OpenAiConfig::from_env().context("Missing OPENAI_API_KEY")?;
    openai_config.api_base = args.api_base;
    openai_config.embedding_model = args.embedding_model;
    openai_config.chat_model = args.chat_model;
    openai_config.request_timeout = settings.request_timeout;
    info!("Using {:?}", openai_config);

    let client = Arc::new(
        OpenAiClient::new(openai_config).context("Failed to initialize OpenAI client")?,
    );

    let knowledge = Arc::new(KnowledgeBase::new(settings, Arc::clone(&client)));
    let session = Session::new(knowledge, client);

    let passages = session
        .warm_up()
        .await
        .context("Failed to build the document index")?;
    info!("Indexed {} passages", passages);

    // Enter interactive Q&A loop
    run_form(&session, io::stdin().lock(), io::stdout())
        .await
        .context("Error in query loop")?;

    Ok(())
}
