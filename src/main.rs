use clap::Parser;
use compass::{
    api,
    config::Config,
    llm::{ChatClient, OpenAiChatClient, OpenAiEmbeddingClient},
    memory::ConversationMemory,
    pipeline::QueryPipeline,
    rag::{DocumentStore, SearchIndex, TextChunker},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "compass-server", version, about = "Retrieval-augmented travel assistant server")]
struct Args {
    /// Bind address, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Knowledge-base directory, overrides DOCS_DIR
    #[arg(long)]
    docs_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(docs_dir) = args.docs_dir {
        config.rag.docs_dir = docs_dir;
    }

    let store = Arc::new(DocumentStore::new(&config.rag.docs_dir));
    let chunker = Arc::new(TextChunker::new(
        config.rag.chunk_size,
        config.rag.chunk_overlap,
    ));
    let embedder = Arc::new(OpenAiEmbeddingClient::new(&config.llm));
    let chat = Arc::new(OpenAiChatClient::new(&config.llm));

    // An index build failure is fatal: the server must not start against
    // an absent index.
    let index = Arc::new(SearchIndex::build(&store, &chunker, embedder).await?);
    tracing::info!(
        documents = index.document_count(),
        chunks = index.chunk_count(),
        model = chat.model_name(),
        "retrieval index ready"
    );

    let memory = Arc::new(ConversationMemory::new(config.memory.max_exchanges));
    let pipeline = Arc::new(QueryPipeline::new(
        Arc::clone(&chat) as _,
        Arc::clone(&index),
        Arc::clone(&memory),
        config.rag.top_k,
        config.rag.max_prompt_chars,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        pipeline,
        index,
        memory,
        store,
        chunker,
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "compass-server listening");
    axum::serve(listener, api::app(state)).await?;

    Ok(())
}
