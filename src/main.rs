use anyhow::Context;
use playground::{
    api::routes::build_app,
    cli::{
        commands::{build_index_file, query_index, read_index, write_index},
        output::Output,
        Cli, Commands,
    },
    utils::toml_config::{ConfigError, LogFormat, PlaygroundConfig, ServerConfig},
    AppState, ModelParams,
};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match run(cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<()> {
    let (config, found) = load_config(&cli.config)?;
    init_tracing(&config.server, cli.verbose);
    if !found {
        tracing::warn!(
            path = %cli.config.display(),
            "Configuration file not found, using defaults"
        );
        output.warning(&format!(
            "{} not found, using defaults",
            cli.config.display()
        ));
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    match command {
        Commands::Serve { host, port } => serve(config, host, port, output).await,
        Commands::Index {
            input,
            chunk_size,
            chunk_overlap,
            output: destination,
        } => {
            let chunk_size = chunk_size.unwrap_or(config.rag.default_chunk_size);
            let chunk_overlap = chunk_overlap.unwrap_or(config.rag.default_chunk_overlap);
            let state = AppState::from_config(config)?;

            let payload =
                build_index_file(&state.pipeline, &input, chunk_size, chunk_overlap).await?;
            write_index(&payload, destination.as_deref())?;

            output.success(&format!(
                "Indexed {} into {} chunks",
                input.display(),
                payload.nodes_with_embedding.len()
            ));
            if let Some(path) = destination {
                output.kv("index", &path.display().to_string());
            }
            Ok(())
        }
        Commands::Query {
            index,
            question,
            top_k,
            temperature,
            top_p,
        } => {
            let top_k = top_k.unwrap_or(config.rag.default_top_k);
            let state = AppState::from_config(config)?;
            let nodes = read_index(&index)?;
            output.info(&format!(
                "Loaded {} chunks from {}",
                nodes.len(),
                index.display()
            ));

            let answer = query_index(
                &state.pipeline,
                &nodes,
                &question,
                top_k,
                ModelParams::new(temperature, top_p),
            )
            .await?;

            output.header("Sources");
            for (rank, hit) in answer.grounding.iter().enumerate() {
                output.source(rank + 1, hit.score, &hit.chunk.text);
            }
            output.answer(&answer.text);
            Ok(())
        }
    }
}

/// Load `path`, falling back to defaults when the file does not exist.
fn load_config(path: &Path) -> anyhow::Result<(PlaygroundConfig, bool)> {
    match PlaygroundConfig::load(path) {
        Ok(config) => Ok((config, true)),
        Err(ConfigError::FileNotFound(_)) => Ok((PlaygroundConfig::default(), false)),
        Err(err) => Err(err).with_context(|| format!("Failed to load {}", path.display())),
    }
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "playground={level},playground_vector={level},rag_playground={level},tower_http={level}"
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn serve(
    config: PlaygroundConfig,
    host: Option<String>,
    port: Option<u16>,
    output: &Output,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let state = AppState::from_config(config).context("Failed to initialize pipeline")?;
    let app = build_app(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(address = %addr, "Server listening");
    output.success(&format!("Listening on http://{}", addr));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
