use anyhow::Context;
use question2answer::config::Config;
use question2answer::server::{answer_question, build_router, AppState};
use question2answer::upload::UploadedFile;
use question2answer::util::init_tracing;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let config = Config::from_env();
    let state = AppState::from_config(&config).context("failed to initialize completion client")?;

    match args.get(1).map(String::as_str) {
        None | Some("serve") => serve(&config, state).await,
        Some("ask") => ask(&args[2..], state).await,
        Some(other) => {
            tracing::info!("Usage: {} [serve] | ask <question> [--file=<path>]", args[0]);
            anyhow::bail!("unknown command: {other}")
        }
    }
}

async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Question2Answer listening on http://{}", config.bind_addr);
    tracing::info!("Completion endpoint: {}", config.completions_url);
    axum::serve(listener, app).await.context("server error")
}

/// Answer one question from the command line and print the JSON payload.
async fn ask(args: &[String], state: AppState) -> anyhow::Result<()> {
    let file_arg = args
        .iter()
        .find(|a| a.starts_with("--file="))
        .and_then(|a| a.strip_prefix("--file="))
        .map(|s| s.to_string());

    let question = args
        .iter()
        .filter(|a| !a.starts_with("--"))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    if question.trim().is_empty() {
        anyhow::bail!("usage: ask <question> [--file=<path>]");
    }

    let file = match file_arg {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {path}"))?;
            let filename = std::path::Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(path);
            Some(UploadedFile::new(filename, bytes))
        }
        None => None,
    };

    let answer = answer_question(&state, &question, file).await;
    println!("{}", serde_json::to_string(&answer)?);
    Ok(())
}
