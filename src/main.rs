//! Analyst - 命令行入口
//!
//! 初始化日志、加载配置与数据集，构建推理后端与分发器，然后从 stdin 逐行读取问题。
//! 命令：`/reset` 重开会话，`/history` 打印对话，`/quit` 退出。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use analyst::config::load_config;
use analyst::core::{exchange_limit_notice, AgentError, Session};
use analyst::dataset::load_dataset;
use analyst::llm::{LlmClient, OpenAiClient};
use analyst::observability;
use analyst::react::{ReactAgent, ReactEvent, DEFAULT_SYSTEM_PROMPT};
use analyst::tools::{ActionDispatcher, ActionSchemaRegistry, HandlerRegistry};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// `analyst [--config <path>]` 或 `analyst <path>`
fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(flag) if flag == "--config" || flag == "-c" => args.next().map(PathBuf::from),
        Some(path) => Some(PathBuf::from(path)),
        None => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(config_path_from_args()).context("Failed to load config")?;
    let dataset = load_dataset(&cfg.app.dataset_path)
        .with_context(|| format!("Failed to load dataset {}", cfg.app.dataset_path.display()))?;
    let dataset = Arc::new(dataset);

    let llm = Arc::new(OpenAiClient::from_config(&cfg.llm));
    let registry = HandlerRegistry::standard(dataset.clone(), llm.clone());
    let dispatcher = ActionDispatcher::new(registry, cfg.actions.handler_timeout_secs);

    // 过程事件打印到 stderr，回答走 stdout
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(ev) = event_rx.recv().await {
            match ev {
                ReactEvent::ActionRequested { kind, arguments, .. } => {
                    eprintln!("  -> {}({})", kind, arguments);
                }
                ReactEvent::Observation { kind, ok, preview, .. } => {
                    let mark = if ok { "ok" } else { "error" };
                    eprintln!("  <- {} [{}] {}", kind, mark, preview);
                }
                _ => {}
            }
        }
    });

    let agent = ReactAgent::new(
        llm.clone(),
        ActionSchemaRegistry::new(cfg.actions.limits()),
        dispatcher,
    )
    .with_config(cfg.agent.react_config())
    .with_event_tx(event_tx);

    let mut session = Session::new(DEFAULT_SYSTEM_PROMPT, cfg.agent.max_exchanges);
    tracing::info!(
        session = %session.id(),
        dataset = dataset.name(),
        rows = dataset.len(),
        model = llm.model(),
        "session started"
    );

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!(
        "{} ready ({} rows). Ask a question, or /reset, /history, /quit.",
        cfg.app.name.as_deref().unwrap_or("analyst"),
        dataset.len()
    );

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                println!("Session restarted.");
                continue;
            }
            "/history" => {
                println!("{}", session.transcript().render_history());
                continue;
            }
            _ => {}
        }

        match session.submit(&agent, input).await {
            Ok(reply) => {
                println!("{}", reply.answer);
                if let Some(notice) = reply.notice {
                    println!("{}", notice);
                }
            }
            Err(AgentError::SessionInactive) => {
                println!("{}", exchange_limit_notice(session.max_exchanges()));
            }
            Err(e) => {
                tracing::error!(error = %e, "exchange failed");
                println!("Error: {}", e);
            }
        }
    }

    let (prompt, completion, total) = llm.token_usage();
    tracing::info!(prompt, completion, total, "token usage");
    Ok(())
}
