//! `kubeclaw chat`: Interactive or single-question mode.
//!
//! The whole chat runs in one session. A confirmation request is answered
//! by typing `yes` or `no` at the next prompt.

use kubeclaw_agent::Orchestrator;
use kubeclaw_core::event::DomainEvent;
use kubeclaw_core::session::SessionId;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>, show_reasoning: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    super::require_api_key(&config)?;
    let orchestrator = super::build_orchestrator(&config)?;
    let session_id = SessionId::generate();

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = orchestrator.handle(Some(session_id.as_str()), &msg).await?;
        eprint!("\r              \r");
        println!("{}", reply.render(show_reasoning));
        return Ok(());
    }

    println!();
    println!("  KubeClaw — Interactive Mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Backend:   {}", config.backend.base_url);
    println!("  Tools:     {}", orchestrator.catalog().names().join(", "));
    println!("  Session:   {session_id}");
    println!();
    println!("  Type your question and press Enter.");
    println!("  '/reset' clears the conversation, 'exit' quits.");
    println!();

    spawn_progress_printer(&orchestrator);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "/reset" => {
                reset(&orchestrator, &session_id).await?;
                println!("  (conversation cleared)");
            }
            _ => match orchestrator.handle(Some(session_id.as_str()), input).await {
                Ok(reply) => {
                    println!();
                    for line in reply.render(show_reasoning).lines() {
                        println!("  Assistant > {line}");
                    }
                    println!();
                }
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            },
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

async fn reset(orchestrator: &Orchestrator, session_id: &SessionId) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(handle) = orchestrator.sessions().get(session_id.as_str()).await? {
        handle.lock().await.reset();
    }
    Ok(())
}

/// Print round and tool progress to stderr while a turn runs.
fn spawn_progress_printer(orchestrator: &Orchestrator) {
    let mut rx = orchestrator.event_bus().subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.as_ref() {
                    DomainEvent::ResponseGenerated { round, .. } => {
                        eprintln!("    · round {round}");
                    }
                    DomainEvent::ToolExecuted {
                        tool_name,
                        success,
                        duration_ms,
                        ..
                    } => {
                        let status = if *success { "ok" } else { "failed" };
                        eprintln!("    · {tool_name} {status} ({duration_ms} ms)");
                    }
                    _ => {}
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
