//! Holochat terminal client.
//!
//! Sends one prompt, or every line read from stdin, and prints the reply as it
//! streams in.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use holochat_async::{ChatSession, Client, Conversation, Credential, HolochatConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod history;

#[derive(Parser)]
#[command(name = "holochat")]
#[command(about = "Chat with an OpenAI-compatible model from the terminal")]
#[command(version)]
struct Cli {
    /// Prompt to send; reads prompts line by line from stdin when omitted
    prompt: Option<String>,

    /// API key (`sk-` followed by 48 letters or digits)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    api_base: Option<String>,

    /// JSON file with the conversation to start from
    #[arg(long)]
    history: Option<PathBuf>,

    /// System prompt sent ahead of every turn
    #[arg(long)]
    system: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // stdout carries the reply; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    let Some(key) = cli.api_key else {
        bail!("no API key: pass --api-key or set OPENAI_API_KEY");
    };
    let credential = Credential::validated(&key)?;

    let mut config = HolochatConfig::new().with_credential(credential);
    if let Some(base) = cli.api_base {
        config = config.with_api_base(base);
    }
    let seed = match &cli.history {
        Some(path) => history::load(path)?,
        None => Vec::new(),
    };

    let session = ChatSession::with_client(Client::with_config(config));
    let mut convo = Conversation::new(session).with_history(seed);
    if let Some(system) = cli.system {
        convo = convo.with_system_prompt(system);
    }

    let mut interrupts = listen_for_interrupts();
    let mut stdout = std::io::stdout();

    if let Some(prompt) = cli.prompt {
        return turn(&mut convo, &prompt, &mut interrupts, &mut stdout).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            Some(()) = interrupts.recv() => {
                tracing::info!("interrupted at prompt");
                break;
            }
            line = lines.next_line() => line.context("reading stdin")?,
        };
        let Some(line) = line else { break };

        match line.trim() {
            "" => {}
            "/reset" => {
                convo.reset();
                tracing::info!(messages = convo.messages().len(), "history reset");
            }
            _ => {
                if let Err(e) = turn(&mut convo, &line, &mut interrupts, &mut stdout).await {
                    eprintln!("error: {e:#}");
                }
            }
        }
    }
    Ok(())
}

/// Forwards every Ctrl-C for the life of the process
///
/// Installing the handler replaces the default SIGINT behaviour, so it is
/// installed once and every caller reacts through the channel.
fn listen_for_interrupts() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// Runs one turn, writing the reply to `out` as it arrives
///
/// An interrupt or a failed write cancels the turn.
async fn turn<W: Write>(
    convo: &mut Conversation,
    text: &str,
    interrupts: &mut mpsc::Receiver<()>,
    out: &mut W,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut write_error = None;

    let result = {
        let submit = convo.submit_with_cancel(
            text,
            |piece| {
                if write_error.is_some() {
                    return;
                }
                if let Err(e) = out.write_all(piece.as_bytes()).and_then(|()| out.flush()) {
                    write_error = Some(e);
                    cancel.cancel();
                }
            },
            cancel.clone(),
        );
        tokio::pin!(submit);

        loop {
            tokio::select! {
                result = &mut submit => break result,
                Some(()) = interrupts.recv() => {
                    tracing::info!("turn cancelled");
                    cancel.cancel();
                }
            }
        }
    };

    if let Some(e) = write_error {
        return Err(e).context("writing reply");
    }
    result.context("chat request failed")?;
    writeln!(out).context("writing reply")?;
    Ok(())
}
