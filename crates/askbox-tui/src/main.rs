//! askbox - terminal chat client for a question-answering endpoint

use std::io::{self, Write};
use std::process::ExitCode;
use anyhow::{Result, bail};
use askbox_core::{AskClient, ChatController, Config, Role, Submission};
use clap::{Parser, Subcommand};

mod app;
mod handler;
mod logging;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "askbox")]
#[command(version, about = "Chat with a question-answering endpoint from the terminal")]
struct Cli {
    /// Endpoint URL (overrides ASKBOX_ENDPOINT and the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Persist the resolved endpoint and timeout to the config file
    #[arg(long)]
    save: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Ask { .. }) => logging::init_stderr(),
        None => {
            logging::init_file()?;
        }
    }

    let mut config = Config::load()?.apply_env()?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = Some(endpoint);
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }

    let client = AskClient::new(config.endpoint(), config.timeout())?;

    if cli.save {
        let path = config.save()?;
        tracing::info!(path = %path.display(), "saved config");
    }

    let controller = ChatController::new(client, config.controller_settings());

    match cli.command {
        Some(Commands::Ask { question }) => {
            let role = ask_once(controller, &question, &mut io::stdout()).await?;
            Ok(if role == Role::Bot { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        None => {
            run_tui(controller).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Ask one question, write the reply to `out` and report who produced it
async fn ask_once<W: Write>(
    mut controller: ChatController,
    question: &str,
    out: &mut W,
) -> Result<Role> {
    controller.input_mut().insert_str(question);
    if controller.submit() != Submission::Sent {
        bail!("question is empty");
    }
    controller.settle().await;

    let Some(reply) = controller.transcript().last() else {
        bail!("no reply recorded");
    };
    writeln!(out, "{}", reply.text)?;
    Ok(reply.role)
}

async fn run_tui(controller: ChatController) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(controller);

    tracing::info!(endpoint = %app.controller.client().endpoint(), "session started");
    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event),
                None => break,
            },
            reply = app.controller.next_reply() => app.controller.finish(reply),
        }
    }
    Ok(())
}
