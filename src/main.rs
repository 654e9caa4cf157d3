mod commands;
mod render;
mod state;

use crate::commands::{Cli, LineInput};
use crate::render::Format;
use crate::state::messages::{ConsoleRequest, ConsoleResponse};
use crate::state::settings::Settings;
use crate::state::snapshot;
use crate::state::worker::TournamentWorker;
use anyhow::{Context, anyhow};
use campusplay_core::clock::SystemClock;
use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    better_panic::install();

    let settings = Settings::load()?;
    init_logging(settings.log_level)?;

    let single_command = cli.command.is_some();
    let failures = run(cli, &settings).await?;

    if failures > 0 && single_command {
        std::process::exit(1);
    }
    Ok(())
}

/// Serve one session against the store snapshot. The store lock is held
/// for the whole session. Returns the number of failed requests.
async fn run(cli: Cli, settings: &Settings) -> anyhow::Result<usize> {
    let mut store_lock = snapshot::open_lock(&settings.store_path)?;
    let _held = store_lock
        .write()
        .with_context(|| format!("could not lock {}", settings.store_path.display()))?;

    let store = Arc::new(snapshot::load(&settings.store_path)?);
    info!(
        "campusplay {} as {} ({:?}), store {}",
        env!("CARGO_PKG_VERSION"),
        settings.actor.username,
        settings.actor.role,
        settings.store_path.display()
    );

    let (request_tx, request_rx) = mpsc::channel::<ConsoleRequest>(100);
    let (response_tx, response_rx) = mpsc::channel::<ConsoleResponse>(100);

    let worker = TournamentWorker::new(
        store.clone(),
        SystemClock,
        settings.policy,
        settings.actor.clone(),
        request_rx,
        response_tx,
    );
    let worker_task = tokio::spawn(worker.run());

    let input_task = match cli.command {
        Some(command) => tokio::spawn(single_input_task(command.into(), request_tx)),
        None => tokio::spawn(stdin_input_task(request_tx)),
    };

    let format = if cli.json { Format::Json } else { Format::Text };
    let failures = print_responses(response_rx, format).await;

    let mutated = input_task.await?;
    worker_task.await?;

    if mutated {
        snapshot::save(&store.snapshot().await, &settings.store_path)?;
    }
    Ok(failures)
}

fn init_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    let max_level = match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("could not install logger: {e}"))?;
    log::set_max_level(level);
    Ok(())
}

async fn single_input_task(request: ConsoleRequest, requests: mpsc::Sender<ConsoleRequest>) -> bool {
    let mutated = request.is_mutation();
    if let Err(e) = requests.send(request).await {
        error!("Failed to send console request: {e}");
        return false;
    }
    mutated
}

/// Feed stdin lines to the worker until EOF. Returns whether any mutating
/// request was sent.
async fn stdin_input_task(requests: mpsc::Sender<ConsoleRequest>) -> bool {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut mutated = false;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {e}");
                break;
            }
        };

        match commands::parse_line(&line) {
            LineInput::Request(request) => {
                mutated |= request.is_mutation();
                if requests.send(request).await.is_err() {
                    break;
                }
            }
            LineInput::Skip => {}
            LineInput::Message(message) => {
                let _ = message.print();
            }
        }
    }

    mutated
}

/// Print responses until the worker shuts down. Returns the number of errors.
async fn print_responses(mut responses: mpsc::Receiver<ConsoleResponse>, format: Format) -> usize {
    let mut failures = 0;
    while let Some(response) = responses.recv().await {
        let output = render::render(&response, format);
        if let ConsoleResponse::Error { message } = &response {
            failures += 1;
            info!("request failed: {message}");
            if format == Format::Text {
                eprintln!("{output}");
                continue;
            }
        }
        println!("{output}");
    }
    failures
}
