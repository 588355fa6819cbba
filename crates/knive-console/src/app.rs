//! App — terminal setup and the run loop.
//!
//! Architecture:
//! - The `Orchestrator` owns all console state; `TuiShell` is its `Shell`.
//! - A blocking task reads crossterm events and forwards them into the
//!   orchestrator's channel as `ConsoleEvent::Input`.
//! - The loop draws a frame, then waits for the next event or UI tick.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use knive_proto::api::Backend;
use knive_proto::config::Config;
use ratatui::crossterm::{
    event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::event::ConsoleEvent;
use crate::orchestrator::Orchestrator;
use crate::store::StoreNotice;
use crate::tui_shell::TuiShell;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run<B: Backend>(config: &Config, backend: Arc<B>) -> anyhow::Result<()> {
    debug!("run(): enabling raw mode");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    debug!("run(): terminal created, size={:?}", terminal.size());

    let shell = TuiShell::new(config.console.max_tabs);
    let mut orchestrator = Orchestrator::new(backend, shell, &config.console);
    let result = event_loop(&mut terminal, &mut orchestrator).await;

    // ── Teardown ──────────────────────────────────────────────────────────────
    orchestrator.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("knive console stopped");

    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Term,
    orchestrator: &mut Orchestrator<B, TuiShell>,
) -> anyhow::Result<()> {
    // ── Background task: keyboard events ──────────────────────────────────────
    let input_tx = orchestrator.sender();
    // Polls with a timeout so the task ends once the orchestrator is dropped.
    tokio::task::spawn_blocking(move || loop {
        if input_tx.is_closed() {
            break;
        }
        match event::poll(Duration::from_millis(250)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if input_tx.blocking_send(ConsoleEvent::Input(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {}
            Err(_) => break,
        }
    });

    // ── Background task: store notices ────────────────────────────────────────
    let mut notices = orchestrator.store().subscribe();
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(StoreNotice::Loaded(records)) => {
                    info!("store now holds {} shows", records.len());
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("store notice receiver lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Toast expiry check
    let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
    ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    orchestrator.initialize();

    loop {
        terminal.draw(|f| orchestrator.shell().draw(f))?;

        if orchestrator.should_quit() {
            break;
        }

        tokio::select! {
            ev = orchestrator.next_event() => match ev {
                Some(ev) => orchestrator.handle(ev),
                None => break,
            },
            _ = ui_tick.tick() => orchestrator.handle(ConsoleEvent::Tick),
        }
    }
    Ok(())
}
