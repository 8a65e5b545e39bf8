use anyhow::{Context, anyhow};
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::config::Config;
use crate::controller::{NewTask, ScreenController};
use crate::datetime::parse_date_expr;
use crate::render::Renderer;
use crate::task::TaskId;

/// Runs one command against a mounted screen, then shows the list the way the
/// screen would after the command.
#[instrument(skip(screen, cfg, renderer))]
pub fn dispatch(
    screen: &mut ScreenController,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let hide_by_default = !cfg.show_done;

    match command {
        Command::List { hide_done } => {
            info!("command list");
            if hide_done || hide_by_default {
                screen.toggle_filter()?;
            }
        }
        Command::Add { description, at } => {
            info!("command add");
            let date = parse_date_expr(&at, now)
                .with_context(|| format!("invalid --at value: {at}"))?;

            screen.open_add_task();
            let added = screen.add_task(NewTask {
                description: description.join(" "),
                date,
            });
            if let Some(alert) = screen.take_alert() {
                renderer.print_alert(&alert)?;
            }
            let id = added?;
            println!("Created task {id}.");
        }
        Command::Toggle { id } => {
            info!(id = %id, "command toggle");
            ensure_known(screen, &id)?;
            screen.toggle_task(id)?;
        }
        Command::Delete { id } => {
            info!(id = %id, "command delete");
            ensure_known(screen, &id)?;
            screen.delete_task(id.clone())?;
            println!("Deleted task {id}.");
        }
    }

    debug!(visible = screen.visible_tasks().len(), "rendering screen");
    renderer.print_screen(
        screen.tasks(),
        screen.visible_tasks(),
        screen.show_done_tasks(),
        now,
    )
}

fn ensure_known(screen: &ScreenController, id: &TaskId) -> anyhow::Result<()> {
    if screen.tasks().iter().any(|task| &task.id == id) {
        Ok(())
    } else {
        Err(anyhow!("no task with id {id}"))
    }
}
