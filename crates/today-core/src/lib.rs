pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod datetime;
pub mod error;
pub mod filter;
pub mod render;
pub mod repository;
pub mod store;
pub mod task;
pub mod writer;

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting today CLI"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  for kv in &cli.rc_overrides {
    cfg
      .set(&kv.key, &kv.value)
      .with_context(|| {
        format!(
          "invalid --rc {}={}",
          kv.key, kv.value
        )
      })?;
  }

  let data_dir = cfg
    .resolve_data_dir(
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    store::FileStore::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open store at {}",
          data_dir.display()
        )
      })?;

  let renderer =
    render::Renderer::new(&cfg);
  let mut screen =
    controller::ScreenController::new(
      Arc::new(store)
    )?;
  screen.mount()?;

  let command =
    cli.command.unwrap_or_default();
  debug!(?command, "parsed command");

  let result = commands::dispatch(
    &mut screen,
    &cfg,
    &renderer,
    command
  );
  screen.flush();
  result?;

  info!("done");
  Ok(())
}
