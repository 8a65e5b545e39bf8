use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use serde::Deserialize;
use tracing::{
  debug,
  info
};

const CONFIG_ENV_VAR: &str =
  "TODAY_CONFIG";
const CONFIG_FILE: &str = "today.toml";

/// Settings read from `today.toml`:
///
/// ```toml
/// data_dir = "~/.today"
/// color = true
/// show_done = false
/// ```
#[derive(
  Debug, Clone, PartialEq, Eq, Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Directory holding the task list.
  pub data_dir:  Option<PathBuf>,
  pub color:     bool,
  /// Whether `list` starts with done
  /// tasks shown.
  pub show_done: bool,

  #[serde(skip)]
  pub source: Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_dir:  None,
      color:     true,
      show_done: true,
      source:    None
    }
  }
}

impl Config {
  /// Reads the file named by `--config`,
  /// else `$TODAY_CONFIG`, else
  /// `<config dir>/today/today.toml` when
  /// it exists. No file means defaults.
  #[tracing::instrument]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      config_path(config_override)
    else {
      debug!(
        "no config file; using defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg: Config =
      toml::from_str(&raw)
        .with_context(|| {
          format!(
            "invalid config {}",
            path.display()
          )
        })?;
    cfg.source = Some(path);
    Ok(cfg)
  }

  /// Applies one `--rc key=value`.
  pub fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    debug!(key, value, "applying override");
    match key {
      | "data_dir" => {
        self.data_dir =
          Some(PathBuf::from(value));
      }
      | "color" => {
        self.color =
          parse_switch(key, value)?;
      }
      | "show_done" => {
        self.show_done =
          parse_switch(key, value)?;
      }
      | other => {
        bail!("unknown setting: {other}")
      }
    }
    Ok(())
  }

  /// The data directory, created if
  /// missing. `--data` wins over the
  /// configured one; `~/.today` is the
  /// fallback.
  #[tracing::instrument(skip(self))]
  pub fn resolve_data_dir(
    &self,
    override_dir: Option<&Path>
  ) -> anyhow::Result<PathBuf> {
    let dir = match (
      override_dir,
      &self.data_dir
    ) {
      | (Some(path), _) => {
        path.to_path_buf()
      }
      | (None, Some(path)) => {
        expand_tilde(path)
      }
      | (None, None) => dirs::home_dir()
        .ok_or_else(|| {
          anyhow!(
            "cannot determine home \
             directory"
          )
        })?
        .join(".today")
    };

    if !dir.exists() {
      info!(dir = %dir.display(), "creating data directory");
      fs::create_dir_all(&dir)
        .with_context(|| {
          format!(
            "failed to create {}",
            dir.display()
          )
        })?;
    }
    Ok(dir)
  }
}

fn config_path(
  config_override: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = config_override {
    return Some(expand_tilde(path));
  }
  if let Some(path) =
    std::env::var_os(CONFIG_ENV_VAR)
    && !path.is_empty()
  {
    return Some(PathBuf::from(path));
  }
  dirs::config_dir()
    .map(|dir| {
      dir.join("today").join(CONFIG_FILE)
    })
    .filter(|path| path.is_file())
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  if let Ok(rest) =
    path.strip_prefix("~")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_switch(
  key: &str,
  value: &str
) -> anyhow::Result<bool> {
  match value
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "yes" | "on" | "true" => {
      Ok(true)
    }
    | "0" | "no" | "off" | "false" => {
      Ok(false)
    }
    | other => Err(anyhow!(
      "{key} expects on/off, got \
       {other:?}"
    ))
  }
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::path::PathBuf;

  use tempfile::tempdir;

  use super::Config;

  #[test]
  fn file_values_then_overrides() {
    let temp =
      tempdir().expect("tempdir");
    let path =
      temp.path().join("today.toml");
    fs::write(
      &path,
      "# mine\n\
       data_dir = \"/tmp/today\"\n\
       show_done = false\n"
    )
    .expect("write config");

    let mut cfg = Config::load(Some(
      path.as_path()
    ))
    .expect("load config");
    assert_eq!(
      cfg.data_dir,
      Some(PathBuf::from("/tmp/today"))
    );
    assert!(cfg.color);
    assert!(!cfg.show_done);
    assert_eq!(
      cfg.source.as_deref(),
      Some(path.as_path())
    );

    cfg
      .set("color", "off")
      .expect("color");
    cfg
      .set("show_done", "YES")
      .expect("show_done");
    assert!(!cfg.color);
    assert!(cfg.show_done);
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let temp =
      tempdir().expect("tempdir");
    let path =
      temp.path().join("today.toml");
    fs::write(&path, "colour = true\n")
      .expect("write config");

    let err = Config::load(Some(
      path.as_path()
    ))
    .expect_err("should fail");
    assert!(
      format!("{err:#}")
        .contains("invalid config")
    );

    let mut cfg = Config::default();
    assert!(
      cfg.set("list.show_done", "on")
        .is_err()
    );
    assert!(
      cfg.set("color", "maybe").is_err()
    );
    assert_eq!(cfg, Config::default());
  }

  #[test]
  fn missing_override_file_is_an_error()
  {
    let temp =
      tempdir().expect("tempdir");
    let path =
      temp.path().join("absent.toml");
    assert!(
      Config::load(Some(path.as_path()))
        .is_err()
    );
  }

  #[test]
  fn data_dir_override_is_created() {
    let temp =
      tempdir().expect("tempdir");
    let target =
      temp.path().join("a").join("b");
    let dir = Config::default()
      .resolve_data_dir(Some(
        target.as_path()
      ))
      .expect("resolve");
    assert_eq!(dir, target);
    assert!(target.is_dir());
  }

  #[test]
  fn configured_data_dir_is_used() {
    let temp =
      tempdir().expect("tempdir");
    let target = temp.path().join("c");
    let mut cfg = Config::default();
    cfg
      .set(
        "data_dir",
        &target.to_string_lossy()
      )
      .expect("data_dir");

    let dir = cfg
      .resolve_data_dir(None)
      .expect("resolve");
    assert_eq!(dir, target);
    assert!(target.is_dir());
  }
}
