use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Country dialing prefix prepended to local phone numbers (e.g. "+233")
  #[serde(default = "default_dialing_prefix")]
  pub dialing_prefix: String,
}

/// Base URLs for the three backend surfaces.
///
/// The backend splits its routes by privilege: admin routes for management
/// operations, user routes for frontdesk work scoped to the caller's office,
/// and a public offices surface for location listings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub admin_url: String,
  pub user_url: String,
  pub offices_url: String,
}

fn default_dialing_prefix() -> String {
  "+233".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./courierdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/courierdesk/config.yaml
  /// 4. ~/.config/courierdesk/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/courierdesk/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("courierdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("courierdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get a previously issued bearer token from the environment.
  ///
  /// Checks COURIERDESK_TOKEN. Absence is not an error: a session can also
  /// start unauthenticated and obtain its token through login.
  pub fn env_token() -> Option<String> {
    std::env::var("COURIERDESK_TOKEN").ok()
  }
}
