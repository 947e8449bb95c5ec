use std::env;
use std::path::PathBuf;

/// Overrides the data directory (tests, portable installs).
pub const DATA_DIR_ENV: &str = "MARGINALIA_DATA_DIR";

const APP_DIR_NAME: &str = "Marginalia";

/// Return the user's home directory path.
///
/// Uses HOME on Unix-like systems and USERPROFILE on Windows.
pub fn get_home_dir() -> Result<String, String> {
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return Ok(home);
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.is_empty() {
            return Ok(profile);
        }
    }

    Err("Home directory not set".to_string())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Platform directory for per-user application data.
fn app_data_root() -> Result<PathBuf, String> {
    if cfg!(target_os = "macos") {
        return Ok(PathBuf::from(get_home_dir()?)
            .join("Library")
            .join("Application Support"));
    }

    if cfg!(windows) {
        if let Some(appdata) = non_empty_var("APPDATA") {
            return Ok(PathBuf::from(appdata));
        }
    } else if let Some(xdg) = non_empty_var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg));
    }

    Ok(PathBuf::from(get_home_dir()?).join(".config"))
}

/// Directory holding `notes.json` and `settings.json`.
///
/// `MARGINALIA_DATA_DIR` wins when set; otherwise the platform app-data
/// directory joined with `Marginalia`.
pub fn default_data_dir() -> Result<PathBuf, String> {
    if let Some(dir) = non_empty_var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    Ok(app_data_root()?.join(APP_DIR_NAME))
}
