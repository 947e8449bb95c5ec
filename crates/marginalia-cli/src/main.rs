//! `marginalia` - headless access to the Marginalia note store.
//!
//! Works on the same data directory as the desktop app, so it can list,
//! capture and export notes from scripts or a terminal.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use marginalia_core::export::{display_title, export_markdown};
use marginalia_core::paths::DATA_DIR_ENV;
use marginalia_core::persistence::QuickCapturePosition;
use marginalia_core::{AppSettings, MarginaliaContext, Note};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "marginalia", version, about = "Marginalia note store")]
struct Cli {
    /// Directory holding notes.json and settings.json
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List notes, pinned first, optionally filtered by a search query
    List { query: Option<String> },

    /// Save a note immediately, like the quick capture popup
    Capture { title: String, body: Option<String> },

    /// Write every note as a markdown file into DIR
    Export { dir: PathBuf },

    /// Show or change app settings
    Settings {
        /// Enable or disable the quick capture popup
        #[arg(long, value_enum)]
        quick_capture: Option<Toggle>,

        /// Where the quick capture popup appears (e.g. bottom-right)
        #[arg(long)]
        position: Option<QuickCapturePosition>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

/// One line of `list` output: pin marker, id, title.
fn format_note_line(note: &Note) -> String {
    let marker = if note.is_pinned() { '*' } else { ' ' };
    format!("{} {}  {}", marker, note.id, display_title(note))
}

fn format_settings(settings: &AppSettings) -> String {
    let enabled = if settings.quick_capture.enabled {
        "on"
    } else {
        "off"
    };
    format!(
        "quick capture: {}\nposition: {}",
        enabled, settings.quick_capture.position
    )
}

fn run_command(
    context: &MarginaliaContext,
    command: Command,
    out: &mut impl Write,
) -> Result<(), String> {
    let repository = context.repository();

    match command {
        Command::List { query } => {
            for note in repository.filtered_view(query.as_deref().unwrap_or_default()) {
                writeln!(out, "{}", format_note_line(&note)).map_err(|e| e.to_string())?;
            }
        }
        Command::Capture { title, body } => {
            let note = repository
                .capture(title, body.unwrap_or_default())
                .map_err(|e| format!("Failed to save note: {e}"))?;
            writeln!(out, "{}", note.id).map_err(|e| e.to_string())?;
        }
        Command::Export { dir } => {
            let written = export_markdown(&repository.notes(), &dir)
                .map_err(|e| format!("Failed to export notes: {e}"))?;
            writeln!(out, "Exported {} notes to {}", written.len(), dir.display())
                .map_err(|e| e.to_string())?;
        }
        Command::Settings {
            quick_capture,
            position,
        } => {
            let mut settings = context.settings();
            if quick_capture.is_some() || position.is_some() {
                if let Some(toggle) = quick_capture {
                    settings.quick_capture.enabled = toggle == Toggle::On;
                }
                if let Some(position) = position {
                    settings.quick_capture.position = position;
                }
                context
                    .update_settings(settings.clone())
                    .map_err(|e| format!("Failed to save settings: {e}"))?;
            }
            writeln!(out, "{}", format_settings(&settings)).map_err(|e| e.to_string())?;
        }
    }

    Ok(())
}

/// Open the store, run one command and flush before returning.
fn run(cli: Cli, out: &mut impl Write) -> Result<(), String> {
    let mut builder = MarginaliaContext::builder();
    if let Some(dir) = cli.data_dir {
        builder = builder.data_dir(dir);
    }
    let context = builder.build().map_err(|e| e.to_string())?;

    let result = run_command(&context, cli.command, out);
    context
        .shutdown()
        .map_err(|e| format!("Failed to save notes: {e}"))?;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER),
    )
    .init();

    let cli = Cli::parse();
    log::debug!("Running {:?}", cli.command);

    match run(cli, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("marginalia: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cli(data_dir: &std::path::Path, args: &[&str]) -> Cli {
        let mut argv = vec!["marginalia", "--data-dir", data_dir.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn run_to_string(data_dir: &std::path::Path, args: &[&str]) -> String {
        let mut out = Vec::new();
        run(cli(data_dir, args), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_settings_flags() {
        let parsed = Cli::try_parse_from([
            "marginalia",
            "settings",
            "--quick-capture",
            "off",
            "--position",
            "top-left",
        ])
        .unwrap();

        match parsed.command {
            Command::Settings {
                quick_capture,
                position,
            } => {
                assert_eq!(quick_capture, Some(Toggle::Off));
                assert_eq!(position, Some(QuickCapturePosition::TopLeft));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_position() {
        let result = Cli::try_parse_from(["marginalia", "settings", "--position", "middle"]);
        assert!(result.is_err());
    }

    #[test]
    fn note_line_marks_pinned_and_untitled() {
        let mut note = Note::new("", "");
        note.id = "abc".to_string();
        assert_eq!(format_note_line(&note), "  abc  Untitled");

        note.title = "Plans".to_string();
        note.pinned = Some(true);
        assert_eq!(format_note_line(&note), "* abc  Plans");
    }

    #[tokio::test]
    async fn list_shows_seed_notes_on_first_run() {
        let dir = tempdir().unwrap();

        let output = run_to_string(dir.path(), &["list"]);

        assert!(output.contains("welcome  Welcome to Marginalia"));
        assert_eq!(output.lines().count(), 3);
    }

    #[tokio::test]
    async fn capture_then_list_with_query() {
        let dir = tempdir().unwrap();

        let id = run_to_string(dir.path(), &["capture", "Groceries", "milk"]);
        let output = run_to_string(dir.path(), &["list", "groceries"]);

        assert_eq!(output.trim_end(), format!("  {}  Groceries", id.trim()));
        assert!(dir.path().join("notes.json").exists());
    }

    #[tokio::test]
    async fn export_writes_markdown_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("export");

        let output = run_to_string(dir.path(), &["export", target.to_str().unwrap()]);

        assert!(output.starts_with("Exported 3 notes"));
        assert!(target.join("Welcome to Marginalia.md").exists());
    }

    #[tokio::test]
    async fn settings_are_updated_and_printed() {
        let dir = tempdir().unwrap();

        let output = run_to_string(dir.path(), &["settings", "--quick-capture", "off"]);
        assert_eq!(output, "quick capture: off\nposition: bottom-right\n");

        let output = run_to_string(dir.path(), &["settings"]);
        assert_eq!(output, "quick capture: off\nposition: bottom-right\n");
    }
}
