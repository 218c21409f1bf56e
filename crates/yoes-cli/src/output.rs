//! How `yoes` commands print reports and errors.
//!
//! Handlers build a serializable report and pass it to [`render_mode`] with
//! a pretty renderer (trees, sections) and a text renderer (tab-separated
//! lines for pipes). JSON is derived from the report itself.
//!
//! # Choosing a mode
//!
//! First match wins:
//! 1. `--format`, or the hidden `--json` shorthand
//! 2. `YOES_FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `output` in the user config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use yoes_core::error::{ErrorCode, GraphError};
use yoes_core::lock::LockError;
use yoes_core::model::ParseEnumError;

use crate::cmd::HostError;

/// Width of the rule under pretty section headings.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// A full-width dashed rule.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Heading line plus rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// Output format for reports and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (trees, sections, visual framing).
    Pretty,
    /// Plain line-oriented text for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some(Self::Pretty),
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Pure precedence rules behind [`resolve_output_mode`].
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next source.
    if let Some(mode) = [format_env, user_output]
        .into_iter()
        .flatten()
        .find_map(OutputMode::from_name)
    {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, user config, and
/// TTY defaults.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    user_output: Option<&str>,
) -> OutputMode {
    let env_val = std::env::var("YOES_FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(
        format_flag,
        json_flag,
        env_val.as_deref(),
        user_output,
        is_tty,
    )
}

/// Render a serializable value into `w` with explicit pretty/text renderers.
pub fn render_mode_to<T: Serialize>(
    w: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, value)?;
            writeln!(w)?;
        }
        OutputMode::Text => text_fn(value, w)?,
        OutputMode::Pretty => pretty_fn(value, w)?,
    }
    Ok(())
}

/// Render a serializable value to stdout with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_mode_to(&mut out, mode, value, text_fn, pretty_fn)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An error as shown to the editor: message, hint, and `E####` code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Full `anyhow` chain, outermost first.
    pub message: String,
    /// Hint attached to the error code, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// An error with no code attached.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Attach the code and hint of `code`.
    #[must_use]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.error_code = Some(code.code().to_string());
        self.suggestion = code.hint().map(str::to_string);
        self
    }
}

/// Find the most specific [`ErrorCode`] in an error chain.
pub fn error_code_of(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(host) = cause.downcast_ref::<HostError>() {
            Some(host.code())
        } else if let Some(graph) = cause.downcast_ref::<GraphError>() {
            Some(graph.code())
        } else if let Some(lock) = cause.downcast_ref::<LockError>() {
            Some(lock.code())
        } else if let Some(parse) = cause.downcast_ref::<ParseEnumError>() {
            Some(if parse.expected == "level" {
                ErrorCode::InvalidLevel
            } else {
                ErrorCode::InvalidEdgeKind
            })
        } else if cause.downcast_ref::<toml::de::Error>().is_some() {
            Some(ErrorCode::ConfigParseError)
        } else if cause.downcast_ref::<rusqlite::Error>().is_some() {
            Some(ErrorCode::StoreWriteFailed)
        } else {
            None
        }
    })
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let base = Self::new(format!("{err:#}"));
        match error_code_of(err) {
            Some(code) => base.with_code(code),
            None => base,
        }
    }
}

/// Render an error into `w` in the requested format.
pub fn render_error_to(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(w, "error[{code}]: {}", error.message)?,
                None => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// [`render_error_to`] on stderr.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    render_error_to(&mut out, mode, error)
}
