//! Call stack filtering for log attribution and panic reports.
//!
//! Everything here works on the text rendering of [`std::backtrace::Backtrace`],
//! so the formatting functions are pure and can be fed captured stacks.

use std::backtrace::Backtrace;
use std::io::{self, Write};

use super::error::Error;

/// Crate path prefix identifying frames that belong to this project.
const PROJECT_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

/// Project files that are plumbing rather than failure sites.
pub const IGNORE_PATHS: &[&str] = &[
    "src/errors/",
    "src/api/response.rs",
    "src/api/middleware/",
    "src/api/routes.rs",
    "src/graphql/presenter.rs",
    "src/metrics/middleware.rs",
    "generated",
    "_gen.rs",
];

/// Macro-generated trait shims whose frames point at attribute lines.
pub const IGNORE_SYMBOLS: &[&str] = &[" as async_graphql::", " as axum::", " as tower::"];

const END: &str = "\x1b[0m";
const RED: &str = "\x1b[38;5;1m";
const DARK: &str = "\x1b[38;5;236m";
const GRAY: &str = "\x1b[38;5;239m";
const WHITE: &str = "\x1b[38;5;249m";

/// One symbol of a rendered backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Frame {
    fn new(function: &str) -> Self {
        Self {
            function: function.to_string(),
            file: None,
            line: None,
        }
    }

    pub fn is_project(&self) -> bool {
        self.function.trim_start_matches('<').starts_with(PROJECT_PREFIX)
    }

    pub fn is_ignored(&self) -> bool {
        let path_ignored = self
            .relative_file()
            .map(|file| IGNORE_PATHS.iter().any(|pattern| file.contains(pattern)))
            .unwrap_or(false);

        path_ignored
            || IGNORE_SYMBOLS
                .iter()
                .any(|pattern| self.function.contains(pattern))
    }

    /// File path relative to the project root when it lives under it.
    pub fn relative_file(&self) -> Option<&str> {
        self.file.as_deref().map(relative_path)
    }

    /// `path/to/file.rs:line`, project relative.
    pub fn location(&self) -> Option<String> {
        let file = self.relative_file()?;
        Some(match self.line {
            Some(line) => format!("{}:{}", file, line),
            None => file.to_string(),
        })
    }

    fn plain(&self) -> String {
        match self.location() {
            Some(location) => format!("{} at {}", self.function, location),
            None => self.function.clone(),
        }
    }
}

fn relative_path(file: &str) -> &str {
    if let Some(rest) = file.strip_prefix(env!("CARGO_MANIFEST_DIR")) {
        return rest.trim_start_matches('/');
    }
    file.strip_prefix("./").unwrap_or(file)
}

fn parse_location(raw: &str) -> (String, Option<u32>) {
    let mut parts = raw.rsplitn(3, ':');
    let column = parts.next();
    let line = parts.next();
    let file = parts.next();

    match (file, line.and_then(|l| l.parse().ok()), column) {
        (Some(file), Some(line), Some(_)) => (file.to_string(), Some(line)),
        _ => match raw.rsplit_once(':') {
            Some((file, line)) if line.parse::<u32>().is_ok() => {
                (file.to_string(), line.parse().ok())
            }
            _ => (raw.to_string(), None),
        },
    }
}

/// Parse the text rendering of a backtrace into frames.
pub fn parse_frames(raw: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("note:") {
            continue;
        }

        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let (file, line) = parse_location(location);
                frame.file = Some(file);
                frame.line = line;
            }
            continue;
        }

        let function = match trimmed.split_once(": ") {
            Some((index, name)) if index.chars().all(|c| c.is_ascii_digit()) => name,
            _ => trimmed,
        };
        frames.push(Frame::new(function));
    }

    frames
}

/// First project frame in `raw` that is not plumbing.
pub fn caller_from(raw: &str) -> String {
    parse_frames(raw)
        .iter()
        .filter(|frame| frame.is_project() && !frame.is_ignored())
        .find_map(Frame::location)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Location of the code that led to the current call, skipping error
/// handling, presenters, middleware and generated code.
pub fn caller() -> String {
    caller_from(&Backtrace::force_capture().to_string())
}

/// Write `raw` as an annotated, colored stack below a highlighted `title`.
pub fn write_stack<W: Write>(w: &mut W, title: &str, raw: &str) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{}{}{}", RED, title, END)?;

    for frame in parse_frames(raw) {
        if frame.is_project() && !frame.is_ignored() {
            if let (Some(file), Some(line)) = (frame.relative_file(), frame.line) {
                let (dir, name) = match file.rsplit_once('/') {
                    Some((dir, name)) => (format!("{}/", dir), name),
                    None => (String::new(), file),
                };
                writeln!(
                    w,
                    "{}{}{}{}:{}{}  {}{}",
                    WHITE, dir, RED, name, line, GRAY, frame.function, END
                )?;
                continue;
            }
        }

        let color = if frame.is_project() { GRAY } else { DARK };
        writeln!(w, "{}{}{}", color, frame.plain(), END)?;
    }

    Ok(())
}

/// [`write_stack`] over the stack of the calling thread.
pub fn write_current_stack<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    write_stack(w, title, &Backtrace::force_capture().to_string())
}

/// Replace the default panic output with a structured log line attributed to
/// the panicking project frame, followed by the filtered stack on stderr.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let raw = Backtrace::force_capture().to_string();
        let err = Error::from_panic(info.payload());

        let mut file = caller_from(&raw);
        if file == "unknown" {
            if let Some(location) = info.location() {
                file = format!("{}:{}", relative_path(location.file()), location.line());
            }
        }

        tracing::error!(error = %err, file = %file, "panic");

        let title = format!("{} ({})", err, file);
        let mut stderr = io::stderr().lock();
        if let Err(e) = write_stack(&mut stderr, &title, &raw) {
            tracing::warn!("Failed to write panic stack: {}", e);
        }
    }));
}
