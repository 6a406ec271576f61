//! Busy indicators for the one-shot commands.
//!
//! While a flow waits on the backend the CLI shows what it is doing:
//! `Loading documents...`, `Submitting...` or `Loading...` for chat.
//! Indicators go to **stderr** so stdout stays parseable when `--json` is used.
//!
//! | Mode | Output |
//! |------|--------|
//! | `human` | one plain line per event |
//! | `json` | one JSON object per line |
//! | `off` | nothing |

use std::io::Write;
use std::str::FromStr;

/// Which flow an event belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Feed,
    Submit,
    Chat,
}

impl Flow {
    pub fn name(&self) -> &'static str {
        match self {
            Flow::Feed => "feed",
            Flow::Submit => "submit",
            Flow::Chat => "chat",
        }
    }

    fn busy_label(&self) -> &'static str {
        match self {
            Flow::Feed => "Loading documents...",
            Flow::Submit => "Submitting...",
            Flow::Chat => "Loading...",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatusEvent {
    /// A backend call started.
    Busy { flow: Flow },
    /// The call finished; `ok` is false when it failed.
    Settled { flow: Flow, ok: bool },
}

/// Reports flow status. Implementations write to stderr.
pub trait StatusReporter: Send + Sync {
    fn report(&self, event: StatusEvent);
}

pub struct HumanStatus;

impl StatusReporter for HumanStatus {
    fn report(&self, event: StatusEvent) {
        // Failures are printed by the command itself.
        if let StatusEvent::Busy { flow } = event {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", flow.busy_label());
            let _ = err.flush();
        }
    }
}

pub struct JsonStatus;

impl StatusReporter for JsonStatus {
    fn report(&self, event: StatusEvent) {
        let obj = match &event {
            StatusEvent::Busy { flow } => serde_json::json!({
                "event": "busy",
                "flow": flow.name(),
            }),
            StatusEvent::Settled { flow, ok } => serde_json::json!({
                "event": "settled",
                "flow": flow.name(),
                "ok": ok,
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
            let _ = err.flush();
        }
    }
}

pub struct NoStatus;

impl StatusReporter for NoStatus {
    fn report(&self, _event: StatusEvent) {}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusMode {
    Off,
    Human,
    Json,
}

impl StatusMode {
    /// Human indicators when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            StatusMode::Human
        } else {
            StatusMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn StatusReporter> {
        match self {
            StatusMode::Off => Box::new(NoStatus),
            StatusMode::Human => Box::new(HumanStatus),
            StatusMode::Json => Box::new(JsonStatus),
        }
    }
}

impl FromStr for StatusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(StatusMode::Off),
            "human" => Ok(StatusMode::Human),
            "json" => Ok(StatusMode::Json),
            other => Err(format!(
                "unknown status mode '{}' (expected off, human or json)",
                other
            )),
        }
    }
}
