use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::VecDeque;
use std::fmt;

pub const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogSource {
    Master,
    Sentry,
    Telemetry,
    System,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogSource::Master => "MASTER",
            LogSource::Sentry => "SENTRY",
            LogSource::Telemetry => "TELEMETRY",
            LogSource::System => "SYSTEM",
        };
        f.write_str(label)
    }
}

/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub source: LogSource,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, source: LogSource, message: impl Into<String>) -> Self {
        Self { timestamp, source, message: message.into() }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.timestamp.format("%H:%M:%S"), self.source, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    recorded: u64,
}

impl Default for LogBook {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl LogBook {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            recorded: 0,
        }
    }

    /// Prepends `entry`, then drops everything past `capacity + 1`.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity + 1);
        self.recorded += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Total entries ever pushed, including evicted ones.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }
}

impl Serialize for LogBook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub message: String,
    pub severity: Severity,
}

impl Alert {
    pub fn warning(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Warning }
    }
}

/// Identifies one raised alert so that its expiry cannot clear a successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlertTicket(u64);

#[derive(Debug, Clone)]
struct LiveAlert {
    ticket: AlertTicket,
    alert: Alert,
}

#[derive(Debug, Default)]
pub struct AlertSlot {
    live: Option<LiveAlert>,
    next_ticket: u64,
}

impl AlertSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever is live.
    pub fn raise(&mut self, alert: Alert) -> AlertTicket {
        let ticket = AlertTicket(self.next_ticket);
        self.next_ticket += 1;
        self.live = Some(LiveAlert { ticket, alert });
        ticket
    }

    /// Clears the slot only if `ticket` still owns it.
    pub fn expire(&mut self, ticket: AlertTicket) -> bool {
        match &self.live {
            Some(live) if live.ticket == ticket => {
                self.live = None;
                true
            }
            _ => false,
        }
    }

    pub fn dismiss(&mut self) -> Option<Alert> {
        self.live.take().map(|live| live.alert)
    }

    pub fn current(&self) -> Option<&Alert> {
        self.live.as_ref().map(|live| &live.alert)
    }
}
