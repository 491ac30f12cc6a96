use std::io::Write;
use std::sync::{Arc, Mutex};

use super::protocol::{ProtocolEvent, StructuredLine, decode};

/// Line-oriented text sink for progress output.
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes to standard output, one line at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        // A closed stdout must not take the run down with it.
        let _ = writeln!(lock, "{line}");
        let _ = lock.flush();
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Lines that decode as structured messages.
    pub fn structured(&self) -> Vec<StructuredLine> {
        self.lines().iter().filter_map(|l| decode(l)).collect()
    }

    /// Lines that decode as known protocol events.
    pub fn events(&self) -> Vec<ProtocolEvent> {
        self.lines()
            .iter()
            .filter_map(|l| ProtocolEvent::from_line(l))
            .collect()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}

/// Fans every line out to several sinks.
#[derive(Clone, Default)]
pub struct TeeSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for TeeSink {
    fn write_line(&self, line: &str) {
        for sink in &self.sinks {
            sink.write_line(line);
        }
    }
}
