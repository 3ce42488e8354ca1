use crate::record::Level;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Local, synchronous text output used when background delivery is not
/// available or has failed, and for local-development rendering.
pub trait FallbackSink: Send + Sync {
    fn write(&self, level: Level, line: &str);
}

/// Writes errors to stderr and everything else to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl FallbackSink for ConsoleSink {
    fn write(&self, level: Level, line: &str) {
        // A closed stdio handle has nowhere left to report to.
        let _ = match level {
            Level::Error => writeln!(std::io::stderr().lock(), "{}", line),
            _ => writeln!(std::io::stdout().lock(), "{}", line),
        };
    }
}

/// Keeps every line in memory, for tests and for hosts that collect local
/// output themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl FallbackSink for MemorySink {
    fn write(&self, level: Level, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, line.to_string()));
    }
}
