use crate::types::LogLevel;

/// Trait for delivering status messages from the engine to the host.
///
/// The control channel supplies an implementation that forwards messages to
/// connected clients; tests use [`CollectSink`] to make assertions about what
/// the engine reported. Messages must be delivered in emission order; sinks
/// may forward asynchronously but must not reorder.
pub trait MessageSink {
    /// Delivers one message at the given level.
    fn send(&mut self, text: &str, level: LogLevel);
}

/// Default sink that prints messages to stdout.
///
/// `Debug` messages are routed to the `log` facade instead of stdout so the
/// user-facing channel stays readable; run with `RUST_LOG=debug` to see them.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn send(&mut self, text: &str, level: LogLevel) {
        if level == LogLevel::Debug {
            log::debug!("{text}");
        } else {
            println!("[{level}] {text}");
        }
    }
}

/// Sink that records every message, including debug traces.
///
/// Useful for testing and for capturing engine output programmatically.
#[derive(Debug, Default)]
pub struct CollectSink {
    messages: Vec<(LogLevel, String)>,
}

impl CollectSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages in emission order.
    #[must_use]
    pub fn messages(&self) -> &[(LogLevel, String)] {
        &self.messages
    }

    /// Consumes the sink and returns the recorded messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<(LogLevel, String)> {
        self.messages
    }

    /// Returns true if any message at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.messages
            .iter()
            .any(|(l, text)| *l == level && text.contains(needle))
    }
}

impl MessageSink for CollectSink {
    fn send(&mut self, text: &str, level: LogLevel) {
        self.messages.push((level, text.to_string()));
    }
}

/// Sink that discards all messages.
#[derive(Debug, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn send(&mut self, _text: &str, _level: LogLevel) {}
}
