use log::warn;

/// Diagnostic sink injected into the inference and parsing cores.
///
/// The reusable engine never writes to the console directly; callers decide
/// where soft warnings go (the CLI routes them to the `log` facade, tests
/// collect them into a buffer).
pub trait Reporter {
    fn warn(&mut self, message: &str);
}

/// Routes diagnostics through the `log` facade.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn warn(&mut self, message: &str) {
        warn!("{message}");
    }
}

/// Collects diagnostics for inspection; used by tests and the `check` command
/// summary.
#[derive(Debug, Default)]
pub struct BufferedReporter {
    pub messages: Vec<String>,
}

impl Reporter for BufferedReporter {
    fn warn(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
