//! Log line setup: `timestamp, LEVEL, message, target` on stdout, optionally
//! mirrored to a daily-rotated file.

use std::fmt::{self, Write as _};
use std::path::Path;

use chrono::Local;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_log::NormalizeEvent;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// `error!(critical = true, ...)` renders with the CRITICAL label.
pub const CRITICAL_FIELD: &str = "critical";

/// Prefix of the fields the `log` bridge attaches to forwarded records.
const LOG_BRIDGE_PREFIX: &str = "log.";

pub const LOG_FILE_NAME: &str = "hwbot.log";

#[derive(Debug, Clone, Copy, Default)]
pub struct CommaLineFormat;

impl<S, N> FormatEvent<S, N> for CommaLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Records forwarded from `log` (teloxide) carry their real target here.
        let normalized = event.normalized_metadata();
        let meta = normalized.as_ref().unwrap_or_else(|| event.metadata());

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let level = if visitor.critical {
            "CRITICAL".to_string()
        } else {
            meta.level().to_string()
        };

        writeln!(
            writer,
            "{}, {}, {}{}, {}",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level,
            visitor.message,
            visitor.extra,
            meta.target()
        )
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    extra: String,
    critical: bool,
}

impl Visit for MessageVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            CRITICAL_FIELD => self.critical = value,
            name if name.starts_with(LOG_BRIDGE_PREFIX) => {}
            name => {
                let _ = write!(self.extra, " {name}={value}");
            }
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message.push_str(value),
            CRITICAL_FIELD => {}
            name if name.starts_with(LOG_BRIDGE_PREFIX) => {}
            name => {
                let _ = write!(self.extra, " {name}={value}");
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => {
                let _ = write!(self.message, "{value:?}");
            }
            CRITICAL_FIELD => {}
            name if name.starts_with(LOG_BRIDGE_PREFIX) => {}
            name => {
                let _ = write!(self.extra, " {name}={value:?}");
            }
        }
    }
}

fn file_writer(dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file output is flushed.
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let layer = tracing_subscriber::fmt::layer()
                .event_format(CommaLineFormat)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(CommaLineFormat)
                .with_writer(std::io::stdout),
        )
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<String> {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .event_format(CommaLineFormat)
            .with_writer(out.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        out.lines()
    }

    #[test]
    fn formats_comma_separated_line() {
        let lines = capture(|| tracing::info!(target: "hwbot::poll", "Sent message"));
        assert_eq!(lines.len(), 1);
        let parts: Vec<&str> = lines[0].split(", ").collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1], "INFO");
        assert_eq!(parts[2], "Sent message");
        assert_eq!(parts[3], "hwbot::poll");
    }

    #[test]
    fn critical_field_changes_label_and_is_hidden() {
        let lines = capture(|| tracing::error!(target: "hwbot", critical = true, "no tokens"));
        assert!(lines[0].contains(", CRITICAL, no tokens, hwbot"));
        assert!(!lines[0].contains("critical=true"));
    }

    #[test]
    fn critical_false_keeps_error_label() {
        let lines = capture(|| tracing::error!(target: "hwbot", critical = false, "recoverable"));
        assert!(lines[0].contains(", ERROR, recoverable, hwbot"));
        assert!(!lines[0].contains("CRITICAL"));
    }

    #[test]
    fn bridged_log_records_keep_their_target() {
        // Another test may already have installed the bridge.
        let _ = tracing_log::LogTracer::init();
        let lines = capture(|| log::warn!(target: "teloxide::dispatching", "network hiccup"));
        assert_eq!(lines.len(), 1);
        let parts: Vec<&str> = lines[0].split(", ").collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1], "WARN");
        assert_eq!(parts[2], "network hiccup");
        assert_eq!(parts[3], "teloxide::dispatching");
        assert!(!lines[0].contains("log."));
    }

    #[test]
    fn extra_fields_follow_message() {
        let lines = capture(|| tracing::warn!(target: "t", attempt = 3, "retrying"));
        assert!(lines[0].contains(", WARN, retrying attempt=3, t"));
    }

    #[test]
    fn file_writer_creates_directory_and_log_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("logs");
        {
            let (mut writer, _guard) = file_writer(&dir).unwrap();
            writer.write_all(b"line\n").unwrap();
        }
        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|name| name.starts_with(LOG_FILE_NAME)));
    }
}
