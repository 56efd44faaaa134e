use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Single-line formatter: level, module path and calling function, the span chain
/// with its fields, then the message and any extra fields.
#[derive(Debug, Default)]
pub struct SubmissionFormatter;

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    function: Option<String>,
    other_fields: Vec<(&'static str, String)>,
}

impl EventVisitor {
    fn record(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            "function" => self.function = Some(value),
            name => self.other_fields.push((name, value)),
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let raw = format!("{value:?}");
        let cleaned = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .map(str::to_string)
            .unwrap_or(raw);
        self.record(field, cleaned);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }
}

impl<S, N> FormatEvent<S, N> for SubmissionFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let module_path = metadata.module_path().unwrap_or_else(|| metadata.target());

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        write!(writer, "{} {module_path}", metadata.level())?;
        if let Some(function) = visitor.function {
            // The macros report the full path; keep only what follows the module.
            let function = function
                .strip_prefix(module_path)
                .and_then(|f| f.strip_prefix("::"))
                .unwrap_or(&function);
            write!(writer, "::{function}")?;
        }

        if let Some(scope) = ctx.event_scope() {
            let mut spans = Vec::new();
            for span in scope.from_root() {
                let extensions = span.extensions();
                let fields = extensions
                    .get::<FormattedFields<N>>()
                    .map(|fields| fields.to_string())
                    .unwrap_or_default();
                if fields.is_empty() {
                    spans.push(span.name().to_string());
                } else {
                    spans.push(format!("{}{{{fields}}}", span.name()));
                }
            }
            if !spans.is_empty() {
                write!(writer, " [{}]", spans.join("::"))?;
            }
        }

        write!(writer, ":")?;
        if let Some(message) = visitor.message {
            write!(writer, " {message}")?;
        }
        for (name, value) in visitor.other_fields {
            write!(writer, " {name}={value}")?;
        }
        writeln!(writer)
    }
}

/// Default filter directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the verbosity default.
pub fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .event_format(SubmissionFormatter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct BufferWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl BufferWriter {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
        }
    }

    fn install_test_subscriber() -> (BufferWriter, DefaultGuard) {
        let writer = BufferWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .event_format(SubmissionFormatter)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (writer, guard)
    }

    #[test]
    fn line_carries_level_function_and_message() {
        let (writer, guard) = install_test_subscriber();
        crate::log_warn!("skipping {}", "passport.pdf");
        drop(guard);

        let output = writer.contents();
        assert!(output.starts_with("WARN "), "output was: {output:?}");
        assert!(
            output.contains(
                "jira_webform::logging::tests::line_carries_level_function_and_message:"
            ),
            "output missing module/function: {output:?}"
        );
        assert!(output.contains("skipping passport.pdf"), "output was: {output:?}");
    }

    #[test]
    fn span_fields_are_printed() {
        let (writer, guard) = install_test_subscriber();
        tracing::info_span!("submission", title = "Travel Request").in_scope(|| {
            tracing::info!(issue_id = "77", "created");
        });
        drop(guard);

        let output = writer.contents();
        assert!(
            output.contains("[submission{title=\"Travel Request\"}]"),
            "output was: {output:?}"
        );
        assert!(output.contains(": created issue_id=77"), "output was: {output:?}");
    }

    #[test]
    fn verbosity_raises_default_level() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(4), "trace");
    }
}

#[macro_export]
#[doc(hidden)]
macro_rules! __log_function_path {
    () => {{
        fn __type_name_of<T>(_value: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = __type_name_of(|| {});
        match name.find("::{{closure") {
            Some(index) => &name[..index],
            None => name,
        }
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        tracing::trace!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        tracing::debug!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        tracing::info!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        tracing::warn!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        tracing::error!(function = %$crate::__log_function_path!(), $($arg)*);
    }};
}
