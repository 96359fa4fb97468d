//! Compact single-line event formatter for interactive use.
//!
//! `12:04:31.512  INFO pipeline{campus=FLO semester=20231}: cagr::crawler::pipeline: Parser finished pages=12 rows=584`

use chrono::Local;
use std::fmt::{self, Write as _};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;
use yansi::Paint;

pub struct CustomPrettyFormatter;

impl<S, N> FormatEvent<S, N> for CustomPrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let ansi = writer.has_ansi_escapes();
        let metadata = event.metadata();

        let timestamp = Local::now().format("%H:%M:%S%.3f").to_string();
        if ansi {
            write!(writer, "{} ", timestamp.dim())?;
        } else {
            write!(writer, "{timestamp} ")?;
        }

        write_level(&mut writer, metadata.level(), ansi)?;
        writer.write_char(' ')?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                if ansi {
                    write!(writer, "{}", span.name().bold())?;
                } else {
                    writer.write_str(span.name())?;
                }
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>()
                    && !fields.is_empty()
                {
                    write!(writer, "{{{fields}}}")?;
                }
                writer.write_str(": ")?;
            }
        }

        if ansi {
            write!(writer, "{}: ", metadata.target().dim())?;
        } else {
            write!(writer, "{}: ", metadata.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn write_level(writer: &mut Writer<'_>, level: &Level, ansi: bool) -> fmt::Result {
    let label = format!("{:>5}", level.as_str());
    if !ansi {
        return writer.write_str(&label);
    }

    let painted = match *level {
        Level::ERROR => label.red().bold(),
        Level::WARN => label.yellow().bold(),
        Level::INFO => label.green(),
        Level::DEBUG => label.blue(),
        Level::TRACE => label.magenta(),
    };
    write!(writer, "{painted}")
}
