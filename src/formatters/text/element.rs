//! Renderers for header elements
//!
//! Each renderer appends one record field to the output buffer. Without a
//! custom format specifier it writes straight into the buffer; with one, the
//! field is first rendered into a private scratch buffer that is reused by
//! the next call.

use super::fmtspec::{Arg, FmtSpec};
use super::layout;
use crate::core::{Context, LogRecord};
use crate::formatters::last_segments;
use chrono::format::Item;
use std::fmt::Write as _;
use std::io::Write as _;

const LEVEL_NAMES: [&str; 6] = ["TRACE", "DEBUG", "INFO ", "WARN ", "ERROR", "FATAL"];
const LEVEL_CHARS: [&str; 6] = ["T", "D", "I", "W", "E", "F"];

const FILE_SEP: &str = "/";
const PATH_SEP: &str = "::";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextStyle {
    Pair,
    List,
}

#[derive(Debug, Clone)]
enum Kind {
    Time(Vec<Item<'static>>),
    Level(&'static [&'static str; 6]),
    File(usize),
    Line,
    Pkg(usize),
    Func(usize),
    Context(ContextStyle),
    Prefix,
    Msg,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    kind: Kind,
    spec: Option<FmtSpec>,
    scratch: String,
}

impl Element {
    /// Build the renderer for a placeholder, or `None` for unknown names.
    /// `name` must already be lowercased.
    pub fn new(name: &str, property: &str, fmtspec: &str) -> Option<Element> {
        let segments = || property.parse::<usize>().unwrap_or(0);
        let kind = match name {
            "time" => Kind::Time(layout::compile(property)),
            "level" => {
                if property.eq_ignore_ascii_case("char") {
                    Kind::Level(&LEVEL_CHARS)
                } else {
                    Kind::Level(&LEVEL_NAMES)
                }
            }
            "file" => Kind::File(segments()),
            "line" => Kind::Line,
            "pkg" => Kind::Pkg(segments()),
            "func" => Kind::Func(segments()),
            "context" => {
                if property.eq_ignore_ascii_case("list") {
                    Kind::Context(ContextStyle::List)
                } else {
                    Kind::Context(ContextStyle::Pair)
                }
            }
            "prefix" => Kind::Prefix,
            "msg" => Kind::Msg,
            _ => return None,
        };
        let default = if matches!(kind, Kind::Line) { "%d" } else { "%s" };
        Some(Element {
            kind,
            spec: FmtSpec::parse(fmtspec, default),
            scratch: String::new(),
        })
    }

    pub fn render(&mut self, record: &LogRecord<'_>, buf: &mut Vec<u8>) {
        match &self.spec {
            None => self.render_plain(record, buf),
            Some(spec) => {
                self.scratch.clear();
                let arg = match &self.kind {
                    Kind::Time(items) => {
                        let _ = write!(
                            self.scratch,
                            "{}",
                            record.timestamp.format_with_items(items.iter())
                        );
                        Arg::Str(&self.scratch)
                    }
                    Kind::Context(style) => {
                        write_contexts(&mut self.scratch, &record.aux.contexts, *style);
                        Arg::Str(&self.scratch)
                    }
                    Kind::Line => Arg::Int(i64::from(record.line)),
                    kind => Arg::Str(text_of(kind, record)),
                };
                spec.render(arg, buf);
            }
        }
    }

    fn render_plain(&self, record: &LogRecord<'_>, buf: &mut Vec<u8>) {
        match &self.kind {
            Kind::Time(items) => {
                let _ = write!(buf, "{}", record.timestamp.format_with_items(items.iter()));
            }
            Kind::Line => {
                let _ = write!(buf, "{}", record.line);
            }
            Kind::Context(style) => {
                let mut out = ByteSink(buf);
                write_contexts(&mut out, &record.aux.contexts, *style);
            }
            kind => buf.extend_from_slice(text_of(kind, record).as_bytes()),
        }
    }
}

fn text_of<'r>(kind: &Kind, record: &'r LogRecord<'_>) -> &'r str {
    match kind {
        Kind::Level(names) => names[record.level.index()],
        Kind::File(n) => last_segments(record.file, *n, FILE_SEP),
        Kind::Pkg(n) => last_segments(record.package, *n, PATH_SEP),
        Kind::Func(n) => last_segments(record.function, *n, PATH_SEP),
        Kind::Prefix => record.aux.prefix,
        Kind::Msg => record.message,
        Kind::Time(_) | Kind::Line | Kind::Context(_) => "",
    }
}

/// `fmt::Write` over the output buffer, so contexts can be rendered into
/// either the buffer or the scratch string by the same code.
struct ByteSink<'a>(&'a mut Vec<u8>);

impl std::fmt::Write for ByteSink<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

fn write_contexts<W: std::fmt::Write>(out: &mut W, contexts: &[Context], style: ContextStyle) {
    let (open, close, sep) = match style {
        ContextStyle::Pair => ("(", ")", " "),
        ContextStyle::List => ("", "", ", "),
    };
    for (i, ctx) in contexts.iter().enumerate() {
        if i > 0 {
            let _ = out.write_str(sep);
        }
        let _ = write!(out, "{}{}: {}{}", open, ctx.key, ctx.value, close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Auxiliary, CallSite, LogLevel};
    use std::borrow::Cow;

    fn render(name: &str, property: &str, fmtspec: &str, record: &LogRecord<'_>) -> String {
        let mut element = Element::new(name, property, fmtspec).expect("known element");
        let mut buf = Vec::new();
        element.render(record, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> LogRecord<'static> {
        LogRecord::new(LogLevel::Info, "hello")
            .with_call_site(&CallSite::new("/src/net/server.rs", 42, "app::net", "Server::run"))
            .with_aux(Auxiliary {
                prefix: "** ",
                contexts: Cow::Owned(vec![Context::new("k1", "v1"), Context::new("k2", "v2")]),
                mark: false,
            })
    }

    #[test]
    fn test_unknown_element() {
        assert!(Element::new("bogus", "", "").is_none());
    }

    #[test]
    fn test_level_forms() {
        let record = sample();
        assert_eq!(render("level", "", "", &record), "INFO ");
        assert_eq!(render("level", "char", "", &record), "I");
        assert_eq!(render("level", "", "%-6s|", &record), "INFO  |");
    }

    #[test]
    fn test_path_elements() {
        let record = sample();
        assert_eq!(render("file", "", "", &record), "/src/net/server.rs");
        assert_eq!(render("file", "1", "", &record), "server.rs");
        assert_eq!(render("pkg", "1", "", &record), "net");
        assert_eq!(render("func", "1", "", &record), "run");
        assert_eq!(render("file", "1", "%12s", &record), "   server.rs");
    }

    #[test]
    fn test_line_element() {
        let record = sample();
        assert_eq!(render("line", "", "", &record), "42");
        assert_eq!(render("line", "", "%d", &record), "42");
        assert_eq!(render("line", "", "%05d", &record), "00042");
    }

    #[test]
    fn test_context_styles() {
        let record = sample();
        assert_eq!(render("context", "", "", &record), "(k1: v1) (k2: v2)");
        assert_eq!(render("context", "list", "", &record), "k1: v1, k2: v2");
        assert_eq!(render("context", "LIST", "%-16s|", &record), "k1: v1, k2: v2  |");
    }

    #[test]
    fn test_scratch_is_reused() {
        let record = sample();
        let mut element = Element::new("context", "pair", "%s!").unwrap();
        let mut buf = Vec::new();
        element.render(&record, &mut buf);
        element.render(&record, &mut buf);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "(k1: v1) (k2: v2)!(k1: v1) (k2: v2)!"
        );
    }

    #[test]
    fn test_prefix_and_msg() {
        let record = sample();
        assert_eq!(render("prefix", "", "", &record), "** ");
        assert_eq!(render("msg", "", "%q", &record), "\"hello\"");
    }
}
