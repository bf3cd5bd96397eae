//! Header template compiler
//!
//! A header is literal text with placeholders of the form
//! `{{name[:property][%fmtspec]}}`. Compilation turns it into a list of
//! `(literal, element)` appenders followed by one literal suffix.

use super::element::Element;
use crate::core::LogRecord;

#[derive(Debug, Clone)]
struct Appender {
    literal: String,
    element: Element,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledHeader {
    appenders: Vec<Appender>,
    suffix: String,
}

/// One `{{...}}` occurrence: its byte range in the header plus its parts.
#[derive(Debug, PartialEq, Eq)]
struct Placeholder<'a> {
    start: usize,
    end: usize,
    name: &'a str,
    property: &'a str,
    fmtspec: &'a str,
}

/// Find the next placeholder at or after `from`.
fn next_placeholder(header: &str, from: usize) -> Option<Placeholder<'_>> {
    let start = from + header[from..].find("{{")?;
    let inner_start = start + 2;
    let inner_len = header[inner_start..].find("}}")?;
    let inner = &header[inner_start..inner_start + inner_len];

    let (head, fmtspec) = match inner.find('%') {
        Some(i) => (&inner[..i], &inner[i..]),
        None => (inner, ""),
    };
    let (name, property) = match head.find(':') {
        Some(i) => (&head[..i], &head[i + 1..]),
        None => (head, ""),
    };

    Some(Placeholder {
        start,
        end: inner_start + inner_len + 2,
        name: name.trim(),
        property: property.trim(),
        fmtspec: fmtspec.trim(),
    })
}

impl CompiledHeader {
    pub fn compile(header: &str) -> Self {
        let mut appenders = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while let Some(ph) = next_placeholder(header, pos) {
            literal.push_str(&header[pos..ph.start]);
            match Element::new(&ph.name.to_lowercase(), ph.property, ph.fmtspec) {
                Some(element) => appenders.push(Appender {
                    literal: std::mem::take(&mut literal),
                    element,
                }),
                // unknown names stay in the output verbatim
                None => literal.push_str(&header[ph.start..ph.end]),
            }
            pos = ph.end;
        }
        literal.push_str(&header[pos..]);

        Self {
            appenders,
            suffix: literal,
        }
    }

    pub fn render(&mut self, record: &LogRecord<'_>, buf: &mut Vec<u8>) {
        for appender in &mut self.appenders {
            buf.extend_from_slice(appender.literal.as_bytes());
            appender.element.render(record, buf);
        }
        buf.extend_from_slice(self.suffix.as_bytes());
    }

    #[cfg(test)]
    fn element_count(&self) -> usize {
        self.appenders.len()
    }
}
