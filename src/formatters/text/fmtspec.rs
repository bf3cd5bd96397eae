//! printf-style element format specifiers
//!
//! Grammar: `%[flags][width][.precision]verb[suffix]` where flags are any of
//! `-`, `+`, `0` and space, and `verb` is one of `s v q d x X o b`. Text after
//! the verb is copied verbatim. Widths and precisions count characters.

use std::fmt::Write as _;

/// Widths and precisions above this are rejected.
const MAX_WIDTH: usize = 1_000_000;

fn push_digit(acc: Option<usize>, d: u32) -> Option<usize> {
    acc.unwrap_or(0)
        .checked_mul(10)?
        .checked_add(d as usize)
        .filter(|&n| n <= MAX_WIDTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Str,
    Quoted,
    Decimal,
    LowerHex,
    UpperHex,
    Octal,
    Binary,
}

/// A value handed to a specifier.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Arg<'a> {
    Str(&'a str),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FmtSpec {
    left: bool,
    plus: bool,
    zero: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
    verb: Verb,
    suffix: String,
}

impl FmtSpec {
    /// Parse `spec`. Returns `None` when it is empty, malformed or equal to
    /// `default`, in which case the element renders on its plain path.
    pub fn parse(spec: &str, default: &str) -> Option<FmtSpec> {
        if spec.is_empty() || spec == "%" || spec == default {
            return None;
        }
        let mut chars = spec.strip_prefix('%')?.char_indices().peekable();
        let rest_of = |idx: usize| &spec[1 + idx..];

        let (mut left, mut plus, mut zero, mut space) = (false, false, false, false);
        while let Some(&(_, c)) = chars.peek() {
            match c {
                '-' => left = true,
                '+' => plus = true,
                '0' => zero = true,
                ' ' => space = true,
                _ => break,
            }
            chars.next();
        }

        let mut width = None;
        while let Some(&(_, c)) = chars.peek() {
            match c.to_digit(10) {
                Some(d) => width = Some(push_digit(width, d)?),
                None => break,
            }
            chars.next();
        }

        let mut precision = None;
        if let Some(&(_, '.')) = chars.peek() {
            chars.next();
            precision = Some(0);
            while let Some(&(_, c)) = chars.peek() {
                match c.to_digit(10) {
                    Some(d) => precision = Some(push_digit(precision, d)?),
                    None => break,
                }
                chars.next();
            }
        }

        let (idx, c) = chars.next()?;
        let verb = match c {
            's' | 'v' => Verb::Str,
            'q' => Verb::Quoted,
            'd' => Verb::Decimal,
            'x' => Verb::LowerHex,
            'X' => Verb::UpperHex,
            'o' => Verb::Octal,
            'b' => Verb::Binary,
            _ => return None,
        };
        let suffix = rest_of(idx + c.len_utf8()).to_string();

        Some(FmtSpec {
            left,
            plus,
            zero,
            space,
            width,
            precision,
            verb,
            suffix,
        })
    }

    /// Render `arg` into `out`.
    pub fn render(&self, arg: Arg<'_>, out: &mut Vec<u8>) {
        let mut body = String::new();
        let mut sign = "";
        match arg {
            Arg::Str(s) => self.render_str(s, &mut body),
            Arg::Int(n) => {
                sign = if n < 0 {
                    "-"
                } else if self.plus {
                    "+"
                } else if self.space {
                    " "
                } else {
                    ""
                };
                self.render_int(n.unsigned_abs(), &mut body);
            }
        }
        self.pad(sign, &body, matches!(arg, Arg::Int(_)), out);
        out.extend_from_slice(self.suffix.as_bytes());
    }

    fn render_str(&self, s: &str, body: &mut String) {
        let s = match self.precision {
            Some(p) => match s.char_indices().nth(p) {
                Some((idx, _)) => &s[..idx],
                None => s,
            },
            None => s,
        };
        match self.verb {
            Verb::Quoted => {
                let _ = write!(body, "{:?}", s);
            }
            Verb::LowerHex => {
                for b in s.bytes() {
                    let _ = write!(body, "{:02x}", b);
                }
            }
            Verb::UpperHex => {
                for b in s.bytes() {
                    let _ = write!(body, "{:02X}", b);
                }
            }
            _ => body.push_str(s),
        }
    }

    fn render_int(&self, n: u64, body: &mut String) {
        let _ = match self.verb {
            Verb::LowerHex => write!(body, "{:x}", n),
            Verb::UpperHex => write!(body, "{:X}", n),
            Verb::Octal => write!(body, "{:o}", n),
            Verb::Binary => write!(body, "{:b}", n),
            Verb::Quoted => match u32::try_from(n).ok().and_then(char::from_u32) {
                Some(c) => write!(body, "{:?}", c),
                None => write!(body, "{}", n),
            },
            Verb::Str | Verb::Decimal => write!(body, "{}", n),
        };
        if let Some(p) = self.precision {
            let digits = body.chars().count();
            if digits < p {
                body.insert_str(0, &"0".repeat(p - digits));
            }
        }
    }

    fn pad(&self, sign: &str, body: &str, numeric: bool, out: &mut Vec<u8>) {
        let len = sign.chars().count() + body.chars().count();
        let fill = self.width.map_or(0, |w| w.saturating_sub(len));
        if self.left {
            out.extend_from_slice(sign.as_bytes());
            out.extend_from_slice(body.as_bytes());
            out.resize(out.len() + fill, b' ');
        } else if self.zero && !(numeric && self.precision.is_some()) {
            out.extend_from_slice(sign.as_bytes());
            out.resize(out.len() + fill, b'0');
            out.extend_from_slice(body.as_bytes());
        } else {
            out.resize(out.len() + fill, b' ');
            out.extend_from_slice(sign.as_bytes());
            out.extend_from_slice(body.as_bytes());
        }
    }
}
