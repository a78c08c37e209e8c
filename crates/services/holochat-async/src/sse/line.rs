//! Classification of a single event-stream line.

/// One line of an event-stream block, without its trailing newline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty line
    Blank,
    /// Line starting with `:` (keep-alive padding); holds the text after the colon
    Comment(&'a str),
    /// `name: value` or `name:value`; `name` is `None` when the line has no colon
    Field {
        /// Text before the first colon
        name: Option<&'a str>,
        /// Text after the colon, minus one optional leading space
        value: &'a str,
    },
}

impl<'a> Line<'a> {
    /// Returns the field name and value when this is a named field
    #[must_use]
    pub const fn as_field(&self) -> Option<(&'a str, &'a str)> {
        match *self {
            Self::Field {
                name: Some(name),
                value,
            } => Some((name, value)),
            _ => None,
        }
    }
}

/// Classifies one line
///
/// Every input classifies; malformed lines degrade to a nameless field.
#[must_use]
pub fn classify(line: &str) -> Line<'_> {
    if line.is_empty() {
        return Line::Blank;
    }
    if let Some(comment) = line.strip_prefix(':') {
        return Line::Comment(comment);
    }
    match line.split_once(':') {
        Some((name, rest)) => Line::Field {
            name: Some(name),
            value: rest.strip_prefix(' ').unwrap_or(rest),
        },
        None => Line::Field {
            name: None,
            value: line,
        },
    }
}
