use std::fmt;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One (id, text) record taken from a line of the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceLine {
    /// 1-based physical line number in the input file.
    pub line_number: usize,
    pub id: String,
    pub text: String,
}

/// Why a non-blank line was not turned into a [`VoiceLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingDelimiter,
    EmptyId,
    EmptyText,
    /// The id would escape the output directory when used as a file stem.
    InvalidId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::MissingDelimiter => "missing delimiter",
            SkipReason::EmptyId => "empty id",
            SkipReason::EmptyText => "empty text",
            SkipReason::InvalidId => "id contains a path separator",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Voice(VoiceLine),
    Skipped {
        line_number: usize,
        reason: SkipReason,
    },
}

/// Lazily parses `content` into voice lines and skip notices.
///
/// Blank lines produce nothing. Each remaining line is split on the first
/// `delimiter` only, so the text may itself contain the delimiter.
pub fn parse_lines(content: &str, delimiter: char) -> impl Iterator<Item = ParsedLine> + '_ {
    content
        .lines()
        .enumerate()
        .filter_map(move |(index, raw)| {
            let raw = if index == 0 {
                raw.trim_start_matches(BYTE_ORDER_MARK)
            } else {
                raw
            };
            parse_line(index + 1, raw, delimiter)
        })
}

fn parse_line(line_number: usize, raw: &str, delimiter: char) -> Option<ParsedLine> {
    if raw.trim().is_empty() {
        return None;
    }

    let skipped = |reason| {
        Some(ParsedLine::Skipped {
            line_number,
            reason,
        })
    };

    let Some((id, text)) = raw.split_once(delimiter) else {
        return skipped(SkipReason::MissingDelimiter);
    };

    let id = id.trim();
    let text = text.trim();

    if id.is_empty() {
        return skipped(SkipReason::EmptyId);
    }
    if text.is_empty() {
        return skipped(SkipReason::EmptyText);
    }
    if id.contains(['/', '\\']) {
        return skipped(SkipReason::InvalidId);
    }

    Some(ParsedLine::Voice(VoiceLine {
        line_number,
        id: id.to_string(),
        text: text.to_string(),
    }))
}
