//! Transcript parsing.
//!
//! Exports are read in two passes. The first pass finds the first header
//! whose date only fits one order and locks that order for the whole
//! transcript. The second pass builds records under the locked order; a
//! header whose date does not fit is flagged and folded into the previous
//! message instead of being re-read under another order.

/// Header and date/time recognition.
pub mod datetime;

use crate::error::{AnalysisError, AnalysisResult};
use datetime::HeaderLine;
use groupscope_core::{
    ClockStyle, DateOrder, FormatLock, MessageKind, MessageRecord, ParseSummary,
    ParsedTranscript, SystemEvent,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

static MEDIA_PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:<media omitted>|<attached: [^>]*>|(?:image|video|audio|sticker|gif|document|contact card|media) omitted)$",
    )
    .expect("media placeholder pattern is valid")
});

/// Parser for plain-text group chat exports.
#[derive(Debug, Clone, Default)]
pub struct TranscriptParser {
    date_order: Option<DateOrder>,
}

impl TranscriptParser {
    /// Creates a parser that detects the date order from the transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip detection and read every date in the given order.
    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = Some(order);
        self
    }

    /// Parse raw export text into ordered message records.
    #[instrument(skip_all, fields(bytes = text.len()))]
    pub fn parse(&self, text: &str) -> AnalysisResult<ParsedTranscript> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines: Vec<&str> = text.lines().collect();

        let (date_order, format_lock) = match self.date_order {
            Some(order) => (order, FormatLock::Forced),
            None => detect_date_order(&lines),
        };
        if format_lock == FormatLock::Defaulted {
            warn!(
                order = %date_order,
                "no line disambiguates day and month, assuming first supported order"
            );
        }

        let mut builder = TranscriptBuilder::new(date_order, format_lock);
        for (idx, line) in lines.iter().enumerate() {
            builder.push_line(idx + 1, line);
        }
        let transcript = builder.finish()?;

        info!(
            records = transcript.summary.records,
            order = %transcript.summary.date_order,
            inconsistent = transcript.summary.inconsistent_lines,
            "Parsed transcript"
        );
        Ok(transcript)
    }
}

/// Parse raw export text, detecting the date order.
pub fn parse_transcript(text: &str) -> AnalysisResult<ParsedTranscript> {
    TranscriptParser::new().parse(text)
}

/// First pass: the first header whose date fits only one order decides.
fn detect_date_order(lines: &[&str]) -> (DateOrder, FormatLock) {
    for (idx, line) in lines.iter().enumerate() {
        let Some(header) = HeaderLine::match_line(line) else {
            continue;
        };
        if let Some(order) = header.date.and_then(|date| date.disambiguate()) {
            debug!(line = idx + 1, order = %order, "Date order locked");
            return (
                order,
                FormatLock::Disambiguated {
                    line_number: idx + 1,
                },
            );
        }
    }
    (DateOrder::PRIORITY[0], FormatLock::Defaulted)
}

/// Where continuation lines currently go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Record,
    SystemEvent,
}

struct TranscriptBuilder {
    date_order: DateOrder,
    format_lock: FormatLock,
    clock_style: Option<ClockStyle>,
    records: Vec<MessageRecord>,
    system_events: Vec<SystemEvent>,
    open: Option<Open>,
    first_header_sample: Option<String>,
    continuation_lines: usize,
    orphan_lines: usize,
    inconsistent_lines: usize,
    out_of_order: usize,
}

impl TranscriptBuilder {
    fn new(date_order: DateOrder, format_lock: FormatLock) -> Self {
        Self {
            date_order,
            format_lock,
            clock_style: None,
            records: Vec::new(),
            system_events: Vec::new(),
            open: None,
            first_header_sample: None,
            continuation_lines: 0,
            orphan_lines: 0,
            inconsistent_lines: 0,
            out_of_order: 0,
        }
    }

    fn push_line(&mut self, line_number: usize, line: &str) {
        let Some(header) = HeaderLine::match_line(line) else {
            self.push_continuation(line);
            return;
        };
        if self.first_header_sample.is_none() {
            self.first_header_sample = Some(line.to_string());
        }

        match header.timestamp(self.date_order) {
            Some(timestamp) => {
                self.clock_style.get_or_insert(header.clock_style());
                self.close_last();
                match split_body(header.body) {
                    Some((user, text, kind)) => {
                        self.push_record(line_number, timestamp, user, text, kind)
                    }
                    None => self.push_system_event(line_number, timestamp, header.body),
                }
            }
            None => {
                self.inconsistent_lines += 1;
                warn!(
                    line = line_number,
                    order = %self.date_order,
                    "header date does not fit the locked order, treating as continuation"
                );
                self.push_continuation(line);
            }
        }
    }

    fn push_record(
        &mut self,
        line_number: usize,
        timestamp: chrono::NaiveDateTime,
        user: String,
        text: String,
        kind: MessageKind,
    ) {
        if let Some(previous) = self.records.last() {
            if timestamp < previous.timestamp {
                self.out_of_order += 1;
            }
        }
        self.records.push(MessageRecord {
            timestamp,
            user,
            text,
            kind,
            line_number,
        });
        self.open = Some(Open::Record);
    }

    fn push_system_event(
        &mut self,
        line_number: usize,
        timestamp: chrono::NaiveDateTime,
        body: &str,
    ) {
        self.system_events.push(SystemEvent {
            timestamp,
            text: body.trim_matches(|c: char| c.is_whitespace() || is_format_mark(c)).to_string(),
            line_number,
        });
        self.open = Some(Open::SystemEvent);
    }

    fn push_continuation(&mut self, line: &str) {
        let blank = line.trim().is_empty();
        let text = match self.open {
            Some(Open::Record) => match self.records.last_mut() {
                Some(last) => {
                    if last.kind == MessageKind::Media && !blank {
                        last.kind = MessageKind::Text;
                    }
                    &mut last.text
                }
                None => return,
            },
            Some(Open::SystemEvent) => match self.system_events.last_mut() {
                Some(last) => &mut last.text,
                None => return,
            },
            None => {
                if !blank {
                    self.orphan_lines += 1;
                }
                return;
            }
        };
        text.push('\n');
        text.push_str(line.trim_end());
        if !blank {
            self.continuation_lines += 1;
        }
    }

    /// Trailing blank continuation lines belong to no message.
    fn close_last(&mut self) {
        let text = match self.open {
            Some(Open::Record) => self.records.last_mut().map(|r| &mut r.text),
            Some(Open::SystemEvent) => self.system_events.last_mut().map(|e| &mut e.text),
            None => None,
        };
        if let Some(text) = text {
            let trimmed_len = text.trim_end().len();
            text.truncate(trimmed_len);
        }
    }

    fn finish(mut self) -> AnalysisResult<ParsedTranscript> {
        self.close_last();

        if self.records.is_empty() {
            return Err(match self.first_header_sample {
                Some(sample) if self.system_events.is_empty() => {
                    AnalysisError::UnsupportedDateFormat { sample }
                }
                _ => AnalysisError::EmptyTranscript,
            });
        }

        let summary = ParseSummary {
            date_order: self.date_order,
            format_lock: self.format_lock,
            clock_style: self.clock_style.unwrap_or(ClockStyle::TwentyFourHour),
            records: self.records.len(),
            continuation_lines: self.continuation_lines,
            orphan_lines: self.orphan_lines,
            system_events: self.system_events.len(),
            media_messages: self
                .records
                .iter()
                .filter(|r| r.kind == MessageKind::Media)
                .count(),
            inconsistent_lines: self.inconsistent_lines,
            out_of_order: self.out_of_order,
        };

        Ok(ParsedTranscript {
            records: self.records,
            system_events: self.system_events,
            summary,
        })
    }
}

/// Split `Name: text` into sender, body and kind; `None` for system events.
fn split_body(body: &str) -> Option<(String, String, MessageKind)> {
    let body = body.trim_start_matches(is_format_mark);
    let (user, text) = body
        .find(": ")
        .map(|idx| (&body[..idx], &body[idx + 2..]))
        .or_else(|| body.strip_suffix(':').map(|user| (user, "")))?;

    let user = user.trim();
    if user.is_empty() {
        return None;
    }
    let text = text.trim_matches(|c: char| c.is_whitespace() || is_format_mark(c));
    if MEDIA_PLACEHOLDER_RE.is_match(text) {
        Some((user.to_string(), String::new(), MessageKind::Media))
    } else {
        Some((user.to_string(), text.to_string(), MessageKind::Text))
    }
}

/// Invisible direction marks some exporters put around names and placeholders.
fn is_format_mark(c: char) -> bool {
    matches!(c, '\u{200e}' | '\u{200f}' | '\u{202a}'..='\u{202e}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_messages_in_source_order() {
        let transcript = parse_transcript(
            "31/01/2023, 10:00 - Alice: hello\n31/01/2023, 10:05 - Bob: hi there\n",
        )
        .expect("transcript should parse");

        assert_eq!(transcript.records.len(), 2);
        assert_eq!(transcript.records[0].user, "Alice");
        assert_eq!(transcript.records[0].text, "hello");
        assert_eq!(transcript.records[1].user, "Bob");
        assert_eq!(transcript.records[1].line_number, 2);
        assert_eq!(transcript.summary.date_order, DateOrder::DayMonthYear);
        assert_eq!(
            transcript.summary.format_lock,
            FormatLock::Disambiguated { line_number: 1 }
        );
    }

    #[test]
    fn wrapped_lines_extend_the_previous_message() {
        let transcript = parse_transcript(
            "31/01/2023, 10:00 - Alice: first line\nsecond line\n\nthird line\n\n31/01/2023, 10:01 - Bob: ok\n",
        )
        .expect("transcript should parse");

        assert_eq!(transcript.records.len(), 2);
        assert_eq!(
            transcript.records[0].text,
            "first line\nsecond line\n\nthird line"
        );
        assert_eq!(transcript.summary.continuation_lines, 2);
    }

    #[test]
    fn format_lock_comes_from_first_disambiguating_line() {
        let transcript = parse_transcript(
            "05/06/2023, 09:00 - Alice: ambiguous\n03/25/2023, 09:30 - Bob: settles MDY\n",
        )
        .expect("transcript should parse");

        assert_eq!(transcript.summary.date_order, DateOrder::MonthDayYear);
        assert_eq!(
            transcript.records[0].timestamp.date().to_string(),
            "2023-05-06"
        );
    }

    #[test]
    fn line_contradicting_the_lock_is_folded_into_previous_message() {
        let transcript = parse_transcript(
            "31/01/2023, 10:00 - Alice: hello\n02/15/2023, 11:00 - Bob: hi\n",
        )
        .expect("transcript should parse");

        assert_eq!(transcript.summary.date_order, DateOrder::DayMonthYear);
        assert_eq!(transcript.summary.inconsistent_lines, 1);
        assert_eq!(transcript.records.len(), 1);
        assert_eq!(
            transcript.records[0].text,
            "hello\n02/15/2023, 11:00 - Bob: hi"
        );
    }

    #[test]
    fn undisambiguated_transcript_defaults_to_day_first() {
        let transcript = parse_transcript("01/02/2023, 10:00 - Alice: hi\n")
            .expect("transcript should parse");

        assert_eq!(transcript.summary.format_lock, FormatLock::Defaulted);
        assert_eq!(transcript.summary.date_order, DateOrder::DayMonthYear);
        assert_eq!(
            transcript.records[0].timestamp.date().to_string(),
            "2023-02-01"
        );
    }

    #[test]
    fn forced_order_overrides_detection() {
        let transcript = TranscriptParser::new()
            .with_date_order(DateOrder::MonthDayYear)
            .parse("01/02/2023, 10:00 - Alice: hi\n")
            .expect("transcript should parse");

        assert_eq!(transcript.summary.format_lock, FormatLock::Forced);
        assert_eq!(
            transcript.records[0].timestamp.date().to_string(),
            "2023-01-02"
        );
    }

    #[test]
    fn system_events_are_kept_apart_from_messages() {
        let transcript = parse_transcript(
            "31/01/2023, 10:00 - Alice joined using this group's invite link\n31/01/2023, 10:01 - Alice: <Media omitted>\n31/01/2023, 10:02 - Bob:\n",
        )
        .expect("transcript should parse");

        let kinds: Vec<MessageKind> = transcript.records.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![MessageKind::Media, MessageKind::Text]);
        assert_eq!(transcript.records[0].user, "Alice");
        assert_eq!(transcript.records[0].text, "");
        assert_eq!(transcript.records[1].user, "Bob");
        assert_eq!(transcript.records[1].text, "");

        assert_eq!(transcript.system_events.len(), 1);
        assert_eq!(
            transcript.system_events[0].text,
            "Alice joined using this group's invite link"
        );
        assert_eq!(transcript.system_events[0].line_number, 1);
        assert_eq!(transcript.summary.system_events, 1);
        assert_eq!(transcript.summary.media_messages, 1);
    }

    #[test]
    fn continuation_after_system_event_stays_with_the_event() {
        let transcript = parse_transcript(
            "31/01/2023, 10:00 - Carol changed the group description\nBring snacks\n31/01/2023, 10:01 - Dan: ok\n",
        )
        .expect("transcript should parse");

        assert_eq!(transcript.records.len(), 1);
        assert_eq!(transcript.records[0].text, "ok");
        assert_eq!(
            transcript.system_events[0].text,
            "Carol changed the group description\nBring snacks"
        );
        assert_eq!(transcript.summary.continuation_lines, 1);
    }

    #[test]
    fn only_system_events_is_an_empty_transcript() {
        let result = parse_transcript("31/01/2023, 10:00 - Alice created group \"Trip\"\n");
        assert!(matches!(result, Err(AnalysisError::EmptyTranscript)));
    }

    #[test]
    fn text_before_first_header_is_counted_as_orphan() {
        let transcript = parse_transcript(
            "\u{feff}Messages are end-to-end encrypted.\n2023-01-31, 10:00 - Alice: hi\n",
        )
        .expect("transcript should parse");

        assert_eq!(transcript.summary.orphan_lines, 1);
        assert_eq!(transcript.summary.date_order, DateOrder::YearMonthDay);
    }

    #[test]
    fn empty_transcript_is_rejected() {
        assert!(matches!(
            parse_transcript(""),
            Err(AnalysisError::EmptyTranscript)
        ));
        assert!(matches!(
            parse_transcript("just some text\nwithout headers"),
            Err(AnalysisError::EmptyTranscript)
        ));
    }

    #[test]
    fn header_lines_with_impossible_dates_are_unsupported() {
        let err = parse_transcript("99/99/2023, 10:00 - Alice: hi\n")
            .expect_err("impossible dates must be rejected");
        match err {
            AnalysisError::UnsupportedDateFormat { sample } => {
                assert!(sample.starts_with("99/99/2023"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_order_timestamps_are_counted() {
        let transcript = parse_transcript(
            "31/01/2023, 10:00 - Alice: later\n30/01/2023, 09:00 - Bob: earlier\n",
        )
        .expect("transcript should parse");
        assert_eq!(transcript.summary.out_of_order, 1);
    }
}
