//! Record classification: protocol data events versus noise.

/// Literal prefix of a data-bearing record.
pub const DATA_MARKER: &str = "data:";

/// Result of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A data record and its payload token.
    DataToken(String),
    /// Anything else: comments, other fields, blank separators.
    Ignored,
}

/// Classifies complete records and extracts data payloads.
#[derive(Debug, Clone, Copy)]
pub struct EventExtractor {
    marker: &'static str,
}

impl EventExtractor {
    /// Extractor for the standard `data:` marker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            marker: DATA_MARKER,
        }
    }

    /// Classify one record.
    ///
    /// The payload is everything after the marker, minus a single leading
    /// space (SSE field framing) and any trailing whitespace.
    #[must_use]
    pub fn classify(&self, record: &str) -> Classified {
        match record.strip_prefix(self.marker) {
            Some(value) => {
                let value = value.strip_prefix(' ').unwrap_or(value);
                Classified::DataToken(value.trim_end().to_owned())
            }
            None => Classified::Ignored,
        }
    }
}

impl Default for EventExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(record: &str) -> Classified {
        EventExtractor::new().classify(record)
    }

    #[test]
    fn data_record_yields_payload() {
        assert_eq!(classify("data: there"), Classified::DataToken("there".into()));
        assert_eq!(classify("data:}"), Classified::DataToken("}".into()));
    }

    #[test]
    fn only_one_leading_space_is_framing() {
        assert_eq!(classify("data:  word"), Classified::DataToken(" word".into()));
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        assert_eq!(classify("data: true \r"), Classified::DataToken("true".into()));
        assert_eq!(classify("data:\r"), Classified::DataToken(String::new()));
    }

    #[test]
    fn non_data_records_are_ignored() {
        assert_eq!(classify(""), Classified::Ignored);
        assert_eq!(classify("\r"), Classified::Ignored);
        assert_eq!(classify("event: message"), Classified::Ignored);
        assert_eq!(classify(": ping"), Classified::Ignored);
        assert_eq!(classify(" data: indented"), Classified::Ignored);
    }
}
