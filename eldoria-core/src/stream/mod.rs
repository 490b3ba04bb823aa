//! Incremental decoding of the inbound dialogue stream.
//!
//! The wire format is line oriented: records are separated by `\n`, records
//! starting with `data:` carry one payload token each, everything else is
//! ignored. Transport fragments arrive in arbitrary sizes, so every stage
//! here is resumable.
//!
//! ```text
//! &[u8] ─► Utf8Decoder ─► LineBuffer ─► EventExtractor ─► tokens ─► SignalDetector
//!          └──────────────── FrameDecoder ─────────────┘
//! ```

pub mod extractor;
pub mod line_buffer;
pub mod signal;
pub mod utf8;

use thiserror::Error;

pub use extractor::{Classified, EventExtractor, DATA_MARKER};
pub use line_buffer::LineBuffer;
pub use signal::{SignalDetector, SignalOutcome};
pub use utf8::Utf8Decoder;

/// Errors raised while decoding the inbound stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// A record grew past the configured limit without a newline.
    #[error("Unterminated record exceeded {limit} bytes ({buffered} buffered)")]
    PartialOverflow {
        /// Configured cap.
        limit: usize,
        /// Bytes held when the cap was hit.
        buffered: usize,
    },
}

/// Bytes in, payload tokens out: the framing half of a turn's decoder.
///
/// Owns one [`Utf8Decoder`], one [`LineBuffer`] and one [`EventExtractor`]
/// for the lifetime of a single turn.
#[derive(Debug)]
pub struct FrameDecoder {
    utf8: Utf8Decoder,
    lines: LineBuffer,
    extractor: EventExtractor,
}

impl FrameDecoder {
    /// A decoder whose partial record may not exceed `max_partial` bytes.
    #[must_use]
    pub fn new(max_partial: usize) -> Self {
        Self {
            utf8: Utf8Decoder::new(),
            lines: LineBuffer::with_limit(max_partial),
            extractor: EventExtractor::new(),
        }
    }

    /// Decode one transport fragment into the data tokens it completes.
    ///
    /// # Errors
    /// Propagates [`StreamError::PartialOverflow`] from the line buffer.
    pub fn push(&mut self, fragment: &[u8]) -> Result<Vec<String>, StreamError> {
        let text = self.utf8.decode(fragment);
        let records = self.lines.append(&text)?;
        Ok(self.extract(records))
    }

    /// Flush at end of stream: the trailing unterminated record, if it is a
    /// data record, yields its token.
    ///
    /// # Errors
    /// Propagates [`StreamError::PartialOverflow`] from the line buffer.
    pub fn finish(&mut self) -> Result<Vec<String>, StreamError> {
        let tail = self.utf8.finish();
        let mut records = self.lines.append(&tail)?;
        records.extend(self.lines.finish());
        Ok(self.extract(records))
    }

    fn extract(&self, records: Vec<String>) -> Vec<String> {
        records
            .iter()
            .filter_map(|record| match self.extractor.classify(record) {
                Classified::DataToken(token) => Some(token),
                Classified::Ignored => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_tokens_across_fragments() {
        let mut decoder = FrameDecoder::new(1024);
        let mut tokens = decoder.push(b"data: Hi\nda").expect("push");
        tokens.extend(decoder.push(b"ta: false\n: comment\n").expect("push"));
        tokens.extend(decoder.push(b"data:}\ndata: there").expect("push"));
        tokens.extend(decoder.finish().expect("finish"));
        assert_eq!(tokens, vec!["Hi", "false", "}", "there"]);
    }

    #[test]
    fn overflow_surfaces_from_push() {
        let mut decoder = FrameDecoder::new(4);
        assert!(decoder.push(b"data: way too long").is_err());
    }
}
