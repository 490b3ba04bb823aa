//! Newline framing over arbitrarily chunked text.

use super::StreamError;

/// Accumulates decoded text fragments and yields complete `\n`-terminated
/// records, holding back the trailing partial record for the next fragment.
///
/// Records come out strictly in arrival order. The partial record is never
/// discarded; [`LineBuffer::finish`] hands it over at end of stream.
#[derive(Debug)]
pub struct LineBuffer {
    partial: String,
    max_partial: usize,
}

impl LineBuffer {
    /// A buffer with no cap on the pending partial record.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    /// A buffer that fails once the pending partial record exceeds
    /// `max_partial` bytes.
    #[must_use]
    pub fn with_limit(max_partial: usize) -> Self {
        Self {
            partial: String::new(),
            max_partial,
        }
    }

    /// Append a fragment and return every record it completes.
    ///
    /// # Errors
    /// Returns [`StreamError::PartialOverflow`] when no newline has arrived
    /// within the configured limit.
    pub fn append(&mut self, fragment: &str) -> Result<Vec<String>, StreamError> {
        self.partial.push_str(fragment);

        let records = match self.partial.rfind('\n') {
            Some(end) => {
                let tail = self.partial.split_off(end + 1);
                let complete = std::mem::replace(&mut self.partial, tail);
                complete[..end].split('\n').map(str::to_owned).collect()
            }
            None => Vec::new(),
        };

        if self.partial.len() > self.max_partial {
            return Err(StreamError::PartialOverflow {
                limit: self.max_partial,
                buffered: self.partial.len(),
            });
        }
        Ok(records)
    }

    /// Take the unterminated trailing record, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.partial))
        }
    }

    /// Bytes currently held as a partial record.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.partial.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_are_emitted_in_order() {
        let mut buffer = LineBuffer::new();
        let records = buffer.append("data: a\ndata: b\n").expect("append");
        assert_eq!(records, vec!["data: a", "data: b"]);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn partial_line_is_held_until_newline() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.append("data: hel").expect("append").is_empty());
        assert_eq!(buffer.pending_len(), 9);
        let records = buffer.append("lo\ndata: x").expect("append");
        assert_eq!(records, vec!["data: hello"]);
        assert_eq!(buffer.finish().as_deref(), Some("data: x"));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn double_newline_yields_blank_record() {
        let mut buffer = LineBuffer::new();
        let records = buffer.append("data: a\n\ndata: b\n").expect("append");
        assert_eq!(records, vec!["data: a", "", "data: b"]);
    }

    #[test]
    fn newline_alone_completes_pending() {
        let mut buffer = LineBuffer::new();
        buffer.append("data: a").expect("append");
        assert_eq!(buffer.append("\n").expect("append"), vec!["data: a"]);
    }

    #[test]
    fn overflow_without_newline_is_an_error() {
        let mut buffer = LineBuffer::with_limit(8);
        buffer.append("12345").expect("within limit");
        let err = buffer.append("6789").expect_err("over limit");
        assert!(matches!(
            err,
            StreamError::PartialOverflow { limit: 8, buffered: 9 }
        ));
    }

    #[test]
    fn limit_applies_only_to_the_partial_record() {
        let mut buffer = LineBuffer::with_limit(4);
        let records = buffer.append("long complete line\nab").expect("append");
        assert_eq!(records, vec!["long complete line"]);
    }
}
