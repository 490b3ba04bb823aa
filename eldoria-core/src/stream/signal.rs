//! Detection of the hostility signal embedded ahead of the visible reply.
//!
//! The remote agent opens every reply with a JSON object such as
//! `{"murder": true}`, streamed token by token. The token carrying the closing
//! brace ends the signal segment; the token right before it holds the value.

/// Character that ends the signal segment.
pub const DELIMITER: char = '}';

/// Substring of the candidate token that marks a hostile verdict.
pub const HOSTILE_LITERAL: &str = "true";

/// What the detector made of one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Nothing to surface: still inside the signal segment, or a keep-alive.
    Pending,
    /// The signal segment just ended; `true` means hostile.
    SignalDetected(bool),
    /// A piece of visible reply text.
    TextToken(String),
}

/// Stateful, one-token-at-a-time signal detector. One instance per turn.
#[derive(Debug, Default)]
pub struct SignalDetector {
    candidate: String,
    resolved: Option<bool>,
}

impl SignalDetector {
    /// A detector that has not seen any token yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next payload token.
    pub fn observe(&mut self, token: String) -> SignalOutcome {
        if self.resolved.is_some() {
            return if token.is_empty() {
                SignalOutcome::Pending
            } else {
                SignalOutcome::TextToken(token)
            };
        }

        if token.contains(DELIMITER) {
            let hostile = std::mem::take(&mut self.candidate).contains(HOSTILE_LITERAL);
            self.resolved = Some(hostile);
            return SignalOutcome::SignalDetected(hostile);
        }

        self.candidate = token;
        SignalOutcome::Pending
    }

    /// The resolved signal, or `None` if the delimiter never arrived.
    #[must_use]
    pub fn resolution(&self) -> Option<bool> {
        self.resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tokens: &[&str]) -> (Vec<SignalOutcome>, Option<bool>) {
        let mut detector = SignalDetector::new();
        let outcomes = tokens
            .iter()
            .map(|t| detector.observe((*t).to_string()))
            .collect();
        (outcomes, detector.resolution())
    }

    #[test]
    fn true_before_delimiter_is_hostile() {
        let (outcomes, resolution) = run(&["hello", "true", "}more"]);
        assert_eq!(outcomes[2], SignalOutcome::SignalDetected(true));
        assert_eq!(resolution, Some(true));
    }

    #[test]
    fn false_before_delimiter_is_peaceful() {
        let (outcomes, resolution) = run(&["hello", "false", "}more"]);
        assert_eq!(outcomes[2], SignalOutcome::SignalDetected(false));
        assert_eq!(resolution, Some(false));
    }

    #[test]
    fn no_delimiter_resolves_nothing() {
        let (outcomes, resolution) = run(&["{\"", "murder", "\":", " true"]);
        assert!(outcomes.iter().all(|o| *o == SignalOutcome::Pending));
        assert_eq!(resolution, None);
    }

    #[test]
    fn only_the_immediately_preceding_token_counts() {
        let (_, resolution) = run(&["true", "false", "}"]);
        assert_eq!(resolution, Some(false));
        // A keep-alive in between replaces the candidate too.
        let (_, resolution) = run(&["true", "", "}"]);
        assert_eq!(resolution, Some(false));
    }

    #[test]
    fn delimiter_as_first_token_is_peaceful() {
        let (_, resolution) = run(&["}"]);
        assert_eq!(resolution, Some(false));
    }

    #[test]
    fn text_after_signal_is_surfaced_and_keepalives_dropped() {
        let (outcomes, _) = run(&["false", "}", " Good", "", " morning", "}"]);
        assert_eq!(
            outcomes,
            vec![
                SignalOutcome::Pending,
                SignalOutcome::SignalDetected(false),
                SignalOutcome::TextToken(" Good".into()),
                SignalOutcome::Pending,
                SignalOutcome::TextToken(" morning".into()),
                SignalOutcome::TextToken("}".into()),
            ]
        );
    }
}
