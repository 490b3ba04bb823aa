//! The transport seam: request in, raw byte stream out.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::LlmError;
use crate::types::ConversationRequest;

/// Raw response body of one turn, in transport-sized fragments.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// Something that can carry one turn's request to a conversational agent.
///
/// A transport makes exactly one remote call per `open`; retrying is the
/// caller's business.
pub trait DialogueTransport: Send + Sync {
    /// Issue the request and hand back the response body as a byte stream.
    fn open(
        &self,
        request: &ConversationRequest,
    ) -> impl Future<Output = Result<ByteStream, LlmError>> + Send;
}

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

/// One canned response.
enum Script {
    /// Yield these fragments, then end.
    Fragments(Vec<Bytes>),
    /// Yield these fragments, then fail mid-stream.
    BreakAfter(Vec<Bytes>, String),
    /// Fail to open.
    Reject(String),
    /// Yield whatever the test pushes into the channel; ends when it closes.
    Live(mpsc::UnboundedReceiver<Result<Bytes, LlmError>>),
}

/// Transport that replays canned responses in order and records requests.
///
/// Clones share the same script and request log.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    requests: Arc<Mutex<Vec<ConversationRequest>>>,
}

impl ScriptedTransport {
    /// A transport with nothing scripted; `open` fails until responses are queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response delivered as the given fragments.
    pub fn push_fragments<I, B>(&self, fragments: I) -> &Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let fragments = fragments.into_iter().map(Into::into).collect();
        self.scripts.lock().push_back(Script::Fragments(fragments));
        self
    }

    /// Queue a response delivered in one piece.
    pub fn push_body(&self, body: impl Into<Bytes>) -> &Self {
        self.push_fragments([body.into()])
    }

    /// Queue a response that breaks after the given fragments.
    pub fn push_broken<I, B>(&self, fragments: I, reason: impl Into<String>) -> &Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let fragments = fragments.into_iter().map(Into::into).collect();
        self.scripts
            .lock()
            .push_back(Script::BreakAfter(fragments, reason.into()));
        self
    }

    /// Queue a request rejection.
    pub fn push_rejection(&self, reason: impl Into<String>) -> &Self {
        self.scripts.lock().push_back(Script::Reject(reason.into()));
        self
    }

    /// Queue a response fed live by the returned sender.
    pub fn push_live(&self) -> mpsc::UnboundedSender<Result<Bytes, LlmError>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scripts.lock().push_back(Script::Live(rx));
        tx
    }

    /// Every request opened so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ConversationRequest> {
        self.requests.lock().clone()
    }

    /// Responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.scripts.lock().len()
    }
}

impl DialogueTransport for ScriptedTransport {
    async fn open(&self, request: &ConversationRequest) -> Result<ByteStream, LlmError> {
        self.requests.lock().push(request.clone());
        let script = self
            .scripts
            .lock()
            .pop_front()
            .ok_or_else(|| LlmError::Unavailable("no scripted response left".into()))?;

        let stream: ByteStream = match script {
            Script::Fragments(fragments) => {
                Box::pin(stream::iter(fragments.into_iter().map(Ok::<Bytes, LlmError>)))
            }
            Script::BreakAfter(fragments, reason) => Box::pin(
                stream::iter(fragments.into_iter().map(Ok::<Bytes, LlmError>))
                    .chain(stream::once(async move { Err(LlmError::RequestFailed(reason)) })),
            ),
            Script::Reject(reason) => return Err(LlmError::Unavailable(reason)),
            Script::Live(rx) => Box::pin(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })),
        };
        Ok(stream)
    }
}
