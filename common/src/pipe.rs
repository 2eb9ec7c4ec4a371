use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::api::RequestKind;
use crate::frame::{Frame, FrameError};

pub type Payload = Vec<u8>;

#[derive(Error, Debug)]
pub enum PipeError {
    #[error("pipe is closed")]
    Closed,
    #[error("stream corrupted: {0}")]
    Corrupt(#[from] FrameError),
    #[error("unknown request type {0}")]
    UnknownRequestType(u16),
    #[error("no handler registered for {0:?}")]
    NoHandler(RequestKind),
    #[error("response for request id {0} with no pending callback")]
    NoPendingCallback(u32),
    #[error("{0:?} arrived expecting a response, but its handler cannot produce one")]
    NoResponseProduced(RequestKind),
    #[error("{0:?} arrived expecting no response, but its handler produces one")]
    UnwantedResponse(RequestKind),
    #[error("the connection died before the response arrived")]
    NoReply,
}

/// What `send` does once the pipe has been closed. Dead-pipe listeners fire on
/// the attempt either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPolicy {
    /// Sending on a dead pipe is an error.
    #[default]
    Error,
    /// Sending on a dead pipe is a silent no-op; pending responses resolve as
    /// [`PipeError::NoReply`].
    Ignore,
}

enum Handler {
    /// Fires on requests that expect no response.
    Notify(Box<dyn FnMut(&[u8]) + Send>),
    /// Fires on requests that expect a response; the return value is sent
    /// back under the same request id.
    Request(Box<dyn FnMut(&[u8]) -> Payload + Send>),
}

struct PipeInner {
    next_request_id: u32,
    pending: HashMap<u32, oneshot::Sender<Payload>>,
    buffer: Vec<u8>,
    /// `None` once the pipe is closed. Dropping the sender is what lets the
    /// writer task drain and shut the transport down.
    outgoing: Option<mpsc::UnboundedSender<Vec<u8>>>,
    dead_listeners: Vec<Box<dyn FnMut() + Send>>,
    /// Listener-firing rounds owed but not yet run; see
    /// [`PipeSender::fire_dead_listeners`].
    fire_rounds_pending: u32,
    firing_dead_listeners: bool,
    policy: SendPolicy,
}

impl PipeInner {
    fn write(&mut self, bytes: Vec<u8>) {
        if let Some(outgoing) = &self.outgoing {
            // The writer task hanging up mid-send is a close in progress.
            let _ = outgoing.send(bytes);
        }
    }
}

/// Request/response multiplexer over a single byte-stream connection.
///
/// One `Pipe` per connection. Outbound requests get a per-pipe request id and
/// an optional pending response slot; inbound frames either resolve such a
/// slot or are dispatched to the handler registered for their request kind.
/// Exactly one task owns the `Pipe` and feeds it via [`Pipe::receive`], which
/// serializes all frame processing; everything else talks through cloned
/// [`PipeSender`] handles.
pub struct Pipe {
    inner: Arc<Mutex<PipeInner>>,
    handlers: HashMap<RequestKind, Handler>,
}

impl Pipe {
    pub fn new(outgoing: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PipeInner {
                next_request_id: 0,
                pending: HashMap::new(),
                buffer: Vec::new(),
                outgoing: Some(outgoing),
                dead_listeners: Vec::new(),
                fire_rounds_pending: 0,
                firing_dead_listeners: false,
                policy: SendPolicy::default(),
            })),
            handlers: HashMap::new(),
        }
    }

    pub fn sender(&self) -> PipeSender {
        PipeSender {
            inner: self.inner.clone(),
        }
    }

    /// Register the handler for a request kind that carries no response.
    /// Handlers are registered once at setup and never removed.
    pub fn on_notify(&mut self, kind: RequestKind, handler: impl FnMut(&[u8]) + Send + 'static) {
        self.handlers.insert(kind, Handler::Notify(Box::new(handler)));
    }

    /// Register the handler for a request kind whose return value is sent
    /// back to the requester.
    pub fn on_request(
        &mut self,
        kind: RequestKind,
        handler: impl FnMut(&[u8]) -> Payload + Send + 'static,
    ) {
        self.handlers.insert(kind, Handler::Request(Box::new(handler)));
    }

    /// Buffer incoming bytes and process every complete frame.
    ///
    /// Arbitrary split boundaries are fine: a frame is handed to its handler
    /// or callback only once it is complete, and the invocation sequence is
    /// the same however the bytes were chunked. Any `Err` is a protocol
    /// violation; the caller must close the connection and never retry.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<(), PipeError> {
        lock(&self.inner).buffer.extend_from_slice(bytes);

        loop {
            let frame = {
                let mut inner = lock(&self.inner);
                match Frame::decode(&inner.buffer)? {
                    None => break,
                    Some((frame, consumed)) => {
                        inner.buffer.drain(..consumed);
                        frame
                    }
                }
            };

            if frame.is_response {
                self.resolve_response(frame)?;
            } else {
                self.dispatch_request(frame)?;
            }
        }

        Ok(())
    }

    fn resolve_response(&mut self, frame: Frame) -> Result<(), PipeError> {
        let Some(callback) = lock(&self.inner).pending.remove(&frame.request_id) else {
            return Err(PipeError::NoPendingCallback(frame.request_id));
        };
        debug!(request_id = frame.request_id, "resolving pending response");
        // The receiver may have been dropped locally; that just cancels the
        // callback.
        let _ = callback.send(frame.payload);
        Ok(())
    }

    fn dispatch_request(&mut self, frame: Frame) -> Result<(), PipeError> {
        let kind = RequestKind::from_code(frame.request_type)
            .ok_or(PipeError::UnknownRequestType(frame.request_type))?;
        debug!(
            ?kind,
            request_id = frame.request_id,
            response_expected = frame.response_expected,
            "dispatching request"
        );

        match self.handlers.get_mut(&kind) {
            None => Err(PipeError::NoHandler(kind)),
            Some(Handler::Notify(handler)) => {
                if frame.response_expected {
                    return Err(PipeError::NoResponseProduced(kind));
                }
                handler(&frame.payload);
                Ok(())
            }
            Some(Handler::Request(handler)) => {
                if !frame.response_expected {
                    return Err(PipeError::UnwantedResponse(kind));
                }
                let reply = handler(&frame.payload);
                lock(&self.inner)
                    .write(Frame::response(frame.request_id, frame.request_type, reply).encode());
                Ok(())
            }
        }
    }
}

/// Cloneable sending half of a [`Pipe`]. Safe to use from any task; each
/// operation takes the pipe lock briefly and never holds it across user code.
#[derive(Clone)]
pub struct PipeSender {
    inner: Arc<Mutex<PipeInner>>,
}

impl PipeSender {
    /// Send a request that expects a response. The returned receiver resolves
    /// exactly once with the response payload, or fails if the pipe dies
    /// first.
    pub fn request(
        &self,
        kind: RequestKind,
        payload: Payload,
    ) -> Result<oneshot::Receiver<Payload>, PipeError> {
        let mut inner = lock(&self.inner);
        if inner.outgoing.is_none() {
            let policy = inner.policy;
            drop(inner);
            self.fire_dead_listeners();
            return match policy {
                SendPolicy::Error => Err(PipeError::Closed),
                SendPolicy::Ignore => {
                    let (sender, receiver) = oneshot::channel();
                    drop(sender);
                    Ok(receiver)
                }
            };
        }

        let request_id = inner.next_request_id;
        inner.next_request_id = inner.next_request_id.wrapping_add(1);

        let (sender, receiver) = oneshot::channel();
        inner.pending.insert(request_id, sender);
        inner.write(Frame::request(request_id, kind.code(), true, payload).encode());
        Ok(receiver)
    }

    /// Send a request that expects no response. The remote handler must not
    /// produce one.
    pub fn notify(&self, kind: RequestKind, payload: Payload) -> Result<(), PipeError> {
        let mut inner = lock(&self.inner);
        if inner.outgoing.is_none() {
            let policy = inner.policy;
            drop(inner);
            self.fire_dead_listeners();
            return match policy {
                SendPolicy::Error => Err(PipeError::Closed),
                SendPolicy::Ignore => Ok(()),
            };
        }

        let request_id = inner.next_request_id;
        inner.next_request_id = inner.next_request_id.wrapping_add(1);
        inner.write(Frame::request(request_id, kind.code(), false, payload).encode());
        Ok(())
    }

    /// Close the pipe: drop the transport writer, cancel every pending
    /// response and fire the dead-pipe listeners. Idempotent; only the first
    /// close fires.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        if inner.outgoing.take().is_none() {
            return;
        }
        // Dropping the senders resolves the waiting receivers with an error.
        inner.pending.clear();
        drop(inner);
        self.fire_dead_listeners();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner).outgoing.is_none()
    }

    /// Register a listener for pipe death. Fired on close and again on every
    /// send attempt after close, whenever the listener was registered.
    pub fn on_dead(&self, listener: impl FnMut() + Send + 'static) {
        lock(&self.inner).dead_listeners.push(Box::new(listener));
    }

    pub fn set_policy(&self, policy: SendPolicy) {
        lock(&self.inner).policy = policy;
    }

    /// Run one listener-firing round per close or send attempt.
    ///
    /// Rounds are counted under the lock, so concurrent attempts cannot miss
    /// each other: each attempt books a round, and whichever task holds the
    /// firing claim drains every booked round before releasing it. Listeners
    /// run without the lock held, so a listener may call back into the pipe;
    /// after each round the listeners are kept, with anything registered in
    /// the meantime appended.
    fn fire_dead_listeners(&self) {
        let mut inner = lock(&self.inner);
        inner.fire_rounds_pending += 1;
        if inner.firing_dead_listeners {
            // The task already firing runs this round as well.
            return;
        }

        inner.firing_dead_listeners = true;
        while inner.fire_rounds_pending > 0 {
            inner.fire_rounds_pending -= 1;
            let mut listeners = std::mem::take(&mut inner.dead_listeners);
            drop(inner);
            for listener in &mut listeners {
                listener();
            }
            inner = lock(&self.inner);
            listeners.append(&mut inner.dead_listeners);
            inner.dead_listeners = listeners;
        }
        inner.firing_dead_listeners = false;
    }
}

fn lock(inner: &Arc<Mutex<PipeInner>>) -> MutexGuard<'_, PipeInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
