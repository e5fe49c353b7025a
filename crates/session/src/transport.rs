use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Message transport seam. Frames arrive already delimited; the session
/// polls until the queue is empty at the start of every frame.
pub trait Transport {
    fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Next queued inbound frame, `Ok(None)` when nothing is waiting.
    fn poll(&mut self) -> Result<Option<String>, TransportError>;
}

/// In-process transport backed by queues.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<String>,
    sent: Vec<String>,
    closed: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame as if the server had sent it.
    pub fn push_inbound(&mut self, frame: impl Into<String>) {
        self.inbound.push_back(frame.into());
    }

    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }

    /// Close after the queued frames have been read.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.sent.push(frame.to_owned());
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<String>, TransportError> {
        match self.inbound.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None if self.closed => Err(TransportError::Closed),
            None => Ok(None),
        }
    }
}
