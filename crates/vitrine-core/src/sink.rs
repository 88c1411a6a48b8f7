//! Destination for streamed output.
//!
//! Producers push chunks as they become available; the transport owns the
//! concrete sink. A [`SinkClosed`] error means the consumer went away and
//! the producer should stop.

use async_trait::async_trait;

/// The consumer of a stream is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("output sink closed")]
pub struct SinkClosed;

/// Receives output chunks in order.
#[async_trait]
pub trait ChunkSink: Send {
    async fn write(&mut self, chunk: Vec<u8>) -> Result<(), SinkClosed>;
}

/// Collects everything in memory.
#[async_trait]
impl ChunkSink for Vec<u8> {
    async fn write(&mut self, chunk: Vec<u8>) -> Result<(), SinkClosed> {
        self.extend_from_slice(&chunk);
        Ok(())
    }
}

/// Forwards chunks into a bounded channel.
#[async_trait]
impl ChunkSink for tokio::sync::mpsc::Sender<Vec<u8>> {
    async fn write(&mut self, chunk: Vec<u8>) -> Result<(), SinkClosed> {
        self.send(chunk).await.map_err(|_| SinkClosed)
    }
}
