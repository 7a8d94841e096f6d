//! Outbound message delivery.
//!
//! The engine only produces `ServerMessage`s; how they reach a client is the
//! transport's business. Two implementations ship here: a crossbeam channel
//! carrying JSON frames per seat (what a socket writer task would drain), and
//! an in-memory recorder for tests.

use anyhow::Context;
use crossbeam::channel::{self, Receiver, Sender};
use jantaku_engine::types::Seat;
use jantaku_engine::ServerMessage;
use parking_lot::Mutex;

pub trait Transport: Send + Sync {
    fn send(&self, seat: Seat, message: &ServerMessage) -> anyhow::Result<()>;
}

/// One unbounded channel of JSON frames per seat.
pub struct ChannelTransport {
    senders: Vec<Sender<String>>,
}

impl ChannelTransport {
    /// Returns the transport and the receiving end for each seat.
    pub fn new(num_seats: usize) -> (Self, Vec<Receiver<String>>) {
        let (senders, receivers) = (0..num_seats).map(|_| channel::unbounded()).unzip();
        (Self { senders }, receivers)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, seat: Seat, message: &ServerMessage) -> anyhow::Result<()> {
        let sender = self
            .senders
            .get(seat)
            .ok_or_else(|| anyhow::anyhow!("no channel for seat {}", seat))?;
        let frame = serde_json::to_string(message).context("serializing server message")?;
        sender
            .send(frame)
            .map_err(|_| anyhow::anyhow!("seat {} disconnected", seat))
    }
}

/// Keeps every message in memory.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(Seat, ServerMessage)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_for(&self, seat: Seat) -> Vec<ServerMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(s, _)| *s == seat)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Drains everything recorded so far.
    pub fn take(&self) -> Vec<(Seat, ServerMessage)> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Transport for RecordingTransport {
    fn send(&self, seat: Seat, message: &ServerMessage) -> anyhow::Result<()> {
        self.sent.lock().push((seat, message.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jantaku_engine::ServerEvent;

    #[test]
    fn channel_frames_are_json() {
        let (transport, receivers) = ChannelTransport::new(2);
        let msg = ServerMessage::Event(ServerEvent::RiichiAccepted { seat: 1 });
        transport.send(1, &msg).unwrap();
        assert!(receivers[0].try_recv().is_err());
        let frame = receivers[1].try_recv().unwrap();
        let back: ServerMessage = serde_json::from_str(&frame).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn channel_reports_unknown_and_closed_seats() {
        let (transport, mut receivers) = ChannelTransport::new(2);
        let msg = ServerMessage::Event(ServerEvent::LoadingStarted);
        assert!(transport.send(5, &msg).is_err());
        drop(receivers.remove(0));
        assert!(transport.send(0, &msg).is_err());
        assert!(transport.send(1, &msg).is_ok());
    }

    #[test]
    fn recorder_filters_by_seat() {
        let transport = RecordingTransport::new();
        transport.send(0, &ServerMessage::Event(ServerEvent::LoadingStarted)).unwrap();
        transport.send(2, &ServerMessage::Event(ServerEvent::LoadingStarted)).unwrap();
        assert_eq!(transport.messages_for(2).len(), 1);
        assert_eq!(transport.take().len(), 2);
        assert!(transport.take().is_empty());
    }
}
