// src/channel.rs
// Named broadcast channels shared by every instance in the process, delivering
// each message to all other handles on the same name.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::card::BoardSet;
use crate::clock::Timestamp;
use crate::logging::{log_debug, log_warning};

const CHANNEL_CAPACITY: usize = 64;

/// Message exchanged between instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Update { ts: Timestamp, payload: BoardSet },
    Clear { ts: Timestamp },
    Reset { ts: Timestamp },
}

impl Envelope {
    pub fn ts(&self) -> Timestamp {
        match self {
            Envelope::Update { ts, .. } | Envelope::Clear { ts } | Envelope::Reset { ts } => *ts,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Update { .. } => "update",
            Envelope::Clear { .. } => "clear",
            Envelope::Reset { .. } => "reset",
        }
    }
}

// Messages travel as JSON text so the receiving side decodes them the
// same way it would decode anything from outside the process
#[derive(Debug, Clone)]
struct Delivery {
    origin: u64,
    body: String,
}

#[derive(Default)]
pub struct ChannelHub {
    channels: Mutex<HashMap<String, broadcast::Sender<Delivery>>>,
    next_id: AtomicU64,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide hub.
    pub fn global() -> &'static ChannelHub {
        static HUB: OnceLock<ChannelHub> = OnceLock::new();
        HUB.get_or_init(ChannelHub::new)
    }

    /// Open a handle on `name`. `None` when the hub cannot be used.
    pub fn open(&self, name: &str) -> Option<Channel> {
        let mut channels = self.channels.lock().ok()?;
        let sender = channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone();
        let receiver = sender.subscribe();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Some(Channel { id, name: name.to_string(), sender, receiver })
    }
}

/// One instance's handle on a named channel.
pub struct Channel {
    id: u64,
    name: String,
    sender: broadcast::Sender<Delivery>,
    receiver: broadcast::Receiver<Delivery>,
}

impl Channel {
    pub fn open(name: &str) -> Option<Channel> {
        ChannelHub::global().open(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fire-and-forget post to every other handle.
    pub fn post(&self, envelope: &Envelope) {
        let body = match serde_json::to_string(envelope) {
            Ok(body) => body,
            Err(e) => {
                log_warning(&format!("Could not encode {} envelope: {e}", envelope.kind()));
                return;
            }
        };
        // No live receivers is not an error for a broadcast
        let _ = self.sender.send(Delivery { origin: self.id, body });
    }

    /// Next envelope from another handle, if any is waiting.
    pub fn try_recv(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.try_recv() {
                Ok(delivery) if delivery.origin == self.id => continue,
                Ok(delivery) => match serde_json::from_str::<Envelope>(&delivery.body) {
                    Ok(envelope) => return Some(envelope),
                    Err(e) => {
                        log_debug(&format!("Ignoring malformed message on '{}': {e}", self.name));
                        continue;
                    }
                },
                Err(TryRecvError::Lagged(skipped)) => {
                    log_warning(&format!("Channel '{}' dropped {skipped} messages", self.name));
                    continue;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Inject a raw message as if another instance had sent it. Test support only.
    #[doc(hidden)]
    pub fn post_raw(&self, body: &str) {
        let _ = self.sender.send(Delivery { origin: u64::MAX, body: body.to_string() });
    }
}
