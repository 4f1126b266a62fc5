//! Connectivity state.
//!
//! Exactly one [`ConnectivityMonitor`] writes the current state; everyone else
//! holds a cheap [`ConnectivityHandle`] and reads snapshots or waits for
//! transitions. Platform signals arrive as [`NetworkKind`] events on a channel
//! that the monitor task drains.

mod probe;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub use probe::TcpProbe;

/// Connectivity as seen by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
}

/// Platform-reported network type. Folded into [`Connectivity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Wifi,
    Cellular,
    Ethernet,
    Vpn,
    Other,
    None,
}

impl From<NetworkKind> for Connectivity {
    fn from(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::None => Connectivity::Offline,
            _ => Connectivity::Online,
        }
    }
}

/// Read side: snapshot access and change notification.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    rx: watch::Receiver<Connectivity>,
}

impl ConnectivityHandle {
    pub fn current(&self) -> Connectivity {
        *self.rx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.current() == Connectivity::Online
    }

    pub fn is_offline(&self) -> bool {
        !self.is_online()
    }

    /// New receiver for observing transitions.
    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.rx.clone()
    }
}

/// Single writer of the connectivity state.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<Connectivity>,
}

impl ConnectivityMonitor {
    /// Create a monitor seeded from the platform's initial answer.
    pub fn new(initial: Connectivity) -> (Self, ConnectivityHandle) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, ConnectivityHandle { rx })
    }

    pub fn handle(&self) -> ConnectivityHandle {
        ConnectivityHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish a new state. Returns true if it differed from the previous one.
    pub fn set(&self, next: Connectivity) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            tracing::info!(state = ?next, "connectivity changed");
        }
        changed
    }

    /// Apply a platform event.
    pub fn apply(&self, kind: NetworkKind) -> bool {
        tracing::trace!(?kind, "platform network event");
        self.set(kind.into())
    }

    /// Spawn the monitor task draining platform events. The task ends when
    /// every event sender is dropped; handles keep the last published state.
    pub fn spawn(
        initial: Connectivity,
        mut events: mpsc::Receiver<NetworkKind>,
    ) -> (ConnectivityHandle, JoinHandle<()>) {
        let (monitor, handle) = Self::new(initial);
        let task = tokio::spawn(async move {
            while let Some(kind) = events.recv().await {
                monitor.apply(kind);
            }
            tracing::debug!("connectivity event source closed");
        });
        (handle, task)
    }
}
