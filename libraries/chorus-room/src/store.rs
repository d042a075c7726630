//! Mirror store seam
//!
//! The remote document store is reached only through this trait.
//! Subscriptions are scoped: dropping the [`Subscription`] (or the
//! task consuming it) is how a participant unsubscribes, so leaving a
//! room can never leak a listener.

use crate::error::Result;
use crate::types::MirrorDocument;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Stream of document updates for one room
///
/// The first update delivered is the document's current value, if the
/// room already has one. Dropping the subscription unsubscribes.
pub struct Subscription {
    updates: mpsc::UnboundedReceiver<MirrorDocument>,
}

impl Subscription {
    /// Wrap an update stream
    pub fn new(updates: mpsc::UnboundedReceiver<MirrorDocument>) -> Self {
        Self { updates }
    }

    /// Next document update; `None` once the store side closes
    pub async fn recv(&mut self) -> Option<MirrorDocument> {
        self.updates.recv().await
    }
}

/// Remote store holding one mirror document per room
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Overwrite the room's document wholesale
    async fn write(&self, room_id: &str, document: &MirrorDocument) -> Result<()>;

    /// Subscribe to the room's document updates
    async fn subscribe(&self, room_id: &str) -> Result<Subscription>;
}
