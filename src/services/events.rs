//! Event system for reward operations
//!
//! Provides an event bus for notifying listeners about reward operations.
//! Useful for:
//! - Push/in-app notification fan-out
//! - Audit logging
//! - Cache invalidation
//!
//! Delivery is out of scope: the engines only emit here, subscribers decide
//! what a `QuestClaimed` or `AchievementUnlocked` becomes downstream.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Reward events emitted by the engines
#[derive(Debug, Clone)]
pub enum RewardEvent {
    // Quest events
    QuestsGenerated {
        user_id: String,
        quest_ids: Vec<String>,
    },
    QuestProgressed {
        user_id: String,
        quest_id: String,
        quest_type: String,
        current_amount: i32,
        completed: bool,
    },
    QuestClaimed {
        user_id: String,
        quest_id: String,
        reward: i32,
        balance: i32,
    },
    QuestsSwept {
        deleted: usize,
    },

    // Achievement events
    AchievementUnlocked {
        user_id: String,
        achievement_id: String,
        title: String,
        badge_id: String,
        coin_reward: i32,
    },

    // Shop events
    ItemPurchased {
        user_id: String,
        item_id: String,
        price: i32,
        balance: i32,
    },
    ItemActivated {
        user_id: String,
        item_id: String,
        item_type: String,
    },
}

/// Trait for event listeners
pub trait EventListener: Send + Sync {
    /// Handle an event
    fn on_event(&self, event: &RewardEvent);
}

/// Event bus for broadcasting reward events
pub struct EventBus {
    sender: broadcast::Sender<RewardEvent>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: RewardEvent) {
        trace!(event = ?event, "Emitting reward event");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<RewardEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging event listener for audit trails
pub struct LoggingEventListener;

impl EventListener for LoggingEventListener {
    fn on_event(&self, event: &RewardEvent) {
        match event {
            RewardEvent::QuestClaimed {
                user_id,
                quest_id,
                reward,
                balance,
            } => {
                debug!(
                    user = %user_id,
                    quest = %quest_id,
                    reward = reward,
                    balance = balance,
                    "Quest reward claimed"
                );
            }
            RewardEvent::AchievementUnlocked {
                user_id,
                achievement_id,
                coin_reward,
                ..
            } => {
                debug!(
                    user = %user_id,
                    achievement = %achievement_id,
                    reward = coin_reward,
                    "Achievement unlocked"
                );
            }
            RewardEvent::ItemPurchased {
                user_id,
                item_id,
                price,
                ..
            } => {
                debug!(user = %user_id, item = %item_id, price = price, "Item purchased");
            }
            _ => {
                trace!(event = ?event, "Reward event");
            }
        }
    }
}

/// Spawn a background task that logs all events
pub fn spawn_logging_listener(event_bus: Arc<EventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    let listener = LoggingEventListener;

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => listener.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(skipped = n, "Event listener lagged, skipped events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping listener");
                    break;
                }
            }
        }
    })
}
