//! Quest engine - daily quest lifecycle
//!
//! Generation is an idempotent upsert keyed on (user, type, active window):
//! a complete unexpired set is returned unchanged, missing types are filled
//! in. Progress and claiming run inside immediate transactions so concurrent
//! action handlers never lose increments or double-pay a claim.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::RewardConfig;
use crate::db::{self, quests, users, LedgerDb, Quest};
use crate::error::RewardError;

use super::events::{EventBus, RewardEvent};

/// Result of a successful claim
#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub quest_id: String,
    pub reward: i32,
    pub balance: i32,
}

/// Quest engine
pub struct QuestService {
    db: Arc<LedgerDb>,
    config: Arc<RewardConfig>,
    events: Arc<EventBus>,
}

impl QuestService {
    pub fn new(db: Arc<LedgerDb>, config: Arc<RewardConfig>, events: Arc<EventBus>) -> Self {
        Self { db, config, events }
    }

    /// Generate the user's daily quest set, or return the existing one.
    ///
    /// Idempotent within the active window: a second call returns the same
    /// quest ids. Only types missing an unexpired quest get a fresh row.
    pub fn generate_daily_quests(&self, user_id: &str) -> Result<Vec<Quest>, RewardError> {
        if user_id.trim().is_empty() {
            return Err(RewardError::InvalidInput("user_id is required".into()));
        }

        let window_hours = self.config.quest_window_hours;
        let catalog = self.config.quest_catalog.clone();

        let mut conn = self.db.conn()?;
        let (quest_set, created_ids) = conn.immediate_transaction(|conn| {
            users::get_user_required(conn, user_id)?;

            let now = db::models::current_timestamp();
            let active = quests::active_quests(conn, user_id, &now)?;

            let mut quest_set = Vec::with_capacity(catalog.len());
            let mut created_ids = Vec::new();

            for spec in &catalog {
                let existing = active.iter().find(|q| q.quest_type == spec.quest_type);
                match existing {
                    Some(q) => quest_set.push(q.clone()),
                    None => {
                        let expires_at = db::models::timestamp_in_hours(window_hours);
                        let quest = quests::insert_quest(
                            conn,
                            quests::InsertQuestInput {
                                user_id,
                                quest_type: &spec.quest_type,
                                title: &spec.title,
                                description: spec.description.as_deref(),
                                target_amount: spec.target_amount,
                                reward: spec.reward,
                                expires_at: &expires_at,
                            },
                        )?;
                        created_ids.push(quest.id.clone());
                        quest_set.push(quest);
                    }
                }
            }

            Ok::<_, RewardError>((quest_set, created_ids))
        })?;

        if !created_ids.is_empty() {
            debug!(user = %user_id, count = created_ids.len(), "Generated daily quests");
            self.events.emit(RewardEvent::QuestsGenerated {
                user_id: user_id.to_string(),
                quest_ids: created_ids,
            });
        }

        Ok(quest_set)
    }

    /// All quest rows for the user, newest first
    pub fn get_user_quests(&self, user_id: &str) -> Result<Vec<Quest>, RewardError> {
        let mut conn = self.db.conn()?;
        quests::list_quests(&mut conn, user_id)
    }

    /// Advance the user's live quest of `quest_type` by `delta`.
    ///
    /// Deliberately a silent no-op (`Ok(None)`) when no unexpired, unclaimed
    /// quest of that type exists: action handlers call this unconditionally
    /// and must not care whether a quest is live. Completion is promoted in
    /// the same transaction and never un-set.
    pub fn update_quest_progress(
        &self,
        user_id: &str,
        quest_type: &str,
        delta: i32,
    ) -> Result<Option<Quest>, RewardError> {
        if delta <= 0 {
            return Err(RewardError::InvalidInput(format!(
                "delta must be > 0, got {}",
                delta
            )));
        }

        let mut conn = self.db.conn()?;
        let updated = conn.immediate_transaction(|conn| {
            let now = db::models::current_timestamp();
            let quest = match quests::find_live_quest(conn, user_id, quest_type, &now)? {
                Some(q) => q,
                None => return Ok::<_, RewardError>(None),
            };

            quests::increment_progress(conn, &quest.id, delta)?;
            quests::promote_completion(conn, &quest.id)?;

            quests::get_quest(conn, user_id, &quest.id)?
                .ok_or_else(|| RewardError::Internal("Failed to retrieve updated quest".into()))
                .map(Some)
        })?;

        match updated {
            Some(quest) => {
                self.events.emit(RewardEvent::QuestProgressed {
                    user_id: user_id.to_string(),
                    quest_id: quest.id.clone(),
                    quest_type: quest.quest_type.clone(),
                    current_amount: quest.current_amount,
                    completed: quest.is_completed == 1,
                });
                Ok(Some(quest))
            }
            None => {
                debug!(user = %user_id, quest_type = %quest_type, "No live quest, progress ignored");
                Ok(None)
            }
        }
    }

    /// Claim a completed quest's reward.
    ///
    /// Preconditions checked in order: exists, not claimed, not expired,
    /// completed. Claim and credit happen in one transaction; a concurrent
    /// double-claim loses with `AlreadyClaimed`.
    pub fn claim_quest_reward(
        &self,
        user_id: &str,
        quest_id: &str,
    ) -> Result<ClaimOutcome, RewardError> {
        let mut conn = self.db.conn()?;
        let outcome = conn.immediate_transaction(|conn| {
            let quest = quests::get_quest(conn, user_id, quest_id)?
                .ok_or_else(|| RewardError::NotFound(format!("quest {}", quest_id)))?;

            if quest.is_claimed == 1 {
                return Err(RewardError::AlreadyClaimed(quest_id.to_string()));
            }
            if db::models::is_past(&quest.expires_at) {
                return Err(RewardError::Expired(quest_id.to_string()));
            }
            if quest.is_completed == 0 {
                return Err(RewardError::NotCompleted(quest_id.to_string()));
            }

            // Guarded flip decides the winner under concurrency
            if !quests::mark_claimed(conn, quest_id)? {
                return Err(RewardError::AlreadyClaimed(quest_id.to_string()));
            }

            let change = users::credit_coins(conn, user_id, quest.reward)?;

            Ok::<_, RewardError>(ClaimOutcome {
                quest_id: quest_id.to_string(),
                reward: quest.reward,
                balance: change.balance,
            })
        })?;

        info!(
            user = %user_id,
            quest = %quest_id,
            reward = outcome.reward,
            "Quest reward claimed"
        );
        self.events.emit(RewardEvent::QuestClaimed {
            user_id: user_id.to_string(),
            quest_id: outcome.quest_id.clone(),
            reward: outcome.reward,
            balance: outcome.balance,
        });

        Ok(outcome)
    }

    /// Sweep expired quests regardless of completion/claim state.
    ///
    /// Intended to run on a periodic trigger outside this crate. Unexpired
    /// rows are never touched.
    pub fn reset_daily_quests(&self) -> Result<usize, RewardError> {
        let mut conn = self.db.conn()?;
        let deleted = conn.immediate_transaction(|conn| {
            let now = db::models::current_timestamp();
            quests::delete_expired(conn, &now)
        })?;

        if deleted > 0 {
            info!(deleted = deleted, "Swept expired quests");
            self.events.emit(RewardEvent::QuestsSwept { deleted });
        }

        Ok(deleted)
    }
}
