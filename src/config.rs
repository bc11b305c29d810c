//! Configuration for reward-ledger
//!
//! Catalogs (quest types, achievement definitions, shop items) are plain
//! data here rather than literals inside the engines, so deployments can
//! extend them without touching engine logic.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RewardError;

/// Default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reward-ledger")
}

fn default_quest_window_hours() -> i64 {
    24
}

/// One entry in the daily quest catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestSpec {
    /// Quest type tag matched against user actions (e.g. "create_post")
    pub quest_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Progress needed to complete the quest
    pub target_amount: i32,
    /// Coins credited on claim
    pub reward: i32,
}

/// One entry in the achievement seed catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementSpec {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Badge shown on the profile once unlocked
    pub badge_id: String,
    pub coin_reward: i32,
    /// Lifetime counter this achievement measures (e.g. "posts_created")
    pub criteria_type: String,
    pub criteria_target: i32,
}

/// One entry in the shop seed catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopItemSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Cosmetic slot: "theme", "badge" or "frame"
    pub item_type: String,
    pub price: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Directory holding the ledger database
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// How long a generated quest stays claimable
    #[serde(default = "default_quest_window_hours")]
    pub quest_window_hours: i64,

    /// Daily quest catalog, one quest per entry per user per window
    #[serde(default = "default_quest_catalog")]
    pub quest_catalog: Vec<QuestSpec>,

    /// Achievement definitions seeded at open
    #[serde(default = "default_achievement_catalog")]
    pub achievement_catalog: Vec<AchievementSpec>,

    /// Shop catalog seeded at open
    #[serde(default = "default_shop_catalog")]
    pub shop_catalog: Vec<ShopItemSpec>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            quest_window_hours: default_quest_window_hours(),
            quest_catalog: default_quest_catalog(),
            achievement_catalog: default_achievement_catalog(),
            shop_catalog: default_shop_catalog(),
        }
    }
}

impl RewardConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self, RewardError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| RewardError::Config(format!("Parse failed: {}", e)))
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load_or_default(storage_dir: &Path) -> Self {
        let path = storage_dir.join("config.toml");
        if path.exists() {
            Self::load(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), RewardError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RewardError::Config(format!("Serialize failed: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Look up a quest spec by type tag
    pub fn quest_spec(&self, quest_type: &str) -> Option<&QuestSpec> {
        self.quest_catalog
            .iter()
            .find(|s| s.quest_type == quest_type)
    }
}

/// Stock daily quests: one post, three comments, five likes
pub fn default_quest_catalog() -> Vec<QuestSpec> {
    vec![
        QuestSpec {
            quest_type: "create_post".into(),
            title: "Share your knowledge".into(),
            description: Some("Publish a post today".into()),
            target_amount: 1,
            reward: 50,
        },
        QuestSpec {
            quest_type: "comment_post".into(),
            title: "Join the conversation".into(),
            description: Some("Leave 3 comments today".into()),
            target_amount: 3,
            reward: 30,
        },
        QuestSpec {
            quest_type: "like_post".into(),
            title: "Spread appreciation".into(),
            description: Some("Like 5 posts today".into()),
            target_amount: 5,
            reward: 20,
        },
    ]
}

/// Stock achievements shipped with the platform
pub fn default_achievement_catalog() -> Vec<AchievementSpec> {
    vec![
        AchievementSpec {
            id: "first-post".into(),
            title: "First Post".into(),
            description: Some("Publish your first post".into()),
            badge_id: "badge-first-post".into(),
            coin_reward: 50,
            criteria_type: "posts_created".into(),
            criteria_target: 1,
        },
        AchievementSpec {
            id: "prolific-writer".into(),
            title: "Prolific Writer".into(),
            description: Some("Publish 10 posts".into()),
            badge_id: "badge-prolific-writer".into(),
            coin_reward: 200,
            criteria_type: "posts_created".into(),
            criteria_target: 10,
        },
        AchievementSpec {
            id: "bookworm".into(),
            title: "Bookworm".into(),
            description: Some("Read 50 posts".into()),
            badge_id: "badge-bookworm".into(),
            coin_reward: 100,
            criteria_type: "posts_read".into(),
            criteria_target: 50,
        },
        AchievementSpec {
            id: "conversationalist".into(),
            title: "Conversationalist".into(),
            description: Some("Write 25 comments".into()),
            badge_id: "badge-conversationalist".into(),
            coin_reward: 150,
            criteria_type: "comments_made".into(),
            criteria_target: 25,
        },
        AchievementSpec {
            id: "rising-star".into(),
            title: "Rising Star".into(),
            description: Some("Gain 10 followers".into()),
            badge_id: "badge-rising-star".into(),
            coin_reward: 300,
            criteria_type: "followers_gained".into(),
            criteria_target: 10,
        },
    ]
}

/// Stock cosmetic shop
pub fn default_shop_catalog() -> Vec<ShopItemSpec> {
    vec![
        ShopItemSpec {
            id: "theme-midnight".into(),
            name: "Midnight Theme".into(),
            description: Some("A dark blue reading theme".into()),
            item_type: "theme".into(),
            price: 50,
            image_url: None,
        },
        ShopItemSpec {
            id: "theme-sepia".into(),
            name: "Sepia Theme".into(),
            description: Some("Warm tones for long sessions".into()),
            item_type: "theme".into(),
            price: 50,
            image_url: None,
        },
        ShopItemSpec {
            id: "badge-gold-quill".into(),
            name: "Gold Quill Badge".into(),
            description: Some("Show off your writing streak".into()),
            item_type: "badge".into(),
            price: 120,
            image_url: None,
        },
        ShopItemSpec {
            id: "frame-laurel".into(),
            name: "Laurel Frame".into(),
            description: Some("A laurel wreath around your avatar".into()),
            item_type: "frame".into(),
            price: 200,
            image_url: None,
        },
    ]
}
