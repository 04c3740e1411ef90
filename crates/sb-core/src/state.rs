//! Game-state facade and the default in-memory implementation.
//!
//! The host application owns the game state. The engine only sees it
//! through [`StateQuery`] (reads, used by condition evaluation) and
//! [`StateMutation`] (writes, used by effects).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse time-of-day classification used by `time_of_day` conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeOfDay {
    /// Early morning, around sunrise.
    Dawn,
    /// Morning.
    #[default]
    Morning,
    /// Midday.
    Noon,
    /// Afternoon.
    Afternoon,
    /// Evening, around sunset.
    Evening,
    /// Night.
    Night,
    /// A host-defined classification not covered by the built-in ones.
    Other(String),
}

impl TimeOfDay {
    /// Parse a classification, case-insensitively. Unknown names are kept
    /// as [`TimeOfDay::Other`] (lowercased) so hosts can extend the set.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "dawn" => Self::Dawn,
            "morning" => Self::Morning,
            "noon" | "midday" => Self::Noon,
            "afternoon" => Self::Afternoon,
            "evening" | "dusk" => Self::Evening,
            "night" => Self::Night,
            _ => Self::Other(lower),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dawn => write!(f, "dawn"),
            Self::Morning => write!(f, "morning"),
            Self::Noon => write!(f, "noon"),
            Self::Afternoon => write!(f, "afternoon"),
            Self::Evening => write!(f, "evening"),
            Self::Night => write!(f, "night"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<String> for TimeOfDay {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

/// Progress of a single quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuestStatus {
    /// In progress at the named stage.
    Active {
        /// Current stage name. Stage names are free-form content.
        stage: String,
    },
    /// Finished. Terminal.
    Complete,
}

impl QuestStatus {
    /// Returns true for any non-terminal status.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// The current stage, if the quest is still active.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Active { stage } => Some(stage),
            Self::Complete => None,
        }
    }
}

/// Read-only view of game state.
///
/// Condition evaluation only ever receives this trait, so it cannot
/// mutate state.
pub trait StateQuery {
    /// Is the named flag set?
    fn has_flag(&self, flag: &str) -> bool;
    /// Reputation with a faction, or the global score when `faction` is `None`.
    fn reputation(&self, faction: Option<&str>) -> i64;
    /// Status of a quest, if it has been started.
    fn quest_status(&self, quest: &str) -> Option<&QuestStatus>;
    /// How many of an item the player carries.
    fn item_count(&self, item: &str) -> u32;
    /// Current gold balance.
    fn gold(&self) -> i64;
    /// Has the player met this NPC before?
    fn has_met(&self, npc: &str) -> bool;
    /// Has the player ever spoken with this NPC?
    fn has_talked_to(&self, npc: &str) -> bool;
    /// Current time-of-day classification.
    fn time_of_day(&self) -> &TimeOfDay;
    /// Is the location accessible to map and travel systems?
    fn is_location_unlocked(&self, location: &str) -> bool;
}

/// Write access to game state, used by effects and by the host.
pub trait StateMutation: StateQuery {
    /// Set a flag. Idempotent.
    fn set_flag(&mut self, flag: &str);
    /// Clear a flag. Returns whether it was set.
    fn clear_flag(&mut self, flag: &str) -> bool;
    /// Overwrite a reputation score (global when `faction` is `None`).
    fn set_reputation(&mut self, faction: Option<&str>, value: i64);
    /// Overwrite the gold balance.
    fn set_gold(&mut self, amount: i64);
    /// Add `count` of an item.
    fn add_item(&mut self, item: &str, count: u32);
    /// Remove up to `count` of an item. Returns how many were removed.
    fn remove_item(&mut self, item: &str, count: u32) -> u32;
    /// Overwrite a quest's status.
    fn set_quest(&mut self, quest: &str, status: QuestStatus);
    /// Make a location accessible. Returns false if it already was.
    fn unlock_location(&mut self, location: &str) -> bool;
    /// Record that the player has met an NPC.
    fn mark_met(&mut self, npc: &str);
    /// Record that the player has spoken with an NPC.
    fn mark_talked_to(&mut self, npc: &str);
}

/// The default in-memory game state.
///
/// Ordered collections keep serialized saves stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    /// Set flags.
    pub flags: BTreeSet<String>,
    /// Global reputation score. Unbounded unless the engine is configured otherwise.
    pub reputation: i64,
    /// Per-faction reputation scores.
    pub faction_reputation: BTreeMap<String, i64>,
    /// Quest progress by quest id.
    pub quests: BTreeMap<String, QuestStatus>,
    /// Inventory as item id → count. Items with a zero count are removed.
    pub inventory: BTreeMap<String, u32>,
    /// Gold balance.
    pub gold: i64,
    /// NPCs the player has met.
    pub met_npcs: BTreeSet<String>,
    /// NPCs the player has spoken with.
    pub talked_to: BTreeSet<String>,
    /// Locations opened up by dialogue.
    pub unlocked_locations: BTreeSet<String>,
    /// Current time-of-day classification.
    pub time_of_day: TimeOfDay,
}

impl GameState {
    /// Create an empty state for a new game.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time of day.
    pub fn with_time_of_day(mut self, time: TimeOfDay) -> Self {
        self.time_of_day = time;
        self
    }

    /// Set the starting gold balance.
    pub fn with_gold(mut self, gold: i64) -> Self {
        self.gold = gold;
        self
    }

    /// Record that a conversation with `npc` has started.
    ///
    /// Hosts call this once the entry point is chosen and before its node
    /// is entered. `first_meeting` then picks the opening, and everything
    /// after it sees the NPC as met.
    pub fn record_conversation(&mut self, npc: &str) {
        self.mark_met(npc);
        self.mark_talked_to(npc);
    }
}

impl StateQuery for GameState {
    fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    fn reputation(&self, faction: Option<&str>) -> i64 {
        match faction {
            Some(f) => self.faction_reputation.get(f).copied().unwrap_or(0),
            None => self.reputation,
        }
    }

    fn quest_status(&self, quest: &str) -> Option<&QuestStatus> {
        self.quests.get(quest)
    }

    fn item_count(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    fn gold(&self) -> i64 {
        self.gold
    }

    fn has_met(&self, npc: &str) -> bool {
        self.met_npcs.contains(npc)
    }

    fn has_talked_to(&self, npc: &str) -> bool {
        self.talked_to.contains(npc)
    }

    fn time_of_day(&self) -> &TimeOfDay {
        &self.time_of_day
    }

    fn is_location_unlocked(&self, location: &str) -> bool {
        self.unlocked_locations.contains(location)
    }
}

impl StateMutation for GameState {
    fn set_flag(&mut self, flag: &str) {
        self.flags.insert(flag.to_string());
    }

    fn clear_flag(&mut self, flag: &str) -> bool {
        self.flags.remove(flag)
    }

    fn set_reputation(&mut self, faction: Option<&str>, value: i64) {
        match faction {
            Some(f) => {
                self.faction_reputation.insert(f.to_string(), value);
            }
            None => self.reputation = value,
        }
    }

    fn set_gold(&mut self, amount: i64) {
        self.gold = amount;
    }

    fn add_item(&mut self, item: &str, count: u32) {
        if count == 0 {
            return;
        }
        let entry = self.inventory.entry(item.to_string()).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    fn remove_item(&mut self, item: &str, count: u32) -> u32 {
        let Some(held) = self.inventory.get_mut(item) else {
            return 0;
        };
        let removed = (*held).min(count);
        *held -= removed;
        if *held == 0 {
            self.inventory.remove(item);
        }
        removed
    }

    fn set_quest(&mut self, quest: &str, status: QuestStatus) {
        self.quests.insert(quest.to_string(), status);
    }

    fn unlock_location(&mut self, location: &str) -> bool {
        self.unlocked_locations.insert(location.to_string())
    }

    fn mark_met(&mut self, npc: &str) {
        self.met_npcs.insert(npc.to_string());
    }

    fn mark_talked_to(&mut self, npc: &str) {
        self.talked_to.insert(npc.to_string());
    }
}
