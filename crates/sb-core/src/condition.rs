//! Gating predicates for entry points and choices.
//!
//! Authored content stores a condition as a flat record
//! (`{ "type", "target", "value", "stringValue" }`). It is decoded into the
//! closed [`Condition`] enum; anything that does not decode cleanly becomes
//! [`Condition::Unrecognized`] instead of failing the whole load, so the
//! engine can fail that one condition closed and report it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::TimeOfDay;
use crate::wire::salvage;

/// The flat on-disk shape of a condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCondition {
    /// Condition kind, e.g. `"flag_set"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// String key: flag name, quest id, item id, NPC id, or faction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Numeric threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Enum-like comparison value (time of day, quest stage).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

/// A pure predicate over game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "WireCondition")]
pub enum Condition {
    /// The flag is set.
    FlagSet {
        /// Flag name.
        flag: String,
    },
    /// The flag is not set.
    FlagUnset {
        /// Flag name.
        flag: String,
    },
    /// Reputation is at least `threshold`.
    ReputationGte {
        /// Faction; `None` means the global score.
        faction: Option<String>,
        /// Inclusive lower bound.
        threshold: i64,
    },
    /// Reputation is at most `threshold`.
    ReputationLte {
        /// Faction; `None` means the global score.
        faction: Option<String>,
        /// Inclusive upper bound.
        threshold: i64,
    },
    /// The quest has been started and is not complete.
    QuestActive {
        /// Quest id.
        quest: String,
        /// When set, the quest must also be at this stage.
        stage: Option<String>,
    },
    /// The quest is complete.
    QuestComplete {
        /// Quest id.
        quest: String,
    },
    /// The player carries at least `count` of the item.
    HasItem {
        /// Item id.
        item: String,
        /// Minimum count, at least 1.
        count: u32,
    },
    /// The player has at least `amount` gold.
    GoldGte {
        /// Inclusive lower bound.
        amount: i64,
    },
    /// The player has not met the NPC yet.
    FirstMeeting {
        /// NPC id; `None` means the NPC the conversation is with.
        npc: Option<String>,
    },
    /// The player has met the NPC before.
    ReturnVisit {
        /// NPC id; `None` means the NPC the conversation is with.
        npc: Option<String>,
    },
    /// The current time of day matches.
    TimeOfDay {
        /// Expected classification.
        time: TimeOfDay,
    },
    /// The player has spoken with the named NPC at some point.
    TalkedTo {
        /// NPC id.
        npc: String,
    },
    /// Content that could not be decoded. Always evaluates to false.
    Unrecognized {
        /// The record exactly as authored.
        record: WireCondition,
        /// Why it could not be decoded.
        reason: String,
    },
}

impl Condition {
    /// The authored `type` string for this condition.
    pub fn kind(&self) -> &str {
        match self {
            Self::FlagSet { .. } => "flag_set",
            Self::FlagUnset { .. } => "flag_unset",
            Self::ReputationGte { .. } => "reputation_gte",
            Self::ReputationLte { .. } => "reputation_lte",
            Self::QuestActive { .. } => "quest_active",
            Self::QuestComplete { .. } => "quest_complete",
            Self::HasItem { .. } => "has_item",
            Self::GoldGte { .. } => "gold_gte",
            Self::FirstMeeting { .. } => "first_meeting",
            Self::ReturnVisit { .. } => "return_visit",
            Self::TimeOfDay { .. } => "time_of_day",
            Self::TalkedTo { .. } => "talked_to",
            Self::Unrecognized { record, .. } => &record.kind,
        }
    }

    /// Returns true for [`Condition::Unrecognized`].
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized { .. })
    }

    /// Shorthand for [`Condition::FlagSet`].
    pub fn flag_set(flag: impl Into<String>) -> Self {
        Self::FlagSet { flag: flag.into() }
    }

    /// Shorthand for [`Condition::FlagUnset`].
    pub fn flag_unset(flag: impl Into<String>) -> Self {
        Self::FlagUnset { flag: flag.into() }
    }

    /// Shorthand for a global [`Condition::ReputationGte`].
    pub fn reputation_gte(threshold: i64) -> Self {
        Self::ReputationGte {
            faction: None,
            threshold,
        }
    }

    /// Shorthand for [`Condition::GoldGte`].
    pub fn gold_gte(amount: i64) -> Self {
        Self::GoldGte { amount }
    }
}

fn unrecognized(record: WireCondition, reason: impl Into<String>) -> Condition {
    Condition::Unrecognized {
        record,
        reason: reason.into(),
    }
}

impl From<Value> for Condition {
    fn from(raw: Value) -> Self {
        match WireCondition::deserialize(&raw) {
            Ok(wire) => wire.into(),
            Err(e) => {
                let salvaged = salvage(&raw);
                let record = WireCondition {
                    kind: salvaged.kind,
                    target: salvaged.target,
                    value: salvaged.value,
                    string_value: salvaged.string_value,
                };
                unrecognized(record, format!("malformed record: {e}"))
            }
        }
    }
}

impl From<WireCondition> for Condition {
    fn from(wire: WireCondition) -> Self {
        let target = wire.target.clone();
        let value = wire.value;
        let string_value = wire.string_value.clone();
        let kind = wire.kind.clone();

        match kind.as_str() {
            "flag_set" => match target {
                Some(flag) => Self::FlagSet { flag },
                None => unrecognized(wire, "missing target flag"),
            },
            "flag_unset" => match target {
                Some(flag) => Self::FlagUnset { flag },
                None => unrecognized(wire, "missing target flag"),
            },
            "reputation_gte" => match value {
                Some(threshold) => Self::ReputationGte {
                    faction: target,
                    threshold,
                },
                None => unrecognized(wire, "missing threshold value"),
            },
            "reputation_lte" => match value {
                Some(threshold) => Self::ReputationLte {
                    faction: target,
                    threshold,
                },
                None => unrecognized(wire, "missing threshold value"),
            },
            "quest_active" => match target {
                Some(quest) => Self::QuestActive {
                    quest,
                    stage: string_value,
                },
                None => unrecognized(wire, "missing target quest"),
            },
            "quest_complete" => match target {
                Some(quest) => Self::QuestComplete { quest },
                None => unrecognized(wire, "missing target quest"),
            },
            "has_item" => match (target, value) {
                (None, _) => unrecognized(wire, "missing target item"),
                (Some(_), Some(v)) if !(1..=i64::from(u32::MAX)).contains(&v) => {
                    unrecognized(wire, format!("item count {v} out of range"))
                }
                (Some(item), v) => Self::HasItem {
                    item,
                    count: v.map_or(1, |v| v as u32),
                },
            },
            "gold_gte" => match value {
                Some(amount) => Self::GoldGte { amount },
                None => unrecognized(wire, "missing gold amount"),
            },
            "first_meeting" => Self::FirstMeeting { npc: target },
            "return_visit" => Self::ReturnVisit { npc: target },
            "time_of_day" => match string_value {
                Some(s) => Self::TimeOfDay {
                    time: TimeOfDay::parse(&s),
                },
                None => unrecognized(wire, "missing stringValue"),
            },
            "talked_to" => match target {
                Some(npc) => Self::TalkedTo { npc },
                None => unrecognized(wire, "missing target npc"),
            },
            other => {
                let reason = format!("unknown condition type \"{other}\"");
                unrecognized(wire, reason)
            }
        }
    }
}

impl From<Condition> for WireCondition {
    fn from(condition: Condition) -> Self {
        let kind = condition.kind().to_string();
        let base = WireCondition {
            kind,
            ..Default::default()
        };
        match condition {
            Condition::FlagSet { flag } | Condition::FlagUnset { flag } => WireCondition {
                target: Some(flag),
                ..base
            },
            Condition::ReputationGte { faction, threshold }
            | Condition::ReputationLte { faction, threshold } => WireCondition {
                target: faction,
                value: Some(threshold),
                ..base
            },
            Condition::QuestActive { quest, stage } => WireCondition {
                target: Some(quest),
                string_value: stage,
                ..base
            },
            Condition::QuestComplete { quest } => WireCondition {
                target: Some(quest),
                ..base
            },
            Condition::HasItem { item, count } => WireCondition {
                target: Some(item),
                value: (count != 1).then_some(i64::from(count)),
                ..base
            },
            Condition::GoldGte { amount } => WireCondition {
                value: Some(amount),
                ..base
            },
            Condition::FirstMeeting { npc } | Condition::ReturnVisit { npc } => WireCondition {
                target: npc,
                ..base
            },
            Condition::TimeOfDay { time } => WireCondition {
                string_value: Some(time.to_string()),
                ..base
            },
            Condition::TalkedTo { npc } => WireCondition {
                target: Some(npc),
                ..base
            },
            Condition::Unrecognized { record, .. } => record,
        }
    }
}

impl fmt::Display for WireCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        let args: Vec<String> = [
            self.target.clone(),
            self.value.map(|v| v.to_string()),
            self.string_value.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !args.is_empty() {
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&WireCondition::from(self.clone()), f)
    }
}
