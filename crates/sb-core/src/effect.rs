//! Effects that modify game state.
//!
//! Like conditions, effects are authored as flat records and decoded into
//! a closed enum, with undecodable records kept as [`Effect::Unrecognized`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wire::salvage;

/// The flat on-disk shape of an effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEffect {
    /// Effect kind, e.g. `"set_flag"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// String key: flag name, quest id, item id, location id, or faction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Numeric amount or delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Stage name for quest effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

/// A state mutation applied when a node is entered or a choice is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "WireEffect")]
pub enum Effect {
    /// Set a flag.
    SetFlag {
        /// Flag name.
        flag: String,
    },
    /// Clear a flag.
    ClearFlag {
        /// Flag name.
        flag: String,
    },
    /// Add `delta` (possibly negative) to a reputation score.
    ChangeReputation {
        /// Faction; `None` means the global score.
        faction: Option<String>,
        /// Signed change.
        delta: i64,
    },
    /// Add gold.
    GiveGold {
        /// Amount added.
        amount: u32,
    },
    /// Remove gold. Content is expected to guard this with `gold_gte`.
    TakeGold {
        /// Amount removed, before the floor is applied.
        amount: u32,
    },
    /// Add items to the inventory.
    GiveItem {
        /// Item id.
        item: String,
        /// How many, at least 1.
        count: u32,
    },
    /// Remove items from the inventory.
    TakeItem {
        /// Item id.
        item: String,
        /// How many, at least 1.
        count: u32,
    },
    /// Start a quest.
    StartQuest {
        /// Quest id.
        quest: String,
        /// Initial stage; `None` uses the engine's default stage name.
        stage: Option<String>,
    },
    /// Move a quest to a new stage.
    AdvanceQuest {
        /// Quest id.
        quest: String,
        /// New stage name.
        stage: String,
    },
    /// Mark a quest complete.
    CompleteQuest {
        /// Quest id.
        quest: String,
    },
    /// Open a location to map and travel systems.
    UnlockLocation {
        /// Location id.
        location: String,
    },
    /// Content that could not be decoded. Applying it does nothing.
    Unrecognized {
        /// The record exactly as authored.
        record: WireEffect,
        /// Why it could not be decoded.
        reason: String,
    },
}

impl Effect {
    /// The authored `type` string for this effect.
    pub fn kind(&self) -> &str {
        match self {
            Self::SetFlag { .. } => "set_flag",
            Self::ClearFlag { .. } => "clear_flag",
            Self::ChangeReputation { .. } => "change_reputation",
            Self::GiveGold { .. } => "give_gold",
            Self::TakeGold { .. } => "take_gold",
            Self::GiveItem { .. } => "give_item",
            Self::TakeItem { .. } => "take_item",
            Self::StartQuest { .. } => "start_quest",
            Self::AdvanceQuest { .. } => "advance_quest",
            Self::CompleteQuest { .. } => "complete_quest",
            Self::UnlockLocation { .. } => "unlock_location",
            Self::Unrecognized { record, .. } => &record.kind,
        }
    }

    /// Returns true for [`Effect::Unrecognized`].
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized { .. })
    }

    /// Shorthand for [`Effect::SetFlag`].
    pub fn set_flag(flag: impl Into<String>) -> Self {
        Self::SetFlag { flag: flag.into() }
    }

    /// Shorthand for a global [`Effect::ChangeReputation`].
    pub fn change_reputation(delta: i64) -> Self {
        Self::ChangeReputation {
            faction: None,
            delta,
        }
    }

    /// Shorthand for [`Effect::GiveGold`].
    pub fn give_gold(amount: u32) -> Self {
        Self::GiveGold { amount }
    }

    /// Shorthand for [`Effect::TakeGold`].
    pub fn take_gold(amount: u32) -> Self {
        Self::TakeGold { amount }
    }
}

fn unrecognized(record: WireEffect, reason: impl Into<String>) -> Effect {
    Effect::Unrecognized {
        record,
        reason: reason.into(),
    }
}

fn item_count(value: Option<i64>) -> Result<u32, String> {
    match value {
        None => Ok(1),
        Some(v) if (1..=i64::from(u32::MAX)).contains(&v) => Ok(v as u32),
        Some(v) => Err(format!("item count {v} out of range")),
    }
}

impl From<Value> for Effect {
    fn from(raw: Value) -> Self {
        match WireEffect::deserialize(&raw) {
            Ok(wire) => wire.into(),
            Err(e) => {
                let salvaged = salvage(&raw);
                let record = WireEffect {
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

impl From<WireEffect> for Effect {
    fn from(wire: WireEffect) -> Self {
        let target = wire.target.clone();
        let value = wire.value;
        let string_value = wire.string_value.clone();
        let kind = wire.kind.clone();

        match kind.as_str() {
            "set_flag" => match target {
                Some(flag) => Self::SetFlag { flag },
                None => unrecognized(wire, "missing target flag"),
            },
            "clear_flag" => match target {
                Some(flag) => Self::ClearFlag { flag },
                None => unrecognized(wire, "missing target flag"),
            },
            "change_reputation" => match value {
                Some(delta) => Self::ChangeReputation {
                    faction: target,
                    delta,
                },
                None => unrecognized(wire, "missing reputation delta"),
            },
            "give_gold" | "take_gold" => match value {
                Some(v) => match u32::try_from(v) {
                    Ok(amount) if kind == "give_gold" => Self::GiveGold { amount },
                    Ok(amount) => Self::TakeGold { amount },
                    Err(_) => unrecognized(wire, format!("gold amount {v} out of range")),
                },
                None => unrecognized(wire, "missing gold amount"),
            },
            "give_item" | "take_item" => match (target, item_count(value)) {
                (None, _) => unrecognized(wire, "missing target item"),
                (Some(_), Err(reason)) => unrecognized(wire, reason),
                (Some(item), Ok(count)) if kind == "give_item" => Self::GiveItem { item, count },
                (Some(item), Ok(count)) => Self::TakeItem { item, count },
            },
            "start_quest" => match target {
                Some(quest) => Self::StartQuest {
                    quest,
                    stage: string_value,
                },
                None => unrecognized(wire, "missing target quest"),
            },
            "advance_quest" => match (target, string_value) {
                (Some(quest), Some(stage)) => Self::AdvanceQuest { quest, stage },
                (None, _) => unrecognized(wire, "missing target quest"),
                (Some(_), None) => unrecognized(wire, "missing stringValue stage"),
            },
            "complete_quest" => match target {
                Some(quest) => Self::CompleteQuest { quest },
                None => unrecognized(wire, "missing target quest"),
            },
            "unlock_location" => match target {
                Some(location) => Self::UnlockLocation { location },
                None => unrecognized(wire, "missing target location"),
            },
            other => {
                let reason = format!("unknown effect type \"{other}\"");
                unrecognized(wire, reason)
            }
        }
    }
}

impl From<Effect> for WireEffect {
    fn from(effect: Effect) -> Self {
        let kind = effect.kind().to_string();
        let base = WireEffect {
            kind,
            ..Default::default()
        };
        match effect {
            Effect::SetFlag { flag } | Effect::ClearFlag { flag } => WireEffect {
                target: Some(flag),
                ..base
            },
            Effect::ChangeReputation { faction, delta } => WireEffect {
                target: faction,
                value: Some(delta),
                ..base
            },
            Effect::GiveGold { amount } | Effect::TakeGold { amount } => WireEffect {
                value: Some(i64::from(amount)),
                ..base
            },
            Effect::GiveItem { item, count } | Effect::TakeItem { item, count } => WireEffect {
                target: Some(item),
                value: (count != 1).then_some(i64::from(count)),
                ..base
            },
            Effect::StartQuest { quest, stage } => WireEffect {
                target: Some(quest),
                string_value: stage,
                ..base
            },
            Effect::AdvanceQuest { quest, stage } => WireEffect {
                target: Some(quest),
                string_value: Some(stage),
                ..base
            },
            Effect::CompleteQuest { quest } => WireEffect {
                target: Some(quest),
                ..base
            },
            Effect::UnlockLocation { location } => WireEffect {
                target: Some(location),
                ..base
            },
            Effect::Unrecognized { record, .. } => record,
        }
    }
}

impl fmt::Display for WireEffect {
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

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&WireEffect::from(self.clone()), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Effect {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decodes_gold_effects() {
        assert_eq!(decode(r#"{"type":"give_gold","value":100}"#), Effect::give_gold(100));
        assert_eq!(decode(r#"{"type":"take_gold","value":150}"#), Effect::take_gold(150));
    }

    #[test]
    fn negative_gold_is_unrecognized() {
        assert!(decode(r#"{"type":"give_gold","value":-5}"#).is_unrecognized());
    }

    #[test]
    fn malformed_effect_keeps_its_readable_fields() {
        match decode(r#"{"type":"set_flag","target":["seated"]}"#) {
            Effect::Unrecognized { record, reason } => {
                assert_eq!(record.kind, "set_flag");
                assert_eq!(record.target, None);
                assert!(reason.starts_with("malformed record"));
            }
            other => panic!("expected unrecognized, got {other:?}"),
        }
        assert!(decode(r#"{"type":"give_gold","value":"lots"}"#).is_unrecognized());
    }

    #[test]
    fn gold_amount_beyond_u32_is_unrecognized() {
        assert!(decode(r#"{"type":"take_gold","value":5000000000}"#).is_unrecognized());
    }

    #[test]
    fn decodes_faction_reputation_change() {
        assert_eq!(
            decode(r#"{"type":"change_reputation","target":"rangers","value":-10}"#),
            Effect::ChangeReputation {
                faction: Some("rangers".to_string()),
                delta: -10,
            }
        );
    }

    #[test]
    fn decodes_item_effects_with_counts() {
        assert_eq!(
            decode(r#"{"type":"give_item","target":"dynamite","value":3}"#),
            Effect::GiveItem {
                item: "dynamite".to_string(),
                count: 3,
            }
        );
        assert_eq!(
            decode(r#"{"type":"take_item","target":"letter"}"#),
            Effect::TakeItem {
                item: "letter".to_string(),
                count: 1,
            }
        );
    }

    #[test]
    fn advance_quest_requires_stage() {
        assert!(decode(r#"{"type":"advance_quest","target":"bounty"}"#).is_unrecognized());
        assert_eq!(
            decode(r#"{"type":"advance_quest","target":"bounty","stringValue":"track"}"#),
            Effect::AdvanceQuest {
                quest: "bounty".to_string(),
                stage: "track".to_string(),
            }
        );
    }

    #[test]
    fn unknown_effect_type_is_unrecognized() {
        let e = decode(r#"{"type":"play_sound","target":"gunshot"}"#);
        assert!(e.is_unrecognized());
        assert_eq!(e.kind(), "play_sound");
    }

    #[test]
    fn wire_form_is_preserved() {
        let json = r#"{"type":"start_quest","target":"gold_rush","stringValue":"stake_claim"}"#;
        let e = decode(json);
        let back = serde_json::to_value(&e).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(json).unwrap());
    }
}
