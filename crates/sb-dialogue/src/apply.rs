//! Effect application.
//!
//! Effects are applied one at a time, in declaration order, through a
//! [`StateMutation`]. Each application yields an [`EffectRecord`] for the
//! conversation log. Effects never fail: content that would break a state
//! invariant is clamped or skipped and reported as a diagnostic.

use sb_core::{Effect, QuestStatus, StateMutation};

use crate::config::EngineConfig;
use crate::diagnostic::{DiagnosticKind, Diagnostics};

/// What happened when an effect was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectOutcome {
    /// The effect ran as authored.
    Applied,
    /// The effect ran but its result was clamped.
    Clamped,
    /// The effect changed nothing.
    NoOp,
}

/// Log entry for one applied effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRecord {
    /// The effect as authored.
    pub effect: Effect,
    /// How it was applied.
    pub outcome: EffectOutcome,
}

/// Apply a single effect to the state.
pub fn apply<S: StateMutation + ?Sized>(
    effect: &Effect,
    state: &mut S,
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> EffectRecord {
    let outcome = match effect {
        Effect::SetFlag { flag } => {
            state.set_flag(flag);
            EffectOutcome::Applied
        }
        Effect::ClearFlag { flag } => {
            state.clear_flag(flag);
            EffectOutcome::Applied
        }
        Effect::ChangeReputation { faction, delta } => {
            change_reputation(state, faction.as_deref(), *delta, config, diagnostics)
        }
        Effect::GiveGold { amount } => {
            state.set_gold(state.gold().saturating_add(i64::from(*amount)));
            EffectOutcome::Applied
        }
        Effect::TakeGold { amount } => take_gold(state, *amount, config, diagnostics),
        Effect::GiveItem { item, count } => {
            state.add_item(item, *count);
            EffectOutcome::Applied
        }
        Effect::TakeItem { item, count } => {
            let removed = state.remove_item(item, *count);
            if removed < *count {
                diagnostics.push(
                    DiagnosticKind::MissingItem,
                    format!("take_item \"{item}\": wanted {count}, removed {removed}"),
                );
            }
            match removed {
                0 => EffectOutcome::NoOp,
                n if n < *count => EffectOutcome::Clamped,
                _ => EffectOutcome::Applied,
            }
        }
        Effect::StartQuest { quest, stage } => {
            if state.quest_status(quest).is_some() {
                tracing::debug!(quest = %quest, "start_quest on a quest already started; ignored");
                EffectOutcome::NoOp
            } else {
                let stage = stage
                    .clone()
                    .unwrap_or_else(|| config.default_quest_stage.clone());
                state.set_quest(quest, QuestStatus::Active { stage });
                EffectOutcome::Applied
            }
        }
        Effect::AdvanceQuest { quest, stage } => {
            if matches!(state.quest_status(quest), Some(QuestStatus::Complete)) {
                diagnostics.push(
                    DiagnosticKind::QuestAlreadyComplete,
                    format!("advance_quest \"{quest}\" to \"{stage}\": quest is already complete"),
                );
                EffectOutcome::NoOp
            } else {
                state.set_quest(
                    quest,
                    QuestStatus::Active {
                        stage: stage.clone(),
                    },
                );
                EffectOutcome::Applied
            }
        }
        Effect::CompleteQuest { quest } => {
            state.set_quest(quest, QuestStatus::Complete);
            EffectOutcome::Applied
        }
        Effect::UnlockLocation { location } => {
            state.unlock_location(location);
            EffectOutcome::Applied
        }
        Effect::Unrecognized { record, reason } => {
            diagnostics.push(
                DiagnosticKind::UnrecognizedEffect,
                format!("effect {record} skipped: {reason}"),
            );
            EffectOutcome::NoOp
        }
    };

    tracing::debug!(effect = %effect, ?outcome, "applied effect");
    EffectRecord {
        effect: effect.clone(),
        outcome,
    }
}

/// Apply a list of effects in declaration order.
pub fn apply_all<S: StateMutation + ?Sized>(
    effects: &[Effect],
    state: &mut S,
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<EffectRecord> {
    effects
        .iter()
        .map(|e| apply(e, state, config, diagnostics))
        .collect()
}

fn change_reputation<S: StateMutation + ?Sized>(
    state: &mut S,
    faction: Option<&str>,
    delta: i64,
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> EffectOutcome {
    let raw = state.reputation(faction).saturating_add(delta);
    let value = config.reputation_bounds.map_or(raw, |b| b.clamp(raw));
    state.set_reputation(faction, value);

    if value == raw {
        return EffectOutcome::Applied;
    }
    let scope = faction.unwrap_or("global");
    diagnostics.push(
        DiagnosticKind::ReputationClamped,
        format!("{scope} reputation {raw} clamped to {value}"),
    );
    EffectOutcome::Clamped
}

fn take_gold<S: StateMutation + ?Sized>(
    state: &mut S,
    amount: u32,
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> EffectOutcome {
    let gold = state.gold();
    let raw = gold.saturating_sub(i64::from(amount));
    // A balance already under the floor is never raised by taking gold.
    let value = raw.max(config.gold_floor.min(gold));
    state.set_gold(value);

    if value == raw {
        return EffectOutcome::Applied;
    }
    diagnostics.push(
        DiagnosticKind::GoldClamped,
        format!("take_gold {amount} with balance {gold}: floored at {value}"),
    );
    EffectOutcome::Clamped
}
