//! Condition evaluation.
//!
//! Evaluation only sees a [`StateQuery`], so it cannot change game state.
//! Content that cannot be evaluated fails closed: a gated branch stays
//! locked and a diagnostic is recorded.

use sb_core::{Condition, QuestStatus, StateQuery};

use crate::diagnostic::{DiagnosticKind, Diagnostics};

/// Evaluate one condition.
///
/// `npc` is the NPC the conversation is held with. It resolves
/// `first_meeting` and `return_visit` when those name no NPC themselves.
pub fn evaluate<S: StateQuery + ?Sized>(
    condition: &Condition,
    state: &S,
    npc: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> bool {
    match condition {
        Condition::FlagSet { flag } => state.has_flag(flag),
        Condition::FlagUnset { flag } => !state.has_flag(flag),
        Condition::ReputationGte { faction, threshold } => {
            state.reputation(faction.as_deref()) >= *threshold
        }
        Condition::ReputationLte { faction, threshold } => {
            state.reputation(faction.as_deref()) <= *threshold
        }
        Condition::QuestActive { quest, stage } => match state.quest_status(quest) {
            Some(QuestStatus::Active { stage: current }) => {
                stage.as_ref().is_none_or(|wanted| wanted == current)
            }
            _ => false,
        },
        Condition::QuestComplete { quest } => {
            matches!(state.quest_status(quest), Some(QuestStatus::Complete))
        }
        Condition::HasItem { item, count } => state.item_count(item) >= *count,
        Condition::GoldGte { amount } => state.gold() >= *amount,
        Condition::FirstMeeting { npc: target } => {
            match resolve_npc(condition, target.as_deref(), npc, diagnostics) {
                Some(id) => !state.has_met(id),
                None => false,
            }
        }
        Condition::ReturnVisit { npc: target } => {
            match resolve_npc(condition, target.as_deref(), npc, diagnostics) {
                Some(id) => state.has_met(id),
                None => false,
            }
        }
        Condition::TimeOfDay { time } => state.time_of_day() == time,
        Condition::TalkedTo { npc } => state.has_talked_to(npc),
        Condition::Unrecognized { record, reason } => {
            diagnostics.push(
                DiagnosticKind::UnrecognizedCondition,
                format!("condition {record} evaluated as false: {reason}"),
            );
            false
        }
    }
}

/// Evaluate a condition list as a conjunction. An empty list holds.
///
/// Every condition is evaluated, even after one fails, so that all
/// unrecognized content in the list is reported.
pub fn all_hold<S: StateQuery + ?Sized>(
    conditions: &[Condition],
    state: &S,
    npc: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> bool {
    conditions
        .iter()
        .fold(true, |acc, c| evaluate(c, state, npc, diagnostics) && acc)
}

fn resolve_npc<'a>(
    condition: &Condition,
    target: Option<&'a str>,
    scope: Option<&'a str>,
    diagnostics: &mut Diagnostics,
) -> Option<&'a str> {
    let resolved = target.or(scope);
    if resolved.is_none() {
        diagnostics.push(
            DiagnosticKind::UnresolvedNpc,
            format!(
                "{} has no target and the conversation has no NPC; evaluated as false",
                condition.kind()
            ),
        );
    }
    resolved
}
