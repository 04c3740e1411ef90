//! Non-fatal reports about degraded content.
//!
//! A diagnostic never stops a conversation. Each one is also emitted as a
//! `tracing` warning so hosts with a subscriber see it in their logs.

use std::fmt;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A condition could not be decoded and evaluated to false.
    UnrecognizedCondition,
    /// An effect could not be decoded and was skipped.
    UnrecognizedEffect,
    /// `take_gold` would have gone below the floor.
    GoldClamped,
    /// A reputation change was clamped into the configured bounds.
    ReputationClamped,
    /// `take_item` found fewer items than requested.
    MissingItem,
    /// `first_meeting`/`return_visit` had no NPC to check.
    UnresolvedNpc,
    /// A quest effect targeted a quest that is already complete.
    QuestAlreadyComplete,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnrecognizedCondition => "unrecognized condition",
            Self::UnrecognizedEffect => "unrecognized effect",
            Self::GoldClamped => "gold clamped",
            Self::ReputationClamped => "reputation clamped",
            Self::MissingItem => "missing item",
            Self::UnresolvedNpc => "unresolved npc",
            Self::QuestAlreadyComplete => "quest already complete",
        };
        f.write_str(s)
    }
}

/// A single report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Category.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Ordered collection of diagnostics gathered during a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(kind = %kind, "{message}");
        self.items.push(Diagnostic { kind, message });
    }

    /// All diagnostics, oldest first.
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Iterate over the diagnostics.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if any diagnostic has the given kind.
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.items.iter().any(|d| d.kind == kind)
    }

    /// Move every diagnostic out of `other` into `self`.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.items.append(&mut other.items);
    }

    /// Take all diagnostics, leaving the collection empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_order() {
        let mut diags = Diagnostics::new();
        diags.push(DiagnosticKind::GoldClamped, "first");
        diags.push(DiagnosticKind::MissingItem, "second");

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.as_slice()[0].message, "first");
        assert!(diags.contains(DiagnosticKind::MissingItem));
        assert!(!diags.contains(DiagnosticKind::UnresolvedNpc));
    }

    #[test]
    fn drain_empties() {
        let mut diags = Diagnostics::new();
        diags.push(DiagnosticKind::UnrecognizedEffect, "play_sound");
        let taken = diags.drain();
        assert_eq!(taken.len(), 1);
        assert!(diags.is_empty());
        assert_eq!(taken[0].to_string(), "unrecognized effect: play_sound");
    }
}
