//! Entry point selection.

use sb_core::{DialogueTree, EntryPoint, StateQuery};

use crate::diagnostic::Diagnostics;
use crate::evaluate::all_hold;

/// An entry point whose conditions all hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySelection<'t> {
    /// Position of the entry in the tree's authored list.
    pub index: usize,
    /// The entry itself.
    pub entry: &'t EntryPoint,
}

impl<'t> EntrySelection<'t> {
    /// The node the conversation starts at.
    pub fn node_id(&self) -> &'t str {
        &self.entry.node_id
    }

    /// The entry's priority.
    pub fn priority(&self) -> i32 {
        self.entry.priority
    }
}

/// Every eligible entry point, in authored order.
pub fn eligible_entries<'t, S: StateQuery + ?Sized>(
    tree: &'t DialogueTree,
    state: &S,
    npc: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> Vec<EntrySelection<'t>> {
    tree.entry_points
        .iter()
        .enumerate()
        .filter(|(_, entry)| all_hold(&entry.conditions, state, npc, diagnostics))
        .map(|(index, entry)| EntrySelection { index, entry })
        .collect()
}

/// Pick the entry point a conversation starts from.
///
/// The highest priority among eligible entries wins. Equal priorities go
/// to the entry declared first. `None` means the NPC has nothing to say.
pub fn select_entry<'t, S: StateQuery + ?Sized>(
    tree: &'t DialogueTree,
    state: &S,
    npc: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> Option<EntrySelection<'t>> {
    let chosen = best_of(eligible_entries(tree, state, npc, diagnostics));
    match &chosen {
        Some(sel) => tracing::debug!(
            tree = %tree.id,
            node = %sel.node_id(),
            priority = sel.priority(),
            "selected entry point"
        ),
        None => tracing::debug!(tree = %tree.id, "no eligible entry point"),
    }
    chosen
}

/// Highest priority wins; only a strictly greater priority displaces an
/// earlier candidate.
pub(crate) fn best_of<T, I>(candidates: I) -> Option<T>
where
    T: HasPriority,
    I: IntoIterator<Item = T>,
{
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(b) if b.priority_key() >= candidate.priority_key() => Some(b),
        _ => Some(candidate),
    })
}

pub(crate) trait HasPriority {
    fn priority_key(&self) -> i32;
}

impl HasPriority for EntrySelection<'_> {
    fn priority_key(&self) -> i32 {
        self.priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sb_core::{Condition, DialogueNode, Effect, GameState};

    use crate::apply::apply;
    use crate::config::EngineConfig;

    fn greeter() -> DialogueTree {
        DialogueTree::new("sheriff_greeting", "Sheriff")
            .with_entry(
                EntryPoint::new("greet_friend", 10).with_condition(Condition::reputation_gte(50)),
            )
            .with_entry(EntryPoint::new("greet_default", 0))
            .with_node(DialogueNode::new("greet_friend", "Good to see you, partner."))
            .with_node(DialogueNode::new("greet_default", "Keep your hands where I can see 'em."))
    }

    fn pick(tree: &DialogueTree, state: &GameState) -> Option<String> {
        select_entry(tree, state, None, &mut Diagnostics::new()).map(|s| s.node_id().to_string())
    }

    #[test]
    fn reputation_unlocks_friendly_greeting() {
        let tree = greeter();
        let mut state = GameState::new();
        assert_eq!(pick(&tree, &state).as_deref(), Some("greet_default"));

        apply(
            &Effect::change_reputation(60),
            &mut state,
            &EngineConfig::default(),
            &mut Diagnostics::new(),
        );
        assert_eq!(pick(&tree, &state).as_deref(), Some("greet_friend"));
    }

    #[test]
    fn ties_go_to_first_declared() {
        let tree = DialogueTree::new("agent", "Agent")
            .with_entry(EntryPoint::new("loyal", 5).with_condition(Condition::flag_set("loyal")))
            .with_entry(EntryPoint::new("pending", 5))
            .with_entry(EntryPoint::new("refused", 5))
            .with_node(DialogueNode::new("loyal", "…"))
            .with_node(DialogueNode::new("pending", "…"))
            .with_node(DialogueNode::new("refused", "…"));

        let mut state = GameState::new();
        assert_eq!(pick(&tree, &state).as_deref(), Some("pending"));
        sb_core::StateMutation::set_flag(&mut state, "loyal");
        assert_eq!(pick(&tree, &state).as_deref(), Some("loyal"));
    }

    #[test]
    fn no_eligible_entry_is_none() {
        let tree = DialogueTree::new("shy", "Shy")
            .with_entry(EntryPoint::new("hello", 0).with_condition(Condition::flag_set("brave")))
            .with_node(DialogueNode::new("hello", "Oh! Hello."));
        assert_eq!(pick(&tree, &GameState::new()), None);
    }

    #[test]
    fn eligible_entries_keep_authored_order() {
        let tree = greeter();
        let mut state = GameState::new();
        sb_core::StateMutation::set_reputation(&mut state, None, 99);
        let eligible = eligible_entries(&tree, &state, None, &mut Diagnostics::new());
        let indices: Vec<usize> = eligible.iter().map(|s| s.index).collect();
        assert_eq!(indices, [0, 1]);
    }

    fn tree_with_priorities(priorities: &[i32]) -> DialogueTree {
        priorities
            .iter()
            .enumerate()
            .fold(DialogueTree::new("p", "P"), |tree, (i, p)| {
                let id = format!("n{i}");
                tree.with_entry(EntryPoint::new(id.clone(), *p))
                    .with_node(DialogueNode::new(id, "…"))
            })
    }

    proptest! {
        #[test]
        fn selection_is_deterministic(priorities in prop::collection::vec(-5i32..5, 1..8)) {
            let tree = tree_with_priorities(&priorities);
            let state = GameState::new();
            let first = pick(&tree, &state);
            for _ in 0..3 {
                prop_assert_eq!(pick(&tree, &state), first.clone());
            }
        }

        #[test]
        fn highest_priority_first_declared_wins(
            priorities in prop::collection::vec(-5i32..5, 1..8)
        ) {
            let tree = tree_with_priorities(&priorities);
            let max = priorities.iter().copied().max().unwrap();
            let expected = priorities.iter().position(|p| *p == max).unwrap();
            prop_assert_eq!(pick(&tree, &GameState::new()), Some(format!("n{expected}")));
        }
    }
}
