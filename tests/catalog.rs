// Native checks for the static level catalog.

use std::collections::HashSet;

use anniversary_quest::levels::{self, GameKind, LEVELS};

#[test]
fn ids_are_contiguous_from_one() {
    for (i, level) in LEVELS.iter().enumerate() {
        assert_eq!(usize::from(level.id), i + 1, "level '{}' out of order", level.name);
    }
    assert_eq!(levels::last_index(), LEVELS.len() - 1);
}

#[test]
fn every_variant_appears_once_in_play_order() {
    let kinds: Vec<GameKind> = LEVELS.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            GameKind::Catcher,
            GameKind::MemoryMatch,
            GameKind::MashToFill,
            GameKind::TimingStop,
            GameKind::SequenceRepeat,
            GameKind::Arithmetic,
            GameKind::Dodge,
            GameKind::Charge,
        ]
    );
    let unique: HashSet<_> = kinds.iter().collect();
    assert_eq!(unique.len(), kinds.len());
}

#[test]
fn texts_are_present() {
    for level in &LEVELS {
        assert!(!level.name.trim().is_empty(), "level {} has no name", level.id);
        assert!(!level.instruction.trim().is_empty(), "level {} has no instruction", level.id);
    }
    assert!(levels::level(LEVELS.len()).is_none());
}
