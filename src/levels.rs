//! Level catalog: the fixed, ordered sequence of eight months.
//!
//! Order is play order. `id` doubles as the month number shown on screen, so
//! ids run contiguously from 1.

/// Which mini-game variant a level mounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameKind {
    Catcher,
    MemoryMatch,
    MashToFill,
    TimingStop,
    SequenceRepeat,
    Arithmetic,
    Dodge,
    Charge,
}

/// Level descriptor (immutable).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelDescriptor {
    pub id: u8,
    pub name: &'static str,
    pub instruction: &'static str,
    pub kind: GameKind,
}

pub static LEVELS: [LevelDescriptor; 8] = [
    LevelDescriptor {
        id: 1,
        name: "Mes 1: La Conquista",
        instruction: "¡Atrapa 10 corazones!",
        kind: GameKind::Catcher,
    },
    LevelDescriptor {
        id: 2,
        name: "Mes 2: Conexión",
        instruction: "¡Encuentra las parejas!",
        kind: GameKind::MemoryMatch,
    },
    LevelDescriptor {
        id: 3,
        name: "Mes 3: Latidos",
        instruction: "¡Dale click rápido para llenar!",
        kind: GameKind::MashToFill,
    },
    LevelDescriptor {
        id: 4,
        name: "Mes 4: Sincronía",
        instruction: "¡Para en la zona verde!",
        kind: GameKind::TimingStop,
    },
    LevelDescriptor {
        id: 5,
        name: "Mes 5: Confianza",
        instruction: "¡Repite la secuencia!",
        kind: GameKind::SequenceRepeat,
    },
    LevelDescriptor {
        id: 6,
        name: "Mes 6: Lógica",
        instruction: "Resuelve: 4 + 4 = ?",
        kind: GameKind::Arithmetic,
    },
    LevelDescriptor {
        id: 7,
        name: "Mes 7: Esquivando Dramas",
        instruction: "¡Esquiva por 10 seg!",
        kind: GameKind::Dodge,
    },
    LevelDescriptor {
        id: 8,
        name: "Mes 8: Para Siempre",
        instruction: "¡Mantén presionado para cargar!",
        kind: GameKind::Charge,
    },
];

/// Descriptor at a 0-based play index.
pub fn level(index: usize) -> Option<&'static LevelDescriptor> {
    LEVELS.get(index)
}

/// Index of the final level.
pub fn last_index() -> usize {
    LEVELS.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_lookup() {
        assert_eq!(level(0).map(|l| l.kind), Some(GameKind::Catcher));
        assert_eq!(level(7).map(|l| l.kind), Some(GameKind::Charge));
        assert!(level(8).is_none());
        assert_eq!(last_index(), 7);
    }
}
