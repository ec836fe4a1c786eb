use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    Attack,
    Defence,
    Strength,
    Hitpoints,
    Ranged,
    Prayer,
    Magic,
    Cooking,
    Woodcutting,
    Fletching,
    Fishing,
    Firemaking,
    Crafting,
    Smithing,
    Mining,
    Herblore,
    Agility,
    Thieving,
    Slayer,
    Farming,
    Runecraft,
    Hunter,
    Construction,
}

impl Skill {
    pub const ALL: [Skill; 23] = [
        Skill::Attack,
        Skill::Defence,
        Skill::Strength,
        Skill::Hitpoints,
        Skill::Ranged,
        Skill::Prayer,
        Skill::Magic,
        Skill::Cooking,
        Skill::Woodcutting,
        Skill::Fletching,
        Skill::Fishing,
        Skill::Firemaking,
        Skill::Crafting,
        Skill::Smithing,
        Skill::Mining,
        Skill::Herblore,
        Skill::Agility,
        Skill::Thieving,
        Skill::Slayer,
        Skill::Farming,
        Skill::Runecraft,
        Skill::Hunter,
        Skill::Construction,
    ];
}

/// Kind of world the character is logged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldKind {
    Standard,
    Seasonal,
    Deadman,
    QuestSpeedrunning,
    Tournament,
    FreshStart,
    Beta,
    NoSave,
}

impl WorldKind {
    /// Temporary or non-persistent worlds where XP should not count by default.
    pub fn is_event(&self) -> bool {
        !matches!(self, WorldKind::Standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_skills_distinct() {
        let set: HashSet<_> = Skill::ALL.iter().collect();
        assert_eq!(set.len(), Skill::ALL.len());
    }

    #[test]
    fn test_event_worlds() {
        assert!(!WorldKind::Standard.is_event());
        assert!(WorldKind::Deadman.is_event());
        assert!(WorldKind::Beta.is_event());
    }
}
