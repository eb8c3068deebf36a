use echorando_game::Amount;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Strictness tier of the traversal logic. Higher tiers grant more trick
/// resources at game start, opening alternatives that are otherwise
/// unsatisfiable.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum LayoutLogic {
    NoGlitches,
    NormalLogic,
    HardLogic,
}

impl LayoutLogic {
    pub fn trick_tier(self) -> u32 {
        match self {
            LayoutLogic::NoGlitches => 0,
            LayoutLogic::NormalLogic => 1,
            LayoutLogic::HardLogic => 2,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum LayoutMode {
    Standard,
    Major,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum LayoutRandomizedFlag {
    Vanilla,
    Randomized,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum LayoutEnabledFlag {
    Enabled,
    Disabled,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
pub enum LayoutDifficulty {
    Normal,
    Hard,
}

impl LayoutDifficulty {
    /// Value granted on every Difficulty resource row at game start.
    pub fn amount(self) -> Amount {
        match self {
            LayoutDifficulty::Normal => 0,
            LayoutDifficulty::Hard => 1,
        }
    }
}

/// Everything a generation run depends on besides the world graph itself.
/// Two runs with equal configurations (seed included) produce identical
/// layouts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutConfiguration {
    pub seed_number: usize,
    pub logic: LayoutLogic,
    pub mode: LayoutMode,
    pub sky_temple_keys: LayoutRandomizedFlag,
    pub item_loss: LayoutEnabledFlag,
    pub elevators: LayoutRandomizedFlag,
    pub hundo_guaranteed: LayoutEnabledFlag,
    pub difficulty: LayoutDifficulty,
}
