use echorando_game::{GameDescription, GamePatches, VertexId};
use echorando_logic::{describe_path, PathEntry};
use serde::{Deserialize, Serialize};

use crate::settings::LayoutConfiguration;

/// Output-format compatibility tag; consumers refuse layouts written by an
/// incompatible engine version.
pub const LAYOUT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The finished artifact of a generation run: the assignment overlay, the
/// pickup permutation it implies, and the solver path proving the layout
/// completable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutDescription {
    pub version: String,
    pub configuration: LayoutConfiguration,
    pub patches: GamePatches,
    // pickup_mapping[i] is the PickupDatabase entry placed at PickupIndex i.
    pub pickup_mapping: Vec<usize>,
    pub solver_path: Vec<VertexId>,
}

impl LayoutDescription {
    pub fn solver_path_entries(&self, game: &GameDescription) -> Vec<PathEntry> {
        describe_path(&self.solver_path, game)
    }
}
