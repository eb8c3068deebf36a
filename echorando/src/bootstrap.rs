use anyhow::{Context, Result};
use echorando_game::{GameDescription, GamePatches, ResourceCollection, ResourceRef};
use echorando_logic::State;

use crate::settings::{LayoutConfiguration, LayoutEnabledFlag};

/// Build the state a run begins in: positioned on the starting area's default
/// node, holding the configured starting resources, the tricks granted by the
/// logic tier and the difficulty amount, at full energy.
pub fn calculate_starting_state(
    game: &GameDescription,
    patches: &GamePatches,
    configuration: &LayoutConfiguration,
) -> Result<State> {
    let start = patches.starting_location;
    let vertex = game.world_list.default_vertex(start).with_context(|| {
        format!(
            "starting location ({}, {}) does not resolve to a node",
            start.world_asset_id, start.area_asset_id
        )
    })?;

    let db = &game.resource_database;
    let mut resources = ResourceCollection::new(db, game.pickup_database.pickups.len());
    for &(resource, amount) in &game.starting_resources {
        resources.add(resource, amount);
    }
    // The intro sequence takes these away; with item loss disabled you keep
    // them from the start.
    if configuration.item_loss == LayoutEnabledFlag::Disabled {
        for &(resource, amount) in &game.item_loss_resources {
            resources.add(resource, amount);
        }
    }
    let tier = configuration.logic.trick_tier();
    for (index, trick) in db.tricks.iter().enumerate() {
        if trick.tier > 0 && trick.tier <= tier {
            resources.add(ResourceRef::Trick(index), 1);
        }
    }
    for index in 0..db.difficulty.len() {
        resources.add(ResourceRef::Difficulty(index), configuration.difficulty.amount());
    }

    let mut state = State::new(resources, 0, vertex, patches.clone());
    state.energy = state.max_energy(db);
    Ok(state)
}
