use anyhow::{bail, Result};
use echorando_game::{
    Amount, AreaLocation, GameDescription, GamePatches, NodeKind, PickupCategory, TeleporterId,
    VertexId,
};
use echorando_logic::State;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::bootstrap;
use crate::layout::{LayoutDescription, LAYOUT_VERSION};
use crate::logic::Logic;
use crate::reach::ResolverReach;
use crate::resolver;
use crate::settings::{LayoutConfiguration, LayoutEnabledFlag, LayoutMode, LayoutRandomizedFlag};

/// Dead ends restart the attempt with a re-derived RNG; past this bound the
/// run is reported as a failure, never as a partial layout.
pub const MAX_GENERATION_ATTEMPTS: usize = 128;

/// Randomized forward-fill search: walk the reach, collect a random possible
/// action each step, and assign the next pool entry whenever the action is an
/// unassigned pickup location. Deterministic for a given world graph,
/// configuration and pickup pool.
///
/// `status_update` is a fire-and-forget progress sink; it has no effect on
/// the search outcome.
pub fn generate_layout(
    game: &GameDescription,
    configuration: &LayoutConfiguration,
    status_update: &mut dyn FnMut(&str),
) -> Result<LayoutDescription> {
    let mut logic = Logic::new(game, configuration)?;
    info!(
        "Generating layout for seed {}: logic {}, mode {}, difficulty {}",
        configuration.seed_number, configuration.logic, configuration.mode, configuration.difficulty
    );
    for attempt_num in 0..MAX_GENERATION_ATTEMPTS {
        logic.clear_additional_requirements();
        if let Some(layout) = generate_attempt(&mut logic, attempt_num, status_update)? {
            info!(
                "[attempt {attempt_num}] success, {} pickups placed, solver path length {}",
                layout.pickup_mapping.len(),
                layout.solver_path.len()
            );
            return Ok(layout);
        }
        status_update(&format!("Attempt {} hit a dead end, retrying", attempt_num + 1));
    }
    bail!(
        "No completable layout found for seed {} after {MAX_GENERATION_ATTEMPTS} attempts",
        configuration.seed_number
    );
}

fn attempt_rng(seed_number: usize, attempt_num: usize) -> StdRng {
    let mut rng_seed = [0u8; 32];
    rng_seed[..8].copy_from_slice(&(seed_number as u64).to_le_bytes());
    rng_seed[8..16].copy_from_slice(&(attempt_num as u64).to_le_bytes());
    StdRng::from_seed(rng_seed)
}

fn generate_attempt(
    logic: &mut Logic,
    attempt_num: usize,
    status_update: &mut dyn FnMut(&str),
) -> Result<Option<LayoutDescription>> {
    let game = logic.game;
    let configuration = logic.configuration;
    let mut rng = attempt_rng(configuration.seed_number, attempt_num);

    let mut patches = GamePatches::with_game(game);
    if configuration.elevators == LayoutRandomizedFlag::Randomized {
        randomize_elevators(game, &mut rng, &mut patches);
    }
    let mut pool = build_pickup_pool(game, &configuration, &mut rng, &mut patches);

    let mut state = bootstrap::calculate_starting_state(game, &patches, &configuration)?;
    info!(
        "[attempt {attempt_num}] starting at {}",
        game.world_list.node_full_name(state.vertex)
    );

    loop {
        if logic
            .victory_condition()
            .satisfied(&state.resources, state.energy)
            && hundo_satisfied(&configuration, &state)
        {
            return finish_attempt(logic, attempt_num, state, pool).map(Some);
        }

        let reach = ResolverReach::calculate_reach(logic, &state);
        let actions: Vec<(VertexId, Amount)> = reach.possible_actions(logic, &state).collect();
        if actions.is_empty() {
            info!(
                "[attempt {attempt_num}] dead end after {} steps, {} pickups placed",
                state.path.len(),
                state.patches.pickup_assignment.len()
            );
            return Ok(None);
        }

        let &(vertex, damage) = actions.choose(&mut rng).unwrap();
        if let NodeKind::Pickup { pickup } = game.world_list.node(vertex).kind {
            if !state.patches.pickup_assignment.contains_key(&pickup) {
                let database_index = pool
                    .pop()
                    .expect("pickup pool exhausted with unassigned locations remaining");
                state.patches.add_pickup_assignment(pickup, database_index);
            }
        }
        state = state.act_on_node(vertex, damage, game);
        status_update(&format!(
            "Placed {} of {} pickups",
            state.patches.pickup_assignment.len(),
            game.pickup_database.pickups.len()
        ));
    }
}

/// Under the 100%-guarantee flag, victory alone is not enough: every pickup
/// location must have been collected on the solver path.
fn hundo_satisfied(configuration: &LayoutConfiguration, state: &State) -> bool {
    configuration.hundo_guaranteed == LayoutEnabledFlag::Disabled
        || state.resources.pickups.iter().all(|&count| count > 0)
}

/// Locations the search never visited get the rest of the shuffled pool;
/// resources only grow from here, so completability is preserved. The final
/// patches are still re-proved by the resolver before being returned.
fn finish_attempt(
    logic: &mut Logic,
    attempt_num: usize,
    state: State,
    mut pool: Vec<usize>,
) -> Result<LayoutDescription> {
    let game = logic.game;
    let num_pickups = game.pickup_database.pickups.len();
    let mut patches = state.patches.clone();
    for pickup in 0..num_pickups {
        if !patches.pickup_assignment.contains_key(&pickup) {
            let database_index = pool
                .pop()
                .expect("pickup pool smaller than the unassigned locations");
            patches.add_pickup_assignment(pickup, database_index);
        }
    }
    assert!(pool.is_empty(), "pickup pool has {} entries left over", pool.len());

    let verify_state = bootstrap::calculate_starting_state(game, &patches, &logic.configuration)?;
    if resolver::resolve(logic, verify_state).is_none() {
        bail!("[attempt {attempt_num}] finished layout failed resolver verification");
    }

    let pickup_mapping: Vec<usize> = (0..num_pickups)
        .map(|pickup| patches.pickup_assignment[&pickup])
        .collect();
    Ok(LayoutDescription {
        version: LAYOUT_VERSION.to_string(),
        configuration: logic.configuration,
        patches,
        pickup_mapping,
        solver_path: state.path,
    })
}

/// The shuffled pool of PickupDatabase entries up for placement. Locations
/// the configuration pins to vanilla (minor items under Major mode, sky
/// temple keys when not randomized) are assigned their own entry up front and
/// stay out of the pool.
fn build_pickup_pool(
    game: &GameDescription,
    configuration: &LayoutConfiguration,
    rng: &mut StdRng,
    patches: &mut GamePatches,
) -> Vec<usize> {
    let mut pool: Vec<usize> = Vec::new();
    for (index, entry) in game.pickup_database.pickups.iter().enumerate() {
        let pinned = match entry.category {
            PickupCategory::Minor => configuration.mode == LayoutMode::Major,
            PickupCategory::SkyTempleKey => {
                configuration.sky_temple_keys == LayoutRandomizedFlag::Vanilla
            }
            PickupCategory::Major => false,
        };
        if pinned {
            patches.add_pickup_assignment(index, index);
        } else {
            pool.push(index);
        }
    }
    pool.shuffle(rng);
    pool
}

/// Shuffle which destination each teleporter leads to. A shuffle that strands
/// the search simply dead-ends the attempt and is retried under the next
/// derived RNG.
fn randomize_elevators(game: &GameDescription, rng: &mut StdRng, patches: &mut GamePatches) {
    let mut teleporters: Vec<TeleporterId> = Vec::new();
    let mut destinations: Vec<AreaLocation> = Vec::new();
    for (_, node) in game.world_list.teleporter_nodes() {
        if let NodeKind::Teleporter {
            instance_id,
            destination,
            ..
        } = node.kind
        {
            teleporters.push(instance_id);
            destinations.push(destination);
        }
    }
    destinations.shuffle(rng);
    for (teleporter, destination) in teleporters.into_iter().zip(destinations) {
        patches.set_elevator_connection(teleporter, destination);
    }
}
