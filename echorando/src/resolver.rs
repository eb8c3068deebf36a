use anyhow::{bail, ensure, Result};
use echorando_game::{Amount, GameDescription, VertexId};
use echorando_logic::State;

use crate::bootstrap;
use crate::layout::LayoutDescription;
use crate::logic::Logic;
use crate::reach::ResolverReach;

/// Depth-first completability prover: starting from `state`, search for an
/// order of collections that satisfies the victory condition. Returns the
/// victory state, whose path is the proof.
///
/// When every action out of a position fails, the reach's frontier
/// requirements are recorded as that node's additional requirements, so a
/// later visit standing on the same node is only re-expanded once the
/// frontier could actually open.
pub fn resolve(logic: &mut Logic, state: State) -> Option<State> {
    if logic
        .victory_condition()
        .satisfied(&state.resources, state.energy)
    {
        return Some(state);
    }
    let reach = ResolverReach::calculate_reach(logic, &state);
    let actions: Vec<(VertexId, Amount)> = reach.possible_actions(logic, &state).collect();
    let frontier = reach.frontier_requirements();
    for &(vertex, damage) in &actions {
        let next = state.act_on_node(vertex, damage, logic.game);
        if let Some(victory) = resolve(logic, next) {
            return Some(victory);
        }
    }
    logic.set_additional_requirements(state.vertex, frontier);
    None
}

/// Replay a finished layout's solver path against a fresh starting state:
/// every step must be reachable and collectible when its turn comes, and the
/// final resources must satisfy the victory condition.
pub fn validate_layout(game: &GameDescription, layout: &LayoutDescription) -> Result<()> {
    let logic = Logic::new(game, &layout.configuration)?;
    let mut state = bootstrap::calculate_starting_state(game, &layout.patches, &layout.configuration)?;
    for &vertex in &layout.solver_path {
        let reach = ResolverReach::calculate_reach(&logic, &state);
        let Some(cost) = reach.cost(vertex) else {
            bail!(
                "solver path step {} is not reachable",
                game.world_list.node_full_name(vertex)
            );
        };
        let node = game.world_list.node(vertex);
        ensure!(
            node.is_resource_node() && node.can_collect(&state.patches, &state.resources),
            "solver path step {} is not collectible",
            game.world_list.node_full_name(vertex)
        );
        state = state.act_on_node(vertex, cost, game);
    }
    ensure!(
        logic
            .victory_condition()
            .satisfied(&state.resources, state.energy),
        "solver path ends without satisfying the victory condition"
    );
    Ok(())
}
