use std::collections::VecDeque;

use echorando_game::{Amount, RequirementList, RequirementSet, VertexId};
use echorando_logic::State;

use crate::logic::Logic;

/// Physical reachability from a state's position, holding resources fixed.
///
/// Breadth-first over the directed graph of satisfied adjacency, dock and
/// teleporter edges. Each vertex is visited at most once per calculation:
/// edges are gated by a fixed resource snapshot, so a later rediscovery can
/// never open edges the first discovery could not, and first-discovery-wins
/// keeps the frontier order (and with it the generator's RNG stream) stable.
///
/// Reaching a resource node is distinct from collecting it; the search never
/// advances through a collect transition.
pub struct ResolverReach {
    costs: Vec<Option<Amount>>,
    parent: Vec<Option<VertexId>>,
    nodes: Vec<VertexId>,
    unsatisfied: Vec<RequirementList>,
}

impl ResolverReach {
    pub fn calculate_reach(logic: &Logic, state: &State) -> ResolverReach {
        let num_vertices = logic.game.world_list.num_vertices();
        let mut costs: Vec<Option<Amount>> = vec![None; num_vertices];
        let mut parent: Vec<Option<VertexId>> = vec![None; num_vertices];
        let mut nodes: Vec<VertexId> = Vec::new();
        let mut unsatisfied: Vec<RequirementList> = Vec::new();
        let mut queue: VecDeque<VertexId> = VecDeque::new();

        costs[state.vertex] = Some(0);
        nodes.push(state.vertex);
        queue.push_back(state.vertex);

        while let Some(vertex) = queue.pop_front() {
            let base = costs[vertex].unwrap();
            for (target, requirement) in logic.connections_from(vertex, &state.patches) {
                if costs[target].is_some() {
                    continue;
                }
                let usable = match requirement.minimum_damage(&state.resources) {
                    Some(damage) if base + damage < state.energy => Some(base + damage),
                    _ => None,
                };
                match usable {
                    Some(cost) => {
                        costs[target] = Some(cost);
                        parent[target] = Some(vertex);
                        nodes.push(target);
                        queue.push_back(target);
                    }
                    None => {
                        // Remember what gated the frontier: these alternatives
                        // are what further resources would have to satisfy for
                        // the reach to grow.
                        for list in &requirement.alternatives {
                            if !unsatisfied.contains(list) {
                                unsatisfied.push(list.clone());
                            }
                        }
                    }
                }
            }
        }

        ResolverReach {
            costs,
            parent,
            nodes,
            unsatisfied,
        }
    }

    /// Reached vertices in discovery order.
    pub fn nodes(&self) -> &[VertexId] {
        &self.nodes
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.costs[vertex].is_some()
    }

    /// Minimum cumulative damage to reach a vertex.
    pub fn cost(&self, vertex: VertexId) -> Option<Amount> {
        self.costs[vertex]
    }

    /// Path from the reach origin to a reached vertex, origin first.
    pub fn route_to(&self, vertex: VertexId) -> Option<Vec<VertexId>> {
        self.costs[vertex]?;
        let mut route = vec![vertex];
        let mut current = vertex;
        while let Some(previous) = self.parent[current] {
            route.push(previous);
            current = previous;
        }
        route.reverse();
        Some(route)
    }

    /// The requirement alternatives that kept edges out of this reach: an OR
    /// over everything that would have to become satisfiable for the reach to
    /// extend past its current frontier.
    pub fn frontier_requirements(&self) -> RequirementSet {
        RequirementSet::new(self.unsatisfied.clone())
    }

    /// Collectible resource nodes in the reach, paired with the minimum
    /// damage incurred reaching them. Yields in vertex declaration order, not
    /// discovery order: the generator's seeded choice runs over this
    /// sequence, and declaration order is the only stable one.
    pub fn possible_actions<'s>(
        &'s self,
        logic: &'s Logic<'s>,
        state: &'s State,
    ) -> impl Iterator<Item = (VertexId, Amount)> + 's {
        (0..self.costs.len()).filter_map(move |vertex| {
            let cost = self.costs[vertex]?;
            let node = logic.game.world_list.node(vertex);
            if !node.is_resource_node() || !node.can_collect(&state.patches, &state.resources) {
                return None;
            }
            let remaining_energy = state.energy - cost;
            if !logic
                .get_additional_requirements(vertex)
                .satisfied(&state.resources, remaining_energy)
            {
                return None;
            }
            Some((vertex, cost))
        })
    }
}
