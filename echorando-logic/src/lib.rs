use echorando_game::{
    Amount, AreaLocation, GameDescription, GamePatches, NodeKind, ResourceCollection,
    ResourceDatabase, ResourceRef, VertexId,
};
use serde::{Deserialize, Serialize};

/// Run-local search state: accumulated resources, current energy, current
/// position, the patches in effect and the path of actions taken so far.
///
/// States are value-like on purpose: advancing constructs a fresh copy, and
/// backtracking is dropping a copy. Nothing is ever undone in place.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub resources: ResourceCollection,
    pub energy: Amount,
    pub vertex: VertexId,
    pub patches: GamePatches,
    pub path: Vec<VertexId>,
}

impl State {
    pub fn new(
        resources: ResourceCollection,
        energy: Amount,
        vertex: VertexId,
        patches: GamePatches,
    ) -> State {
        State {
            resources,
            energy,
            vertex,
            patches,
            path: Vec::new(),
        }
    }

    pub fn max_energy(&self, db: &ResourceDatabase) -> Amount {
        db.base_energy + db.energy_per_tank * self.resources.get(ResourceRef::Item(db.energy_tank_item))
    }

    pub fn area_location(&self, game: &GameDescription) -> AreaLocation {
        game.world_list.area_location(self.vertex)
    }

    /// Successor state after moving to `vertex` and collecting it: pay the
    /// path damage, grant the node's resource (pickup contents come from the
    /// patches assignment), heal where the node heals. The visited node is
    /// appended to the solver path.
    pub fn act_on_node(&self, vertex: VertexId, damage: Amount, game: &GameDescription) -> State {
        let mut next = self.clone();
        next.energy -= damage;
        assert!(
            next.energy >= 1,
            "acted through an unaffordable path: damage {damage} at energy {}",
            self.energy
        );
        let node = game.world_list.node(vertex);
        match node.kind {
            NodeKind::Event { event } => {
                next.resources.add(ResourceRef::Event(event), 1);
            }
            NodeKind::Pickup { pickup } => {
                next.resources.add(ResourceRef::Pickup(pickup), 1);
                if let Some(&database_index) = next.patches.pickup_assignment.get(&pickup) {
                    let entry = &game.pickup_database.pickups[database_index];
                    for &(resource, amount) in &entry.resources {
                        next.resources.add(resource, amount);
                    }
                }
            }
            _ => {}
        }
        let db = &game.resource_database;
        let max_energy = next.max_energy(db);
        // Collecting an energy tank raises the maximum and refills, same as
        // standing on a heal node.
        if node.heal || max_energy > self.max_energy(db) {
            next.energy = max_energy;
        }
        next.vertex = vertex;
        next.path.push(vertex);
        next
    }
}

/// Serializable view of a solver path entry, for spoiler-style output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub vertex: VertexId,
    pub node: String,
}

pub fn describe_path(path: &[VertexId], game: &GameDescription) -> Vec<PathEntry> {
    path.iter()
        .map(|&vertex| PathEntry {
            vertex,
            node: game.world_list.node_full_name(vertex),
        })
        .collect()
}
