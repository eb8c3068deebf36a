use anyhow::{bail, Result};
use echorando_game::{
    GameDescription, GamePatches, NodeKind, RequirementSet, ResourceDatabase, ResourceRef,
    VertexId,
};

use crate::settings::LayoutConfiguration;

/// Couples the immutable game description with a layout configuration.
///
/// Besides resolving teleporter and dock traversal, Logic owns the per-node
/// additional-requirements table: extra gating beyond the base adjacency,
/// trivial until the resolver records what a failed expansion was missing.
/// All configuration inconsistencies are rejected here, never mid-search.
#[derive(Debug)]
pub struct Logic<'a> {
    pub game: &'a GameDescription,
    pub configuration: LayoutConfiguration,
    enabled_tricks: Vec<bool>,
    additional_requirements: Vec<RequirementSet>,
    trivial: RequirementSet,
}

fn check_resource_ref(resource: ResourceRef, db: &ResourceDatabase, num_pickups: usize) -> Result<()> {
    let (table_len, kind) = match resource {
        ResourceRef::Item(i) => (db.items.len(), ("item", i)),
        ResourceRef::Event(i) => (db.events.len(), ("event", i)),
        ResourceRef::Trick(i) => (db.tricks.len(), ("trick", i)),
        ResourceRef::Difficulty(i) => (db.difficulty.len(), ("difficulty", i)),
        ResourceRef::Damage(i) => (db.damage.len(), ("damage", i)),
        ResourceRef::Pickup(i) => (num_pickups, ("pickup", i)),
    };
    if kind.1 >= table_len {
        bail!(
            "reference to {} resource {} which is not in the resource database ({} entries)",
            kind.0,
            kind.1,
            table_len
        );
    }
    Ok(())
}

fn check_requirement_set(
    set: &RequirementSet,
    db: &ResourceDatabase,
    num_pickups: usize,
) -> Result<()> {
    for list in &set.alternatives {
        for req in &list.items {
            check_resource_ref(req.resource, db, num_pickups)?;
        }
    }
    Ok(())
}

impl<'a> Logic<'a> {
    pub fn new(game: &'a GameDescription, configuration: &LayoutConfiguration) -> Result<Logic<'a>> {
        let db = &game.resource_database;
        let num_pickups = game.pickup_database.pickups.len();

        for world in &game.world_list.worlds {
            for area in &world.areas {
                for (node_idx, targets) in area.connections.iter().enumerate() {
                    for (target, requirement) in targets {
                        check_requirement_set(requirement, db, num_pickups).map_err(|e| {
                            e.context(format!(
                                "connection {} -> {} in area '{}'",
                                area.nodes[node_idx].name, area.nodes[*target].name, area.name
                            ))
                        })?;
                    }
                }
            }
        }
        check_requirement_set(&game.victory_condition, db, num_pickups)
            .map_err(|e| e.context("victory condition"))?;
        for weakness in &game.dock_weakness_database.weaknesses {
            check_requirement_set(&weakness.requirement, db, num_pickups)
                .map_err(|e| e.context(format!("dock weakness '{}'", weakness.name)))?;
        }
        for entry in &game.pickup_database.pickups {
            for &(resource, _) in &entry.resources {
                check_resource_ref(resource, db, num_pickups)
                    .map_err(|e| e.context(format!("pickup entry '{}'", entry.name)))?;
                if matches!(resource, ResourceRef::Damage(_)) {
                    bail!("pickup entry '{}' grants a damage resource", entry.name);
                }
            }
        }

        let tier = configuration.logic.trick_tier();
        let enabled_tricks = db.tricks.iter().map(|trick| trick.tier <= tier).collect();

        Ok(Logic {
            game,
            configuration: *configuration,
            enabled_tricks,
            additional_requirements: vec![
                RequirementSet::trivial();
                game.world_list.num_vertices()
            ],
            trivial: RequirementSet::trivial(),
        })
    }

    pub fn victory_condition(&self) -> &RequirementSet {
        &self.game.victory_condition
    }

    /// Which trick resources the configuration grants at game start.
    pub fn enabled_tricks(&self) -> &[bool] {
        &self.enabled_tricks
    }

    pub fn get_additional_requirements(&self, vertex: VertexId) -> &RequirementSet {
        &self.additional_requirements[vertex]
    }

    pub fn set_additional_requirements(&mut self, vertex: VertexId, requirements: RequirementSet) {
        self.additional_requirements[vertex] = requirements;
    }

    pub fn clear_additional_requirements(&mut self) {
        self.additional_requirements.fill(RequirementSet::trivial());
    }

    /// Ordered successor edges of a vertex: intra-area adjacency in
    /// declaration order, then the dock or teleporter transition of the node
    /// itself, then backward teleporter entries if this is the area's default
    /// node. The order is part of the determinism contract.
    pub fn connections_from(
        &self,
        vertex: VertexId,
        patches: &GamePatches,
    ) -> Vec<(VertexId, &RequirementSet)> {
        let world_list = &self.game.world_list;
        let (_, _, node_idx) = world_list.vertex_key(vertex);
        let area = world_list.area(vertex);
        let location = world_list.area_location(vertex);
        let mut edges: Vec<(VertexId, &RequirementSet)> = Vec::new();

        for (target, requirement) in &area.connections[node_idx] {
            let target_vertex = world_list
                .vertex_id(location, *target)
                .expect("adjacency validated at construction");
            edges.push((target_vertex, requirement));
        }

        match world_list.node(vertex).kind {
            NodeKind::Dock {
                dock_index,
                destination,
                destination_dock,
                weakness,
            } => {
                let (dest, dest_dock) = patches
                    .dock_connection
                    .get(&(location, dock_index))
                    .copied()
                    .unwrap_or((destination, destination_dock));
                let weakness_index = patches
                    .dock_weakness
                    .get(&(location, dock_index))
                    .copied()
                    .unwrap_or(weakness);
                if let Some(target_vertex) = world_list.dock_vertex(dest, dest_dock) {
                    let requirement =
                        &self.game.dock_weakness_database.weaknesses[weakness_index].requirement;
                    edges.push((target_vertex, requirement));
                }
            }
            NodeKind::Teleporter {
                instance_id,
                destination,
                forward_visitable,
                ..
            } => {
                if forward_visitable {
                    let dest = patches
                        .elevator_connection
                        .get(&instance_id)
                        .copied()
                        .unwrap_or(destination);
                    if let Some(target_vertex) = world_list.default_vertex(dest) {
                        edges.push((target_vertex, &self.trivial));
                    }
                }
            }
            _ => {}
        }

        // A teleporter drops you on its destination area's default node, so
        // backward traversal starts there.
        if node_idx == area.default_node_index {
            for (tele_vertex, tele_node) in world_list.teleporter_nodes() {
                if let NodeKind::Teleporter {
                    instance_id,
                    destination,
                    backward_visitable,
                    ..
                } = tele_node.kind
                {
                    if !backward_visitable {
                        continue;
                    }
                    let dest = patches
                        .elevator_connection
                        .get(&instance_id)
                        .copied()
                        .unwrap_or(destination);
                    if dest == location && tele_vertex != vertex {
                        edges.push((tele_vertex, &self.trivial));
                    }
                }
            }
        }

        edges
    }
}
