// The changes suggested by this lint usually make the code more cluttered and less clear:
#![allow(clippy::needless_range_loop)]
// TODO: consider removing this later. It's not a bad lint but I don't want to deal with it now.
#![allow(clippy::too_many_arguments)]

use anyhow::{bail, ensure, Context, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub type Amount = i32; // Quantity of a resource (item count, energy, damage)
pub type ResourceIndex = usize; // Index into one of ResourceDatabase's per-kind tables
pub type PickupIndex = usize; // Global index identifying an item location; entry i of PickupDatabase is its vanilla content
pub type DockIndex = usize; // Dock number, unique within an area
pub type DockWeaknessIndex = usize; // Index into DockWeaknessDatabase.weaknesses
pub type TeleporterId = usize; // Teleporter instance id, unique across the whole game
pub type AssetId = u32; // Asset id of a world or area
pub type NodeIndex = usize; // Position of a node within its area's node list
pub type WorldIndex = usize; // Position of a world within the WorldList
pub type AreaIndex = usize; // Position of an area within its world
pub type VertexId = usize; // Index into WorldList.vertex_keys: flattened (world, area, node)

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceRef {
    Item(ResourceIndex),
    Event(ResourceIndex),
    Trick(ResourceIndex),
    Difficulty(ResourceIndex),
    Damage(ResourceIndex),
    Pickup(PickupIndex),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceInfo {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrickInfo {
    pub name: String,
    pub tier: u32, // Lowest logic tier at which the trick is granted at game start
}

#[derive(Clone, Debug)]
pub struct ResourceDatabase {
    pub items: Vec<ResourceInfo>,
    pub events: Vec<ResourceInfo>,
    pub tricks: Vec<TrickInfo>,
    pub difficulty: Vec<ResourceInfo>,
    pub damage: Vec<ResourceInfo>,
    pub energy_tank_item: ResourceIndex,
    pub base_energy: Amount,
    pub energy_per_tank: Amount,
}

impl ResourceDatabase {
    pub fn item_index_by_name(&self, name: &str) -> Option<ResourceIndex> {
        self.items.iter().position(|info| info.name == name)
    }

    pub fn event_index_by_name(&self, name: &str) -> Option<ResourceIndex> {
        self.events.iter().position(|info| info.name == name)
    }
}

/// Snapshot of accumulated resources. Collectibles only ever grow; energy is
/// tracked separately on the State since it fluctuates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCollection {
    pub items: Vec<Amount>,
    pub events: Vec<Amount>,
    pub tricks: Vec<Amount>,
    pub difficulty: Vec<Amount>,
    pub pickups: Vec<Amount>,
}

impl ResourceCollection {
    pub fn new(db: &ResourceDatabase, num_pickups: usize) -> Self {
        ResourceCollection {
            items: vec![0; db.items.len()],
            events: vec![0; db.events.len()],
            tricks: vec![0; db.tricks.len()],
            difficulty: vec![0; db.difficulty.len()],
            pickups: vec![0; num_pickups],
        }
    }

    pub fn get(&self, resource: ResourceRef) -> Amount {
        match resource {
            ResourceRef::Item(i) => self.items[i],
            ResourceRef::Event(i) => self.events[i],
            ResourceRef::Trick(i) => self.tricks[i],
            ResourceRef::Difficulty(i) => self.difficulty[i],
            // Damage rows carry no accumulated amount; they only appear
            // inside requirement lists, where they contribute damage.
            ResourceRef::Damage(_) => 0,
            ResourceRef::Pickup(i) => self.pickups[i],
        }
    }

    pub fn add(&mut self, resource: ResourceRef, amount: Amount) {
        match resource {
            ResourceRef::Item(i) => self.items[i] += amount,
            ResourceRef::Event(i) => self.events[i] += amount,
            ResourceRef::Trick(i) => self.tricks[i] += amount,
            ResourceRef::Difficulty(i) => self.difficulty[i] += amount,
            ResourceRef::Damage(_) => panic!("damage resources cannot be accumulated"),
            ResourceRef::Pickup(i) => self.pickups[i] += amount,
        }
    }

    /// Pointwise >= on every resource.
    pub fn supersets(&self, other: &ResourceCollection) -> bool {
        fn ge(a: &[Amount], b: &[Amount]) -> bool {
            a.iter().zip(b.iter()).all(|(&x, &y)| x >= y)
        }
        ge(&self.items, &other.items)
            && ge(&self.events, &other.events)
            && ge(&self.tricks, &other.tricks)
            && ge(&self.difficulty, &other.difficulty)
            && ge(&self.pickups, &other.pickups)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndividualRequirement {
    pub resource: ResourceRef,
    pub amount: Amount,
    pub negate: bool,
}

impl IndividualRequirement {
    pub fn satisfied(&self, resources: &ResourceCollection) -> bool {
        if let ResourceRef::Damage(_) = self.resource {
            // Damage members never gate a list; they are accounted for in
            // RequirementList::damage.
            return true;
        }
        (resources.get(self.resource) >= self.amount) != self.negate
    }
}

/// Logical AND over its members, with an energy cost attached: the sum of its
/// damage members is the energy consumed if this alternative is taken.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementList {
    pub items: Vec<IndividualRequirement>,
}

impl RequirementList {
    pub fn new(items: Vec<IndividualRequirement>) -> Self {
        RequirementList { items }
    }

    pub fn satisfied(&self, resources: &ResourceCollection) -> bool {
        self.items.iter().all(|req| req.satisfied(resources))
    }

    pub fn damage(&self) -> Amount {
        self.items
            .iter()
            .filter(|req| matches!(req.resource, ResourceRef::Damage(_)))
            .map(|req| req.amount)
            .sum()
    }
}

/// Logical OR over RequirementLists. The two canonical forms: `trivial` is a
/// single empty list (always satisfiable), `impossible` has no lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub alternatives: Vec<RequirementList>,
}

impl RequirementSet {
    pub fn new(alternatives: Vec<RequirementList>) -> Self {
        RequirementSet { alternatives }
    }

    pub fn trivial() -> Self {
        RequirementSet {
            alternatives: vec![RequirementList::default()],
        }
    }

    pub fn impossible() -> Self {
        RequirementSet {
            alternatives: vec![],
        }
    }

    pub fn single(req: IndividualRequirement) -> Self {
        RequirementSet {
            alternatives: vec![RequirementList::new(vec![req])],
        }
    }

    pub fn is_trivial(&self) -> bool {
        self.alternatives.iter().any(|list| list.items.is_empty())
    }

    pub fn is_impossible(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// A boolean-satisfied alternative is still unusable if taking it would
    /// drop energy to zero or below.
    pub fn satisfied(&self, resources: &ResourceCollection, current_energy: Amount) -> bool {
        self.alternatives
            .iter()
            .any(|list| list.satisfied(resources) && list.damage() < current_energy)
    }

    /// Least damage over the boolean-satisfied alternatives, ignoring energy.
    pub fn minimum_damage(&self, resources: &ResourceCollection) -> Option<Amount> {
        self.alternatives
            .iter()
            .filter(|list| list.satisfied(resources))
            .map(|list| list.damage())
            .min()
    }

    /// OR-combination, normalized in the spirit of make_and/make_or: anything
    /// OR trivial collapses to trivial, impossible contributes nothing.
    pub fn union(&self, other: &RequirementSet) -> RequirementSet {
        if self.is_trivial() || other.is_trivial() {
            return RequirementSet::trivial();
        }
        let mut alternatives = self.alternatives.clone();
        for list in &other.alternatives {
            if !alternatives.contains(list) {
                alternatives.push(list.clone());
            }
        }
        RequirementSet { alternatives }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaLocation {
    pub world_asset_id: AssetId,
    pub area_asset_id: AssetId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Generic,
    Event {
        event: ResourceIndex,
    },
    Pickup {
        pickup: PickupIndex,
    },
    Dock {
        dock_index: DockIndex,
        destination: AreaLocation,
        destination_dock: DockIndex,
        weakness: DockWeaknessIndex,
    },
    Teleporter {
        instance_id: TeleporterId,
        destination: AreaLocation,
        forward_visitable: bool,
        backward_visitable: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub heal: bool,
    pub index: NodeIndex,
    pub kind: NodeKind,
}

impl Node {
    /// Resource nodes grant a resource on collection; everything else is a
    /// pure waypoint.
    pub fn is_resource_node(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Event { .. } | NodeKind::Pickup { .. }
        )
    }

    pub fn resource(&self) -> Option<ResourceRef> {
        match self.kind {
            NodeKind::Event { event } => Some(ResourceRef::Event(event)),
            NodeKind::Pickup { pickup } => Some(ResourceRef::Pickup(pickup)),
            _ => None,
        }
    }

    pub fn can_collect(&self, _patches: &GamePatches, resources: &ResourceCollection) -> bool {
        match self.resource() {
            Some(resource) => resources.get(resource) == 0,
            None => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    pub area_asset_id: AssetId,
    pub default_node_index: NodeIndex,
    pub nodes: Vec<Node>,
    // Indexed by source node; declaration order of the targets is the
    // traversal order, which the determinism contract depends on.
    pub connections: Vec<Vec<(NodeIndex, RequirementSet)>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub name: String,
    pub world_asset_id: AssetId,
    pub areas: Vec<Area>,
}

#[derive(Clone, Debug)]
pub struct WorldList {
    pub worlds: Vec<World>,
    vertex_keys: Vec<(WorldIndex, AreaIndex, NodeIndex)>,
    vertex_by_node: HashMap<(AreaLocation, NodeIndex), VertexId>,
    area_by_location: HashMap<AreaLocation, (WorldIndex, AreaIndex)>,
    vertex_by_pickup: HashMap<PickupIndex, VertexId>,
    vertex_by_dock: HashMap<(AreaLocation, DockIndex), VertexId>,
}

impl WorldList {
    pub fn new(worlds: Vec<World>) -> Result<WorldList> {
        let mut vertex_keys: Vec<(WorldIndex, AreaIndex, NodeIndex)> = Vec::new();
        let mut vertex_by_node = HashMap::new();
        let mut area_by_location = HashMap::new();
        let mut vertex_by_pickup = HashMap::new();
        let mut vertex_by_dock = HashMap::new();

        for (world_idx, world) in worlds.iter().enumerate() {
            for (area_idx, area) in world.areas.iter().enumerate() {
                let location = AreaLocation {
                    world_asset_id: world.world_asset_id,
                    area_asset_id: area.area_asset_id,
                };
                if area_by_location
                    .insert(location, (world_idx, area_idx))
                    .is_some()
                {
                    bail!(
                        "Duplicate area location ({}, {}) for area '{}'",
                        location.world_asset_id,
                        location.area_asset_id,
                        area.name
                    );
                }
                ensure!(
                    area.default_node_index < area.nodes.len(),
                    "Default node index {} out of range in area '{}'",
                    area.default_node_index,
                    area.name
                );
                ensure!(
                    area.connections.len() == area.nodes.len(),
                    "Adjacency table size mismatch in area '{}'",
                    area.name
                );
                for (node_idx, node) in area.nodes.iter().enumerate() {
                    ensure!(
                        node.index == node_idx,
                        "Node '{}' in area '{}' has index {} but is declared at position {}",
                        node.name,
                        area.name,
                        node.index,
                        node_idx
                    );
                    let vertex_id = vertex_keys.len();
                    vertex_keys.push((world_idx, area_idx, node_idx));
                    vertex_by_node.insert((location, node_idx), vertex_id);
                    match node.kind {
                        NodeKind::Pickup { pickup } => {
                            if vertex_by_pickup.insert(pickup, vertex_id).is_some() {
                                bail!("Pickup index {} appears on more than one node", pickup);
                            }
                        }
                        NodeKind::Dock { dock_index, .. } => {
                            if vertex_by_dock.insert((location, dock_index), vertex_id).is_some() {
                                bail!(
                                    "Dock {} appears on more than one node of area '{}'",
                                    dock_index,
                                    area.name
                                );
                            }
                        }
                        _ => {}
                    }
                    for &(target, _) in &area.connections[node_idx] {
                        ensure!(
                            target < area.nodes.len(),
                            "Connection from '{}' in area '{}' targets node {} which does not exist",
                            node.name,
                            area.name,
                            target
                        );
                    }
                }
            }
        }

        let world_list = WorldList {
            worlds,
            vertex_keys,
            vertex_by_node,
            area_by_location,
            vertex_by_pickup,
            vertex_by_dock,
        };

        // Teleporter and dock destinations must resolve now, not mid-search.
        for (vertex_id, node) in world_list.all_nodes() {
            match node.kind {
                NodeKind::Teleporter { destination, .. } => {
                    world_list.area_by_area_location(destination).with_context(|| {
                        format!(
                            "Teleporter '{}' targets area ({}, {}) which does not exist",
                            node.name,
                            destination.world_asset_id,
                            destination.area_asset_id
                        )
                    })?;
                }
                NodeKind::Dock {
                    destination,
                    destination_dock,
                    ..
                } => {
                    world_list
                        .dock_vertex(destination, destination_dock)
                        .with_context(|| {
                            format!(
                                "Dock node '{}' (vertex {}) targets dock {} of area ({}, {}) which does not exist",
                                node.name,
                                vertex_id,
                                destination_dock,
                                destination.world_asset_id,
                                destination.area_asset_id
                            )
                        })?;
                }
                _ => {}
            }
        }
        Ok(world_list)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_keys.len()
    }

    pub fn vertex_key(&self, vertex: VertexId) -> (WorldIndex, AreaIndex, NodeIndex) {
        self.vertex_keys[vertex]
    }

    pub fn world(&self, vertex: VertexId) -> &World {
        &self.worlds[self.vertex_keys[vertex].0]
    }

    pub fn area(&self, vertex: VertexId) -> &Area {
        let (world_idx, area_idx, _) = self.vertex_keys[vertex];
        &self.worlds[world_idx].areas[area_idx]
    }

    pub fn node(&self, vertex: VertexId) -> &Node {
        let (world_idx, area_idx, node_idx) = self.vertex_keys[vertex];
        &self.worlds[world_idx].areas[area_idx].nodes[node_idx]
    }

    pub fn area_location(&self, vertex: VertexId) -> AreaLocation {
        let (world_idx, area_idx, _) = self.vertex_keys[vertex];
        AreaLocation {
            world_asset_id: self.worlds[world_idx].world_asset_id,
            area_asset_id: self.worlds[world_idx].areas[area_idx].area_asset_id,
        }
    }

    pub fn node_full_name(&self, vertex: VertexId) -> String {
        format!(
            "{}/{}/{}",
            self.world(vertex).name,
            self.area(vertex).name,
            self.node(vertex).name
        )
    }

    pub fn area_by_area_location(&self, location: AreaLocation) -> Option<&Area> {
        let &(world_idx, area_idx) = self.area_by_location.get(&location)?;
        Some(&self.worlds[world_idx].areas[area_idx])
    }

    pub fn vertex_id(&self, location: AreaLocation, node_index: NodeIndex) -> Option<VertexId> {
        self.vertex_by_node.get(&(location, node_index)).copied()
    }

    /// Vertex of the destination area's default node: where a teleporter
    /// drops you.
    pub fn default_vertex(&self, location: AreaLocation) -> Option<VertexId> {
        let area = self.area_by_area_location(location)?;
        self.vertex_id(location, area.default_node_index)
    }

    pub fn dock_vertex(&self, location: AreaLocation, dock: DockIndex) -> Option<VertexId> {
        self.vertex_by_dock.get(&(location, dock)).copied()
    }

    pub fn pickup_vertex(&self, pickup: PickupIndex) -> Option<VertexId> {
        self.vertex_by_pickup.get(&pickup).copied()
    }

    pub fn num_pickup_nodes(&self) -> usize {
        self.vertex_by_pickup.len()
    }

    /// All nodes across all worlds, in declaration order.
    pub fn all_nodes(&self) -> impl Iterator<Item = (VertexId, &Node)> {
        (0..self.num_vertices()).map(move |vertex| (vertex, self.node(vertex)))
    }

    pub fn pickup_nodes(&self) -> impl Iterator<Item = (VertexId, &Node)> {
        self.all_nodes()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Pickup { .. }))
    }

    pub fn event_nodes(&self) -> impl Iterator<Item = (VertexId, &Node)> {
        self.all_nodes()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Event { .. }))
    }

    pub fn teleporter_nodes(&self) -> impl Iterator<Item = (VertexId, &Node)> {
        self.all_nodes()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Teleporter { .. }))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupCategory {
    Major,
    Minor,
    SkyTempleKey,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupEntry {
    pub name: String,
    pub category: PickupCategory,
    pub resources: Vec<(ResourceRef, Amount)>,
}

/// Ordered catalog of pickup contents. Entry i is the vanilla content of
/// PickupIndex i; the generator permutes this mapping.
#[derive(Clone, Debug)]
pub struct PickupDatabase {
    pub pickups: Vec<PickupEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DockWeakness {
    pub name: String,
    pub requirement: RequirementSet,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DockWeaknessDatabase {
    pub weaknesses: Vec<DockWeakness>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub target: PickupIndex,
}

/// Mutable per-attempt overlay on the immutable world graph. A fresh copy is
/// created for each generation attempt; the finalized copy is the artifact
/// handed to the patch writer and hint generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GamePatches {
    pub pickup_assignment: HashMap<PickupIndex, usize>, // PickupIndex -> index into PickupDatabase
    pub elevator_connection: HashMap<TeleporterId, AreaLocation>,
    pub dock_connection: HashMap<(AreaLocation, DockIndex), (AreaLocation, DockIndex)>,
    pub dock_weakness: HashMap<(AreaLocation, DockIndex), DockWeaknessIndex>,
    pub hints: HashMap<AssetId, Hint>,
    pub starting_location: AreaLocation,
}

impl GamePatches {
    pub fn with_game(game: &GameDescription) -> GamePatches {
        GamePatches {
            pickup_assignment: HashMap::new(),
            elevator_connection: HashMap::new(),
            dock_connection: HashMap::new(),
            dock_weakness: HashMap::new(),
            hints: HashMap::new(),
            starting_location: game.starting_location,
        }
    }

    /// Append-only: assigning the same pickup index twice is a search bug,
    /// not an environmental condition.
    pub fn add_pickup_assignment(&mut self, pickup: PickupIndex, database_index: usize) {
        let previous = self.pickup_assignment.insert(pickup, database_index);
        assert!(
            previous.is_none(),
            "pickup index {pickup} assigned twice (was {:?}, now {database_index})",
            previous
        );
    }

    pub fn set_elevator_connection(&mut self, teleporter: TeleporterId, target: AreaLocation) {
        self.elevator_connection.insert(teleporter, target);
    }

    pub fn set_dock_connection(
        &mut self,
        source: (AreaLocation, DockIndex),
        target: (AreaLocation, DockIndex),
    ) {
        self.dock_connection.insert(source, target);
    }

    pub fn set_dock_weakness(&mut self, dock: (AreaLocation, DockIndex), weakness: DockWeaknessIndex) {
        self.dock_weakness.insert(dock, weakness);
    }

    pub fn add_hint(&mut self, asset: AssetId, hint: Hint) {
        let previous = self.hints.insert(asset, hint);
        assert!(previous.is_none(), "hint asset {asset:x} assigned twice");
    }
}

/// The immutable description of the game: world graph, databases, victory
/// condition and starting position. Never changes during a run; safe to share
/// read-only across generation attempts.
#[derive(Clone, Debug)]
pub struct GameDescription {
    pub game_name: String,
    pub world_list: WorldList,
    pub resource_database: ResourceDatabase,
    pub pickup_database: PickupDatabase,
    pub dock_weakness_database: DockWeaknessDatabase,
    pub victory_condition: RequirementSet,
    pub starting_location: AreaLocation,
    pub starting_resources: Vec<(ResourceRef, Amount)>,
    // Granted at game start only when item loss is disabled; these are the
    // resources the intro sequence would otherwise take away.
    pub item_loss_resources: Vec<(ResourceRef, Amount)>,
}

impl GameDescription {
    pub fn new(
        game_name: String,
        world_list: WorldList,
        resource_database: ResourceDatabase,
        pickup_database: PickupDatabase,
        dock_weakness_database: DockWeaknessDatabase,
        victory_condition: RequirementSet,
        starting_location: AreaLocation,
        starting_resources: Vec<(ResourceRef, Amount)>,
        item_loss_resources: Vec<(ResourceRef, Amount)>,
    ) -> Result<GameDescription> {
        world_list
            .area_by_area_location(starting_location)
            .with_context(|| {
                format!(
                    "Starting location ({}, {}) does not exist",
                    starting_location.world_asset_id, starting_location.area_asset_id
                )
            })?;
        let num_pickups = pickup_database.pickups.len();
        ensure!(
            world_list.num_pickup_nodes() == num_pickups,
            "Pickup database has {} entries but the world graph has {} pickup nodes",
            num_pickups,
            world_list.num_pickup_nodes()
        );
        for (vertex, node) in world_list.pickup_nodes() {
            if let NodeKind::Pickup { pickup } = node.kind {
                ensure!(
                    pickup < num_pickups,
                    "Pickup node '{}' (vertex {}) has pickup index {} outside the database",
                    node.name,
                    vertex,
                    pickup
                );
            }
        }
        for (vertex, node) in world_list.all_nodes() {
            if let NodeKind::Dock { weakness, .. } = node.kind {
                ensure!(
                    weakness < dock_weakness_database.weaknesses.len(),
                    "Dock node '{}' (vertex {}) references unknown weakness {}",
                    node.name,
                    vertex,
                    weakness
                );
            }
        }
        Ok(GameDescription {
            game_name,
            world_list,
            resource_database,
            pickup_database,
            dock_weakness_database,
            victory_condition,
            starting_location,
            starting_resources,
            item_loss_resources,
        })
    }
}
