use anyhow::Result;
use echorando::bootstrap::calculate_starting_state;
use echorando::logic::Logic;
use echorando::reach::ResolverReach;
use echorando::settings::{
    LayoutConfiguration, LayoutDifficulty, LayoutEnabledFlag, LayoutLogic, LayoutMode,
    LayoutRandomizedFlag,
};
use echorando_game::{
    Amount, Area, AreaLocation, AssetId, DockWeakness, DockWeaknessDatabase, GameDescription,
    GamePatches, IndividualRequirement, Node, NodeIndex, NodeKind, PickupDatabase, RequirementList,
    RequirementSet, ResourceDatabase, ResourceIndex, ResourceInfo, ResourceRef, TrickInfo, World,
    WorldList,
};

fn info(name: &str) -> ResourceInfo {
    ResourceInfo {
        name: name.to_string(),
    }
}

fn database() -> ResourceDatabase {
    ResourceDatabase {
        items: vec![info("Missile Launcher"), info("Space Jump Boots"), info("Energy Tank")],
        events: vec![info("Gate Unlocked")],
        tricks: vec![TrickInfo {
            name: "Terminal Fall Abuse".to_string(),
            tier: 1,
        }],
        difficulty: vec![info("Difficulty Level")],
        damage: vec![info("Dark Aether Exposure")],
        energy_tank_item: 2,
        base_energy: 99,
        energy_per_tank: 100,
    }
}

fn generic(name: &str, index: NodeIndex) -> Node {
    Node {
        name: name.to_string(),
        heal: false,
        index,
        kind: NodeKind::Generic,
    }
}

fn event_node(name: &str, index: NodeIndex, event: ResourceIndex) -> Node {
    Node {
        name: name.to_string(),
        heal: false,
        index,
        kind: NodeKind::Event { event },
    }
}

fn teleporter(
    name: &str,
    index: NodeIndex,
    instance_id: usize,
    destination: AreaLocation,
    forward_visitable: bool,
    backward_visitable: bool,
) -> Node {
    Node {
        name: name.to_string(),
        heal: false,
        index,
        kind: NodeKind::Teleporter {
            instance_id,
            destination,
            forward_visitable,
            backward_visitable,
        },
    }
}

fn location(world_asset_id: AssetId, area_asset_id: AssetId) -> AreaLocation {
    AreaLocation {
        world_asset_id,
        area_asset_id,
    }
}

fn item_req(item: ResourceIndex, amount: Amount) -> RequirementSet {
    RequirementSet::single(IndividualRequirement {
        resource: ResourceRef::Item(item),
        amount,
        negate: false,
    })
}

fn damage_req(amount: Amount) -> RequirementSet {
    RequirementSet::single(IndividualRequirement {
        resource: ResourceRef::Damage(0),
        amount,
        negate: false,
    })
}

fn config() -> LayoutConfiguration {
    LayoutConfiguration {
        seed_number: 1027649936,
        logic: LayoutLogic::NoGlitches,
        mode: LayoutMode::Standard,
        sky_temple_keys: LayoutRandomizedFlag::Randomized,
        item_loss: LayoutEnabledFlag::Enabled,
        elevators: LayoutRandomizedFlag::Vanilla,
        hundo_guaranteed: LayoutEnabledFlag::Disabled,
        difficulty: LayoutDifficulty::Normal,
    }
}

fn single_world_game(areas: Vec<Area>, start: AreaLocation) -> Result<GameDescription> {
    let world_list = WorldList::new(vec![World {
        name: "Temple Grounds".to_string(),
        world_asset_id: 1000,
        areas,
    }])?;
    GameDescription::new(
        "Test Game".to_string(),
        world_list,
        database(),
        PickupDatabase { pickups: vec![] },
        DockWeaknessDatabase::default(),
        RequirementSet::impossible(),
        start,
        vec![],
        vec![],
    )
}

#[test]
fn possible_actions_with_no_resource_nodes() -> Result<()> {
    let area = Area {
        name: "Landing Site".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![generic("Start", 0), generic("Door", 1)],
        connections: vec![
            vec![(1, RequirementSet::trivial())],
            vec![(0, RequirementSet::trivial())],
        ],
    };
    let game = single_world_game(vec![area], location(1000, 5000))?;
    let logic = Logic::new(&game, &config())?;
    let patches = GamePatches::with_game(&game);
    let state = calculate_starting_state(&game, &patches, &config())?;

    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert_eq!(reach.nodes().len(), 2);
    assert_eq!(reach.possible_actions(&logic, &state).count(), 0);
    Ok(())
}

#[test]
fn reachable_event_is_surfaced_exactly_once() -> Result<()> {
    let area = Area {
        name: "Hall of Honored Dead".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![generic("Start", 0), event_node("Gate", 1, 0)],
        connections: vec![vec![(1, RequirementSet::trivial())], vec![]],
    };
    let game = single_world_game(vec![area], location(1000, 5000))?;
    let logic = Logic::new(&game, &config())?;
    let patches = GamePatches::with_game(&game);
    let state = calculate_starting_state(&game, &patches, &config())?;
    let event_vertex = game.world_list.vertex_id(location(1000, 5000), 1).unwrap();

    let reach = ResolverReach::calculate_reach(&logic, &state);
    let actions: Vec<_> = reach.possible_actions(&logic, &state).collect();
    assert_eq!(actions, vec![(event_vertex, 0)]);
    assert_eq!(game.world_list.event_nodes().count(), 1);

    // Once collected, the event is no longer a possible action.
    let next = state.act_on_node(event_vertex, 0, &game);
    assert_eq!(next.resources.get(ResourceRef::Event(0)), 1);
    assert_eq!(next.area_location(&game), location(1000, 5000));
    let reach = ResolverReach::calculate_reach(&logic, &next);
    assert_eq!(reach.possible_actions(&logic, &next).count(), 0);
    Ok(())
}

fn visit_restriction_game() -> Result<GameDescription> {
    let area_x = Area {
        name: "X".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![
            generic("Start", 0),
            teleporter("ToY", 1, 10, location(2000, 6000), true, false),
            teleporter("ToZ", 2, 11, location(2000, 7000), true, false),
        ],
        connections: vec![
            vec![(1, RequirementSet::trivial()), (2, item_req(0, 1))],
            vec![],
            vec![],
        ],
    };
    let area_y = Area {
        name: "Y".to_string(),
        area_asset_id: 6000,
        default_node_index: 0,
        nodes: vec![generic("Y Arrival", 0)],
        connections: vec![vec![]],
    };
    let area_z = Area {
        name: "Z".to_string(),
        area_asset_id: 7000,
        default_node_index: 0,
        nodes: vec![generic("Z Arrival", 0)],
        connections: vec![vec![]],
    };
    let world_list = WorldList::new(vec![
        World {
            name: "A".to_string(),
            world_asset_id: 1000,
            areas: vec![area_x],
        },
        World {
            name: "B".to_string(),
            world_asset_id: 2000,
            areas: vec![area_y, area_z],
        },
    ])?;
    GameDescription::new(
        "Test Game".to_string(),
        world_list,
        database(),
        PickupDatabase { pickups: vec![] },
        DockWeaknessDatabase::default(),
        RequirementSet::impossible(),
        location(1000, 5000),
        vec![],
        vec![],
    )
}

#[test]
fn teleporter_with_visit_restriction() -> Result<()> {
    let game = visit_restriction_game()?;
    let logic = Logic::new(&game, &config())?;
    let patches = GamePatches::with_game(&game);
    let target_y = game.world_list.default_vertex(location(2000, 6000)).unwrap();
    let target_z = game.world_list.default_vertex(location(2000, 7000)).unwrap();

    for has_resource in [false, true] {
        let mut state = calculate_starting_state(&game, &patches, &config())?;
        if has_resource {
            state.resources.add(ResourceRef::Item(0), 1);
        }
        let reach = ResolverReach::calculate_reach(&logic, &state);
        assert!(reach.contains(target_y));
        assert_eq!(reach.contains(target_z), has_resource);
    }
    Ok(())
}

#[test]
fn reach_is_monotone_in_resources() -> Result<()> {
    let game = visit_restriction_game()?;
    let logic = Logic::new(&game, &config())?;
    let patches = GamePatches::with_game(&game);

    let lesser = calculate_starting_state(&game, &patches, &config())?;
    let mut greater = lesser.clone();
    greater.resources.add(ResourceRef::Item(0), 1);
    assert!(greater.resources.supersets(&lesser.resources));

    let lesser_reach = ResolverReach::calculate_reach(&logic, &lesser);
    let greater_reach = ResolverReach::calculate_reach(&logic, &greater);
    for &vertex in lesser_reach.nodes() {
        assert!(
            greater_reach.contains(vertex),
            "vertex {} lost by growing resources",
            game.world_list.node_full_name(vertex)
        );
    }
    assert!(greater_reach.nodes().len() > lesser_reach.nodes().len());
    Ok(())
}

#[test]
fn one_way_teleporters_have_no_return_edge() -> Result<()> {
    for returnable in [false, true] {
        let area_x = Area {
            name: "X".to_string(),
            area_asset_id: 5000,
            default_node_index: 0,
            nodes: vec![
                generic("Hub", 0),
                teleporter("ToY", 1, 10, location(2000, 6000), true, returnable),
            ],
            connections: vec![vec![(1, RequirementSet::trivial())], vec![(0, RequirementSet::trivial())]],
        };
        let area_y = Area {
            name: "Y".to_string(),
            area_asset_id: 6000,
            default_node_index: 0,
            nodes: vec![generic("Y Arrival", 0)],
            connections: vec![vec![]],
        };
        let world_list = WorldList::new(vec![
            World {
                name: "A".to_string(),
                world_asset_id: 1000,
                areas: vec![area_x],
            },
            World {
                name: "B".to_string(),
                world_asset_id: 2000,
                areas: vec![area_y],
            },
        ])?;
        let game = GameDescription::new(
            "Test Game".to_string(),
            world_list,
            database(),
            PickupDatabase { pickups: vec![] },
            DockWeaknessDatabase::default(),
            RequirementSet::impossible(),
            location(2000, 6000),
            vec![],
            vec![],
        )?;
        let logic = Logic::new(&game, &config())?;
        let patches = GamePatches::with_game(&game);
        let state = calculate_starting_state(&game, &patches, &config())?;
        let hub = game.world_list.vertex_id(location(1000, 5000), 0).unwrap();

        // Starting on the far side: the hub is only reachable back through
        // the teleporter when backward traversal is allowed.
        let reach = ResolverReach::calculate_reach(&logic, &state);
        assert_eq!(reach.contains(hub), returnable);
    }
    Ok(())
}

#[test]
fn dock_weakness_gates_and_patches_override() -> Result<()> {
    let weaknesses = DockWeaknessDatabase {
        weaknesses: vec![
            DockWeakness {
                name: "Normal Door".to_string(),
                requirement: RequirementSet::trivial(),
            },
            DockWeakness {
                name: "Missile Blast Shield".to_string(),
                requirement: item_req(0, 1),
            },
        ],
    };
    let area_a = Area {
        name: "Courtyard".to_string(),
        area_asset_id: 8000,
        default_node_index: 0,
        nodes: vec![
            generic("Start", 0),
            Node {
                name: "South Door".to_string(),
                heal: false,
                index: 1,
                kind: NodeKind::Dock {
                    dock_index: 0,
                    destination: location(1000, 8100),
                    destination_dock: 0,
                    weakness: 1,
                },
            },
        ],
        connections: vec![vec![(1, RequirementSet::trivial())], vec![(0, RequirementSet::trivial())]],
    };
    let area_b = Area {
        name: "Storage".to_string(),
        area_asset_id: 8100,
        default_node_index: 0,
        nodes: vec![Node {
            name: "North Door".to_string(),
            heal: false,
            index: 0,
            kind: NodeKind::Dock {
                dock_index: 0,
                destination: location(1000, 8000),
                destination_dock: 0,
                weakness: 1,
            },
        }],
        connections: vec![vec![]],
    };
    let world_list = WorldList::new(vec![World {
        name: "Temple Grounds".to_string(),
        world_asset_id: 1000,
        areas: vec![area_a, area_b],
    }])?;
    let game = GameDescription::new(
        "Test Game".to_string(),
        world_list,
        database(),
        PickupDatabase { pickups: vec![] },
        weaknesses,
        RequirementSet::impossible(),
        location(1000, 8000),
        vec![],
        vec![],
    )?;
    let logic = Logic::new(&game, &config())?;
    let storage_door = game.world_list.vertex_id(location(1000, 8100), 0).unwrap();

    let patches = GamePatches::with_game(&game);
    let state = calculate_starting_state(&game, &patches, &config())?;
    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert!(!reach.contains(storage_door));

    let mut armed = state.clone();
    armed.resources.add(ResourceRef::Item(0), 1);
    let reach = ResolverReach::calculate_reach(&logic, &armed);
    assert!(reach.contains(storage_door));

    // A per-run weakness override turns the blast shield into a normal door.
    let mut patched = GamePatches::with_game(&game);
    patched.set_dock_weakness((location(1000, 8000), 0), 0);
    let state = calculate_starting_state(&game, &patched, &config())?;
    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert!(reach.contains(storage_door));

    // Rewiring the dock back onto itself cuts Storage off entirely.
    let mut rewired = GamePatches::with_game(&game);
    rewired.set_dock_weakness((location(1000, 8000), 0), 0);
    rewired.set_dock_connection((location(1000, 8000), 0), (location(1000, 8000), 0));
    let state = calculate_starting_state(&game, &rewired, &config())?;
    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert!(!reach.contains(storage_door));
    Ok(())
}

#[test]
fn damage_paths_cost_energy_and_pick_the_cheapest_way() -> Result<()> {
    let area = Area {
        name: "Dark Forgotten Bridge".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![generic("Start", 0), generic("Far Ledge", 1)],
        connections: vec![
            vec![(
                1,
                damage_req(150).union(&RequirementSet::new(vec![RequirementList::new(vec![
                    IndividualRequirement {
                        resource: ResourceRef::Item(1),
                        amount: 1,
                        negate: false,
                    },
                    IndividualRequirement {
                        resource: ResourceRef::Damage(0),
                        amount: 30,
                        negate: false,
                    },
                ])])),
            )],
            vec![],
        ],
    };
    let game = single_world_game(vec![area], location(1000, 5000))?;
    let logic = Logic::new(&game, &config())?;
    let patches = GamePatches::with_game(&game);
    let ledge = game.world_list.vertex_id(location(1000, 5000), 1).unwrap();

    // 150 damage is not survivable on 99 energy, and the cheap alternative
    // needs Space Jump.
    let state = calculate_starting_state(&game, &patches, &config())?;
    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert!(!reach.contains(ledge));

    // An energy tank raises the ceiling enough to brute-force it.
    let mut tanked = state.clone();
    tanked.resources.add(ResourceRef::Item(2), 1);
    tanked.energy = tanked.max_energy(&game.resource_database);
    assert_eq!(tanked.energy, 199);
    let reach = ResolverReach::calculate_reach(&logic, &tanked);
    assert_eq!(reach.cost(ledge), Some(150));

    // With Space Jump the cheaper alternative wins.
    let mut jumper = state.clone();
    jumper.resources.add(ResourceRef::Item(1), 1);
    let reach = ResolverReach::calculate_reach(&logic, &jumper);
    assert_eq!(reach.cost(ledge), Some(30));
    Ok(())
}

#[test]
fn trick_gated_edges_follow_the_logic_tier() -> Result<()> {
    let area = Area {
        name: "Meeting Grounds".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![generic("Start", 0), generic("High Ledge", 1)],
        connections: vec![
            vec![(
                1,
                RequirementSet::single(IndividualRequirement {
                    resource: ResourceRef::Trick(0),
                    amount: 1,
                    negate: false,
                }),
            )],
            vec![],
        ],
    };
    let game = single_world_game(vec![area], location(1000, 5000))?;
    let ledge = game.world_list.vertex_id(location(1000, 5000), 1).unwrap();
    let patches = GamePatches::with_game(&game);

    let strict = config();
    let logic = Logic::new(&game, &strict)?;
    assert_eq!(logic.enabled_tricks(), &[false]);
    let state = calculate_starting_state(&game, &patches, &strict)?;
    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert!(!reach.contains(ledge));

    let relaxed = LayoutConfiguration {
        logic: LayoutLogic::NormalLogic,
        ..strict
    };
    let logic = Logic::new(&game, &relaxed)?;
    assert_eq!(logic.enabled_tricks(), &[true]);
    let state = calculate_starting_state(&game, &patches, &relaxed)?;
    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert!(reach.contains(ledge));
    Ok(())
}

#[test]
fn difficulty_gated_edges_follow_the_difficulty_tier() -> Result<()> {
    let area = Area {
        name: "Sacred Bridge".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![generic("Start", 0), generic("Gap", 1)],
        connections: vec![
            vec![(
                1,
                RequirementSet::single(IndividualRequirement {
                    resource: ResourceRef::Difficulty(0),
                    amount: 1,
                    negate: false,
                }),
            )],
            vec![],
        ],
    };
    let game = single_world_game(vec![area], location(1000, 5000))?;
    let gap = game.world_list.vertex_id(location(1000, 5000), 1).unwrap();
    let patches = GamePatches::with_game(&game);

    let normal = config();
    let logic = Logic::new(&game, &normal)?;
    let state = calculate_starting_state(&game, &patches, &normal)?;
    assert!(!ResolverReach::calculate_reach(&logic, &state).contains(gap));

    let hard = LayoutConfiguration {
        difficulty: LayoutDifficulty::Hard,
        ..normal
    };
    let logic = Logic::new(&game, &hard)?;
    let state = calculate_starting_state(&game, &patches, &hard)?;
    assert!(ResolverReach::calculate_reach(&logic, &state).contains(gap));
    Ok(())
}

#[test]
fn additional_requirements_filter_possible_actions() -> Result<()> {
    let area = Area {
        name: "Hall of Honored Dead".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![generic("Start", 0), event_node("Gate", 1, 0)],
        connections: vec![vec![(1, RequirementSet::trivial())], vec![]],
    };
    let game = single_world_game(vec![area], location(1000, 5000))?;
    let mut logic = Logic::new(&game, &config())?;
    let patches = GamePatches::with_game(&game);
    let mut state = calculate_starting_state(&game, &patches, &config())?;
    let event_vertex = game.world_list.vertex_id(location(1000, 5000), 1).unwrap();

    logic.set_additional_requirements(event_vertex, item_req(1, 1));
    let reach = ResolverReach::calculate_reach(&logic, &state);
    // Physically reachable, but not a useful action yet.
    assert!(reach.contains(event_vertex));
    assert_eq!(reach.possible_actions(&logic, &state).count(), 0);

    state.resources.add(ResourceRef::Item(1), 1);
    let reach = ResolverReach::calculate_reach(&logic, &state);
    let actions: Vec<_> = reach.possible_actions(&logic, &state).collect();
    assert_eq!(actions, vec![(event_vertex, 0)]);
    Ok(())
}

#[test]
fn routes_and_frontier_requirements_are_reported() -> Result<()> {
    let gate = item_req(0, 1);
    let area = Area {
        name: "Path of Eyes".to_string(),
        area_asset_id: 5000,
        default_node_index: 0,
        nodes: vec![generic("Start", 0), generic("Middle", 1), generic("End", 2)],
        connections: vec![
            vec![(1, RequirementSet::trivial())],
            vec![(2, gate.clone())],
            vec![],
        ],
    };
    let game = single_world_game(vec![area], location(1000, 5000))?;
    let logic = Logic::new(&game, &config())?;
    let patches = GamePatches::with_game(&game);
    let state = calculate_starting_state(&game, &patches, &config())?;

    let start = game.world_list.vertex_id(location(1000, 5000), 0).unwrap();
    let middle = game.world_list.vertex_id(location(1000, 5000), 1).unwrap();
    let end = game.world_list.vertex_id(location(1000, 5000), 2).unwrap();

    let reach = ResolverReach::calculate_reach(&logic, &state);
    assert_eq!(reach.route_to(middle), Some(vec![start, middle]));
    assert_eq!(reach.route_to(end), None);
    // The gate that stopped the reach shows up as the frontier.
    assert_eq!(reach.frontier_requirements(), gate);
    Ok(())
}
