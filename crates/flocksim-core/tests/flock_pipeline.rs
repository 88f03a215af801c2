use flocksim_core::{
    AgentData, BoidParams, FlockConfig, FlockWorld, SpawnSphere, SteerInputs, look_along,
    normalize_safe, steer_agent,
};
use glam::Vec3;

fn world_with(params: BoidParams) -> FlockWorld {
    FlockWorld::new(FlockConfig {
        rng_seed: Some(0xB01D),
        groups: vec![params],
    })
    .expect("world")
}

fn agent(position: Vec3, heading: Vec3) -> AgentData {
    AgentData {
        position,
        heading,
        orientation: look_along(heading),
        group: 0,
    }
}

fn lone_inputs(position: Vec3, forward: Vec3) -> SteerInputs {
    SteerInputs {
        position,
        forward,
        count: 1,
        alignment_sum: forward,
        separation_sum: position,
        nearest_obstacle: Vec3::new(100.0, 0.0, 0.0),
        nearest_obstacle_distance: 100.0,
        nearest_target: Vec3::new(10.0, 0.0, 0.0),
    }
}

fn assert_close(a: Vec3, b: Vec3) {
    assert!((a - b).length() < 1e-4, "{a} != {b}");
}

#[test]
fn single_agent_advances_toward_its_target() {
    let params = BoidParams {
        cell_radius: 8.0,
        separation_weight: 1.0,
        alignment_weight: 1.0,
        target_weight: 2.0,
        obstacle_aversion_distance: 5.0,
        move_speed: 10.0,
    };
    let mut world = world_with(params);
    world.set_targets(vec![Vec3::new(10.0, 0.0, 0.0)]);
    world.set_obstacles(vec![Vec3::new(100.0, 0.0, 0.0)]);
    world.spawn_agent(agent(Vec3::ZERO, Vec3::X)).expect("spawn");

    let dt = 0.1;
    let summary = world.step(dt);
    assert_eq!(summary.groups_processed, 1);
    assert_eq!(summary.groups_skipped, 0);

    // Alignment and separation terms vanish with no peers; the agent keeps
    // facing the target and advances move_speed * dt along it.
    let state = world.snapshot_agent(0).expect("agent");
    assert_close(state.heading, Vec3::X);
    assert_close(state.position, Vec3::new(params.move_speed * dt, 0.0, 0.0));
}

#[test]
fn coincident_agents_stay_finite() {
    let params = BoidParams {
        obstacle_aversion_distance: 1.0,
        ..BoidParams::default()
    };
    let mut world = world_with(params);
    world.set_targets(vec![Vec3::new(20.0, 0.0, 0.0)]);
    world.set_obstacles(vec![Vec3::new(-900.0, 0.0, 0.0)]);
    let position = Vec3::new(1.0, 1.0, 1.0);
    world.spawn_agent(agent(position, Vec3::X)).expect("spawn");
    world.spawn_agent(agent(position, Vec3::X)).expect("spawn");

    world.step(1.0 / 60.0);

    // Zero separation distance must resolve through safe-normalize, not NaN.
    for index in 0..2 {
        let state = world.snapshot_agent(index).expect("agent");
        assert!(state.position.is_finite());
        assert!(state.heading.is_finite());
    }
    let a = world.snapshot_agent(0).expect("agent");
    let b = world.snapshot_agent(1).expect("agent");
    assert_close(a.position, b.position);
    assert_close(a.heading, b.heading);
}

#[test]
fn obstacle_inside_aversion_distance_overrides_all_blending() {
    let params = BoidParams {
        separation_weight: 50.0,
        alignment_weight: 50.0,
        target_weight: 50.0,
        obstacle_aversion_distance: 5.0,
        ..BoidParams::default()
    };
    let obstacle = Vec3::new(2.0, 0.0, 0.0);
    let position = Vec3::ZERO;
    let inputs = SteerInputs {
        nearest_obstacle: obstacle,
        nearest_obstacle_distance: 2.0,
        ..lone_inputs(position, Vec3::X)
    };

    // With dt = 1 the committed heading is the normalized chosen heading.
    let pose = steer_agent(&params, 1.0, inputs);
    let avoid = (obstacle
        + normalize_safe(position - obstacle) * params.obstacle_aversion_distance)
        - position;
    assert_close(pose.heading, normalize_safe(avoid));
}

#[test]
fn aversion_boundary_does_not_trigger_the_override() {
    let params = BoidParams {
        obstacle_aversion_distance: 5.0,
        target_weight: 2.0,
        ..BoidParams::default()
    };
    // Obstacle exactly at the aversion distance, behind the agent; target ahead.
    let inputs = SteerInputs {
        nearest_obstacle: Vec3::new(-5.0, 0.0, 0.0),
        nearest_obstacle_distance: 5.0,
        ..lone_inputs(Vec3::ZERO, Vec3::X)
    };

    let pose = steer_agent(&params, 1.0, inputs);
    // Blended steering points at the target (+X); the avoidance heading would
    // point away from it.
    assert_close(pose.heading, Vec3::X);
}

#[test]
fn zero_dt_preserves_the_prior_heading() {
    let params = BoidParams::default();
    let inputs = SteerInputs {
        nearest_target: Vec3::new(0.0, 0.0, -50.0),
        ..lone_inputs(Vec3::new(3.0, 2.0, 1.0), Vec3::Y)
    };
    let pose = steer_agent(&params, 0.0, inputs);
    assert_close(pose.heading, Vec3::Y);
    assert_close(pose.position, Vec3::new(3.0, 2.0, 1.0));
}

#[test]
fn groups_without_targets_or_obstacles_are_skipped() {
    let mut world = world_with(BoidParams::default());
    world.spawn_agent(agent(Vec3::ZERO, Vec3::X)).expect("spawn");

    // No targets, no obstacles.
    let before = world.snapshot_agent(0).expect("agent");
    let summary = world.step(0.5);
    assert_eq!(summary.groups_processed, 0);
    assert_eq!(summary.groups_skipped, 1);
    assert_eq!(world.snapshot_agent(0).expect("agent"), before);

    // Targets alone are not enough.
    world.set_targets(vec![Vec3::X * 10.0]);
    let summary = world.step(0.5);
    assert_eq!(summary.groups_skipped, 1);
    assert_eq!(world.snapshot_agent(0).expect("agent"), before);

    // Both lists present: the pass runs and the agent moves.
    world.set_obstacles(vec![Vec3::X * -100.0]);
    let summary = world.step(0.5);
    assert_eq!(summary.groups_processed, 1);
    assert_ne!(world.snapshot_agent(0).expect("agent").position, before.position);
}

#[test]
fn identically_seeded_worlds_stay_identical() {
    let build = || {
        let mut world = FlockWorld::new(FlockConfig {
            rng_seed: Some(42),
            groups: vec![
                BoidParams::default(),
                BoidParams {
                    cell_radius: 4.0,
                    move_speed: 12.0,
                    ..BoidParams::default()
                },
            ],
        })
        .expect("world");
        world.set_targets(vec![Vec3::new(40.0, 0.0, 0.0), Vec3::new(-40.0, 5.0, 0.0)]);
        world.set_obstacles(vec![Vec3::new(0.0, 0.0, 30.0)]);
        world
            .queue_spawn(SpawnSphere {
                center: Vec3::ZERO,
                radius: 10.0,
                count: 200,
                group: 0,
            })
            .expect("queue");
        world
            .queue_spawn(SpawnSphere {
                center: Vec3::new(15.0, 0.0, 0.0),
                radius: 5.0,
                count: 50,
                group: 1,
            })
            .expect("queue");
        world
    };

    let mut a = build();
    let mut b = build();
    for _ in 0..3 {
        a.step(1.0 / 60.0);
        b.step(1.0 / 60.0);
    }

    assert_eq!(a.agent_count(), b.agent_count());
    assert_eq!(a.agents().positions(), b.agents().positions());
    assert_eq!(a.agents().headings(), b.agents().headings());
    assert_eq!(a.agents().orientations(), b.agents().orientations());
}

#[test]
fn population_growth_replaces_pooled_buffers_cleanly() {
    let mut world = world_with(BoidParams {
        cell_radius: 6.0,
        ..BoidParams::default()
    });
    world.set_targets(vec![Vec3::new(25.0, 0.0, 0.0)]);
    world.set_obstacles(vec![Vec3::new(-25.0, 0.0, 0.0)]);
    world
        .queue_spawn(SpawnSphere {
            center: Vec3::ZERO,
            radius: 8.0,
            count: 30,
            group: 0,
        })
        .expect("queue");
    world.step(1.0 / 60.0);
    assert_eq!(world.agent_count(), 30);

    world
        .queue_spawn(SpawnSphere {
            center: Vec3::new(10.0, 0.0, 0.0),
            radius: 8.0,
            count: 30,
            group: 0,
        })
        .expect("queue");
    for _ in 0..4 {
        world.step(1.0 / 60.0);
    }

    assert_eq!(world.agent_count(), 60);
    for &position in world.agents().positions() {
        assert!(position.is_finite());
    }
    for &heading in world.agents().headings() {
        assert!(heading.is_finite());
    }
}
