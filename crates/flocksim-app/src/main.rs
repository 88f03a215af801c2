use anyhow::Result;
use flocksim_core::{BoidParams, FlockConfig, FlockWorld, SpawnSphere};
use glam::Vec3;
use tracing::info;

mod cycle;
use cycle::FrameCycle;

const DT: f32 = 1.0 / 60.0;
const TICKS: u64 = 600;

fn main() -> Result<()> {
    init_tracing();
    let mut world = bootstrap_world()?;
    info!(
        groups = world.group_params().len(),
        targets = world.targets().len(),
        obstacles = world.obstacles().len(),
        "Starting flocksim demo shell"
    );

    let mut cookie = FrameCycle::new(8, 15.0);
    let mut clock = 0.0f64;
    for _ in 0..TICKS {
        let summary = world.step(DT);
        clock += f64::from(DT);
        let light_frame = cookie.poll(clock);
        if summary.tick % 60 == 0 {
            info!(
                tick = summary.tick,
                agents = summary.agent_count,
                processed = summary.groups_processed,
                skipped = summary.groups_skipped,
                light_frame,
                "flock tick"
            );
        }
    }

    world.release_buffers();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn bootstrap_world() -> Result<FlockWorld> {
    let config = FlockConfig {
        rng_seed: Some(0x5EED_F10C),
        groups: vec![
            BoidParams::default(),
            BoidParams {
                cell_radius: 4.0,
                separation_weight: 2.0,
                move_speed: 15.0,
                ..BoidParams::default()
            },
        ],
    };
    let mut world = FlockWorld::new(config)?;
    world.set_targets(vec![
        Vec3::new(60.0, 0.0, 0.0),
        Vec3::new(-60.0, 10.0, 30.0),
    ]);
    world.set_obstacles(vec![
        Vec3::new(0.0, 0.0, 40.0),
        Vec3::new(20.0, -10.0, -30.0),
    ]);
    world.queue_spawn(SpawnSphere {
        center: Vec3::ZERO,
        radius: 25.0,
        count: 2_000,
        group: 0,
    })?;
    world.queue_spawn(SpawnSphere {
        center: Vec3::new(40.0, 0.0, 0.0),
        radius: 10.0,
        count: 500,
        group: 1,
    })?;
    Ok(world)
}
