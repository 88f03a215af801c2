//! Flocking simulation core.
//!
//! Each tick, agents are partitioned into parameter groups, every group's
//! positions are hashed into transient spatial cells, per-cell aggregates
//! (member count, summed headings and positions, nearest obstacle/target)
//! are merged under a representative member, and a steering pass blends
//! target attraction, alignment, separation, and obstacle avoidance into a
//! new pose per agent. Work inside a group runs data-parallel with explicit
//! joins between stages; groups run sequentially so only one group's
//! transient buffers are live at a time.

use flocksim_index::{CellMap, IndexError, SpatialHash};
use glam::{Mat3, Quat, Vec3};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Errors emitted by world construction and registration.
#[derive(Debug, Error)]
pub enum FlockError {
    /// Indicates a configuration value that cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Indicates a reference to a parameter group that was never registered.
    #[error("unknown parameter group {0}")]
    UnknownGroup(usize),
    /// Propagated spatial hash configuration failure.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Normalize `v`, returning the zero vector for near-zero-magnitude input.
///
/// Never produces NaN or infinity: inputs whose squared length falls below
/// the smallest normal `f32` resolve to zero instead.
#[must_use]
pub fn normalize_safe(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq > f32::MIN_POSITIVE {
        v / len_sq.sqrt()
    } else {
        Vec3::ZERO
    }
}

/// Orientation facing along `heading` with world +Y as the reference up axis.
///
/// Falls back to the world +X axis as the reference when the heading is
/// parallel to up, and to the identity for a degenerate heading.
#[must_use]
pub fn look_along(heading: Vec3) -> Quat {
    let forward = normalize_safe(heading);
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = Vec3::Y.cross(forward);
    if right.length_squared() <= 1e-10 {
        right = Vec3::X.cross(forward);
    }
    let right = normalize_safe(right);
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

/// Sample a point uniformly distributed within the unit sphere.
pub fn random_in_unit_sphere<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let point = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        if point.length_squared() <= 1.0 {
            return point;
        }
    }
}

/// Steering configuration shared by every agent in one parameter group.
///
/// Immutable for the lifetime of the group; agents referencing the same
/// registered group are processed together as one simulation pass per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoidParams {
    /// Edge length of the spatial hash cells, in world units (must be positive).
    pub cell_radius: f32,
    /// Weight applied to the separation (anti-crowding) term.
    pub separation_weight: f32,
    /// Weight applied to the alignment (shared heading) term.
    pub alignment_weight: f32,
    /// Weight applied to the target attraction term.
    pub target_weight: f32,
    /// Distance below which obstacle avoidance overrides blended steering (non-negative).
    pub obstacle_aversion_distance: f32,
    /// Forward speed in world units per second.
    pub move_speed: f32,
}

impl Default for BoidParams {
    fn default() -> Self {
        Self {
            cell_radius: 8.0,
            separation_weight: 1.0,
            alignment_weight: 1.0,
            target_weight: 2.0,
            obstacle_aversion_distance: 30.0,
            move_speed: 25.0,
        }
    }
}

impl BoidParams {
    /// Check that every field holds a usable value.
    pub fn validate(&self) -> Result<(), FlockError> {
        if !self.cell_radius.is_finite() || self.cell_radius <= 0.0 {
            return Err(FlockError::InvalidConfig("cell_radius must be positive"));
        }
        if !self.obstacle_aversion_distance.is_finite() || self.obstacle_aversion_distance < 0.0 {
            return Err(FlockError::InvalidConfig(
                "obstacle_aversion_distance must be non-negative",
            ));
        }
        if !self.move_speed.is_finite() {
            return Err(FlockError::InvalidConfig("move_speed must be finite"));
        }
        if !self.separation_weight.is_finite()
            || !self.alignment_weight.is_finite()
            || !self.target_weight.is_finite()
        {
            return Err(FlockError::InvalidConfig("steering weights must be finite"));
        }
        Ok(())
    }
}

/// Top-level world configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlockConfig {
    /// Optional RNG seed for reproducible spawning.
    pub rng_seed: Option<u64>,
    /// Parameter groups registered at startup, one per distinct flock.
    pub groups: Vec<BoidParams>,
}

impl FlockConfig {
    fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }
}

/// Snapshot of a single agent, used for insertion and inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentData {
    pub position: Vec3,
    pub heading: Vec3,
    pub orientation: Quat,
    pub group: usize,
}

/// Column-oriented agent storage shared by the simulation and presentation layers.
///
/// Committed positions and orientations are stable between ticks; nothing
/// mutates them mid-tick.
#[derive(Debug, Default)]
pub struct AgentColumns {
    positions: Vec<Vec3>,
    headings: Vec<Vec3>,
    orientations: Vec<Quat>,
    groups: Vec<usize>,
}

impl AgentColumns {
    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if no agents exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[must_use]
    pub fn headings(&self) -> &[Vec3] {
        &self.headings
    }

    #[must_use]
    pub fn orientations(&self) -> &[Quat] {
        &self.orientations
    }

    #[must_use]
    pub fn groups(&self) -> &[usize] {
        &self.groups
    }

    /// Copy of the row at `index`, if it exists.
    #[must_use]
    pub fn snapshot(&self, index: usize) -> Option<AgentData> {
        if index >= self.len() {
            return None;
        }
        Some(AgentData {
            position: self.positions[index],
            heading: self.headings[index],
            orientation: self.orientations[index],
            group: self.groups[index],
        })
    }

    fn push(&mut self, agent: AgentData) {
        self.positions.push(agent.position);
        self.headings.push(agent.heading);
        self.orientations.push(agent.orientation);
        self.groups.push(agent.group);
        debug_assert!(
            self.headings.len() == self.positions.len()
                && self.orientations.len() == self.positions.len()
                && self.groups.len() == self.positions.len()
        );
    }

    fn commit_pose(&mut self, index: usize, pose: &AgentPose) {
        self.positions[index] = pose.position;
        self.headings[index] = pose.heading;
        self.orientations[index] = pose.orientation;
    }
}

/// One-shot order to spawn `count` agents within `radius` of `center`.
///
/// Orders queue on the world and are consumed at the start of the next tick,
/// before that tick's pass over the target group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnSphere {
    pub center: Vec3,
    pub radius: f32,
    pub count: usize,
    pub group: usize,
}

/// Summary of one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    pub agent_count: usize,
    /// Groups whose pass ran to completion this tick.
    pub groups_processed: usize,
    /// Groups deliberately skipped for lack of targets or obstacles.
    pub groups_skipped: usize,
    /// Agents instantiated from spawn orders at the start of this tick.
    pub spawned: usize,
}

/// Per-agent inputs to the steering function, resolved through the agent's
/// cell redirect.
#[derive(Debug, Clone, Copy)]
pub struct SteerInputs {
    pub position: Vec3,
    pub forward: Vec3,
    /// Number of agents sharing the cell (always at least 1).
    pub count: u32,
    pub alignment_sum: Vec3,
    pub separation_sum: Vec3,
    pub nearest_obstacle: Vec3,
    pub nearest_obstacle_distance: f32,
    pub nearest_target: Vec3,
}

/// New pose produced for one agent in one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentPose {
    pub position: Vec3,
    pub heading: Vec3,
    pub orientation: Quat,
}

/// Compute one agent's next pose from its state and its cell aggregate.
///
/// Pure function of its inputs. Obstacle avoidance is a hard override: when
/// the cell's nearest obstacle lies strictly inside the aversion distance,
/// the avoidance heading replaces the blended heading entirely. The turn
/// toward the chosen heading is smoothed by `dt`; with `dt == 0` the prior
/// forward heading is preserved.
#[must_use]
pub fn steer_agent(params: &BoidParams, dt: f32, input: SteerInputs) -> AgentPose {
    let position = input.position;
    let forward = input.forward;

    let to_obstacle = position - input.nearest_obstacle;
    let avoid_obstacle_heading = (input.nearest_obstacle
        + normalize_safe(to_obstacle) * params.obstacle_aversion_distance)
        - position;

    let target_heading =
        params.target_weight * normalize_safe(input.nearest_target - position);
    let alignment_heading = params.alignment_weight
        * normalize_safe(input.alignment_sum / input.count as f32 - forward);
    let separation_heading = params.separation_weight
        * normalize_safe(position * input.count as f32 - input.separation_sum);
    let blended_heading =
        normalize_safe(target_heading + alignment_heading + separation_heading);

    let chosen = if input.nearest_obstacle_distance - params.obstacle_aversion_distance < 0.0 {
        avoid_obstacle_heading
    } else {
        blended_heading
    };

    let next_heading = normalize_safe(forward + dt * (chosen - forward));
    AgentPose {
        position: position + next_heading * dt * params.move_speed,
        heading: next_heading,
        orientation: look_along(next_heading),
    }
}

/// Scan `points` for the entry nearest to `position`.
///
/// Tracks minimum squared distance with a strictly-less comparison (ties keep
/// the first-encountered index) and takes a single square root at the end.
/// Callers guarantee `points` is non-empty.
fn nearest(points: &[Vec3], position: Vec3) -> (u32, f32) {
    let mut best_index = 0u32;
    let mut best_sq = position.distance_squared(points[0]);
    for (index, &point) in points.iter().enumerate().skip(1) {
        let dist_sq = position.distance_squared(point);
        if dist_sq < best_sq {
            best_sq = dist_sq;
            best_index = index as u32;
        }
    }
    (best_index, best_sq.sqrt())
}

/// Aggregate record produced for one populated cell during the merge pass.
#[derive(Debug, Clone, Copy)]
struct CellStats {
    representative: u32,
    count: u32,
    alignment: Vec3,
    separation: Vec3,
    nearest_obstacle_index: u32,
    nearest_obstacle_distance: f32,
    nearest_target_index: u32,
}

/// Pooled per-group working storage, reused across ticks while sizes match.
///
/// Seed arrays are written only by the copy stages and read only by the
/// merge; aggregate arrays are written only by the merge commit and read
/// only by steering. Every slot that steering reads is written first, so
/// stale contents after a reallocation are harmless.
#[derive(Debug, Default)]
struct GroupBuffers {
    /// Group-local index to world agent index, rebuilt by the partition pass.
    members: Vec<u32>,
    alignment_seed: Vec<Vec3>,
    separation_seed: Vec<Vec3>,
    target_positions: Vec<Vec3>,
    obstacle_positions: Vec<Vec3>,
    cell_redirect: Vec<u32>,
    cell_count: Vec<u32>,
    cell_alignment: Vec<Vec3>,
    cell_separation: Vec<Vec3>,
    cell_obstacle_index: Vec<u32>,
    cell_obstacle_distance: Vec<f32>,
    cell_target_index: Vec<u32>,
    cells: CellMap,
    cell_scratch: Vec<Vec<u32>>,
}

fn ensure_len<T: Clone + Default>(buf: &mut Vec<T>, len: usize) {
    if buf.len() != len {
        *buf = vec![T::default(); len];
    }
}

impl GroupBuffers {
    fn ensure(&mut self, agents: usize, targets: usize, obstacles: usize) {
        if self.alignment_seed.len() != agents
            || self.target_positions.len() != targets
            || self.obstacle_positions.len() != obstacles
        {
            debug!(agents, targets, obstacles, "resizing flock frame buffers");
        }
        ensure_len(&mut self.alignment_seed, agents);
        ensure_len(&mut self.separation_seed, agents);
        ensure_len(&mut self.cell_redirect, agents);
        ensure_len(&mut self.cell_count, agents);
        ensure_len(&mut self.cell_alignment, agents);
        ensure_len(&mut self.cell_separation, agents);
        ensure_len(&mut self.cell_obstacle_index, agents);
        ensure_len(&mut self.cell_obstacle_distance, agents);
        ensure_len(&mut self.cell_target_index, agents);
        ensure_len(&mut self.target_positions, targets);
        ensure_len(&mut self.obstacle_positions, obstacles);
        self.cell_scratch.clear();
    }
}

/// A registered parameter group plus its derived spatial hasher.
#[derive(Debug)]
struct ParamGroup {
    params: BoidParams,
    hasher: SpatialHash,
}

/// Aggregate simulation state: registered groups, agents, shared target and
/// obstacle lists, and the pooled per-group frame buffers.
pub struct FlockWorld {
    groups: Vec<ParamGroup>,
    agents: AgentColumns,
    targets: Vec<Vec3>,
    obstacles: Vec<Vec3>,
    buffers: Vec<GroupBuffers>,
    pending_spawns: Vec<SpawnSphere>,
    rng: SmallRng,
    tick: u64,
}

impl fmt::Debug for FlockWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlockWorld")
            .field("tick", &self.tick)
            .field("group_count", &self.groups.len())
            .field("agent_count", &self.agents.len())
            .field("target_count", &self.targets.len())
            .field("obstacle_count", &self.obstacles.len())
            .finish()
    }
}

impl FlockWorld {
    /// Instantiate a new world using the supplied configuration.
    pub fn new(config: FlockConfig) -> Result<Self, FlockError> {
        let rng = config.seeded_rng();
        let mut world = Self {
            groups: Vec::new(),
            agents: AgentColumns::default(),
            targets: Vec::new(),
            obstacles: Vec::new(),
            buffers: Vec::new(),
            pending_spawns: Vec::new(),
            rng,
            tick: 0,
        };
        for params in &config.groups {
            world.register_group(*params)?;
        }
        Ok(world)
    }

    /// Register a parameter group, returning its stable ordinal.
    pub fn register_group(&mut self, params: BoidParams) -> Result<usize, FlockError> {
        params.validate()?;
        let hasher = SpatialHash::new(params.cell_radius)?;
        self.groups.push(ParamGroup { params, hasher });
        self.buffers.push(GroupBuffers::default());
        Ok(self.groups.len() - 1)
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of live agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Registered parameter groups in registration order.
    #[must_use]
    pub fn group_params(&self) -> Vec<BoidParams> {
        self.groups.iter().map(|group| group.params).collect()
    }

    /// Read access to committed agent state.
    #[must_use]
    pub fn agents(&self) -> &AgentColumns {
        &self.agents
    }

    #[must_use]
    pub fn targets(&self) -> &[Vec3] {
        &self.targets
    }

    #[must_use]
    pub fn obstacles(&self) -> &[Vec3] {
        &self.obstacles
    }

    /// Replace the shared target list; takes effect at the next tick boundary.
    pub fn set_targets(&mut self, targets: Vec<Vec3>) {
        self.targets = targets;
    }

    /// Replace the shared obstacle list; takes effect at the next tick boundary.
    pub fn set_obstacles(&mut self, obstacles: Vec<Vec3>) {
        self.obstacles = obstacles;
    }

    /// Insert a fully specified agent, returning its index.
    pub fn spawn_agent(&mut self, agent: AgentData) -> Result<usize, FlockError> {
        if agent.group >= self.groups.len() {
            return Err(FlockError::UnknownGroup(agent.group));
        }
        self.agents.push(agent);
        Ok(self.agents.len() - 1)
    }

    /// Queue a one-shot spawn order, consumed at the start of the next tick.
    pub fn queue_spawn(&mut self, order: SpawnSphere) -> Result<(), FlockError> {
        if order.group >= self.groups.len() {
            return Err(FlockError::UnknownGroup(order.group));
        }
        if !order.radius.is_finite() || order.radius < 0.0 {
            return Err(FlockError::InvalidConfig(
                "spawn radius must be non-negative",
            ));
        }
        self.pending_spawns.push(order);
        Ok(())
    }

    /// Number of spawn orders not yet consumed.
    #[must_use]
    pub fn pending_spawn_count(&self) -> usize {
        self.pending_spawns.len()
    }

    /// Copy of the agent row at `index`, if it exists.
    #[must_use]
    pub fn snapshot_agent(&self, index: usize) -> Option<AgentData> {
        self.agents.snapshot(index)
    }

    /// Drop all pooled per-group buffers, e.g. when the simulation stops.
    pub fn release_buffers(&mut self) {
        for buffers in &mut self.buffers {
            *buffers = GroupBuffers::default();
        }
    }

    /// Advance the simulation by one tick of `dt` seconds.
    ///
    /// Groups are processed sequentially in registration order. A group with
    /// agents but no targets or no obstacles is skipped for the tick and its
    /// agents keep their previous pose.
    pub fn step(&mut self, dt: f32) -> TickSummary {
        let spawned = self.stage_spawns();
        self.stage_partition();

        let mut groups_processed = 0;
        let mut groups_skipped = 0;
        for group_index in 0..self.groups.len() {
            if self.buffers[group_index].members.is_empty() {
                continue;
            }
            if self.targets.is_empty() || self.obstacles.is_empty() {
                debug!(
                    group = group_index,
                    targets = self.targets.len(),
                    obstacles = self.obstacles.len(),
                    "skipping flock pass without targets or obstacles"
                );
                groups_skipped += 1;
                continue;
            }
            self.run_group(group_index, dt);
            groups_processed += 1;
        }

        self.tick += 1;
        TickSummary {
            tick: self.tick,
            agent_count: self.agents.len(),
            groups_processed,
            groups_skipped,
            spawned,
        }
    }

    /// Consume queued spawn orders, instantiating agents on sphere-sampled points.
    fn stage_spawns(&mut self) -> usize {
        if self.pending_spawns.is_empty() {
            return 0;
        }
        let orders: Vec<SpawnSphere> = self.pending_spawns.drain(..).collect();
        let mut spawned = 0;
        for order in orders {
            for _ in 0..order.count {
                let point = random_in_unit_sphere(&mut self.rng);
                let heading = normalize_safe(point);
                self.agents.push(AgentData {
                    position: order.center + point * order.radius,
                    heading,
                    orientation: look_along(heading),
                    group: order.group,
                });
                spawned += 1;
            }
        }
        spawned
    }

    /// Rebuild each group's member list from agent group membership.
    fn stage_partition(&mut self) {
        for buffers in &mut self.buffers {
            buffers.members.clear();
        }
        let groups = self.agents.groups();
        for (index, &group) in groups.iter().enumerate() {
            self.buffers[group].members.push(index as u32);
        }
    }

    /// Run the full pipeline for one group: copy/hash stages, barrier, cell
    /// merge, barrier, steering, commit.
    fn run_group(&mut self, group_index: usize, dt: f32) {
        let Self {
            groups,
            agents,
            targets,
            obstacles,
            buffers,
            ..
        } = self;
        let group = &groups[group_index];
        let buffers = &mut buffers[group_index];

        let agent_count = buffers.members.len();
        buffers.ensure(agent_count, targets.len(), obstacles.len());

        let GroupBuffers {
            members,
            alignment_seed,
            separation_seed,
            target_positions,
            obstacle_positions,
            cell_redirect,
            cell_count,
            cell_alignment,
            cell_separation,
            cell_obstacle_index,
            cell_obstacle_distance,
            cell_target_index,
            cells,
            cell_scratch,
        } = buffers;
        let members: &[u32] = members;
        let cells: &CellMap = cells;
        let positions: &[Vec3] = agents.positions();
        let headings: &[Vec3] = agents.headings();
        let hasher = &group.hasher;

        // Independent copy/hash/init stages; the scope end is the barrier.
        rayon::scope(|s| {
            s.spawn(|_| {
                alignment_seed
                    .par_iter_mut()
                    .zip(members.par_iter())
                    .for_each(|(seed, &agent)| *seed = headings[agent as usize]);
            });
            s.spawn(|_| {
                separation_seed
                    .par_iter_mut()
                    .zip(members.par_iter())
                    .for_each(|(seed, &agent)| *seed = positions[agent as usize]);
            });
            s.spawn(|_| target_positions.copy_from_slice(targets));
            s.spawn(|_| obstacle_positions.copy_from_slice(obstacles));
            s.spawn(|_| {
                members.par_iter().enumerate().for_each(|(local, &agent)| {
                    cells.insert(hasher.key(positions[agent as usize]), local as u32);
                });
            });
            s.spawn(|_| cell_count.fill(1));
        });

        // Seeds and copies are read-only past the barrier.
        let alignment_seed: &[Vec3] = alignment_seed;
        let separation_seed: &[Vec3] = separation_seed;
        let target_positions: &[Vec3] = target_positions;
        let obstacle_positions: &[Vec3] = obstacle_positions;

        // Merge pass: one aggregate per populated cell, parallel over cells.
        cells.drain_cells(cell_scratch);
        let stats: Vec<CellStats> = cell_scratch
            .par_iter_mut()
            .map(|cell_members| {
                // Lowest member index is the representative; the sorted fold
                // keeps f32 accumulation order fixed for a fixed agent order.
                cell_members.sort_unstable();
                let rep = cell_members[0] as usize;
                let provisional = cell_count[rep];
                let centroid = separation_seed[rep] / provisional as f32;

                let (nearest_obstacle_index, nearest_obstacle_distance) =
                    nearest(obstacle_positions, centroid);
                let (nearest_target_index, _) = nearest(target_positions, centroid);

                let mut count = provisional;
                let mut alignment = alignment_seed[rep];
                let mut separation = separation_seed[rep];
                for &member in &cell_members[1..] {
                    count += 1;
                    alignment += alignment_seed[member as usize];
                    separation += separation_seed[member as usize];
                }

                CellStats {
                    representative: rep as u32,
                    count,
                    alignment,
                    separation,
                    nearest_obstacle_index,
                    nearest_obstacle_distance,
                    nearest_target_index,
                }
            })
            .collect();

        // Commit aggregates to representative slots and rewrite redirects.
        for (cell_members, cell) in cell_scratch.iter().zip(&stats) {
            let rep = cell.representative as usize;
            cell_count[rep] = cell.count;
            cell_alignment[rep] = cell.alignment;
            cell_separation[rep] = cell.separation;
            cell_obstacle_index[rep] = cell.nearest_obstacle_index;
            cell_obstacle_distance[rep] = cell.nearest_obstacle_distance;
            cell_target_index[rep] = cell.nearest_target_index;
            for &member in cell_members {
                cell_redirect[member as usize] = cell.representative;
            }
        }

        // Steering pass over agents, then a sequential commit.
        let params = &group.params;
        let poses: Vec<AgentPose> = members
            .par_iter()
            .enumerate()
            .map(|(local, &agent)| {
                let ci = cell_redirect[local] as usize;
                steer_agent(
                    params,
                    dt,
                    SteerInputs {
                        position: positions[agent as usize],
                        forward: headings[agent as usize],
                        count: cell_count[ci],
                        alignment_sum: cell_alignment[ci],
                        separation_sum: cell_separation[ci],
                        nearest_obstacle: obstacle_positions
                            [cell_obstacle_index[ci] as usize],
                        nearest_obstacle_distance: cell_obstacle_distance[ci],
                        nearest_target: target_positions[cell_target_index[ci] as usize],
                    },
                )
            })
            .collect();

        for (local, pose) in poses.iter().enumerate() {
            agents.commit_pose(members[local] as usize, pose);
        }
    }
}
