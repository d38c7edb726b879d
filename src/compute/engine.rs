//! Gravity map - the phase-driven simulation engine.
//!
//! Each call to [`GravityMap::update`] runs one [`Phase`]. Four calls make up
//! one full cycle: gravity diffusion, mass migration, mass consumption and a
//! stats refresh.

use rand::prelude::*;

use crate::schema::{ConfigError, MapConfig};

use super::{
    AdjacentCell, AdjacentSample, Field, FieldStats, Grid, Phase, SimulationStats, Topology,
};

/// Each ring neighbour contributes `gravity / NEIGHBOR_DIVISOR`.
const NEIGHBOR_DIVISOR: u128 = 8;

/// A cell's own mass contributes `mass / MASS_DIVISOR` to its gravity.
const MASS_DIVISOR: u128 = NEIGHBOR_DIVISOR - 2;

/// Per-cell probability of trying to absorb a neighbour during consumption.
const HUNGER_CHANCE: f64 = 0.25;

/// Two-field automaton of diffusing gravity and migrating, merging mass.
///
/// Generic over the random source so tests and replays can inject a seeded RNG.
pub struct GravityMap<R = StdRng> {
    grid: Grid,
    max_gravity: u128,
    max_mass: u128,
    generation: u64,
    phase: Phase,
    running: bool,
    stats: SimulationStats,
    rng: R,
    /// Reused candidate list for grouped tie-breaking.
    candidates: Vec<AdjacentCell>,
}

impl GravityMap<StdRng> {
    /// Create a map from configuration, seeding the RNG from `config.seed`
    /// or from OS entropy when no seed is set.
    pub fn new(config: &MapConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> GravityMap<R> {
    /// Create a map driven by an injected random source.
    pub fn with_rng(config: &MapConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        log::debug!(
            "creating {}x{} gravity map ({}), seed {:?}",
            config.width,
            config.height,
            config.topology,
            config.seed
        );

        Ok(Self {
            grid: Grid::new(config.width, config.height, config.topology),
            max_gravity: config.max_gravity,
            max_mass: config.max_mass,
            generation: 0,
            phase: Phase::GravityDiffusion,
            running: false,
            stats: SimulationStats::reset_to(config.max_gravity, config.max_mass),
            rng,
            candidates: Vec::with_capacity(8),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[inline]
    pub fn max_gravity(&self) -> u128 {
        self.max_gravity
    }

    #[inline]
    pub fn max_mass(&self) -> u128 {
        self.max_mass
    }

    /// Driver calls made while running since construction or the last reset.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The phase the next running driver call will execute.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Flip the running flag, returning the new value.
    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.grid.topology
    }

    pub fn set_topology(&mut self, topology: Topology) {
        log::debug!("topology {} -> {}", self.grid.topology, topology);
        self.grid.topology = topology;
    }

    /// Switch to the next topology in cycle order, returning it.
    pub fn cycle_topology(&mut self) -> Topology {
        let next = self.grid.topology.next();
        self.set_topology(next);
        next
    }

    /// Latest aggregates.
    #[inline]
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Read access to the underlying layers.
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn gravity_at(&self, x: i32, y: i32, default: u128) -> u128 {
        self.grid.get(Field::Gravity, x, y, default)
    }

    pub fn mass_at(&self, x: i32, y: i32, default: u128) -> u128 {
        self.grid.get(Field::Mass, x, y, default)
    }

    /// Write gravity directly into the live layer.
    pub fn set_gravity(&mut self, x: i32, y: i32, gravity: u128) {
        self.grid.set(Field::Gravity, x, y, gravity);
    }

    /// Write mass directly into the live layer.
    pub fn set_mass(&mut self, x: i32, y: i32, mass: u128) {
        self.grid.set(Field::Mass, x, y, mass);
    }

    /// 3x3 neighbourhood of (x, y) in `field`.
    pub fn adjacent(&self, field: Field, x: i32, y: i32) -> AdjacentSample {
        self.grid.sample_adjacent(field, x, y)
    }

    /// Set the 3x3 block spanning (x, y) to (x + 2, y + 2) to `mass`.
    pub fn stamp_mass(&mut self, x: i32, y: i32, mass: u128) {
        for i in 0..=2 {
            for j in 0..=2 {
                self.set_mass(x.saturating_add(i), y.saturating_add(j), mass);
            }
        }
    }

    pub fn clear_mass(&mut self) {
        self.grid.clear(Field::Mass);
    }

    pub fn clear_gravity(&mut self) {
        self.grid.clear(Field::Gravity);
    }

    /// Give each empty cell `mass` with probability `chance`, using the map's RNG.
    ///
    /// Returns the number of cells seeded.
    pub fn scatter_mass(&mut self, chance: f64, mass: u128) -> usize {
        scatter(&mut self.grid, &mut self.rng, chance, mass)
    }

    /// Like [`scatter_mass`](Self::scatter_mass) but drawing from `rng`.
    pub fn scatter_mass_with<G: Rng + ?Sized>(
        &mut self,
        rng: &mut G,
        chance: f64,
        mass: u128,
    ) -> usize {
        scatter(&mut self.grid, rng, chance, mass)
    }

    /// Zero every layer and aggregate and rewind to generation 0.
    pub fn reset(&mut self) {
        log::debug!("reset at generation {}", self.generation);
        self.generation = 0;
        self.phase = Phase::GravityDiffusion;
        self.grid.clear_all();
        self.stats = SimulationStats::reset_to(self.max_gravity, self.max_mass);
    }

    /// Advance one phase. While paused, only refreshes the aggregates.
    pub fn update(&mut self) {
        if !self.running {
            self.refresh_stats();
            return;
        }

        self.generation += 1;

        match self.phase {
            Phase::GravityDiffusion => self.diffuse_gravity(),
            Phase::MassMigration => self.migrate_mass(),
            Phase::MassConsumption => self.consume_mass(),
            Phase::StatsOnly => self.refresh_stats(),
        }

        log::trace!(
            "generation {} {}: gravity total {:.3e}, mass total {:.3e} over {} cells",
            self.generation,
            self.phase.name(),
            self.stats.gravity.total,
            self.stats.mass.total,
            self.stats.mass.occupied
        );

        self.phase = self.phase.next();
    }

    /// Run one full cycle (one driver call per phase).
    pub fn tick(&mut self) {
        for _ in 0..Phase::COUNT {
            self.update();
        }
    }

    /// Run `ticks` full cycles.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn refresh_stats(&mut self) {
        self.stats = SimulationStats::from_grid(&self.grid);
    }

    /// Gravity becomes an eighth of each ring neighbour plus a sixth of the
    /// cell's own mass, clamped to the global cap.
    fn diffuse_gravity(&mut self) {
        self.grid.scratch.fill(0);
        let mut stats = FieldStats::EMPTY;

        for x in 0..self.grid.width() {
            for y in 0..self.grid.height() {
                let sample = self
                    .grid
                    .sample_adjacent(Field::Gravity, x as i32, y as i32);
                // At most 8 * (u128::MAX / 8), so this cannot overflow.
                let pull: u128 = sample.ring().map(|c| c.value / NEIGHBOR_DIVISOR).sum();

                let idx = self.grid.index(x, y);
                let mut gravity = (self.grid.mass[idx] / MASS_DIVISOR).saturating_add(pull);
                // Weak neighbours still keep the cell lit.
                if gravity == 0 && sample.occupied_neighbors() > 0 {
                    gravity = 1;
                }
                let gravity = gravity.min(self.max_gravity);

                self.grid.scratch[idx] = gravity;
                stats.fold(gravity);
            }
        }

        self.grid.commit_scratch(Field::Gravity);
        self.stats.gravity = stats;
    }

    /// Unsurrounded mass moves to a free neighbour whose gravity is at least
    /// its own, strongest group first.
    fn migrate_mass(&mut self) {
        self.grid.scratch.fill(0);
        let mut stats = FieldStats::EMPTY;

        for x in 0..self.grid.width() {
            for y in 0..self.grid.height() {
                let idx = self.grid.index(x, y);
                let mass = self.grid.mass[idx];
                if mass == 0 {
                    continue;
                }
                stats.fold(mass);

                let (cx, cy) = (x as i32, y as i32);
                let surrounded = self
                    .grid
                    .sample_adjacent(Field::Mass, cx, cy)
                    .occupied_neighbors()
                    == 8;

                let target = if surrounded {
                    None
                } else {
                    self.migration_target(cx, cy)
                };

                match target {
                    Some(target) => {
                        self.grid.mass[idx] = 0;
                        self.grid.scratch[target] = mass;
                    }
                    None => self.grid.scratch[idx] = mass,
                }
            }
        }

        self.grid.commit_scratch(Field::Mass);
        self.stats.mass = stats;
    }

    fn migration_target(&mut self, x: i32, y: i32) -> Option<usize> {
        let sample = self.grid.sample_adjacent(Field::Gravity, x, y);
        let own = sample.center();

        self.candidates.clear();
        self.candidates.extend(sample.ring());
        self.candidates.sort_by(|a, b| b.value.cmp(&a.value));

        for group in self.candidates.chunk_by_mut(|a, b| a.value == b.value) {
            if group[0].value < own {
                break;
            }
            group.shuffle(&mut self.rng);

            for cell in group.iter() {
                let Some((tx, ty)) = self.grid.translate(x + cell.dx, y + cell.dy) else {
                    continue;
                };
                let target = self.grid.index(tx, ty);
                if self.grid.mass[target] == 0 && self.grid.scratch[target] == 0 {
                    return Some(target);
                }
            }
        }

        None
    }

    /// Hungry cells with company absorb one of their smallest neighbours if
    /// the merged mass stays under the local ceiling.
    fn consume_mass(&mut self) {
        self.grid.scratch.fill(0);
        let mut stats = FieldStats::EMPTY;

        for x in 0..self.grid.width() {
            for y in 0..self.grid.height() {
                let idx = self.grid.index(x, y);
                let mass = self.grid.mass[idx];
                if mass == 0 {
                    continue;
                }
                stats.fold(mass);

                let (cx, cy) = (x as i32, y as i32);
                let neighbors = self.grid.sample_adjacent(Field::Mass, cx, cy);
                let surrounded = neighbors.occupied_neighbors() >= 2;
                let hungry = self.rng.gen_bool(HUNGER_CHANCE);
                let ceiling = self.local_mass_ceiling(self.grid.gravity[idx]);

                let merged = if hungry && surrounded && mass < ceiling {
                    self.absorb_smallest(cx, cy, idx, mass, ceiling, &neighbors)
                } else {
                    None
                };

                self.grid.scratch[idx] = merged.unwrap_or(mass);
            }
        }

        self.grid.commit_scratch(Field::Mass);
        self.stats.mass = stats;
    }

    /// Pick one neighbour from the smallest group no heavier than `mass` and
    /// absorb it. Returns the merged mass, or `None` if nothing was absorbed.
    fn absorb_smallest(
        &mut self,
        x: i32,
        y: i32,
        idx: usize,
        mass: u128,
        ceiling: u128,
        neighbors: &AdjacentSample,
    ) -> Option<u128> {
        let smallest = neighbors
            .ring()
            .map(|c| c.value)
            .filter(|&v| v != 0 && v <= mass)
            .min()?;

        self.candidates.clear();
        self.candidates
            .extend(neighbors.ring().filter(|c| c.value == smallest));
        self.candidates.shuffle(&mut self.rng);
        let prey = self.candidates[0];

        let (tx, ty) = self.grid.translate(x + prey.dx, y + prey.dy)?;
        let target = self.grid.index(tx, ty);
        if target == idx {
            return None;
        }

        // A neighbour that already settled this pass may have absorbed
        // something itself; its scratch value is authoritative.
        let prey_mass = match self.grid.scratch[target] {
            0 => self.grid.mass[target],
            settled => settled,
        };
        let merged = mass.checked_add(prey_mass).filter(|&m| m < ceiling)?;

        self.grid.mass[target] = 0;
        self.grid.scratch[target] = 0;
        Some(merged)
    }

    /// `max_mass * gravity / max_gravity`, zero when the gravity cap is zero.
    fn local_mass_ceiling(&self, gravity: u128) -> u128 {
        if self.max_gravity == 0 {
            return 0;
        }
        let fraction = gravity as f64 / self.max_gravity as f64;
        ((self.max_mass as f64 * fraction) as u128).min(self.max_mass)
    }
}

fn scatter<G: Rng + ?Sized>(grid: &mut Grid, rng: &mut G, chance: f64, mass: u128) -> usize {
    if chance.is_nan() || chance <= 0.0 || mass == 0 {
        return 0;
    }
    let chance = chance.min(1.0);

    let mut seeded = 0;
    for cell in grid.mass.iter_mut() {
        if *cell == 0 && rng.gen_bool(chance) {
            *cell = mass;
            seeded += 1;
        }
    }
    seeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_config(width: usize, height: usize, topology: Topology) -> MapConfig {
        MapConfig {
            width,
            height,
            topology,
            seed: Some(42),
            ..MapConfig::default()
        }
    }

    fn test_map(width: usize, height: usize, topology: Topology) -> GravityMap {
        GravityMap::new(&test_config(width, height, topology)).unwrap()
    }

    fn total_mass<R: Rng>(map: &GravityMap<R>) -> u128 {
        map.grid().checked_total(Field::Mass).unwrap()
    }

    #[test]
    fn test_map_creation() {
        let map = test_map(5, 7, Topology::Torus);
        assert_eq!(map.width(), 5);
        assert_eq!(map.height(), 7);
        assert_eq!(map.generation(), 0);
        assert_eq!(map.phase(), Phase::GravityDiffusion);
        assert!(!map.is_running());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = test_config(0, 3, Topology::Torus);
        assert!(GravityMap::new(&config).is_err());
    }

    #[test]
    fn test_running_cycles_phases() {
        let mut map = test_map(4, 4, Topology::Torus);
        map.set_running(true);

        for i in 0..Phase::COUNT {
            assert_eq!(map.phase().index(), i);
            map.update();
            assert_eq!(map.generation(), i as u64 + 1);
        }
        assert_eq!(map.phase(), Phase::GravityDiffusion);
    }

    #[test]
    fn test_paused_only_refreshes_stats() {
        let mut map = test_map(4, 4, Topology::Torus);
        map.set_mass(1, 1, 10);
        map.set_gravity(2, 2, 3);

        map.update();
        map.update();

        assert_eq!(map.generation(), 0);
        assert_eq!(map.phase(), Phase::GravityDiffusion);
        assert_eq!(map.stats().mass.total, 10.0);
        assert_eq!(map.stats().gravity.max, 3.0);
        assert_eq!(map.mass_at(1, 1, 0), 10);
    }

    #[test]
    fn test_single_seed_diffusion_on_3x3_torus() {
        let mut map = test_map(3, 3, Topology::Torus);
        map.set_mass(1, 1, 600);

        map.diffuse_gravity();
        assert_eq!(map.gravity_at(1, 1, 0), 100);
        for x in 0..3 {
            for y in 0..3 {
                if (x, y) != (1, 1) {
                    assert_eq!(map.gravity_at(x, y, 0), 0);
                }
            }
        }

        // Every other cell on a 3x3 torus borders (1, 1).
        map.diffuse_gravity();
        assert_eq!(map.gravity_at(1, 1, 0), 100);
        assert_eq!(map.gravity_at(0, 0, 0), 12);
        assert_eq!(map.gravity_at(2, 1, 0), 12);
        assert_eq!(map.stats().gravity.total, 100.0 + 8.0 * 12.0);
    }

    #[test]
    fn test_weak_neighbors_floor_to_one() {
        let mut map = test_map(3, 3, Topology::Plane);
        map.set_gravity(0, 0, 5);

        map.diffuse_gravity();
        assert_eq!(map.gravity_at(1, 1, 0), 1);
        assert_eq!(map.gravity_at(0, 1, 0), 1);
        assert_eq!(map.gravity_at(0, 0, 0), 0);
        assert_eq!(map.gravity_at(2, 2, 0), 0);
    }

    #[test]
    fn test_diffusion_clamps_to_cap() {
        let mut config = test_config(3, 3, Topology::Torus);
        config.max_gravity = 10;
        let mut map = GravityMap::new(&config).unwrap();
        map.set_mass(1, 1, 600);

        map.diffuse_gravity();
        assert_eq!(map.gravity_at(1, 1, 0), 10);
    }

    #[test]
    fn test_diffusion_saturates_wide_values() {
        let mut map = test_map(3, 3, Topology::Torus);
        for x in 0..3 {
            for y in 0..3 {
                map.set_gravity(x, y, u128::MAX);
                map.set_mass(x, y, u128::MAX);
            }
        }

        map.diffuse_gravity();
        assert_eq!(map.gravity_at(1, 1, 0), u128::MAX);
    }

    #[test]
    fn test_zero_gravity_cap() {
        let mut config = test_config(3, 3, Topology::Torus);
        config.max_gravity = 0;
        let mut map = GravityMap::new(&config).unwrap();
        map.stamp_mass(0, 0, 50);
        map.set_running(true);
        map.run(3);

        assert!(map.grid().layer(Field::Gravity).iter().all(|&g| g == 0));
        assert_eq!(total_mass(&map), 9 * 50);
    }

    #[test]
    fn test_migration_moves_toward_gravity() {
        let mut map = test_map(3, 3, Topology::Plane);
        map.set_mass(1, 1, 7);
        map.set_gravity(2, 2, 100);

        map.migrate_mass();
        assert_eq!(map.mass_at(1, 1, 0), 0);
        assert_eq!(map.mass_at(2, 2, 0), 7);
        assert_eq!(map.stats().mass.total, 7.0);
    }

    #[test]
    fn test_migration_spreads_over_equal_targets() {
        let mut map = test_map(5, 5, Topology::Torus);
        let mut reached = std::collections::HashSet::new();

        for _ in 0..200 {
            map.clear_mass();
            map.set_mass(2, 2, 7);
            map.migrate_mass();

            assert_eq!(map.mass_at(2, 2, 0), 0);
            let landed = map
                .adjacent(Field::Mass, 2, 2)
                .ring()
                .find(|c| c.value == 7)
                .map(|c| (c.dx, c.dy));
            reached.insert(landed.unwrap());
        }

        // Flat gravity: every neighbour ties, so all eight should be used.
        assert_eq!(reached.len(), 8);
    }

    #[test]
    fn test_migration_stays_below_own_gravity() {
        let mut map = test_map(3, 3, Topology::Torus);
        for x in 0..3 {
            for y in 0..3 {
                map.set_gravity(x, y, 10);
            }
        }
        map.set_gravity(1, 1, 50);
        map.set_mass(1, 1, 7);

        map.migrate_mass();
        assert_eq!(map.mass_at(1, 1, 0), 7);
    }

    #[test]
    fn test_migration_without_free_target_keeps_mass() {
        // Two adjacent cells on a 2x1 plane: every in-range target is taken.
        let mut map = test_map(2, 1, Topology::Plane);
        map.set_mass(0, 0, 5);
        map.set_mass(1, 0, 9);

        map.migrate_mass();
        assert_eq!(map.mass_at(0, 0, 0), 5);
        assert_eq!(map.mass_at(1, 0, 0), 9);
    }

    #[test]
    fn test_surrounded_mass_never_moves() {
        let mut map = test_map(3, 3, Topology::Torus);
        for x in 0..3 {
            for y in 0..3 {
                map.set_mass(x, y, (x * 3 + y + 1) as u128);
            }
        }
        map.set_gravity(0, 0, 1000);
        let before = map.grid().layer(Field::Mass).to_vec();

        map.migrate_mass();
        assert_eq!(map.grid().layer(Field::Mass), before.as_slice());
    }

    #[test]
    fn test_consumption_absorbs_smaller_neighbor() {
        let mut map = test_map(3, 3, Topology::Plane);
        map.set_gravity(1, 1, map.max_gravity());
        map.set_mass(1, 1, 10);
        map.set_mass(0, 1, 3);
        map.set_mass(2, 1, 3);

        for _ in 0..200 {
            if map.mass_at(1, 1, 0) != 10 {
                break;
            }
            map.consume_mass();
        }

        assert_eq!(map.mass_at(1, 1, 0), 13);
        assert_eq!(map.mass_at(0, 1, 0) + map.mass_at(2, 1, 0), 3);
        assert_eq!(total_mass(&map), 16);
        assert_eq!(FieldStats::from_layer(map.grid().layer(Field::Mass)).occupied, 2);
    }

    /// Centre (1, 1) at full gravity flanked by two equal, smaller masses.
    fn hungry_trio(seed: u64) -> GravityMap {
        let mut config = test_config(3, 3, Topology::Plane);
        config.seed = Some(seed);
        let mut map = GravityMap::new(&config).unwrap();
        map.set_gravity(1, 1, map.max_gravity());
        map.set_mass(1, 1, 10);
        map.set_mass(0, 1, 3);
        map.set_mass(2, 1, 3);
        map
    }

    #[test]
    fn test_consumption_hunger_rate() {
        let trials = 400;
        let mut absorbed = 0;
        for seed in 0..trials {
            let mut map = hungry_trio(seed);
            map.consume_mass();
            if map.mass_at(1, 1, 0) == 13 {
                absorbed += 1;
            }
        }

        let rate = absorbed as f64 / trials as f64;
        assert!((0.15..=0.35).contains(&rate), "absorption rate {rate}");
    }

    #[test]
    fn test_consumption_picks_either_equal_neighbor() {
        let (mut left, mut right) = (0, 0);
        for seed in 0..400 {
            let mut map = hungry_trio(seed);
            map.consume_mass();
            if map.mass_at(1, 1, 0) != 13 {
                continue;
            }
            match (map.mass_at(0, 1, 0), map.mass_at(2, 1, 0)) {
                (0, 3) => left += 1,
                (3, 0) => right += 1,
                other => panic!("unexpected flanks {other:?}"),
            }
        }

        assert!(left > 0, "left neighbour never absorbed");
        assert!(right > 0, "right neighbour never absorbed");
    }

    #[test]
    fn test_consumption_blocked_by_ceiling() {
        let mut map = test_map(3, 3, Topology::Plane);
        // No gravity anywhere means a zero local ceiling.
        map.set_mass(1, 1, 10);
        map.set_mass(0, 1, 3);
        map.set_mass(2, 1, 3);

        for _ in 0..50 {
            map.consume_mass();
        }
        assert_eq!(map.mass_at(1, 1, 0), 10);
        assert_eq!(total_mass(&map), 16);
    }

    #[test]
    fn test_consumption_needs_two_neighbors() {
        let mut map = test_map(3, 3, Topology::Plane);
        map.set_gravity(1, 1, map.max_gravity());
        map.set_mass(1, 1, 10);
        map.set_mass(0, 1, 3);

        for _ in 0..50 {
            map.consume_mass();
        }
        assert_eq!(map.mass_at(1, 1, 0), 10);
        assert_eq!(map.mass_at(0, 1, 0), 3);
    }

    #[test]
    fn test_local_mass_ceiling() {
        let mut config = test_config(3, 3, Topology::Torus);
        config.max_gravity = 100;
        config.max_mass = 1000;
        let map = GravityMap::new(&config).unwrap();

        assert_eq!(map.local_mass_ceiling(0), 0);
        assert_eq!(map.local_mass_ceiling(50), 500);
        assert_eq!(map.local_mass_ceiling(100), 1000);

        let wide = test_map(3, 3, Topology::Torus);
        assert_eq!(wide.local_mass_ceiling(u128::MAX), wide.max_mass());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut map = test_map(4, 4, Topology::Torus);
        map.stamp_mass(0, 0, 1000);
        map.set_running(true);
        map.run(2);
        map.update();

        map.reset();
        assert_eq!(map.generation(), 0);
        assert_eq!(map.phase(), Phase::GravityDiffusion);
        assert!(map.grid().layer(Field::Mass).iter().all(|&v| v == 0));
        assert!(map.grid().layer(Field::Gravity).iter().all(|&v| v == 0));
        assert_eq!(map.stats().gravity.min, map.max_gravity() as f64);
        assert_eq!(map.stats().mass.min, map.max_mass() as f64);
        assert_eq!(map.stats().mass.total, 0.0);
    }

    #[test]
    fn test_stamp_mass_wraps() {
        let mut map = test_map(4, 4, Topology::Torus);
        map.stamp_mass(3, 3, 2);
        assert_eq!(map.mass_at(3, 3, 0), 2);
        assert_eq!(map.mass_at(0, 0, 0), 2);
        assert_eq!(map.mass_at(1, 1, 0), 2);
        assert_eq!(total_mass(&map), 18);
    }

    #[test]
    fn test_scatter_mass() {
        let mut map = test_map(4, 4, Topology::Torus);
        map.set_mass(0, 0, 99);

        assert_eq!(map.scatter_mass(0.0, 5), 0);
        assert_eq!(map.scatter_mass(f64::NAN, 5), 0);
        assert_eq!(map.scatter_mass(1.0, 5), 15);
        assert_eq!(map.mass_at(0, 0, 0), 99);
        assert_eq!(map.mass_at(3, 3, 0), 5);
    }

    #[test]
    fn test_toggle_and_cycle() {
        let mut map = test_map(2, 2, Topology::Torus);
        assert!(map.toggle_running());
        assert!(!map.toggle_running());
        assert_eq!(map.cycle_topology(), Topology::KleinBottle);
        assert_eq!(map.topology(), Topology::KleinBottle);
    }

    #[test]
    fn test_clear_layers() {
        let mut map = test_map(2, 2, Topology::Torus);
        map.set_mass(0, 0, 1);
        map.set_gravity(1, 1, 1);
        map.clear_mass();
        assert_eq!(map.mass_at(0, 0, 0), 0);
        assert_eq!(map.gravity_at(1, 1, 0), 1);
        map.clear_gravity();
        assert_eq!(map.gravity_at(1, 1, 0), 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut map = test_map(16, 16, Topology::Torus);
            map.scatter_mass(0.2, 1 << 40);
            map.set_running(true);
            map.run(20);
            map.grid().layer(Field::Mass).to_vec()
        };
        assert_eq!(run(), run());
    }

    fn seeded_map(width: usize, height: usize, seed: u64, masses: &[u64]) -> GravityMap {
        let mut config = test_config(width, height, Topology::Torus);
        config.seed = Some(seed);
        let mut map = GravityMap::new(&config).unwrap();
        for (i, &m) in masses.iter().take(width * height).enumerate() {
            map.set_mass((i / height) as i32, (i % height) as i32, m as u128);
        }
        map
    }

    proptest! {
        #[test]
        fn gravity_stays_within_cap(
            w in 1usize..8,
            h in 1usize..8,
            cap in 0u128..1000,
            seed in any::<u64>(),
            masses in prop::collection::vec(0u64..100_000, 64),
        ) {
            let mut map = seeded_map(w, h, seed, &masses);
            map.max_gravity = cap;
            for _ in 0..3 {
                map.diffuse_gravity();
                prop_assert!(map.grid().layer(Field::Gravity).iter().all(|&g| g <= cap));
            }
        }

        #[test]
        fn migration_conserves_mass(
            w in 1usize..8,
            h in 1usize..8,
            seed in any::<u64>(),
            masses in prop::collection::vec(prop_oneof![Just(0u64), 1u64..1000], 64),
        ) {
            let mut map = seeded_map(w, h, seed, &masses);
            map.diffuse_gravity();
            let before = total_mass(&map);
            map.migrate_mass();
            prop_assert_eq!(total_mass(&map), before);
        }

        #[test]
        fn consumption_conserves_mass(
            w in 1usize..8,
            h in 1usize..8,
            seed in any::<u64>(),
            masses in prop::collection::vec(prop_oneof![Just(0u64), 1u64..1000], 64),
        ) {
            let mut map = seeded_map(w, h, seed, &masses);
            for x in 0..w as i32 {
                for y in 0..h as i32 {
                    map.set_gravity(x, y, u128::MAX);
                }
            }
            for _ in 0..4 {
                let before = total_mass(&map);
                let occupied = FieldStats::from_layer(map.grid().layer(Field::Mass)).occupied;
                map.consume_mass();
                prop_assert_eq!(total_mass(&map), before);
                prop_assert!(FieldStats::from_layer(map.grid().layer(Field::Mass)).occupied <= occupied);
            }
        }

        #[test]
        fn full_cycles_conserve_mass(
            seed in any::<u64>(),
            masses in prop::collection::vec(prop_oneof![Just(0u64), 1u64..1_000_000], 64),
        ) {
            let mut map = seeded_map(8, 8, seed, &masses);
            let before = total_mass(&map);
            map.set_running(true);
            map.run(5);
            prop_assert_eq!(total_mass(&map), before);
            prop_assert_eq!(map.generation(), 20);
        }
    }
}
