//! Simulation engine: the per-tick state machine.
//!
//! One coordinator thread runs the tick. Animal sensing and movement fan out
//! over rayon against a read-only view of the pheromone field; everything
//! else (merging, objects, predators, aging, pruning) runs sequentially.

use super::animal::{Animal, Kinematics};
use super::objects::{ObjectRules, WorldObject};
use super::pheromone::{PheromoneField, PheromoneSource};
use super::predator::Predator;
use super::snapshot::{AnimalView, ObjectView, PheromoneView, PredatorView, WorldSnapshot};
use super::torus::Torus;
use crate::core::config::SimConfig;
use crate::core::error::SimError;
use crate::evolution::breeding::{select_parents, BreedingPipeline, BreedingStats};
use crate::evolution::controller::{Controller, Genetics};
use crate::evolution::scheduler::EventScheduler;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::f32::consts::TAU;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub births: usize,
    pub deaths: usize,
    pub controller_failures: usize,
    pub food_spawned: bool,
    pub poison_spawned: bool,
    pub breeding_submitted: bool,
    pub emitted: usize,
    pub objects_removed: usize,
    pub pheromones_pruned: usize,
}

type AnimalOutcome<C> = (Animal<C>, Vec<PheromoneSource>, bool);

pub struct SimulationEngine<G: Genetics> {
    config: SimConfig,
    genetics: Arc<G>,
    rng: StdRng,

    animals: Vec<Animal<G::Controller>>,
    objects: Vec<WorldObject>,
    predators: Vec<Predator>,
    pheromones: PheromoneField,

    scheduler: EventScheduler,
    breeding: BreedingPipeline<G>,
    pool: Option<rayon::ThreadPool>,

    kinematics: Kinematics,
    rules: ObjectRules,

    tick: u64,
    elapsed: f32,
}

impl<G: Genetics> SimulationEngine<G> {
    /// Build a world populated from a pool of seed genomes.
    pub fn new(
        config: SimConfig,
        genetics: Arc<G>,
        seeds: &[Arc<G::Genome>],
    ) -> Result<Self, SimError> {
        if seeds.is_empty() && config.animal_count > 0 {
            return Err(SimError::NoSeedGenomes);
        }
        let mut engine = Self::empty(config, genetics)?;
        engine.populate(seeds);
        Ok(engine)
    }

    /// Build a validated world with nothing in it.
    pub fn empty(config: SimConfig, genetics: Arc<G>) -> Result<Self, SimError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let scheduler = EventScheduler::from_config(&config, &mut rng)?;
        let breeding = BreedingPipeline::new(Arc::clone(&genetics))?;
        let pool = match config.max_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("animal-worker-{i}"))
                    .build()
                    .map_err(|e| SimError::Runtime(e.to_string()))?,
            ),
            None => None,
        };

        let torus = Torus::new(config.world_width, config.world_height);
        let pheromones = PheromoneField::new(
            config.pheromone_kinds,
            torus,
            config.pheromone_lifetime,
            config.prune_threshold,
        );

        Ok(Self {
            kinematics: Kinematics::from_config(&config),
            rules: ObjectRules::from_config(&config),
            config,
            genetics,
            rng,
            animals: Vec::new(),
            objects: Vec::new(),
            predators: Vec::new(),
            pheromones,
            scheduler,
            breeding,
            pool,
            tick: 0,
            elapsed: 0.0,
        })
    }

    fn populate(&mut self, seeds: &[Arc<G::Genome>]) {
        for _ in 0..self.config.animal_count {
            if let Some(genome) = seeds.choose(&mut self.rng) {
                let genome = Arc::clone(genome);
                self.spawn_animal(genome);
            }
        }
        for _ in 0..self.config.animal_count {
            self.spawn_food();
        }
        for _ in 0..self.config.predator_count {
            let (x, y) = self.random_position();
            let theta = self.rng.gen_range(0.0..TAU);
            self.predators
                .push(Predator::new(x, y, theta, self.config.emission_period));
        }
        info!(
            "🌱 [Engine] Spawned {} animals, {} food, {} predators in a {}x{} world",
            self.animals.len(),
            self.objects.len(),
            self.predators.len(),
            self.config.world_width,
            self.config.world_height
        );
    }

    fn random_position(&mut self) -> (f32, f32) {
        let x = self.rng.gen_range(0.0..self.config.world_width);
        let y = self.rng.gen_range(0.0..self.config.world_height);
        (x, y)
    }

    /// Express a genome and drop the animal somewhere random.
    fn spawn_animal(&mut self, genome: Arc<G::Genome>) {
        let controller = self.genetics.express(genome);
        let mut animal = Animal::new(controller, self.config.spawn_energy);
        let (x, y) = self.random_position();
        let theta = self.rng.gen_range(0.0..TAU);
        animal.teleport(x, y, theta);
        self.animals.push(animal);
    }

    fn spawn_food(&mut self) {
        let (x, y) = self.random_position();
        self.objects.push(WorldObject::food(
            x,
            y,
            self.config.object_amount,
            self.config.emission_period,
        ));
    }

    fn spawn_poison(&mut self) {
        let (x, y) = self.random_position();
        self.objects.push(WorldObject::poison(
            x,
            y,
            self.config.object_amount,
            self.config.emission_period,
        ));
    }

    /// Rank the population by energy and queue a crossover of two parents.
    fn submit_breeding(&mut self) -> bool {
        self.animals.sort_by(|a, b| {
            b.energy
                .partial_cmp(&a.energy)
                .unwrap_or(Ordering::Equal)
        });
        let fitness = self.config.breeding_fitness;
        let Some((ia, ib)) = select_parents(&mut self.rng, fitness, self.animals.len()) else {
            debug!("[Engine] breeding skipped, population is empty");
            return false;
        };
        let a = Arc::clone(self.animals[ia].genome());
        let b = Arc::clone(self.animals[ib].genome());
        let seed = self.rng.gen();
        self.breeding.submit(a, b, seed);
        true
    }

    /// Sense and move every animal in parallel against the pre-tick field.
    fn run_animals(&mut self, timestep: f32) -> Vec<AnimalOutcome<G::Controller>> {
        let animals = std::mem::take(&mut self.animals);
        let field = &self.pheromones;
        let kin = self.kinematics;

        let work = move || {
            animals
                .into_par_iter()
                .map(|mut animal| {
                    let readings = animal.sense(field);
                    match animal.update(&readings, timestep, &kin) {
                        Ok(emitted) => (animal, emitted, false),
                        Err(e) => {
                            warn!("[Engine] controller failed, animal removed: {}", e);
                            animal.energy = 0.0;
                            (animal, Vec::new(), true)
                        }
                    }
                })
                .collect::<Vec<_>>()
        };

        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }

    /// Advance the world by `timestep` seconds.
    pub fn update(&mut self, timestep: f32) -> TickReport {
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        if !(timestep.is_finite() && timestep >= 0.0) {
            warn!("[Engine] ignoring tick with timestep {}", timestep);
            return report;
        }

        // 1. Scheduled events
        let events = self.scheduler.advance(timestep, &mut self.rng);
        if events.spawn_food {
            self.spawn_food();
            report.food_spawned = true;
        }
        if events.spawn_poison {
            self.spawn_poison();
            report.poison_spawned = true;
        }
        if events.breed {
            report.breeding_submitted = self.submit_breeding();
        }

        // 2. At most one finished child per tick
        if let Some(genome) = self.breeding.poll() {
            self.spawn_animal(Arc::new(genome));
            report.births = 1;
            info!(
                "🐣 [Engine] Child born at tick {}, population {}",
                self.tick,
                self.animals.len()
            );
        }

        // 3. Parallel phase
        let outcomes = self.run_animals(timestep);

        // 4. Merge
        self.animals.reserve(outcomes.len());
        for (animal, emitted, failed) in outcomes {
            report.emitted += emitted.len();
            self.pheromones.extend(emitted);
            if failed {
                report.controller_failures += 1;
            }
            if animal.is_alive() {
                self.animals.push(animal);
            } else {
                report.deaths += 1;
            }
        }

        // 5. Objects
        for object in &mut self.objects {
            object.update(&mut self.animals, &mut self.pheromones, timestep, &self.rules);
        }

        // 6. Predators
        for predator in &mut self.predators {
            predator.update(
                &mut self.animals,
                &mut self.pheromones,
                timestep,
                &self.config.predator,
                &self.rules,
                &mut self.rng,
            );
        }

        // 7. Age
        self.pheromones.age(timestep);

        // 8. Prune
        let before = self.objects.len();
        self.objects.retain(|o| !o.is_depleted());
        report.objects_removed = before - self.objects.len();
        report.pheromones_pruned = self.pheromones.prune();

        self.tick += 1;
        self.elapsed += timestep;

        if self.config.log_every > 0 && self.tick % self.config.log_every == 0 {
            info!(
                "[Engine] tick {} | animals={} objects={} predators={} pheromones={} pending={}",
                self.tick,
                self.animals.len(),
                self.objects.len(),
                self.predators.len(),
                self.pheromones.len(),
                self.breeding.pending()
            );
        }
        report
    }

    /// Advance by the configured timestep.
    pub fn step(&mut self) -> TickReport {
        self.update(self.config.timestep)
    }

    pub fn insert_animal(&mut self, animal: Animal<G::Controller>) {
        self.animals.push(animal);
    }

    /// Express `genome` into a new animal at a given pose.
    pub fn insert_genome(
        &mut self,
        genome: Arc<G::Genome>,
        x: f32,
        y: f32,
        theta: f32,
        energy: f32,
    ) {
        let mut animal = Animal::new(self.genetics.express(genome), energy);
        let (x, y) = self.kinematics.torus.wrap(x, y);
        animal.teleport(x, y, theta);
        self.animals.push(animal);
    }

    pub fn insert_object(&mut self, object: WorldObject) {
        self.objects.push(object);
    }

    pub fn insert_predator(&mut self, predator: Predator) {
        self.predators.push(predator);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn animals(&self) -> &[Animal<G::Controller>] {
        &self.animals
    }

    pub fn animals_mut(&mut self) -> &mut [Animal<G::Controller>] {
        &mut self.animals
    }

    pub fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    pub fn predators(&self) -> &[Predator] {
        &self.predators
    }

    pub fn pheromones(&self) -> &PheromoneField {
        &self.pheromones
    }

    pub fn pheromones_mut(&mut self) -> &mut PheromoneField {
        &mut self.pheromones
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn breeding_pending(&self) -> usize {
        self.breeding.pending()
    }

    pub fn breeding_stats(&self) -> BreedingStats {
        self.breeding.stats()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            elapsed: self.elapsed,
            width: self.config.world_width,
            height: self.config.world_height,
            animals: self
                .animals
                .iter()
                .map(|a| AnimalView {
                    x: a.x,
                    y: a.y,
                    heading: a.theta,
                    energy: a.energy,
                })
                .collect(),
            pheromones: self
                .pheromones
                .sources()
                .iter()
                .map(|p| PheromoneView {
                    x: p.x,
                    y: p.y,
                    kind: p.kind.index(),
                    power: p.power(),
                    radius: p.radius,
                })
                .collect(),
            objects: self
                .objects
                .iter()
                .map(|o| ObjectView {
                    x: o.x,
                    y: o.y,
                    kind: o.kind,
                    amount: o.amount,
                })
                .collect(),
            predators: self
                .predators
                .iter()
                .map(|p| PredatorView {
                    x: p.x,
                    y: p.y,
                    heading: p.theta,
                })
                .collect(),
        }
    }
}

/// Genome of every animal, fittest first. Handy for hosts that checkpoint seed pools.
pub fn genomes_by_energy<C: Controller>(animals: &[Animal<C>]) -> Vec<Arc<C::Genome>> {
    let mut ranked: Vec<&Animal<C>> = animals.iter().collect();
    ranked.sort_by(|a, b| b.energy.partial_cmp(&a.energy).unwrap_or(Ordering::Equal));
    ranked.into_iter().map(|a| Arc::clone(a.genome())).collect()
}
