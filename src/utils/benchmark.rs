use crate::evolution::controller::Genetics;
use crate::swarm::engine::SimulationEngine;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Outcome of one benchmark run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub ticks: u64,
    pub seconds: f64,
    pub ticks_per_sec: f64,
    pub births: usize,
    pub deaths: usize,
    pub final_animals: usize,
    pub final_objects: usize,
    pub final_pheromones: usize,
}

impl BenchmarkReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Benchmark - times an engine over a fixed number of ticks
pub struct SimulationBenchmark {
    ticks: u64,
}

impl SimulationBenchmark {
    pub fn new(ticks: u64) -> Self {
        SimulationBenchmark { ticks }
    }

    /// Step `engine` at its configured timestep and report throughput.
    pub fn run<G: Genetics>(&self, engine: &mut SimulationEngine<G>) -> BenchmarkReport {
        info!(
            "📊 [Benchmark] Running {} ticks on {} animals...",
            self.ticks,
            engine.animals().len()
        );

        let mut report = BenchmarkReport {
            ticks: self.ticks,
            ..BenchmarkReport::default()
        };
        let start = Instant::now();
        for _ in 0..self.ticks {
            let tick = engine.step();
            report.births += tick.births;
            report.deaths += tick.deaths;
        }
        report.seconds = start.elapsed().as_secs_f64();
        report.ticks_per_sec = if report.seconds > 0.0 {
            self.ticks as f64 / report.seconds
        } else {
            0.0
        };
        report.final_animals = engine.animals().len();
        report.final_objects = engine.objects().len();
        report.final_pheromones = engine.pheromones().len();

        info!(
            "📈 [Benchmark] Complete. {:.1} ticks/s | animals={} births={} deaths={}",
            report.ticks_per_sec, report.final_animals, report.births, report.deaths
        );
        report
    }
}
