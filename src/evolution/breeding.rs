//! Breeding Pipeline
//!
//! Picks parents by rank selection, runs crossover on a background worker,
//! and reaps finished genomes strictly in submission order. The coordinator
//! never waits on a job: `poll` only peeks at the head of the queue.

use super::controller::Genetics;
use crate::core::error::{BreedError, SimError};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Rank selection over a population sorted fittest-first.
///
/// Walks down the ranks while each uniform draw is at least `fitness`, so
/// `fitness` is the chance of stopping at any given rank. Never runs past
/// the last rank.
pub fn select_parent<R: Rng + ?Sized>(rng: &mut R, fitness: f32, len: usize) -> usize {
    let last = len.saturating_sub(1);
    let mut rank = 0;
    while rank < last && rng.gen::<f32>() >= fitness {
        rank += 1;
    }
    rank
}

/// Two independent draws. The same rank may come up twice.
pub fn select_parents<R: Rng + ?Sized>(
    rng: &mut R,
    fitness: f32,
    len: usize,
) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let a = select_parent(rng, fitness, len);
    let b = select_parent(rng, fitness, len);
    Some((a, b))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreedingStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub reaped: u64,
    pub dropped: u64,
}

struct PendingJob<T> {
    id: u64,
    rx: oneshot::Receiver<Result<T, BreedError>>,
}

pub struct BreedingPipeline<G: Genetics> {
    genetics: Arc<G>,
    runtime: Option<Runtime>,
    queue: VecDeque<PendingJob<G::Genome>>,
    next_id: u64,
    stats: Arc<Mutex<BreedingStats>>,
}

impl<G: Genetics> BreedingPipeline<G> {
    pub fn new(genetics: Arc<G>) -> Result<Self, SimError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("breeding-worker")
            .enable_all()
            .build()
            .map_err(|e| SimError::Runtime(e.to_string()))?;

        Ok(Self {
            genetics,
            runtime: Some(runtime),
            queue: VecDeque::new(),
            next_id: 0,
            stats: Arc::new(Mutex::new(BreedingStats::default())),
        })
    }

    pub fn genetics(&self) -> &Arc<G> {
        &self.genetics
    }

    /// Queue a crossover job and return its id. Does not wait.
    pub fn submit(&mut self, a: Arc<G::Genome>, b: Arc<G::Genome>, seed: u64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = oneshot::channel();

        let genetics = Arc::clone(&self.genetics);
        let stats = Arc::clone(&self.stats);
        let job = move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = genetics.crossover(&a, &b, &mut rng);
            {
                let mut s = stats.lock();
                match result {
                    Ok(_) => s.completed += 1,
                    Err(_) => s.failed += 1,
                }
            }
            // Receiver may be gone if the pipeline was dropped
            let _ = tx.send(result);
        };

        match &self.runtime {
            Some(rt) => {
                rt.spawn_blocking(job);
            }
            None => warn!("[Breeding] runtime is shut down, job {} will never complete", id),
        }

        self.stats.lock().submitted += 1;
        self.queue.push_back(PendingJob { id, rx });
        debug!("[Breeding] submitted job {} ({} pending)", id, self.queue.len());
        id
    }

    /// Reap the oldest job if, and only if, it has finished.
    ///
    /// A slow head blocks later jobs even when they are already done.
    /// Failed or cancelled heads are dropped and yield `None`.
    pub fn poll(&mut self) -> Option<G::Genome> {
        let head = self.queue.front_mut()?;
        let outcome = match head.rx.try_recv() {
            Err(TryRecvError::Empty) => return None,
            Ok(result) => result,
            Err(TryRecvError::Closed) => Err(BreedError::Cancelled),
        };
        let id = head.id;
        self.queue.pop_front();

        match outcome {
            Ok(genome) => {
                self.stats.lock().reaped += 1;
                debug!("[Breeding] reaped job {}", id);
                Some(genome)
            }
            Err(e) => {
                self.stats.lock().dropped += 1;
                warn!("[Breeding] job {} dropped: {}", id, e);
                None
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> BreedingStats {
        *self.stats.lock()
    }
}

impl<G: Genetics> Drop for BreedingPipeline<G> {
    fn drop(&mut self) {
        // Do not wait on jobs that may never finish
        if let Some(rt) = self.runtime.take() {
            rt.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::animal::tests::{Scripted, ScriptedGenetics};
    use parking_lot::Condvar;
    use rand::rngs::StdRng;
    use std::time::{Duration, Instant};

    /// Genome 1 blocks until the gate opens; genome 99 fails.
    struct GatedGenetics {
        gate: Arc<(Mutex<bool>, Condvar)>,
    }

    impl Genetics for GatedGenetics {
        type Genome = u32;
        type Controller = Scripted;

        fn express(&self, genome: Arc<u32>) -> Scripted {
            ScriptedGenetics.express(genome)
        }

        fn crossover(&self, a: &u32, b: &u32, _rng: &mut StdRng) -> Result<u32, BreedError> {
            if *a == 99 {
                return Err(BreedError::Other("sterile".into()));
            }
            if *a == 1 {
                let (lock, cv) = &*self.gate;
                let mut open = lock.lock();
                while !*open {
                    cv.wait(&mut open);
                }
            }
            Ok(a * 10 + b)
        }
    }

    fn gated(gate: &Arc<(Mutex<bool>, Condvar)>) -> Arc<GatedGenetics> {
        Arc::new(GatedGenetics {
            gate: Arc::clone(gate),
        })
    }

    fn open(gate: &Arc<(Mutex<bool>, Condvar)>) {
        let (lock, cv) = &**gate;
        *lock.lock() = true;
        cv.notify_all();
    }

    fn poll_until<G: Genetics>(
        p: &mut BreedingPipeline<G>,
        timeout: Duration,
    ) -> Option<G::Genome> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Some(g) = p.poll() {
                return Some(g);
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        None
    }

    fn wait_for(p: &BreedingPipeline<GatedGenetics>, completed: u64) {
        let start = Instant::now();
        while p.stats().completed + p.stats().failed < completed
            && start.elapsed() < Duration::from_secs(5)
        {
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn threshold_one_always_picks_the_fittest() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(select_parent(&mut rng, 1.0, 10), 0);
        }
    }

    #[test]
    fn vanishing_threshold_degrades_to_last_rank() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(select_parent(&mut rng, 1e-9, 10), 9);
        }
    }

    #[test]
    fn selection_is_biased_toward_the_top() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut counts = [0usize; 5];
        for _ in 0..10_000 {
            counts[select_parent(&mut rng, 0.5, 5)] += 1;
        }
        assert!(counts[0] > counts[1] && counts[1] > counts[2] && counts[2] > counts[3]);
        assert!(counts.iter().all(|c| *c > 0));
    }

    #[test]
    fn empty_population_has_no_parents() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select_parents(&mut rng, 0.3, 0), None);
        assert_eq!(select_parents(&mut rng, 0.3, 1), Some((0, 0)));
    }

    #[test]
    fn completed_job_is_reaped_once() {
        let mut p = BreedingPipeline::new(Arc::new(ScriptedGenetics)).expect("pipeline");
        p.submit(Arc::new(2), Arc::new(3), 0);
        assert_eq!(p.pending(), 1);
        assert_eq!(poll_until(&mut p, Duration::from_secs(5)), Some(5));
        assert_eq!(p.pending(), 0);
        assert_eq!(p.poll(), None);
        assert_eq!(p.stats().reaped, 1);
    }

    #[test]
    fn slow_head_blocks_finished_successor() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let mut p = BreedingPipeline::new(gated(&gate)).expect("pipeline");

        p.submit(Arc::new(1), Arc::new(2), 0);
        p.submit(Arc::new(3), Arc::new(4), 0);
        wait_for(&p, 1);

        // J2 is done but J1 is not: nothing may be reaped
        assert_eq!(p.poll(), None);
        assert_eq!(p.pending(), 2);

        open(&gate);
        assert_eq!(poll_until(&mut p, Duration::from_secs(5)), Some(12));
        assert_eq!(poll_until(&mut p, Duration::from_secs(5)), Some(34));
        assert_eq!(p.pending(), 0);
    }

    #[test]
    fn at_most_one_job_per_poll() {
        let mut p = BreedingPipeline::new(Arc::new(ScriptedGenetics)).expect("pipeline");
        for i in 0..3 {
            p.submit(Arc::new(i), Arc::new(i), 0);
        }
        let start = Instant::now();
        while p.stats().completed < 3 && start.elapsed() < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(p.poll(), Some(0));
        assert_eq!(p.pending(), 2);
        assert_eq!(p.poll(), Some(2));
        assert_eq!(p.poll(), Some(4));
    }

    #[test]
    fn failed_job_is_dropped_without_a_child() {
        let gate = Arc::new((Mutex::new(true), Condvar::new()));
        let mut p = BreedingPipeline::new(Arc::new(GatedGenetics { gate })).expect("pipeline");
        p.submit(Arc::new(99), Arc::new(1), 0);
        p.submit(Arc::new(2), Arc::new(1), 0);
        wait_for(&p, 2);

        assert_eq!(p.poll(), None);
        assert_eq!(p.pending(), 1);
        assert_eq!(p.poll(), Some(21));
        let stats = p.stats();
        assert_eq!((stats.failed, stats.dropped, stats.reaped), (1, 1, 1));
    }

    #[test]
    fn dropping_with_a_stuck_job_does_not_hang() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let mut p = BreedingPipeline::new(gated(&gate)).expect("pipeline");
        p.submit(Arc::new(1), Arc::new(1), 0);
        drop(p);
        open(&gate);
    }
}
