use super::torus::Torus;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pheromone channel.
/// Each channel is a different "chemical" animals can tell apart.
/// CH_0: Food trail
/// CH_1: Poison trail
/// CH_2: Predator scent
/// CH_3+: Free for trails laid by the animals themselves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PheromoneKind(pub usize);

impl PheromoneKind {
    pub const FOOD: PheromoneKind = PheromoneKind(0);
    pub const POISON: PheromoneKind = PheromoneKind(1);
    pub const PREDATOR: PheromoneKind = PheromoneKind(2);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A decaying point emitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PheromoneSource {
    pub kind: PheromoneKind,
    pub x: f32,
    pub y: f32,
    pub amount: f32,
    pub radius: f32,
    /// Seconds since creation
    pub age: f32,
    lifetime: f32,
}

impl PheromoneSource {
    pub fn new(
        kind: PheromoneKind,
        x: f32,
        y: f32,
        amount: f32,
        radius: f32,
        lifetime: f32,
    ) -> Self {
        Self {
            kind,
            x,
            y,
            amount,
            radius,
            age: 0.0,
            lifetime,
        }
    }

    /// Normalized power in (0, 1]: `exp(-age / lifetime)`.
    #[inline]
    pub fn power(&self) -> f32 {
        (-self.age / self.lifetime).exp()
    }

    pub fn tick(&mut self, timestep: f32) {
        self.age += timestep;
    }

    /// Gaussian contribution and its gradient at an offset `(dx, dy)` from the origin.
    #[inline]
    fn contribution(&self, dx: f32, dy: f32) -> (f32, f32, f32) {
        let r2 = self.radius * self.radius;
        let value = self.amount * self.power() * (-(dx * dx + dy * dy) / (2.0 * r2)).exp();
        // d/dx of the kernel points back toward the origin
        (value, -dx / r2 * value, -dy / r2 * value)
    }
}

/// Summed field value and gradient for one channel at one point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldSample {
    pub value: f32,
    pub grad_x: f32,
    pub grad_y: f32,
}

/// Multi-channel pheromone field built from discrete decaying sources.
#[derive(Clone, Debug)]
pub struct PheromoneField {
    sources: Vec<PheromoneSource>,
    pub channels: usize,
    pub torus: Torus,
    pub lifetime: f32,
    pub prune_threshold: f32,
}

impl PheromoneField {
    pub fn new(channels: usize, torus: Torus, lifetime: f32, prune_threshold: f32) -> Self {
        Self {
            sources: Vec::new(),
            channels,
            torus,
            lifetime,
            prune_threshold,
        }
    }

    /// Build a source with this field's decay parameters.
    pub fn make_source(
        &self,
        kind: PheromoneKind,
        x: f32,
        y: f32,
        amount: f32,
        radius: f32,
    ) -> PheromoneSource {
        PheromoneSource::new(kind, x, y, amount, radius, self.lifetime)
    }

    pub fn add_source(&mut self, kind: PheromoneKind, x: f32, y: f32, amount: f32, radius: f32) {
        let source = self.make_source(kind, x, y, amount, radius);
        self.push(source);
    }

    /// Append a ready-made source. Unknown channels and degenerate sources
    /// (non-positive or non-finite radius, non-finite amount) are dropped.
    pub fn push(&mut self, source: PheromoneSource) {
        if source.kind.index() >= self.channels {
            return;
        }
        if !(source.radius.is_finite() && source.radius > 0.0 && source.amount.is_finite()) {
            debug!("[Pheromone] dropping degenerate source {:?}", source);
            return;
        }
        self.sources.push(source);
    }

    pub fn extend<I: IntoIterator<Item = PheromoneSource>>(&mut self, sources: I) {
        for source in sources {
            self.push(source);
        }
    }

    pub fn sources(&self) -> &[PheromoneSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Field value and gradient of one channel at `(x, y)`, wrap-aware.
    pub fn values_at(&self, kind: PheromoneKind, x: f32, y: f32) -> (f32, f32, f32) {
        let mut acc = FieldSample::default();
        for source in self.sources.iter().filter(|s| s.kind == kind) {
            let (dx, dy) = self.torus.delta(x, y, source.x, source.y);
            let (v, gx, gy) = source.contribution(dx, dy);
            acc.value += v;
            acc.grad_x += gx;
            acc.grad_y += gy;
        }
        (acc.value, acc.grad_x, acc.grad_y)
    }

    /// Every channel at `(x, y)` in a single pass over the sources.
    pub fn sense_all(&self, x: f32, y: f32) -> Vec<FieldSample> {
        let mut samples = vec![FieldSample::default(); self.channels];
        for source in &self.sources {
            let (dx, dy) = self.torus.delta(x, y, source.x, source.y);
            let (v, gx, gy) = source.contribution(dx, dy);
            let slot = &mut samples[source.kind.index()];
            slot.value += v;
            slot.grad_x += gx;
            slot.grad_y += gy;
        }
        samples
    }

    /// Advance every source's decay clock
    pub fn age(&mut self, timestep: f32) {
        for source in &mut self.sources {
            source.tick(timestep);
        }
    }

    /// Drop sources whose power fell below the threshold. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let before = self.sources.len();
        let threshold = self.prune_threshold;
        self.sources.retain(|s| s.power() >= threshold);
        before - self.sources.len()
    }
}
