//! Candidate generation: greedy perturbation of the best seen, mixed with
//! uniform random exploration.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::Rng;

use crate::space::{Candidate, ParamSpace};

/// Fraction of candidates drawn uniformly at random even once a best
/// candidate exists, so the search keeps escaping local minima.
const EXPLORE_PROB: f64 = 0.3;

/// Seedable candidate source. Deterministic under a fixed seed.
pub struct SearchTechnique {
    rng: StdRng,
    explore: f64,
}

impl SearchTechnique {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SearchTechnique {
            rng,
            explore: EXPLORE_PROB,
        }
    }

    /// Next candidate to evaluate. Before any best exists, samples the
    /// space uniformly; afterwards, usually perturbs one parameter of the
    /// best candidate.
    pub fn next_candidate(&mut self, space: &ParamSpace, best: Option<&Candidate>) -> Candidate {
        match best {
            Some(base) if !self.rng.gen_bool(self.explore) => space.perturb(base, &mut self.rng),
            _ => space.random_candidate(&mut self.rng),
        }
    }
}
