//! Uniform crossover and per-locus mutation of form genes.

use crate::gene::{Gene, GeneValue, Locus};
use crate::rng::unit;
use rand::RngCore;

/// Uniform crossover: one fair coin per locus, Up to Right.
/// A draw below 0.5 takes the locus from `parent_a`.
pub fn crossover<R: RngCore + ?Sized>(parent_a: &Gene, parent_b: &Gene, rng: &mut R) -> Gene {
    let mut child = *parent_a;
    for locus in Locus::ALL {
        if unit(rng) >= 0.5 {
            child.set(locus, parent_b.get(locus));
        }
    }
    child
}

/// Per-locus mutation: each locus is replaced by a fresh domain value with
/// probability `p_mut`. The replacement draw happens only on a hit.
pub fn mutate<R: RngCore + ?Sized>(mut gene: Gene, p_mut: f64, rng: &mut R) -> Gene {
    for locus in Locus::ALL {
        if unit(rng) < p_mut {
            gene.set(locus, GeneValue::random(rng));
        }
    }
    gene
}
