//! Fitness-proportional (roulette-wheel) parent selection.

use crate::rng::unit;
use rand::RngCore;

/// Pick one candidate with probability proportional to its fitness.
///
/// Draws `r = rng() * sum(fitness)` and walks the candidates subtracting
/// fitness until the remainder drops to zero or below. A zero fitness sum
/// falls back to a uniform pick. Exactly one draw is consumed either way.
///
/// `candidates` must be non-empty and the same length as `fitness`.
pub fn select_parent<T: Copy, R: RngCore + ?Sized>(
    candidates: &[T],
    fitness: &[f64],
    rng: &mut R,
) -> T {
    debug_assert!(!candidates.is_empty());
    debug_assert_eq!(candidates.len(), fitness.len());

    let total: f64 = fitness.iter().sum();
    if total == 0.0 {
        let slot = (unit(rng) * candidates.len() as f64).floor() as usize;
        return candidates[slot.min(candidates.len() - 1)];
    }

    let mut remaining = unit(rng) * total;
    for (candidate, f) in candidates.iter().zip(fitness) {
        remaining -= f;
        if remaining <= 0.0 {
            return *candidate;
        }
    }
    // Floating-point leftovers land on the last candidate
    candidates[candidates.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mulberry32;

    #[test]
    fn test_zero_fitness_is_uniform() {
        let mut rng = Mulberry32::new(5);
        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            counts[select_parent(&[0usize, 1, 2, 3], &[0.0; 4], &mut rng)] += 1;
        }
        for count in counts {
            assert!(count > 800 && count < 1200, "count {}", count);
        }
    }

    #[test]
    fn test_zero_weight_never_picked() {
        let mut rng = Mulberry32::new(6);
        for _ in 0..1000 {
            let pick = select_parent(&['a', 'b', 'c'], &[0.0, 0.4, 0.0], &mut rng);
            assert_eq!(pick, 'b');
        }
    }

    #[test]
    fn test_proportional() {
        let mut rng = Mulberry32::new(7);
        let mut heavy = 0;
        for _ in 0..10_000 {
            if select_parent(&[0u8, 1], &[0.9, 0.1], &mut rng) == 0 {
                heavy += 1;
            }
        }
        assert!((8700..9300).contains(&heavy), "heavy {}", heavy);
    }

    #[test]
    fn test_one_draw_per_pick() {
        let mut rng = Mulberry32::new(12);
        let mut reference = Mulberry32::new(12);
        select_parent(&[1, 2], &[0.3, 0.3], &mut rng);
        select_parent(&[1, 2], &[0.0, 0.0], &mut rng);
        reference.next_f64();
        reference.next_f64();
        assert_eq!(rng.state(), reference.state());
    }
}
