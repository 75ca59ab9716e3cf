use rand::Rng;

/// In-place Fisher–Yates shuffle.
///
/// Walks from the back, swapping each slot with a uniformly chosen slot at or
/// before it, which yields every permutation with equal probability.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_shuffle_keeps_every_element() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..50).collect();
        fisher_yates(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_short_inputs_are_fine() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = Vec::new();
        fisher_yates(&mut empty, &mut rng);
        let mut single = vec![9];
        fisher_yates(&mut single, &mut rng);
        assert_eq!(single, vec![9]);
    }

    /// Each element should land in each position about equally often.
    #[test]
    fn test_position_distribution_is_uniform() {
        const N: usize = 4;
        const TRIALS: usize = 10_000;
        // Chi-square critical value for 3 degrees of freedom at p = 0.0001
        const CRITICAL: f64 = 21.11;

        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts = [[0usize; N]; N];

        for _ in 0..TRIALS {
            let mut items: Vec<usize> = (0..N).collect();
            fisher_yates(&mut items, &mut rng);
            for (position, &element) in items.iter().enumerate() {
                counts[element][position] += 1;
            }
        }

        let expected = TRIALS as f64 / N as f64;
        for (element, row) in counts.iter().enumerate() {
            let chi_square: f64 = row
                .iter()
                .map(|&observed| {
                    let diff = observed as f64 - expected;
                    diff * diff / expected
                })
                .sum();
            assert!(
                chi_square < CRITICAL,
                "element {} skewed: {:?} (chi-square {:.2})",
                element,
                row,
                chi_square
            );
        }
    }
}
