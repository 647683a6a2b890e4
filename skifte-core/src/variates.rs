//! Seeded duration sampling. Plain `rand` only; distributions the
//! simulation needs are the exponential (inter-arrival intervals,
//! exploit time) and the normal (MTD execution time).

use rand::Rng;

/// Exponential variate via inverse CDF.
pub fn exponential(rng: &mut impl Rng, mean: f64) -> f64 {
    let u: f64 = rng.random();
    // 1 - u is in (0, 1], keeping ln() finite.
    -mean * (1.0 - u).ln()
}

/// Normal variate via Box-Muller.
pub fn normal(rng: &mut impl Rng, mean: f64, std: f64) -> f64 {
    let u1: f64 = (1.0 - rng.random::<f64>()).max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    mean + std * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Exponential nanosecond delay with the given mean.
pub fn exponential_ns(rng: &mut impl Rng, mean_ns: u64) -> u64 {
    exponential(rng, mean_ns as f64) as u64
}

/// Normal nanosecond delay clamped to a floor, since an execution or
/// interval duration below the floor makes no sense in virtual time.
pub fn normal_ns(rng: &mut impl Rng, mean_ns: u64, std_ns: u64, floor_ns: u64) -> u64 {
    let sample = normal(rng, mean_ns as f64, std_ns as f64);
    if sample <= floor_ns as f64 {
        floor_ns
    } else {
        sample as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn exponential_mean_is_close() {
        let mut rng = SmallRng::seed_from_u64(1);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| exponential(&mut rng, 30.0)).sum::<f64>() / n as f64;
        assert!((mean - 30.0).abs() < 1.5, "sample mean {mean}");
    }

    #[test]
    fn normal_respects_floor() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..10_000 {
            assert!(normal_ns(&mut rng, 1_000, 5_000, 100) >= 100);
        }
    }

    #[test]
    fn variates_are_deterministic_per_seed() {
        let mut a = SmallRng::seed_from_u64(3);
        let mut b = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(exponential_ns(&mut a, 1_000_000), exponential_ns(&mut b, 1_000_000));
        }
    }
}
