#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use smrs_scaleup::{duplicate, estimate, interpolate, ExpansionFactor, PeriodTimers, RunEstimate};

    const CASES: usize = 200;

    fn random_curve(rng: &mut ChaCha8Rng) -> Vec<f64> {
        let n = rng.gen_range(1..=12);
        (0..n).map(|_| rng.gen_range(0.0..500.0)).collect()
    }

    fn random_factor(rng: &mut ChaCha8Rng) -> ExpansionFactor {
        ExpansionFactor::new(rng.gen_range(1..=9)).unwrap()
    }

    // ========== Curve Expansion ==========

    #[test]
    fn test_duplicate_length_and_blocks() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..CASES {
            let curve = random_curve(&mut rng);
            let factor = random_factor(&mut rng);
            let f = factor.get();
            let out = duplicate(&curve, factor);
            assert_eq!(out.len(), curve.len() * f);
            for (i, block) in out.chunks(f).enumerate() {
                assert!(block.iter().all(|&v| v == curve[i]), "block {} differs", i);
            }
        }
    }

    #[test]
    fn test_interpolate_length_boundary_and_tail() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..CASES {
            let curve = random_curve(&mut rng);
            let factor = random_factor(&mut rng);
            let f = factor.get();
            let out = interpolate(&curve, factor).unwrap();
            assert_eq!(out.len(), curve.len() * f);
            assert_eq!(out[0], curve[0]);
            let last = *curve.last().unwrap();
            assert!(out[out.len() - f..].iter().all(|&v| v == last));
            // every block opens on the original unit
            for (i, block) in out.chunks(f).enumerate() {
                assert_eq!(block[0], curve[i]);
            }
        }
    }

    #[test]
    fn test_identity_factor_leaves_curve() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..CASES {
            let curve = random_curve(&mut rng);
            assert_eq!(duplicate(&curve, ExpansionFactor::IDENTITY), curve);
            assert_eq!(interpolate(&curve, ExpansionFactor::IDENTITY).unwrap(), curve);
        }
    }

    #[test]
    fn test_interpolate_preserves_monotonicity() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..CASES {
            let mut curve = random_curve(&mut rng);
            curve.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let out = interpolate(&curve, random_factor(&mut rng)).unwrap();
            assert!(out.windows(2).all(|w| w[0] <= w[1] + 1e-9), "not non-decreasing: {:?}", out);

            curve.reverse();
            let out = interpolate(&curve, random_factor(&mut rng)).unwrap();
            assert!(out.windows(2).all(|w| w[0] + 1e-9 >= w[1]), "not non-increasing: {:?}", out);
        }
    }

    #[test]
    fn test_interpolate_stays_between_neighbours() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..CASES {
            let curve = random_curve(&mut rng);
            let factor = random_factor(&mut rng);
            let out = interpolate(&curve, factor).unwrap();
            for (i, pair) in curve.windows(2).enumerate() {
                let (lo, hi) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
                for &v in &out[i * factor.get()..(i + 1) * factor.get()] {
                    assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
                }
            }
        }
    }

    // ========== Run-Time Estimation ==========

    #[test]
    fn test_estimate_documented_scenarios() {
        let t = PeriodTimers::from(vec![None, Some(500.0), Some(900.0), Some(1300.0)]);
        assert_eq!(estimate(&t, 50, 1), RunEstimate::Millis(20_500.0));
        let t = PeriodTimers::from(vec![None, Some(600.0)]);
        assert_eq!(estimate(&t, 10, 1), RunEstimate::Millis(6000.0));
        assert_eq!(estimate(&PeriodTimers::new(), 10, 1), RunEstimate::Unknown);
    }

    #[test]
    fn test_estimate_unknown_law() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..CASES {
            let periods = rng.gen_range(0..10_000);
            assert!(estimate(&PeriodTimers::new(), periods, 1).is_unknown());
            let single = PeriodTimers::from(vec![Some(rng.gen_range(0.0..100.0))]);
            assert!(estimate(&single, periods, 1).is_unknown());
            let many: PeriodTimers = (0..6).map(|i| Some(i as f64 * 10.0)).collect();
            assert!(estimate(&many, 0, 1).is_unknown());
        }
    }

    #[test]
    fn test_estimate_non_negative_for_increasing_timers() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..CASES {
            let samples = rng.gen_range(1..=5);
            let mut elapsed = 0.0;
            let mut timers = PeriodTimers::new();
            for period in 1..=samples {
                elapsed += rng.gen_range(0.0..800.0);
                timers.record(period, elapsed);
            }
            let periods = rng.gen_range(1..5000);
            let configs = rng.gen_range(1..4);
            let ms = estimate(&timers, periods, configs).millis().unwrap();
            assert!(ms >= 0.0);
        }
    }
}
