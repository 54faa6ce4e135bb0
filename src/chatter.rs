//! Autonomous chatter: unprompted lines Mimu speaks on random triggers.
//!
//! Two independent Bernoulli draws run every cycle, after the command
//! handling (or its skip) completes:
//!
//!  * a flat 20% chance (`draw > 0.8`), and
//!  * when the local wall-clock minute is divisible by 5, an additional
//!    30% chance (`draw > 0.7`).
//!
//! Both can fire in the same cycle, producing two back-to-back lines on
//! top of any command response. Each line is drawn uniformly from a fixed
//! set with no memory between draws, so the same line twice in a row is
//! possible. All randomness flows through a caller-supplied [`Rng`] so
//! tests can seed it.

use rand::Rng;

/// The unprompted lines, selected uniformly at random.
pub const AUTONOMOUS_LINES: &[&str] = &[
    "Ẹhh ẹhhh! Ba ơi đang làm gì đó ạ?",
    "Sao im lặng vậy, cho Mimu một tí động tĩnh đi nè!",
    "Mệt quá ba ơi, hay mình đi chơi nha...",
    "Ọc ọc... đói rồi ba ơi!",
];

/// Flat per-cycle trigger: 20% chance to randomly speak.
pub fn spontaneous_due(rng: &mut impl Rng) -> bool {
    rng.gen::<f64>() > 0.8
}

/// Heartbeat trigger: 30% chance, gated to minutes divisible by 5. The
/// minute is sampled by the caller once per cycle, after capture completes.
pub fn heartbeat_due(minute: u32, rng: &mut impl Rng) -> bool {
    minute % 5 == 0 && rng.gen::<f64>() > 0.7
}

/// Pick one autonomous line uniformly at random.
pub fn pick_line(rng: &mut impl Rng) -> &'static str {
    AUTONOMOUS_LINES[rng.gen_range(0..AUTONOMOUS_LINES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn line_selection_is_deterministic_for_a_fixed_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(pick_line(&mut a), pick_line(&mut b));
        }
    }

    #[test]
    fn line_selection_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; AUTONOMOUS_LINES.len()];
        let draws = 10_000;
        for _ in 0..draws {
            let line = pick_line(&mut rng);
            let idx = AUTONOMOUS_LINES
                .iter()
                .position(|&l| l == line)
                .expect("picked line must come from the fixed set");
            counts[idx] += 1;
        }
        // Expect each of the 4 lines near 2500; allow generous tolerance.
        for &count in &counts {
            assert!(
                (2000..=3000).contains(&count),
                "line frequency {count} outside tolerance"
            );
        }
    }

    #[test]
    fn spontaneous_trigger_fires_about_one_cycle_in_five() {
        let mut rng = StdRng::seed_from_u64(42);
        let fired = (0..1000).filter(|_| spontaneous_due(&mut rng)).count();
        // ~200 of 1000 at 20%, same tolerance the original suite used.
        assert!(
            (150..=250).contains(&fired),
            "expected ~200 firings, got {fired}"
        );
    }

    #[test]
    fn heartbeat_only_fires_on_minutes_divisible_by_five() {
        let mut rng = StdRng::seed_from_u64(1);
        for minute in [1u32, 3, 7, 13, 59] {
            for _ in 0..100 {
                assert!(!heartbeat_due(minute, &mut rng));
            }
        }
    }

    #[test]
    fn heartbeat_fires_about_three_in_ten_on_gated_minutes() {
        let mut rng = StdRng::seed_from_u64(9);
        let fired = (0..1000).filter(|_| heartbeat_due(0, &mut rng)).count();
        assert!(
            (250..=350).contains(&fired),
            "expected ~300 firings, got {fired}"
        );
    }
}
