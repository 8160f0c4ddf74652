//! Random-walk price step used by the simulated market-data feed.
//!
//! new = max(floor, round_cents(old + U(-A/2, +A/2)))

use rand::Rng;

use super::error::LivefolioError;
use super::ledger::round_cents;

pub const DEFAULT_JITTER: f64 = 5.0;
pub const DEFAULT_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStep {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceWalk {
    amplitude: f64,
    floor: f64,
}

impl Default for PriceWalk {
    fn default() -> Self {
        PriceWalk {
            amplitude: DEFAULT_JITTER,
            floor: DEFAULT_FLOOR,
        }
    }
}

impl PriceWalk {
    pub fn new(amplitude: f64, floor: f64) -> Result<Self, LivefolioError> {
        if !(amplitude.is_finite() && amplitude >= 0.0) {
            return Err(LivefolioError::config_invalid(
                "feed",
                "jitter",
                "jitter must be a non-negative number",
            ));
        }
        if !(floor.is_finite() && floor > 0.0) {
            return Err(LivefolioError::config_invalid(
                "feed",
                "floor_price",
                "floor_price must be positive",
            ));
        }
        Ok(PriceWalk { amplitude, floor })
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Move `old` by a uniform random offset in [-A/2, +A/2].
    pub fn step<R: Rng + ?Sized>(&self, old: f64, rng: &mut R) -> PriceStep {
        let half = self.amplitude / 2.0;
        let offset = if half > 0.0 {
            rng.gen_range(-half..=half)
        } else {
            0.0
        };
        self.apply_offset(old, offset)
    }

    /// Deterministic part of a step: apply `offset`, round to cents, clamp to floor.
    pub fn apply_offset(&self, old: f64, offset: f64) -> PriceStep {
        let price = round_cents(old + offset).max(self.floor);
        let change = price - old;
        let change_percent = if old > 0.0 { change / old * 100.0 } else { 0.0 };
        PriceStep {
            price,
            change,
            change_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn apply_offset_moves_and_rounds() {
        let walk = PriceWalk::default();
        let step = walk.apply_offset(100.0, 1.234);
        assert!((step.price - 101.23).abs() < 1e-9);
        assert!((step.change - 1.23).abs() < 1e-9);
        assert!((step.change_percent - 1.23).abs() < 1e-9);
    }

    #[test]
    fn apply_offset_clamps_to_floor() {
        let walk = PriceWalk::default();
        let step = walk.apply_offset(1.0, -2.5);
        assert_eq!(step.price, DEFAULT_FLOOR);
        assert!((step.change - (DEFAULT_FLOOR - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn zero_amplitude_holds_price() {
        let walk = PriceWalk::new(0.0, 0.01).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let step = walk.step(42.5, &mut rng);
        assert_eq!(step.price, 42.5);
        assert_eq!(step.change, 0.0);
    }

    #[test]
    fn step_stays_within_amplitude() {
        let walk = PriceWalk::new(5.0, 0.01).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let step = walk.step(500.0, &mut rng);
            assert!(step.change.abs() <= 2.5 + 0.005 + 1e-9);
        }
    }

    #[test]
    fn new_rejects_bad_parameters() {
        assert!(PriceWalk::new(-1.0, 0.01).is_err());
        assert!(PriceWalk::new(f64::NAN, 0.01).is_err());
        assert!(PriceWalk::new(1.0, 0.0).is_err());
        assert!(PriceWalk::new(1.0, -0.5).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn walk_never_goes_non_positive(
            amplitude in 0.0f64..10_000.0,
            start in 0.01f64..5_000.0,
            seed in any::<u64>(),
        ) {
            let walk = PriceWalk::new(amplitude, 0.01).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut price = start;
            for _ in 0..10_000 {
                price = walk.step(price, &mut rng).price;
                prop_assert!(price > 0.0);
            }
        }
    }
}
