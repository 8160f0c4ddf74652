//! Simulated market data: a seeded random walk over a watchlist.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::error::LivefolioError;
use crate::domain::price_walk::PriceWalk;
use crate::domain::tick::PriceTick;
use crate::domain::watchlist::Watchlist;
use crate::ports::market_data_port::MarketDataPort;

pub struct SimulatedFeed {
    prices: Vec<(String, f64)>,
    walk: PriceWalk,
    rng: StdRng,
    opened: bool,
}

impl SimulatedFeed {
    /// A `seed` makes the walk reproducible; without one it is seeded from
    /// the operating system.
    pub fn new(watchlist: &Watchlist, walk: PriceWalk, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        SimulatedFeed {
            prices: watchlist
                .entries
                .iter()
                .map(|e| (e.symbol.clone(), e.opening_price))
                .collect(),
            walk,
            rng,
            opened: false,
        }
    }

    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, p)| *p)
    }
}

impl MarketDataPort for SimulatedFeed {
    fn symbols(&self) -> Vec<String> {
        self.prices.iter().map(|(s, _)| s.clone()).collect()
    }

    /// The first batch carries the opening prices; every later batch moves
    /// each symbol one step along the walk.
    fn next_batch(&mut self, at: DateTime<Utc>) -> Result<Vec<PriceTick>, LivefolioError> {
        if !self.opened {
            self.opened = true;
        } else {
            for (_, price) in self.prices.iter_mut() {
                *price = self.walk.step(*price, &mut self.rng).price;
            }
        }
        Ok(self
            .prices
            .iter()
            .map(|(symbol, price)| PriceTick::new(symbol.clone(), *price, at))
            .collect())
    }
}
