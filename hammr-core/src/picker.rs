use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

use super::error::{Error, Result};

/// Uniform random choice over a fixed, non-empty list of endpoints.
///
/// The random source is owned by the picker so a seeded picker gives a
/// reproducible sequence.
#[derive(Debug)]
pub struct EndpointPicker<T> {
    items: Vec<T>,
    rng: Mutex<StdRng>,
}

impl<T> EndpointPicker<T> {
    pub fn new(items: Vec<T>) -> Result<Self> {
        Self::with_rng(items, StdRng::from_entropy())
    }

    pub fn seeded(items: Vec<T>, seed: u64) -> Result<Self> {
        Self::with_rng(items, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(items: Vec<T>, rng: StdRng) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::NoEndpoints);
        }
        Ok(Self {
            items,
            rng: Mutex::new(rng),
        })
    }

    /// Returns the chosen index and item.
    pub fn choose(&self) -> (usize, &T) {
        let idx = self.rng.lock().gen_range(0..self.items.len());
        (idx, &self.items[idx])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}
