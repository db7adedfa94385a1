//! Binary-seeded source of deterministic draws.

use std::fs::File;
use std::hash::Hasher;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::{debug, trace};

use crate::Fnv64;

const NUM_SAMPLES: u64 = 8;
const SAMPLE_LEN: usize = 64;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DetrandError {
    #[error("invalid argument to intn: {0}")]
    InvalidArgument(i64),
}

/// A fixed seed and the draws derived from it.
///
/// A zero seed is the fallback when the binary cannot be read. Its draws are
/// `false` and `0`, and its shuffles leave the input in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    seed: u64,
}

impl Source {
    pub const fn from_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// Seeds from the currently running executable.
    pub fn from_current_exe() -> Self {
        match std::env::current_exe() {
            Ok(path) => Self::from_path(&path),
            Err(err) => {
                debug!(error = %err, "executable path unavailable, using zero seed");
                Self::from_seed(0)
            }
        }
    }

    /// Seeds from a hash of the file at `path`. Any I/O failure yields seed zero.
    pub fn from_path(path: &Path) -> Self {
        match binary_hash(path) {
            Ok(seed) => {
                trace!(path = %path.display(), seed, "derived binary seed");
                Self::from_seed(seed)
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "binary hash failed, using zero seed");
                Self::from_seed(0)
            }
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn boolean(&self) -> bool {
        self.seed & 1 == 1
    }

    pub fn try_intn(&self, n: i64) -> Result<usize, DetrandError> {
        if n <= 0 {
            return Err(DetrandError::InvalidArgument(n));
        }
        Ok((self.seed % n as u64) as usize)
    }

    /// # Panics
    ///
    /// Panics if `n <= 0`.
    pub fn intn(&self, n: i64) -> usize {
        match self.try_intn(n) {
            Ok(v) => v,
            Err(err) => panic!("{err}"),
        }
    }

    /// A fresh generator positioned at the start of this seed's stream.
    pub fn rng(&self) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(self.seed)
    }

    /// Permutes `items`. The zero fallback seed leaves them in place.
    pub fn shuffle<T>(&self, items: &mut [T]) {
        if self.seed == 0 {
            return;
        }
        items.shuffle(&mut self.rng());
    }
}

/// Hashes the file size followed by evenly spaced fixed-size samples.
fn binary_hash(path: &Path) -> io::Result<u64> {
    let mut f = File::open(path)?;
    let size = f.metadata()?.len();

    let mut h = Fnv64::new();
    h.write(&size.to_le_bytes());
    let mut buf = [0u8; SAMPLE_LEN];
    for i in 0..NUM_SAMPLES {
        let offset = (u128::from(i) * u128::from(size) / u128::from(NUM_SAMPLES)) as u64;
        f.seek(SeekFrom::Start(offset))?;
        f.read_exact(&mut buf)?;
        h.write(&buf);
    }
    Ok(h.finish())
}
