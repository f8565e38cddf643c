/*!
 * Simulated Workload
 *
 * The shared resource the demo workers fight over, plus randomized pacing.
 */

use super::config::DriverConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const DOCUMENT_SECTIONS: usize = 16;

/// Versioned document
///
/// A writer stamps every section with the new version in two halves with
/// simulated work in between. A reader that overlaps a writer would see
/// sections from different versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    version: u64,
    sections: Vec<u64>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            version: 0,
            sections: vec![0; DOCUMENT_SECTIONS],
        }
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Start a revision: bump the version and stamp the first half
    pub fn begin_revision(&mut self) -> u64 {
        self.version += 1;
        let half = self.sections.len() / 2;
        for section in &mut self.sections[..half] {
            *section = self.version;
        }
        self.version
    }

    /// Finish a revision started with [`begin_revision`](Self::begin_revision)
    pub fn finish_revision(&mut self) {
        let half = self.sections.len() / 2;
        for section in &mut self.sections[half..] {
            *section = self.version;
        }
    }

    /// Check that every section carries the current version
    pub fn verify(&self) -> Result<u64, String> {
        match self.sections.iter().position(|&s| s != self.version) {
            None => Ok(self.version),
            Some(i) => Err(format!(
                "section {} has version {} but document is at {}",
                i, self.sections[i], self.version
            )),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Random durations for simulated work and pauses
pub struct Pacing {
    rng: StdRng,
    work: (Duration, Duration),
    pause: (Duration, Duration),
}

impl Pacing {
    /// Pacing for one worker; `stream` keeps seeded workers apart
    pub fn from_config(config: &DriverConfig, stream: u64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            work: (config.work_min, config.work_max),
            pause: (config.pause_min, config.pause_max),
        }
    }

    /// Time to spend inside a critical section
    pub fn work(&mut self) -> Duration {
        Self::sample(&mut self.rng, self.work)
    }

    /// Time to spend between cycles
    pub fn pause(&mut self) -> Duration {
        Self::sample(&mut self.rng, self.pause)
    }

    fn sample(rng: &mut StdRng, (min, max): (Duration, Duration)) -> Duration {
        if min >= max {
            min
        } else {
            rng.gen_range(min..=max)
        }
    }
}
