// ============================================================
// Layer 4 — Synthetic Digits
// ============================================================
// Generates a seeded, in-memory stand-in for the digit dataset.
// Class k is a bright horizontal bar covering rows 4+2k and
// 5+2k, with a random horizontal extent, over low-intensity noise.
// Pixel values use the same 0..=255 scale as MNIST.
//
// The classes are trivially separable, so a correct training
// loop reaches high accuracy within one epoch. Useful for
// offline smoke runs and tests.

use burn::data::dataset::vision::MnistItem;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::dataset::{IMAGE_SIZE, NUM_CLASSES};

const BAR_TOP: usize    = 4;
const BAR_HEIGHT: usize = 2;
const NOISE_MAX: f32    = 60.0;
const BAR_VALUE: f32    = 255.0;

pub struct SyntheticDigits {
    rng: StdRng,
}

impl SyntheticDigits {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Generate `count` samples with labels cycling 0..NUM_CLASSES
    pub fn generate(&mut self, count: usize) -> Vec<MnistItem> {
        (0..count)
            .map(|i| self.sample((i % NUM_CLASSES) as u8))
            .collect()
    }

    pub fn sample(&mut self, label: u8) -> MnistItem {
        let mut image = [[0.0f32; IMAGE_SIZE]; IMAGE_SIZE];
        for row in image.iter_mut() {
            for px in row.iter_mut() {
                *px = self.rng.gen_range(0.0..NOISE_MAX);
            }
        }

        let top   = BAR_TOP + BAR_HEIGHT * label as usize;
        let left  = self.rng.gen_range(1..8);
        let right = self.rng.gen_range(20..IMAGE_SIZE - 1);
        for row in image.iter_mut().skip(top).take(BAR_HEIGHT) {
            for px in &mut row[left..right] {
                *px = BAR_VALUE;
            }
        }

        MnistItem { image, label }
    }
}
