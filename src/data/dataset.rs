use burn::data::dataset::{
    vision::{MnistDataset, MnistItem},
    Dataset,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::data::synthetic::SyntheticDigits;

/// Side length of every digit image, in pixels
pub const IMAGE_SIZE: usize = 28;

/// Number of digit classes
pub const NUM_CLASSES: usize = 10;

/// Where digit images come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// The MNIST handwritten digits (downloaded and cached by burn)
    #[default]
    Mnist,
    /// Seeded in-memory stripe patterns, no download needed
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

enum Source {
    Mnist(MnistDataset),
    InMemory(Vec<MnistItem>),
}

/// A digit-image dataset, optionally capped to its first `limit` items.
pub struct DigitDataset {
    source: Source,
    len:    usize,
}

impl DigitDataset {
    pub fn mnist(split: Split) -> Self {
        let inner = match split {
            Split::Train => MnistDataset::train(),
            Split::Test  => MnistDataset::test(),
        };
        let len = inner.len();
        Self { source: Source::Mnist(inner), len }
    }

    pub fn from_items(items: Vec<MnistItem>) -> Self {
        let len = items.len();
        Self { source: Source::InMemory(items), len }
    }

    /// Open one split of a data source.
    /// The synthetic test split uses a different seed and a fifth of the samples.
    pub fn open(source: DataSource, split: Split, synthetic_samples: usize, seed: u64) -> Self {
        match source {
            DataSource::Mnist => Self::mnist(split),
            DataSource::Synthetic => {
                let (count, seed) = match split {
                    Split::Train => (synthetic_samples, seed),
                    Split::Test  => ((synthetic_samples / 5).max(1), seed.wrapping_add(1)),
                };
                Self::from_items(SyntheticDigits::new(seed).generate(count))
            }
        }
    }

    /// Cap the dataset to at most `limit` items
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.len = self.len.min(limit);
        }
        self
    }
}

impl Dataset<MnistItem> for DigitDataset {
    fn get(&self, index: usize) -> Option<MnistItem> {
        if index >= self.len {
            return None;
        }
        match &self.source {
            Source::Mnist(inner)    => inner.get(index),
            Source::InMemory(items) => items.get(index).cloned(),
        }
    }

    fn len(&self) -> usize {
        self.len
    }
}
