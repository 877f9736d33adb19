// ============================================================
// Layer 4 — Digit Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<MnistItem>
// into tensors on the target device.
//
//   Input:  N items, each a 28x28 image and a u8 label
//   Output: images  [N, 1, 28, 28]  (normalised)
//           targets [N]             (class indices)
//
// Pixels are scaled to [0, 1] and standardised with the
// MNIST mean and standard deviation.

use burn::{
    data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    prelude::*,
};

use crate::data::dataset::IMAGE_SIZE;
use crate::domain::error::ConfigError;

const PIXEL_MEAN: f32 = 0.1307;
const PIXEL_STD: f32  = 0.3081;

/// One batch ready for the forward pass.
#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// Shape: [batch_size, 1, 28, 28]
    pub images: Tensor<B, 4>,

    /// Shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> DigitBatch<B> {
    pub fn len(&self) -> usize {
        self.targets.dims()[0]
    }

    /// Check the batch invariant: images [N, 1, 28, 28] and targets [N] with N > 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let images  = self.images.dims();
        let targets = self.targets.dims();
        if images[0] == 0 || targets[0] == 0 {
            return Err(ConfigError::EmptyBatch);
        }
        if images[0] != targets[0] || images[1..] != [1, IMAGE_SIZE, IMAGE_SIZE] {
            return Err(ConfigError::BatchShape {
                images:  images.to_vec(),
                targets: targets.to_vec(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct DigitBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> DigitBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<MnistItem, DigitBatch<B>> for DigitBatcher<B> {
    fn batch(&self, items: Vec<MnistItem>) -> DigitBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.image.iter().flatten())
            .map(|&px| (px / 255.0 - PIXEL_MEAN) / PIXEL_STD)
            .collect();

        let labels: Vec<i32> = items.iter().map(|item| item.label as i32).collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, 1, IMAGE_SIZE, IMAGE_SIZE]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        DigitBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::SyntheticDigits;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn batch_has_matching_leading_dims() {
        let items = SyntheticDigits::new(5).generate(6);
        let batch = DigitBatcher::<TestBackend>::new(Default::default()).batch(items);
        assert_eq!(batch.images.dims(), [6, 1, IMAGE_SIZE, IMAGE_SIZE]);
        assert_eq!(batch.targets.dims(), [6]);
        assert_eq!(batch.len(), 6);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn labels_are_preserved_in_order() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let items = SyntheticDigits::new(5).generate(4);
        let batch = DigitBatcher::<TestBackend>::new(device.clone()).batch(items);
        let expected = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 2, 3], &device);
        let matching: i64 = batch.targets.equal(expected).int().sum().into_scalar().elem::<i64>();
        assert_eq!(matching, 4);
    }

    #[test]
    fn pixels_are_standardised() {
        let mut item = SyntheticDigits::new(5).sample(0);
        item.image = [[0.0; IMAGE_SIZE]; IMAGE_SIZE];
        let batch = DigitBatcher::<TestBackend>::new(Default::default()).batch(vec![item]);
        let values = batch.images.into_data().to_vec::<f32>().unwrap();
        let expected = -PIXEL_MEAN / PIXEL_STD;
        assert!(values.iter().all(|v| (v - expected).abs() < 1e-6));
    }

    #[test]
    fn mismatched_targets_fail_validation() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let batch = DigitBatch::<TestBackend> {
            images:  Tensor::zeros([3, 1, IMAGE_SIZE, IMAGE_SIZE], &device),
            targets: Tensor::zeros([2], &device),
        };
        assert!(matches!(batch.validate(), Err(ConfigError::BatchShape { .. })));
    }

    #[test]
    fn wrong_image_size_fails_validation() {
        let device: <TestBackend as Backend>::Device = Default::default();
        let batch = DigitBatch::<TestBackend> {
            images:  Tensor::zeros([2, 1, 14, 14], &device),
            targets: Tensor::zeros([2], &device),
        };
        assert!(matches!(batch.validate(), Err(ConfigError::BatchShape { .. })));
    }
}
