// ============================================================
// Layer 5 — Small Convolutional Digit Classifier
// ============================================================
// Five layers:
//
//   conv1  [N,1,28,28]  → [N,10,24,24]   (5x5 kernel)
//   pool + relu         → [N,10,12,12]
//   conv2               → [N,20,8,8]     (5x5 kernel)
//   conv2 dropout, pool + relu → [N,20,4,4]
//   flatten             → [N,320]
//   fc1 + relu + dropout → [N,50]
//   fc2                 → [N,num_classes]  (raw logits)
//
// The loss applies log-softmax itself, so forward returns logits.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::data::dataset::IMAGE_SIZE;
use crate::domain::params::ParamInfo;
use crate::ml::model::{push_conv2d, push_linear, Classifier};

const KERNEL: usize = 5;
const POOL: usize   = 2;

#[derive(Config, Debug)]
pub struct DigitCnnConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = 10)]
    pub conv1_channels: usize,
    #[config(default = 20)]
    pub conv2_channels: usize,
    #[config(default = 50)]
    pub hidden: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl DigitCnnConfig {
    /// Side length of the feature map after both conv/pool stages (4 for 28x28 input)
    pub fn feature_side(&self) -> usize {
        let after_first = (IMAGE_SIZE - KERNEL + 1) / POOL;
        (after_first - KERNEL + 1) / POOL
    }

    /// Width of the flattened feature vector fed to fc1
    pub fn flat_features(&self) -> usize {
        let side = self.feature_side();
        self.conv2_channels * side * side
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitCnn<B> {
        let conv1 = Conv2dConfig::new([1, self.conv1_channels], [KERNEL, KERNEL]).init(device);
        let conv2 = Conv2dConfig::new([self.conv1_channels, self.conv2_channels], [KERNEL, KERNEL])
            .init(device);
        let pool = MaxPool2dConfig::new([POOL, POOL])
            .with_strides([POOL, POOL])
            .init();
        let dropout = DropoutConfig::new(self.dropout).init();
        let fc1 = LinearConfig::new(self.flat_features(), self.hidden).init(device);
        let fc2 = LinearConfig::new(self.hidden, self.num_classes).init(device);

        DigitCnn {
            conv1,
            conv2,
            pool,
            dropout,
            fc1,
            fc2,
            num_classes: self.num_classes,
        }
    }
}

#[derive(Module, Debug)]
pub struct DigitCnn<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub conv2:   Conv2d<B>,
    pub pool:    MaxPool2d,
    pub dropout: Dropout,
    pub fc1:     Linear<B>,
    pub fc2:     Linear<B>,
    pub num_classes: usize,
}

impl<B: Backend> Classifier<B> for DigitCnn<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.pool.forward(self.conv1.forward(images)));
        let x = self.dropout.forward(self.conv2.forward(x));
        let x = relu(self.pool.forward(x));

        let x = x.flatten::<2>(1, 3);
        let x = relu(self.fc1.forward(x));
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn parameters(&self) -> Vec<ParamInfo> {
        let mut out = Vec::with_capacity(8);
        push_conv2d(&mut out, "conv1", &self.conv1);
        push_conv2d(&mut out, "conv2", &self.conv2);
        push_linear(&mut out, "fc1", &self.fc1);
        push_linear(&mut out, "fc2", &self.fc2);
        out
    }
}
