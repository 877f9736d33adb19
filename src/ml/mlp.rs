use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::data::dataset::IMAGE_SIZE;
use crate::domain::params::ParamInfo;
use crate::ml::model::{push_linear, Classifier};

#[derive(Config, Debug)]
pub struct MlpConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = 128)]
    pub hidden: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl MlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MlpClassifier<B> {
        let inputs = IMAGE_SIZE * IMAGE_SIZE;
        MlpClassifier {
            fc1:     LinearConfig::new(inputs, self.hidden).init(device),
            fc2:     LinearConfig::new(self.hidden, self.hidden).init(device),
            fc3:     LinearConfig::new(self.hidden, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            num_classes: self.num_classes,
        }
    }
}

/// Fully-connected baseline: flatten → fc1 → fc2 → fc3.
#[derive(Module, Debug)]
pub struct MlpClassifier<B: Backend> {
    pub fc1:     Linear<B>,
    pub fc2:     Linear<B>,
    pub fc3:     Linear<B>,
    pub dropout: Dropout,
    pub num_classes: usize,
}

impl<B: Backend> Classifier<B> for MlpClassifier<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = images.flatten::<2>(1, 3);
        let x = self.dropout.forward(relu(self.fc1.forward(x)));
        let x = self.dropout.forward(relu(self.fc2.forward(x)));
        self.fc3.forward(x)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn parameters(&self) -> Vec<ParamInfo> {
        let mut out = Vec::with_capacity(6);
        push_linear(&mut out, "fc1", &self.fc1);
        push_linear(&mut out, "fc2", &self.fc2);
        push_linear(&mut out, "fc3", &self.fc3);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn output_leading_dim_matches_batch() {
        let device = Default::default();
        let model = MlpConfig::new().with_hidden(32).init::<TestBackend>(&device);
        let images = Tensor::<TestBackend, 4>::ones([5, 1, IMAGE_SIZE, IMAGE_SIZE], &device);
        assert_eq!(model.forward(images).dims(), [5, 10]);
    }

    #[test]
    fn hidden_width_shows_in_parameter_shapes() {
        let device = Default::default();
        let model = MlpConfig::new().with_hidden(32).init::<TestBackend>(&device);
        let params = model.parameters();
        assert_eq!(params.len(), 6);
        assert_eq!(params[0].name, "fc1.weight");
        assert_eq!(params[0].shape, vec![IMAGE_SIZE * IMAGE_SIZE, 32]);
        assert_eq!(params[5].shape, vec![10]);
    }
}
