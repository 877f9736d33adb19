// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// The compute device is chosen once per run. Each workflow is
// written generically over an AutodiffBackend and handed to
// `dispatch`, which instantiates it for the selected backend:
//
//   ndarray → Autodiff<NdArray<f32>>  (CPU, always available)
//   wgpu    → Autodiff<Wgpu>          (needs `--features wgpu`)
//
// Evaluation-only workflows use `B::InnerBackend`.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    tensor::backend::AutodiffBackend,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "wgpu"))]
use crate::domain::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// CPU via ndarray
    #[default]
    Ndarray,
    /// GPU via wgpu
    Wgpu,
}

/// A workflow that can run on any autodiff backend.
pub trait BackendJob {
    type Output;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<Self::Output>;
}

pub fn dispatch<J: BackendJob>(kind: BackendKind, job: J) -> Result<J::Output> {
    match kind {
        BackendKind::Ndarray => {
            let device = NdArrayDevice::default();
            tracing::info!("Using ndarray device: {:?}", device);
            job.run::<Autodiff<NdArray<f32>>>(device)
        }
        BackendKind::Wgpu => run_wgpu(job),
    }
}

#[cfg(feature = "wgpu")]
fn run_wgpu<J: BackendJob>(job: J) -> Result<J::Output> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    job.run::<Autodiff<burn::backend::Wgpu>>(device)
}

#[cfg(not(feature = "wgpu"))]
fn run_wgpu<J: BackendJob>(_job: J) -> Result<J::Output> {
    Err(ConfigError::BackendUnavailable("wgpu").into())
}
