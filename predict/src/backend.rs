use burn::tensor::backend::Backend;

#[cfg(feature = "ndarray")]
pub type InferenceBackend = burn::backend::NdArray<f32>;

#[cfg(all(feature = "tch", not(feature = "ndarray")))]
pub type InferenceBackend = burn::backend::LibTorch<f32>;

#[cfg(all(feature = "wgpu", not(any(feature = "ndarray", feature = "tch"))))]
pub type InferenceBackend = burn::backend::Wgpu<burn::backend::wgpu::AutoGraphicsApi, f32, i32>;

#[cfg(not(any(feature = "ndarray", feature = "tch", feature = "wgpu")))]
compile_error!("enable one of the `ndarray`, `tch` or `wgpu` features to select a backend");

/// CPU for ndarray and libtorch, best available adapter for wgpu.
pub fn default_device() -> <InferenceBackend as Backend>::Device {
    Default::default()
}
