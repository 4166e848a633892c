use candle_core::Device;

use crate::core::{DeviceConfig, InspectError, ModelOptions, Result};

/// Loads a device to be used for the model.
/// If `index` is `Some(i)` it will attempt to load the specified CUDA device.
/// When `None` it defaults to CUDA device 0 if available and otherwise falls back
/// to CPU.
pub fn load_device_with(index: Option<usize>) -> Result<Device> {
    match index {
        Some(i) => Device::new_cuda(i)
            .map_err(|e| InspectError::Device(format!("failed to open CUDA device {i}: {e}"))),
        None => Device::cuda_if_available(0)
            .map_err(|e| InspectError::Device(format!("failed to probe CUDA device 0: {e}"))),
    }
}

pub fn load_device() -> Result<Device> {
    load_device_with(None)
}

/// Request for a specific device, used by pipeline builders.
#[derive(Clone, Default)]
pub enum DeviceRequest {
    /// Use CUDA if available, otherwise CPU.
    #[default]
    Default,
    /// Force CPU even if CUDA is available.
    Cpu,
    /// Select a specific CUDA device by index.
    Cuda(usize),
    /// Provide an already constructed device.
    Explicit(Device),
}

impl DeviceRequest {
    /// Resolve the request into an actual [`Device`].
    pub fn resolve(self) -> Result<Device> {
        let device = match self {
            DeviceRequest::Default => load_device_with(None)?,
            DeviceRequest::Cpu => Device::Cpu,
            DeviceRequest::Cuda(i) => load_device_with(Some(i))?,
            DeviceRequest::Explicit(d) => d,
        };
        tracing::debug!(device = ?device.location(), "resolved device");
        Ok(device)
    }
}

impl From<DeviceConfig> for DeviceRequest {
    fn from(value: DeviceConfig) -> Self {
        match value {
            DeviceConfig::Auto => DeviceRequest::Default,
            DeviceConfig::Cpu => DeviceRequest::Cpu,
            DeviceConfig::Cuda(i) => DeviceRequest::Cuda(i),
        }
    }
}

/// Utility to generate a cache key combining model options and device location.
pub fn build_cache_key<O: ModelOptions>(options: &O, device: &Device) -> String {
    format!("{}-{:?}", options.cache_key(), device.location())
}
