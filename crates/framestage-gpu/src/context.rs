//! GPU device and queue.

use framestage_core::{FrameStageError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// How to pick the adapter video planes are uploaded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuOptions {
    /// Defaults to the low power adapter
    pub power_preference: wgpu::PowerPreference,
    /// Retry with a software adapter when no hardware adapter is found
    pub allow_software: bool,
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::LowPower,
            allow_software: true,
        }
    }
}

/// Device and queue shared by every texture the backend creates.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Open an adapter with the default options.
    pub async fn new() -> Result<Self> {
        Self::with_options(GpuOptions::default()).await
    }

    pub async fn with_options(options: GpuOptions) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let request = |force_fallback_adapter| wgpu::RequestAdapterOptions {
            power_preference: options.power_preference,
            compatible_surface: None,
            force_fallback_adapter,
        };
        let adapter = match instance.request_adapter(&request(false)).await {
            Some(adapter) => Some(adapter),
            None if options.allow_software => {
                warn!("No hardware adapter, trying a software one");
                instance.request_adapter(&request(true)).await
            }
            None => None,
        }
        .ok_or_else(|| FrameStageError::Gpu("no usable GPU adapter".to_string()))?;

        let adapter_info = adapter.get_info();
        info!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            kind = ?adapter_info.device_type,
            "Opened GPU adapter"
        );

        // R8 plane textures fit in the downlevel limits
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("FrameStage video planes"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(|e| FrameStageError::Gpu(format!("device request failed: {}", e)))?;

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Blocking form of [`GpuContext::new`].
    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    /// Largest texture side the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
