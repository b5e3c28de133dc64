//! Host capability detection

#[cfg(feature = "cuda")]
use candle_core::CudaDevice;
use candle_core::Device;
use serde::Serialize;
use std::path::Path;
use sysinfo::{Disks, System};
use tracing::{debug, info, warn};

/// Decimal gigabyte, the unit hardware requirements are stated in
const GB: f64 = 1_000_000_000.0;

/// Detected hardware capabilities
#[derive(Debug, Clone, Serialize)]
pub struct HardwareCapabilities {
    pub total_ram_bytes: u64,
    pub available_ram_bytes: u64,
    pub cpu_cores: usize,
    pub cpu_brand: String,
    pub avx2: bool,
    pub avx512: bool,
    pub cuda_available: bool,
    /// CUDA device memory, when the driver reports it
    pub cuda_memory_bytes: Option<u64>,
    pub metal_available: bool,
    /// Free space on the disk holding the probed path
    pub free_disk_bytes: Option<u64>,
}

impl HardwareCapabilities {
    pub fn available_ram_gb(&self) -> f64 {
        self.available_ram_bytes as f64 / GB
    }

    pub fn total_ram_gb(&self) -> f64 {
        self.total_ram_bytes as f64 / GB
    }

    pub fn free_disk_gb(&self) -> Option<f64> {
        self.free_disk_bytes.map(|b| b as f64 / GB)
    }

    pub fn gpu_memory_gb(&self) -> Option<f64> {
        self.cuda_memory_bytes.map(|b| b as f64 / GB)
    }

    /// Returns the best available compute device
    pub fn best_device(&self) -> ComputeDevice {
        if self.cuda_available {
            ComputeDevice::Cuda
        } else if self.metal_available {
            ComputeDevice::Metal
        } else {
            ComputeDevice::Cpu
        }
    }

    /// Candle device for [`Self::best_device`], falling back to CPU
    pub fn candle_device(&self) -> Device {
        match self.best_device() {
            ComputeDevice::Cuda => Device::new_cuda(0).unwrap_or_else(|e| {
                warn!("CUDA device unavailable ({}), using CPU", e);
                Device::Cpu
            }),
            ComputeDevice::Metal => Device::new_metal(0).unwrap_or_else(|e| {
                warn!("Metal device unavailable ({}), using CPU", e);
                Device::Cpu
            }),
            ComputeDevice::Cpu => Device::Cpu,
        }
    }
}

/// Available compute devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComputeDevice {
    Cpu,
    Cuda,
    Metal,
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Cpu => write!(f, "CPU"),
            ComputeDevice::Cuda => write!(f, "CUDA"),
            ComputeDevice::Metal => write!(f, "Metal"),
        }
    }
}

/// Detects hardware capabilities
pub struct HardwareDetector;

impl HardwareDetector {
    /// Detect capabilities, measuring free disk space for the current directory
    pub fn detect() -> HardwareCapabilities {
        let cwd = std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
        Self::detect_at(&cwd)
    }

    /// Detect capabilities, measuring free disk space for `path`
    pub fn detect_at(path: &Path) -> HardwareCapabilities {
        let mut sys = System::new_all();
        sys.refresh_all();

        let cpu_brand = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_default();
        let (avx2, avx512) = Self::detect_simd();
        let (cuda_available, cuda_memory_bytes) = Self::detect_cuda();

        let capabilities = HardwareCapabilities {
            total_ram_bytes: sys.total_memory(),
            available_ram_bytes: sys.available_memory(),
            cpu_cores: sys.cpus().len(),
            cpu_brand,
            avx2,
            avx512,
            cuda_available,
            cuda_memory_bytes,
            metal_available: Self::detect_metal(),
            free_disk_bytes: Self::free_disk_space(path),
        };

        info!(
            "Hardware detected: {:.1}GB RAM available ({:.1}GB total), {} cores, device: {}",
            capabilities.available_ram_gb(),
            capabilities.total_ram_gb(),
            capabilities.cpu_cores,
            capabilities.best_device()
        );
        debug!("Hardware capabilities: {:?}", capabilities);

        capabilities
    }

    #[cfg(target_arch = "x86_64")]
    fn detect_simd() -> (bool, bool) {
        (
            std::arch::is_x86_feature_detected!("avx2"),
            std::arch::is_x86_feature_detected!("avx512f"),
        )
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn detect_simd() -> (bool, bool) {
        (false, false)
    }

    /// Free bytes on the disk whose mount point is the longest prefix of `path`
    fn free_disk_space(path: &Path) -> Option<u64> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let disks = Disks::new_with_refreshed_list();

        disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space())
    }

    #[cfg(feature = "cuda")]
    fn detect_cuda() -> (bool, Option<u64>) {
        use candle_core::backend::BackendDevice;
        use candle_core::cuda::cudarc;
        use std::mem::MaybeUninit;

        match CudaDevice::new(0) {
            Ok(_device) => {
                let context = match cudarc::driver::CudaContext::new(0) {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        debug!("Failed to create CUDA context: {}", e);
                        return (true, None);
                    }
                };

                let cu_device = context.cu_device();
                let memory_bytes = unsafe {
                    let mut bytes = MaybeUninit::uninit();
                    match cudarc::driver::sys::cuDeviceTotalMem_v2(bytes.as_mut_ptr(), cu_device) {
                        cudarc::driver::sys::cudaError_enum::CUDA_SUCCESS => {
                            Some(bytes.assume_init() as u64)
                        }
                        _ => None,
                    }
                };

                info!("CUDA device detected");
                (true, memory_bytes)
            }
            Err(e) => {
                debug!("CUDA not available: {}", e);
                (false, None)
            }
        }
    }

    #[cfg(not(feature = "cuda"))]
    fn detect_cuda() -> (bool, Option<u64>) {
        debug!("CUDA support not compiled (cuda feature not enabled)");
        (false, None)
    }

    #[cfg(feature = "metal")]
    fn detect_metal() -> bool {
        use candle_core::metal_backend::MetalDevice;
        use candle_core::backend::BackendDevice;

        match MetalDevice::new(0) {
            Ok(_) => {
                info!("Metal device detected");
                true
            }
            Err(e) => {
                debug!("Metal not available: {}", e);
                false
            }
        }
    }

    #[cfg(not(feature = "metal"))]
    fn detect_metal() -> bool {
        debug!("Metal support not compiled (metal feature not enabled)");
        false
    }
}
