//! Host hardware detection, requirement checks and endpoint health

mod detector;
mod health;
mod requirements;

pub use detector::{ComputeDevice, HardwareCapabilities, HardwareDetector};
pub use health::{health_url, probe, HealthReport};
pub use requirements::{
    CheckStatus, RequirementCheck, RequirementReport, MIN_RAM_GB, MIN_STORAGE_GB,
    OPTIONAL_GPU_MEMORY_GB, RECOMMENDED_CORES, RECOMMENDED_RAM_GB, RECOMMENDED_STORAGE_GB,
};
