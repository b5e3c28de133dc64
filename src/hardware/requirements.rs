//! Host checks against the deployment hardware requirements

use super::HardwareCapabilities;
use serde::Serialize;

pub const MIN_RAM_GB: f64 = 8.0;
pub const RECOMMENDED_RAM_GB: f64 = 16.0;
pub const MIN_STORAGE_GB: f64 = 3.0;
pub const RECOMMENDED_STORAGE_GB: f64 = 5.0;
pub const RECOMMENDED_CORES: usize = 6;
pub const OPTIONAL_GPU_MEMORY_GB: f64 = 4.0;

/// Outcome of a single requirement check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Warn => write!(f, "WARN"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl RequirementCheck {
    fn new(name: &str, status: CheckStatus, detail: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail,
        }
    }
}

/// All requirement checks for one host
#[derive(Debug, Clone, Serialize)]
pub struct RequirementReport {
    pub capabilities: HardwareCapabilities,
    pub checks: Vec<RequirementCheck>,
}

impl RequirementReport {
    pub fn evaluate(capabilities: HardwareCapabilities) -> Self {
        let checks = vec![
            check_instruction_set(&capabilities),
            check_cores(&capabilities),
            check_memory(&capabilities),
            check_storage(&capabilities),
            check_gpu(&capabilities),
        ];
        Self {
            capabilities,
            checks,
        }
    }

    /// True when no check failed
    pub fn meets_minimum(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

fn check_instruction_set(caps: &HardwareCapabilities) -> RequirementCheck {
    let (status, detail) = if caps.avx512 {
        (CheckStatus::Pass, "AVX-512 available".to_string())
    } else if caps.avx2 {
        (CheckStatus::Pass, "AVX2 available".to_string())
    } else {
        (
            CheckStatus::Fail,
            "AVX2 not detected; an x86-64 CPU with AVX2 is required".to_string(),
        )
    };
    RequirementCheck::new("cpu instruction set", status, detail)
}

fn check_cores(caps: &HardwareCapabilities) -> RequirementCheck {
    let status = if caps.cpu_cores >= RECOMMENDED_CORES {
        CheckStatus::Pass
    } else {
        CheckStatus::Warn
    };
    RequirementCheck::new(
        "cpu cores",
        status,
        format!("{} cores (recommended {}+)", caps.cpu_cores, RECOMMENDED_CORES),
    )
}

fn check_memory(caps: &HardwareCapabilities) -> RequirementCheck {
    let total = caps.total_ram_gb();
    let status = if total < MIN_RAM_GB {
        CheckStatus::Fail
    } else if total < RECOMMENDED_RAM_GB {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    RequirementCheck::new(
        "memory",
        status,
        format!(
            "{:.1} GB total (minimum {:.0} GB, recommended {:.0} GB)",
            total, MIN_RAM_GB, RECOMMENDED_RAM_GB
        ),
    )
}

fn check_storage(caps: &HardwareCapabilities) -> RequirementCheck {
    let Some(free) = caps.free_disk_gb() else {
        return RequirementCheck::new(
            "storage",
            CheckStatus::Warn,
            "free disk space could not be determined".to_string(),
        );
    };
    let status = if free < MIN_STORAGE_GB {
        CheckStatus::Fail
    } else if free < RECOMMENDED_STORAGE_GB {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    RequirementCheck::new(
        "storage",
        status,
        format!(
            "{:.1} GB free (minimum {:.0} GB, recommended {:.0} GB)",
            free, MIN_STORAGE_GB, RECOMMENDED_STORAGE_GB
        ),
    )
}

fn check_gpu(caps: &HardwareCapabilities) -> RequirementCheck {
    let (status, detail) = match (caps.cuda_available, caps.gpu_memory_gb()) {
        (true, Some(gb)) if gb >= OPTIONAL_GPU_MEMORY_GB => {
            (CheckStatus::Pass, format!("CUDA GPU with {:.1} GB VRAM", gb))
        }
        (true, Some(gb)) => (
            CheckStatus::Warn,
            format!(
                "CUDA GPU with {:.1} GB VRAM (optional offload wants {:.0} GB+)",
                gb, OPTIONAL_GPU_MEMORY_GB
            ),
        ),
        (true, None) => (
            CheckStatus::Warn,
            "CUDA GPU detected, VRAM unknown".to_string(),
        ),
        (false, _) if caps.metal_available => (
            CheckStatus::Pass,
            "Metal GPU with unified memory".to_string(),
        ),
        (false, _) => (
            CheckStatus::Warn,
            "no GPU detected; inference runs on CPU".to_string(),
        ),
    };
    RequirementCheck::new("gpu", status, detail)
}
