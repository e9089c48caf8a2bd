//! Compilation targets for the Ember tensor compiler.
//!
//! This crate defines the closed set of architecture families that operator
//! strategies dispatch on. Scheduling decisions are made per family, so the
//! set is deliberately small and every `match` over [`Arch`] is expected to
//! be exhaustive: adding a family is a compile-checked edit everywhere it is
//! scheduled.
//!
//! # Supported Families
//!
//! - **x86**: x86-64 CPUs
//! - **arm**: 64-bit ARM CPUs
//! - **nvgpu**: NVIDIA GPUs (CUDA)
//! - **hygon-dcu-hip** / **hygon-dcu-sycl**: Hygon DCU accelerators
//!
//! The `unknown` family exists so that an unconfigured target can be
//! represented; scheduling for it is a hard error.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target architecture family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arch {
    /// No architecture selected.
    #[default]
    Unknown,
    /// x86-64.
    X86,
    /// 64-bit ARM.
    Arm,
    /// NVIDIA GPU.
    NvGpu,
    /// Hygon DCU driven through HIP.
    HygonDcuHip,
    /// Hygon DCU driven through SYCL.
    HygonDcuSycl,
}

impl Arch {
    /// Every family, `Unknown` included.
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::X86,
        Self::Arm,
        Self::NvGpu,
        Self::HygonDcuHip,
        Self::HygonDcuSycl,
    ];

    /// Every family a strategy can be scheduled for.
    pub const KNOWN: [Self; 5] = [
        Self::X86,
        Self::Arm,
        Self::NvGpu,
        Self::HygonDcuHip,
        Self::HygonDcuSycl,
    ];

    /// Get the name of this architecture family.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::X86 => "x86",
            Self::Arm => "arm",
            Self::NvGpu => "nvgpu",
            Self::HygonDcuHip => "hygon-dcu-hip",
            Self::HygonDcuSycl => "hygon-dcu-sycl",
        }
    }

}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Arch {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_arch(s)
    }
}

/// A compilation target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Architecture family.
    pub arch: Arch,
}

impl Target {
    /// Create a target for the given family.
    #[must_use]
    pub const fn new(arch: Arch) -> Self {
        Self { arch }
    }

    /// Parse a target from an architecture name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known architecture.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        parse_arch(s).map(Self::new)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new(Arch::Unknown)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arch)
    }
}

/// Errors that can occur when parsing targets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Unknown architecture.
    #[error("unknown architecture: {0}")]
    UnknownArch(String),
}

/// Parse an architecture from a string.
fn parse_arch(s: &str) -> Result<Arch, TargetError> {
    match s.to_ascii_lowercase().as_str() {
        "unknown" => Ok(Arch::Unknown),
        "x86" | "x86_64" | "amd64" => Ok(Arch::X86),
        "arm" | "arm64" | "aarch64" => Ok(Arch::Arm),
        "nvgpu" | "cuda" | "nvptx64" => Ok(Arch::NvGpu),
        "hygon-dcu-hip" | "hip" => Ok(Arch::HygonDcuHip),
        "hygon-dcu-sycl" | "sycl" => Ok(Arch::HygonDcuSycl),
        _ => Err(TargetError::UnknownArch(s.to_string())),
    }
}

/// Get the target for the host machine.
#[must_use]
pub fn host_target() -> Target {
    #[cfg(target_arch = "x86_64")]
    let arch = Arch::X86;
    #[cfg(target_arch = "aarch64")]
    let arch = Arch::Arm;
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    let arch = Arch::Unknown;

    Target::new(arch)
}

/// Pre-defined targets.
pub mod targets {
    use super::{Arch, Target};

    /// x86-64 CPU target.
    #[must_use]
    pub const fn x86() -> Target {
        Target::new(Arch::X86)
    }

    /// ARM CPU target.
    #[must_use]
    pub const fn arm() -> Target {
        Target::new(Arch::Arm)
    }

    /// NVIDIA GPU target.
    #[must_use]
    pub const fn nvgpu() -> Target {
        Target::new(Arch::NvGpu)
    }

    /// Hygon DCU (HIP) target.
    #[must_use]
    pub const fn hygon_dcu_hip() -> Target {
        Target::new(Arch::HygonDcuHip)
    }

    /// Hygon DCU (SYCL) target.
    #[must_use]
    pub const fn hygon_dcu_sycl() -> Target {
        Target::new(Arch::HygonDcuSycl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Target::parse("x86_64").unwrap().arch, Arch::X86);
        assert_eq!(Target::parse("aarch64").unwrap().arch, Arch::Arm);
        assert_eq!(Target::parse("CUDA").unwrap().arch, Arch::NvGpu);
        assert_eq!("sycl".parse::<Arch>().unwrap(), Arch::HygonDcuSycl);
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = Target::parse("riscv64").unwrap_err();
        assert_eq!(err, TargetError::UnknownArch("riscv64".to_string()));
    }

    #[test]
    fn test_name_roundtrip() {
        for arch in Arch::ALL {
            assert_eq!(arch.name().parse::<Arch>().unwrap(), arch);
        }
    }

    #[test]
    fn test_known_excludes_unknown() {
        assert!(!Arch::KNOWN.contains(&Arch::Unknown));
        assert_eq!(Arch::KNOWN.len() + 1, Arch::ALL.len());
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(Target::default().arch, Arch::Unknown);
        assert_eq!(targets::x86().to_string(), "x86");
    }
}
