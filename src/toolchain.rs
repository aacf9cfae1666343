//! Purpose: Host architecture probe and compiler-warning policy toggles.
//! Exports: `HostArch`, `CpuArch`, `Platform`, `detect_host_arch`,
//! `WarningPolicy`, `ToolchainFlavor`, `flavor_for_compiler`, `apply_warning_policy`.
//! Role: Configuration glue around the core link mechanism.
//! Invariants: An unrecognized compiler path is fatal, never guessed.
//! Invariants: Warning flags only land on targets with compiled output.
use std::path::Path;

use crate::core::error::{Error, ErrorKind};
use crate::core::graph::{BuildGraph, TargetKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CpuArch {
    Aarch64,
    X86_64,
    X86,
    Arm,
    Riscv64,
}

impl CpuArch {
    pub fn name(self) -> &'static str {
        match self {
            CpuArch::Aarch64 => "aarch64",
            CpuArch::X86_64 => "x86_64",
            CpuArch::X86 => "x86",
            CpuArch::Arm => "arm",
            CpuArch::Riscv64 => "riscv64",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Platform {
    Linux,
    Windows,
    Macos,
    Android,
}

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Android => "android",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HostArch {
    pub cpu: CpuArch,
    pub platform: Platform,
}

const CPU_PATTERNS: &[(&str, CpuArch)] = &[
    ("aarch64", CpuArch::Aarch64),
    ("arm64", CpuArch::Aarch64),
    ("x86_64", CpuArch::X86_64),
    ("amd64", CpuArch::X86_64),
    ("x64", CpuArch::X86_64),
    ("i686", CpuArch::X86),
    ("i586", CpuArch::X86),
    ("riscv64", CpuArch::Riscv64),
    ("armv7", CpuArch::Arm),
    ("arm-", CpuArch::Arm),
];

// Checked in order; mingw/msvc must win over the generic "gnu" suffix.
const PLATFORM_PATTERNS: &[(&str, Platform)] = &[
    ("mingw", Platform::Windows),
    ("msvc", Platform::Windows),
    ("windows", Platform::Windows),
    ("apple", Platform::Macos),
    ("darwin", Platform::Macos),
    ("android", Platform::Android),
    ("musl", Platform::Linux),
    ("linux", Platform::Linux),
    ("gnu", Platform::Linux),
];

const BARE_COMPILERS: &[&str] = &["cc", "c++", "gcc", "g++", "clang", "clang++", "cl"];

/// Maps a compiler path against known triple patterns. Bare compiler names
/// (`cc`, `clang`, `cl`, ...) resolve to the build host itself. Anything
/// else fails the configuration pass.
pub fn detect_host_arch(compiler: &Path) -> Result<HostArch, Error> {
    let haystack = compiler.to_string_lossy().to_lowercase();

    let cpu = CPU_PATTERNS
        .iter()
        .find(|(pattern, _)| haystack.contains(pattern))
        .map(|(_, cpu)| *cpu);
    let platform = PLATFORM_PATTERNS
        .iter()
        .find(|(pattern, _)| haystack.contains(pattern))
        .map(|(_, platform)| *platform);

    if let (Some(cpu), Some(platform)) = (cpu, platform) {
        return Ok(HostArch { cpu, platform });
    }

    let stem = compiler
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if BARE_COMPILERS.contains(&stem.as_str()) {
        return Ok(HostArch {
            cpu: build_host_cpu()?,
            platform: build_host_platform()?,
        });
    }

    Err(Error::new(ErrorKind::Toolchain)
        .with_message("unrecognized compiler path")
        .with_path(compiler)
        .with_hint("Expected a known target triple or a bare compiler name."))
}

fn build_host_cpu() -> Result<CpuArch, Error> {
    if cfg!(target_arch = "x86_64") {
        Ok(CpuArch::X86_64)
    } else if cfg!(target_arch = "aarch64") {
        Ok(CpuArch::Aarch64)
    } else if cfg!(target_arch = "x86") {
        Ok(CpuArch::X86)
    } else if cfg!(target_arch = "arm") {
        Ok(CpuArch::Arm)
    } else if cfg!(target_arch = "riscv64") {
        Ok(CpuArch::Riscv64)
    } else {
        Err(Error::new(ErrorKind::Toolchain).with_message("build host cpu is not supported"))
    }
}

fn build_host_platform() -> Result<Platform, Error> {
    if cfg!(target_os = "linux") {
        Ok(Platform::Linux)
    } else if cfg!(target_os = "windows") {
        Ok(Platform::Windows)
    } else if cfg!(target_os = "macos") {
        Ok(Platform::Macos)
    } else if cfg!(target_os = "android") {
        Ok(Platform::Android)
    } else {
        Err(Error::new(ErrorKind::Toolchain).with_message("build host platform is not supported"))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WarningPolicy {
    Strict,
    Relaxed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToolchainFlavor {
    Gnu,
    Msvc,
}

pub fn flavor_for_compiler(compiler: &Path) -> ToolchainFlavor {
    let haystack = compiler.to_string_lossy().to_lowercase();
    let stem = compiler
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if haystack.contains("msvc") || stem == "cl" {
        ToolchainFlavor::Msvc
    } else {
        ToolchainFlavor::Gnu
    }
}

fn warning_flags(policy: WarningPolicy, flavor: ToolchainFlavor) -> &'static [&'static str] {
    match (policy, flavor) {
        (WarningPolicy::Strict, ToolchainFlavor::Gnu) => &["-Wall", "-Wextra", "-Werror"],
        (WarningPolicy::Strict, ToolchainFlavor::Msvc) => &["/W4", "/WX"],
        (WarningPolicy::Relaxed, ToolchainFlavor::Gnu) => &["-w"],
        (WarningPolicy::Relaxed, ToolchainFlavor::Msvc) => &["/W0"],
    }
}

/// Appends the policy's flags to the target's `compile-options` property.
pub fn apply_warning_policy(
    graph: &mut BuildGraph,
    target: &str,
    policy: WarningPolicy,
    flavor: ToolchainFlavor,
) -> Result<(), Error> {
    let entry = graph.target(target).ok_or_else(|| {
        Error::new(ErrorKind::NotFound)
            .with_message("target is not declared")
            .with_target(target)
    })?;
    if entry.kind() == TargetKind::InterfaceOnly {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("interface-only targets take no warning flags")
            .with_target(target));
    }
    for flag in warning_flags(policy, flavor) {
        graph.append_property_item(target, "compile-options", flag)?;
    }
    Ok(())
}
