//! Purpose: Define the stable public Rust API boundary for linkhook.
//! Exports: Graph, linking, hook-loading, and manifest types used by the CLI.
//! Role: Public, additive-only surface; internal module layout stays hidden.
//! Invariants: This module is the only public path consumers should import from.

mod manifest;

pub use crate::core::error::{Error, ErrorKind};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::graph::{BuildGraph, DepRef, LinkEdge, LinkScope, Target, TargetKind};
pub use crate::core::hooks::{HookLoader, LinkedHook};
pub use crate::core::link::{ScopedDep, link_with_hooks, parse_link_args};
pub use crate::core::script::ScriptLoader;
pub use crate::fetch::{FetchCommand, install_js_packages, restore_native_packages};
pub use crate::toolchain::{
    CpuArch, HostArch, Platform, ToolchainFlavor, WarningPolicy, apply_warning_policy,
    detect_host_arch, flavor_for_compiler,
};
pub use manifest::{ApplyReport, LinkSpec, Manifest, TargetSpec, apply};
