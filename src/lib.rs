//! Purpose: Shared core library crate used by the `linkhook` CLI and tests.
//! Exports: `core` (graph registry, hook loading, linking, errors), `api`, helpers.
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod fetch;
pub mod toolchain;
