//! Kernel-wide constants.

/// Project namespace the kernel's own built-in services live under
pub const KERNEL_PROJECT: &str = "wicker";

/// Kernel version string
pub const KERNEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Priority pinning built-in callbacks ahead of consumer code
pub const BUILTIN_PRIORITY: i64 = -100;
