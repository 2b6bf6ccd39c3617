//! NativeBuild.toml configuration

pub mod native_toml;
pub mod validation;

pub use native_toml::{NativeConfig, PlatformConfig, PostBuildConfig};
