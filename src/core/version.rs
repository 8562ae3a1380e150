//! Build metadata generated by `build.rs`

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Fallback when the generated API version is not numeric
const DEFAULT_API_VERSION: u32 = 20241104;

/// Plugin API version declared in `Cargo.toml` metadata
pub fn api_version() -> u32 {
    PLUGIN_API_VERSION.parse().unwrap_or(DEFAULT_API_VERSION)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// One-line version banner: `plugview 0.1.0 (api 20241104, abc1234, built ...)`
pub fn version_banner() -> String {
    format!(
        "{} {} (api {}, {}, built {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        api_version(),
        git_hash(),
        build_time()
    )
}
