//! Bundled asset lookup.

use std::path::PathBuf;

/// Resolves a bundled asset by file name.
///
/// Prefers the crate's `assets/` directory (development builds), falling
/// back to an `assets/` directory next to the executable.
pub fn asset_path(name: &str) -> PathBuf {
    let dev = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(name);
    if dev.exists() {
        return dev;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| Some(exe.parent()?.join("assets").join(name)))
        .unwrap_or(dev)
}
