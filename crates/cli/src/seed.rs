use crate::error::Error;
use companion::backend::Release;
use companion::domain::Snapshot;
use companion::update::UpdateManifest;
use std::path::Path;

/// Read the snapshot the in-process backend starts with.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, Error> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::ReadSnapshot {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::ParseSnapshot {
        path: path.to_owned(),
        source,
    })
}

/// Release offered by the backend, reporting `current_version` as installed.
pub fn release(version: &str, current_version: Option<&str>) -> Release {
    let mut manifest = UpdateManifest::new(version);
    manifest.current_version = current_version.map(str::to_owned);
    Release::new(manifest)
}
