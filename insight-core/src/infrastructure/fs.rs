// insight-core/src/infrastructure/fs.rs

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::infrastructure::error::InfrastructureError;

/// Writes `content` through a temp file in the same directory, then renames it,
/// so readers never observe a half-written report.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Pretty JSON + trailing newline, written atomically.
pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), InfrastructureError> {
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    atomic_write(path, body)
}
