//! Checksums sidecar loader (§4.2, §6 Filesystem): an optional
//! `checksums.asc` next to the daemon binary, feeding the readiness
//! banner's `data.checksums` field.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::DaemonError;

/// Derives the sidecar path from the running executable's directory.
pub fn default_checksums_path() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join("checksums.asc"))
}

/// Loads `<hash> <relative-path>` lines. A missing sidecar is tolerated and
/// yields `None` (§9: "absence tolerated"); a present-but-unreadable sidecar
/// (permissions, not-a-file) is a startup defect.
pub fn load(path: &Path) -> Result<Option<BTreeMap<String, String>>, DaemonError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse(&contents))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(DaemonError::ChecksumsRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let hash = parts.next()?;
            let rel_path = parts.next()?;
            Some((rel_path.to_string(), hash.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_separated_lines() {
        let parsed = parse("deadbeef  bin/zrpcd\ncafef00d  lib/libhelper.so\n");
        assert_eq!(parsed.get("bin/zrpcd"), Some(&"deadbeef".to_string()));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn missing_file_is_tolerated() {
        let result = load(Path::new("/nonexistent/checksums.asc")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let parsed = parse("\n\ndeadbeef  bin/zrpcd\n\n");
        assert_eq!(parsed.len(), 1);
    }
}
