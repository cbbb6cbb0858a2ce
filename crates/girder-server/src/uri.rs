//! Build-target identity: `<projectDirAsFileUri>?sourceset=<name>`.
//!
//! The `sourceset` query parameter is the single source of identity next to
//! the directory. Parsers tolerate arbitrary additional query keys, and a
//! missing parameter is an error — directory equality alone never identifies
//! a target.

use std::path::{Path, PathBuf};

use url::Url;

use crate::TargetError;

/// Builds the canonical URI for one (project dir, source set) pair.
pub fn build_target_uri(project_dir: &Path, source_set_name: &str) -> Result<Url, TargetError> {
    let absolute = absolute_path(project_dir);
    let mut url = Url::from_file_path(&absolute).map_err(|()| TargetError::InvalidUri {
        uri: absolute.display().to_string(),
        reason: "project directory is not an absolute path".to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("sourceset", source_set_name);
    Ok(url)
}

/// Recovers the (project dir, source set) pair from a target URI.
pub fn parse_build_target_uri(uri: &str) -> Result<(PathBuf, String), TargetError> {
    let url = Url::parse(uri).map_err(|err| TargetError::InvalidUri {
        uri: uri.to_string(),
        reason: err.to_string(),
    })?;

    let source_set = url
        .query_pairs()
        .find(|(key, _)| key == "sourceset")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| TargetError::InvalidUri {
            uri: uri.to_string(),
            reason: "missing sourceset query parameter".to_string(),
        })?;

    let mut dir_url = url;
    dir_url.set_query(None);
    dir_url.set_fragment(None);
    let dir = dir_url.to_file_path().map_err(|()| TargetError::InvalidUri {
        uri: uri.to_string(),
        reason: "not a file uri".to_string(),
    })?;

    Ok((dir, source_set))
}

/// Mirrors `File::getAbsolutePath`: relative paths resolve against the
/// current directory.
fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
