//! Pulls `classes.dex`, `classes2.dex`, ... out of an APK (a zip archive) so
//! they can be opened the same way as a standalone dex file.
use std::fs::File;
use std::io;
use std::path::PathBuf;

use tempfile::TempDir;
use zip::ZipArchive;

use crate::Result;

/// Extracts every `classes*.dex` entry from `apk_path` into a fresh temporary
/// directory, in multidex order (`classes.dex`, `classes2.dex`, `classes3.dex`, ...).
///
/// The returned `TempDir` must outlive the paths it produced; dropping it
/// deletes the extracted files.
pub(crate) fn extract_dex_files(apk_path: &std::path::Path) -> Result<(TempDir, Vec<PathBuf>)> {
    let file = File::open(apk_path)?;
    let mut archive = ZipArchive::new(file)?;
    let dir = TempDir::new()?;

    let mut names: Vec<String> = (0..archive.len())
        .map(|i| Ok(archive.by_index(i)?.name().to_owned()))
        .collect::<Result<Vec<_>>>()?;
    names.retain(|name| is_dex_entry(name));
    names.sort_by_key(|name| multidex_index(name));

    debug!(target: "zipio", "found {} dex entries in {}", names.len(), apk_path.display());

    let mut paths = Vec::with_capacity(names.len());
    for name in names {
        let mut entry = archive.by_name(&name)?;
        let dest = dir.path().join(entry.name());
        let mut out = File::create(&dest)?;
        io::copy(&mut entry, &mut out)?;
        paths.push(dest);
    }
    Ok((dir, paths))
}

/// `classes.dex`, `classes2.dex`, `classes3.dex`, ... at the top level of the archive.
fn is_dex_entry(name: &str) -> bool {
    match name.strip_prefix("classes").and_then(|s| s.strip_suffix(".dex")) {
        Some(digits) => digits.is_empty() || digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// `classes.dex` sorts before `classes2.dex`, which sorts before `classes3.dex`, ...
fn multidex_index(name: &str) -> u32 {
    name.strip_prefix("classes")
        .and_then(|s| s.strip_suffix(".dex"))
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_multidex_entry_names() {
        assert!(is_dex_entry("classes.dex"));
        assert!(is_dex_entry("classes2.dex"));
        assert!(is_dex_entry("classes17.dex"));
        assert!(!is_dex_entry("classes.dex.orig"));
        assert!(!is_dex_entry("res/classes.dex"));
        assert!(!is_dex_entry("AndroidManifest.xml"));
    }

    #[test]
    fn orders_multidex_entries_numerically() {
        let mut names = vec!["classes3.dex".to_string(), "classes.dex".to_string(), "classes2.dex".to_string()];
        names.sort_by_key(|name| multidex_index(name));
        assert_eq!(names, vec!["classes.dex", "classes2.dex", "classes3.dex"]);
    }
}
