use std::path::{Path, PathBuf};

/// Replaces the extension of `path` with `suffix`, keeping the stem.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    path.with_file_name(format!("{}{}", stem.to_string_lossy(), suffix))
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_suffix_replaces_extension() {
        assert_eq!(
            with_suffix(Path::new("rep1/all_coors.xyz"), "_clean.xyz"),
            PathBuf::from("rep1/all_coors_clean.xyz")
        );
    }

    #[test]
    fn display_name_falls_back_to_path() {
        assert_eq!(display_name(Path::new("a/b.pdb")), "b.pdb");
        assert_eq!(display_name(Path::new("..")), "..");
    }
}
