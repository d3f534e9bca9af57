//! Object path generation for the storage provider.
//!
//! Path format: `{base_dir}/{folder}/{hash}{ext}` with empty segments skipped,
//! backslashes turned into forward slashes, repeated slashes collapsed and no
//! leading or trailing slash.

use bunny_hybrid_core::UploadFile;

/// Join and normalize path segments
pub fn normalize_path(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/");

    joined
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Object path of a file under the configured base directory
///
/// Upload and delete both go through this function, so the same file attributes
/// always address the same object.
pub fn object_path(base_dir: &str, file: &UploadFile) -> String {
    let file_name = file.file_name();
    normalize_path(&[base_dir, file.path.as_deref().unwrap_or(""), &file_name])
}
