//! Recursive project copy for mutant isolation.
//!
//! Every mutant gets a full copy of the project tree, minus version-control
//! metadata and the mutant output directory itself. Directory and file
//! permission bits are carried over from the source.

use std::fs;
use std::path::Path;

const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

fn is_vcs_dir(name: &str) -> bool {
    VCS_DIRS.iter().any(|d| *d == name)
}

/// Copy `source_root` into `dest`, skipping VCS directories and anything
/// rooted at `exclude` (the mutant output tree, so mutants never nest).
pub fn copy_project(source_root: &Path, dest: &Path, exclude: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    fs::set_permissions(dest, fs::metadata(source_root)?.permissions())?;

    for entry in fs::read_dir(source_root)? {
        let entry = entry?;
        let name = entry.file_name();
        let src_path = entry.path();
        if src_path == exclude || is_vcs_dir(&name.to_string_lossy()) {
            continue;
        }
        let dst_path = dest.join(&name);
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_project(&src_path, &dst_path, exclude)?;
        } else if file_type.is_file() {
            // fs::copy carries the permission bits over.
            fs::copy(&src_path, &dst_path)?;
        }
        // Symlinks and other special files are not copied.
    }
    Ok(())
}
