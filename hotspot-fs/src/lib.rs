//! Capability-based file helpers for photo snapshots, databases and reports.
//!
//! Every helper resolves an ambient directory for the target's parent and
//! performs the operation relative to it, so callers only ever hand over
//! UTF-8 paths.
#![forbid(unsafe_code)]

use std::io::{self, Read};
use std::path::Component;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Read a whole UTF-8 text file.
///
/// # Errors
/// Returns any I/O error raised while opening or reading the file.
pub fn read_utf8_file(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Write `contents` to `path`, creating parent directories and replacing any
/// existing file.
///
/// # Errors
/// Returns any I/O error raised while creating directories or writing.
pub fn write_utf8_file(path: &Utf8Path, contents: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let (dir, name) = parent_dir_and_name(path)?;
    dir.write(name.as_str(), contents)
}

/// Ensure the parent directory of `path` exists.
///
/// # Errors
/// Returns any I/O error raised while opening the base directory or creating
/// the missing components.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    let (base, relative) = split_base(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// Report whether `path` names a regular file rather than a directory or
/// other entry.
///
/// # Errors
/// Returns [`io::ErrorKind::NotFound`] when nothing exists at `path`, and any
/// other I/O error raised while inspecting it.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = parent_dir_and_name(path)?;
    Ok(dir.metadata(name.as_str())?.is_file())
}

fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} has no file name")))?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

// Split into an ambient base directory and a relative remainder that cap-std
// will accept.
fn split_base(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();
    let (base, relative) = match std_parent.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;
    Ok((dir, relative))
}
