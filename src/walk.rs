use crate::Error;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A regular file found under the sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub absolute_path: PathBuf,
    /// `/`-separated path relative to the root, used as the object key
    pub relative_key: String,
}

/// Lazily walks every regular file under `root`.
///
/// `root` is expected to be an existing, canonical directory. Directories themselves never show
/// up. With `follow_links` symlinked files are yielded under the link's own path and symlinked
/// directories are descended into (a link cycle is a filesystem error); without it symlinks are
/// skipped. Entries are visited in file name order so repeated runs over the same tree upload
/// in the same order.
pub fn walk(
    root: &Path,
    follow_links: bool,
) -> impl Iterator<Item = Result<LocalFile, Error>> + use<> {
    let root = root.to_path_buf();
    WalkDir::new(&root)
        .follow_links(follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => to_local_file(&root, entry).transpose(),
            Err(e) => Some(Err(e.into())),
        })
}

fn to_local_file(root: &Path, entry: DirEntry) -> Result<Option<LocalFile>, Error> {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        debug!(path=?entry.path(), "Skipping symlink");
        return Ok(None);
    }
    if !file_type.is_file() {
        return Ok(None);
    }

    let relative_key = relative_key(root, entry.path())?;
    trace!(?relative_key, "Found file");

    Ok(Some(LocalFile {
        absolute_path: entry.into_path(),
        relative_key,
    }))
}

/// Derives the object key for `path`: its components below `root` joined with `/`.
pub fn relative_key(root: &Path, path: &Path) -> Result<String, Error> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::filesystem(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not below the sync root {root:?}"),
            ),
        )
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let Some(part) = part.to_str() else {
                    return Err(Error::NonUtf8Path(path.to_path_buf()));
                };
                parts.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(Error::filesystem(
                    path,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "unexpected path component",
                    ),
                ));
            }
        }
    }

    Ok(parts.join("/"))
}
