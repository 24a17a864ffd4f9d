use mime::Mime;
use std::path::Path;

/// Guesses the MIME type of an object from its key's extension.
///
/// Keys without an extension, or with one the table doesn't know, are served as `text/plain`.
pub fn resolve(key: impl AsRef<Path>) -> Mime {
    new_mime_guess::from_path(key).first().unwrap_or(mime::TEXT_PLAIN)
}
