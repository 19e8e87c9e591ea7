//! Media storage implementations - local filesystem and in-memory fallback.

mod local;
mod memory;

pub use local::LocalMediaStorage;
pub use memory::InMemoryMediaStorage;

use uuid::Uuid;
use yatube_core::ports::MediaError;

/// Directory (key prefix) that post images are stored under.
const POST_IMAGES: &str = "posts";

/// Fresh key for a post image, e.g. `posts/3f2c...e1.png`.
fn new_key(extension: &str) -> Result<String, MediaError> {
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MediaError::InvalidKey(format!(
            "bad extension '{extension}'"
        )));
    }
    Ok(format!(
        "{POST_IMAGES}/{}.{}",
        Uuid::new_v4().simple(),
        extension.to_ascii_lowercase()
    ))
}

/// Keys are relative paths of plain segments; anything that could escape the
/// storage root is refused.
fn check_key(key: &str) -> Result<(), MediaError> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        });

    if valid {
        Ok(())
    } else {
        Err(MediaError::InvalidKey(key.to_string()))
    }
}
