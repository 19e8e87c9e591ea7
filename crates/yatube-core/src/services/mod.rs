//! Services - use cases composed from the ports.

mod follow;
mod listing;

pub use follow::{follow, unfollow};
pub use listing::page_of_posts;
