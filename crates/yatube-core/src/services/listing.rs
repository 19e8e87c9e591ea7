use crate::domain::{PostEntry, PostScope};
use crate::error::RepoError;
use crate::pagination::{Page, Paginator};
use crate::ports::PostRepository;

/// Fetch one page of the posts in `scope`.
///
/// Only the records of the resolved page are loaded from the store.
pub async fn page_of_posts(
    posts: &dyn PostRepository,
    paginator: &Paginator,
    scope: PostScope,
    requested: Option<&str>,
) -> Result<Page<PostEntry>, RepoError> {
    let total = posts.count(scope).await?;
    let slot = paginator.locate(total, requested);
    let items = if slot.limit == 0 {
        Vec::new()
    } else {
        posts.list(scope, slot.offset, slot.limit).await?
    };

    tracing::debug!(
        ?scope,
        page = slot.number,
        num_pages = slot.num_pages,
        total,
        "Listed posts"
    );

    Ok(slot.into_page(items))
}
