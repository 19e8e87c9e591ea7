//! Conversions from domain records to template contexts.

use chrono::{DateTime, Utc};

use yatube_core::Page;
use yatube_core::domain::{CommentEntry, Group, PostEntry};
use yatube_shared::context::{CommentView, GroupChoice, GroupView, PageObj, PostCard};

/// Public URL of a stored media file.
pub fn media_url(key: &str) -> String {
    format!("/media/{key}")
}

fn display_date(at: DateTime<Utc>) -> String {
    at.format("%d %b %Y").to_string()
}

pub fn group_view(group: Group) -> GroupView {
    GroupView {
        title: group.title,
        slug: group.slug,
        description: group.description,
    }
}

pub fn group_choice(group: Group) -> GroupChoice {
    GroupChoice {
        id: group.id,
        title: group.title,
    }
}

pub fn post_card(entry: PostEntry) -> PostCard {
    let PostEntry {
        post,
        author,
        group,
    } = entry;

    PostCard {
        id: post.id,
        label: post.label(),
        image_url: post.image.as_deref().map(media_url),
        pub_date: display_date(post.created_at),
        text: post.text,
        author,
        group: group.map(group_view),
    }
}

pub fn comment_view(entry: CommentEntry) -> CommentView {
    CommentView {
        author: entry.author,
        created: display_date(entry.comment.created_at),
        text: entry.comment.text,
    }
}

/// Page of records with its navigation values.
pub fn page_obj<T, U, F>(page: Page<T>, f: F) -> PageObj<U>
where
    F: FnMut(T) -> U,
{
    let has_previous = page.has_previous();
    let has_next = page.has_next();
    let previous_page_number = page.previous_page_number();
    let next_page_number = page.next_page_number();
    let page_range = page.page_range().collect();
    let page = page.map(f);

    PageObj {
        object_list: page.items,
        number: page.number,
        num_pages: page.num_pages,
        count: page.total,
        has_previous,
        has_next,
        previous_page_number,
        next_page_number,
        page_range,
    }
}
