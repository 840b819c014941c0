use core::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::id::PostId;

/// Sort key for the listing order: newest `created_at` first, ties broken by
/// the larger identifier. Ascending order of this key is listing order.
pub type NewestFirst = (Reverse<DateTime<Utc>>, Reverse<PostId>);

/// A stored post.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// The listing projection of this post.
    pub fn to_list_item(&self) -> ListItem {
        ListItem {
            id: self.id,
            author_id: self.author_id,
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }

    pub fn newest_first(&self) -> NewestFirst {
        (Reverse(self.created_at), Reverse(self.id))
    }
}

/// The read-only projection returned by listing queries. Carries no body.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    pub id: PostId,
    pub author_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl ListItem {
    pub fn newest_first(&self) -> NewestFirst {
        (Reverse(self.created_at), Reverse(self.id))
    }
}

impl From<&Post> for ListItem {
    fn from(post: &Post) -> Self {
        post.to_list_item()
    }
}

impl From<Post> for ListItem {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            created_at: post.created_at,
        }
    }
}
