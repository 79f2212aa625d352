use serde::{Deserialize, Serialize};

/// A single feed post. `id` is server-assigned and monotonic; id 0 marks an
/// unsaved draft. `published_at` is a server-assigned timestamp string the
/// client treats as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub published_at: String,
    pub liked_by_me: bool,
    pub like_count: u32,
}

impl Post {
    /// Empty draft sentinel: id 0, blank fields, no likes.
    pub fn draft() -> Self {
        Self {
            id: 0,
            author: String::new(),
            content: String::new(),
            published_at: String::new(),
            liked_by_me: false,
            like_count: 0,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.id == 0
    }

    /// The post as it should read after flipping the like state locally:
    /// `liked_by_me` inverted, `like_count` adjusted ±1 without underflow.
    pub fn toggled(&self) -> Self {
        let like_count = if self.liked_by_me {
            self.like_count.saturating_sub(1)
        } else {
            self.like_count + 1
        };
        Self {
            liked_by_me: !self.liked_by_me,
            like_count,
            ..self.clone()
        }
    }
}
