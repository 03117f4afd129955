use serde::{Deserialize, Serialize};

use super::Timestamp;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { name: name.into(), email: email.into(), username: None }
    }
}

/// The code version a run measured. Commits are keyed by `id` and never change once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl Commit {
    pub fn new(id: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id: id.into(),
            timestamp,
            message: String::default(),
            author: Author::default(),
            committer: None,
            tree_id: None,
            url: String::default(),
        }
    }

    pub fn with_author(self, author: Author) -> Self {
        Self { author, ..self }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self { message: message.into(), ..self }
    }

    pub fn with_url(self, url: impl Into<String>) -> Self {
        Self { url: url.into(), ..self }
    }
}
