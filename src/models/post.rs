use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::embedded::{EmbeddedList, Keyed};
use crate::database::Document;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    /// Author name at creation time; not kept in sync.
    pub name: String,
    /// Author avatar at creation time; not kept in sync.
    pub avatar: String,
    #[serde(default)]
    pub likes: EmbeddedList<Like>,
    #[serde(default)]
    pub comments: EmbeddedList<Comment>,
    pub date: DateTime<Utc>,
}

impl Document for Post {
    const COLLECTION: &'static str = "posts";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user: Uuid,
}

impl Keyed for Like {
    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl Keyed for Comment {
    fn key(&self) -> Uuid {
        self.id
    }
}
