use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::ServiceError;
use crate::auth::{authorize, Identity};
use crate::database::{DocumentStore, FilterData, Repository};
use crate::models::{Comment, EmbeddedList, Like, Post, User};

const POST_NOT_FOUND: &str = "Post not found";

/// Posts and their embedded likes and comments.
#[derive(Clone)]
pub struct PostService {
    posts: Repository<Post>,
    users: Repository<User>,
    max_attempts: u32,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self {
            posts: Repository::new(store.clone()),
            users: Repository::new(store),
            max_attempts,
        }
    }

    #[instrument(name = "posts.create", skip(self, text), fields(user_id = %identity.id))]
    pub async fn create(&self, identity: &Identity, text: String) -> Result<Post, ServiceError> {
        let author = self.author(identity).await?;
        let post = Post {
            id: Uuid::new_v4(),
            user: author.id,
            text,
            name: author.name,
            avatar: author.avatar,
            likes: EmbeddedList::new(),
            comments: EmbeddedList::new(),
            date: Utc::now(),
        };

        self.posts.insert(&post).await?;
        info!(post_id = %post.id, "Created post");
        Ok(post)
    }

    /// All posts, newest first.
    pub async fn list(&self) -> Result<Vec<Post>, ServiceError> {
        let mut posts = self.posts.find_all(&FilterData::all()).await?;
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    pub async fn get(&self, post_id: Uuid) -> Result<Post, ServiceError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .map(|found| found.doc)
            .ok_or(ServiceError::NotFound(POST_NOT_FOUND))
    }

    #[instrument(name = "posts.delete", skip(self), fields(user_id = %identity.id))]
    pub async fn delete(&self, identity: &Identity, post_id: Uuid) -> Result<(), ServiceError> {
        let post = self.get(post_id).await?;
        if let Err(denied) = authorize(post.user, identity) {
            warn!("Post deletion denied");
            return Err(denied.into());
        }

        self.posts.remove(post_id).await?;
        info!("Removed post");
        Ok(())
    }

    #[instrument(name = "posts.like", skip(self), fields(user_id = %identity.id))]
    pub async fn like(&self, identity: &Identity, post_id: Uuid) -> Result<EmbeddedList<Like>, ServiceError> {
        let caller = identity.id;
        let likes = self
            .mutate(post_id, |post| {
                if post.likes.any(|like| like.user == caller) {
                    return Err(ServiceError::AlreadyLiked);
                }
                post.likes.insert_head(Like { id: Uuid::new_v4(), user: caller });
                Ok(post.likes.clone())
            })
            .await?;

        debug!(likes = likes.len(), "Liked post");
        Ok(likes)
    }

    #[instrument(name = "posts.unlike", skip(self), fields(user_id = %identity.id))]
    pub async fn unlike(&self, identity: &Identity, post_id: Uuid) -> Result<EmbeddedList<Like>, ServiceError> {
        let caller = identity.id;
        let likes = self
            .mutate(post_id, |post| {
                post.likes
                    .remove_first_where(|like| like.user == caller)
                    .ok_or(ServiceError::NotLiked)?;
                Ok(post.likes.clone())
            })
            .await?;

        debug!(likes = likes.len(), "Unliked post");
        Ok(likes)
    }

    #[instrument(name = "posts.add_comment", skip(self, text), fields(user_id = %identity.id))]
    pub async fn add_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        text: String,
    ) -> Result<EmbeddedList<Comment>, ServiceError> {
        let author = self.author(identity).await?;
        let comment = Comment {
            id: Uuid::new_v4(),
            user: author.id,
            text,
            name: author.name,
            avatar: author.avatar,
            date: Utc::now(),
        };

        let comments = self
            .mutate(post_id, |post| {
                post.comments.insert_head(comment.clone());
                Ok(post.comments.clone())
            })
            .await?;

        debug!(comment_id = %comment.id, "Added comment");
        Ok(comments)
    }

    #[instrument(name = "posts.remove_comment", skip(self), fields(user_id = %identity.id))]
    pub async fn remove_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<EmbeddedList<Comment>, ServiceError> {
        let comments = self
            .mutate(post_id, |post| {
                let comment = post
                    .comments
                    .find(comment_id)
                    .ok_or(ServiceError::NotFound("Comment does not exist"))?;
                authorize(comment.user, identity)?;

                post.comments.remove_by_id(comment_id);
                Ok(post.comments.clone())
            })
            .await?;

        debug!("Removed comment");
        Ok(comments)
    }

    async fn mutate<R, F>(&self, post_id: Uuid, apply: F) -> Result<R, ServiceError>
    where
        F: FnMut(&mut Post) -> Result<R, ServiceError> + Send,
        R: Send,
    {
        self.posts
            .update_by_id(post_id, self.max_attempts, apply)
            .await?
            .map(|(_, outcome)| outcome)
            .ok_or(ServiceError::NotFound(POST_NOT_FOUND))
    }

    async fn author(&self, identity: &Identity) -> Result<User, ServiceError> {
        self.users
            .find_by_id(identity.id)
            .await?
            .map(|found| found.doc)
            .ok_or(ServiceError::NotFound("User not found"))
    }
}
