//! Threaded comments
//!
//! Only top-level comments can be replied to, so threads are exactly two
//! levels deep. Deleting a thread root deletes its replies with it.

use crate::element::{unix_now, ElementId};
use crate::error::{ModelError, ModelResult};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(String);

impl CommentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Thread root when `None`
    pub parent: Option<CommentId>,
    pub element: Option<ElementId>,
    pub page: u32,
    pub anchor: Point,
    pub text: String,
    pub author: String,
    pub created_at: i64,
    pub modified_at: i64,
    pub resolved: bool,
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(page: u32, anchor: Point, text: impl Into<String>, author: impl Into<String>) -> Self {
        let now = unix_now();
        Self {
            id: CommentId::generate(),
            parent: None,
            element: None,
            page,
            anchor,
            text: text.into(),
            author: author.into(),
            created_at: now,
            modified_at: now,
            resolved: false,
            replies: Vec::new(),
        }
    }

    pub fn on_element(mut self, element: ElementId) -> Self {
        self.element = Some(element);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentThreads {
    threads: Vec<Comment>,
}

impl CommentThreads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[Comment] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn add_thread(&mut self, mut comment: Comment) -> CommentId {
        comment.parent = None;
        let id = comment.id.clone();
        self.threads.push(comment);
        id
    }

    /// Append a reply to a top-level comment.
    pub fn reply(
        &mut self,
        parent: &CommentId,
        text: impl Into<String>,
        author: impl Into<String>,
    ) -> ModelResult<CommentId> {
        let Some(root) = self.threads.iter_mut().find(|comment| &comment.id == parent) else {
            if self.get(parent).is_some() {
                return Err(ModelError::NotATopLevelComment(parent.clone()));
            }
            return Err(ModelError::ParentNotFound(parent.clone()));
        };

        let mut reply = Comment::new(root.page, root.anchor, text, author);
        reply.parent = Some(root.id.clone());
        reply.element = root.element.clone();
        let id = reply.id.clone();
        root.replies.push(reply);
        root.modified_at = unix_now();
        Ok(id)
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.threads.iter().find_map(|root| {
            if &root.id == id {
                Some(root)
            } else {
                root.replies.iter().find(|reply| &reply.id == id)
            }
        })
    }

    pub fn edit(&mut self, id: &CommentId, text: impl Into<String>) -> ModelResult<()> {
        let comment = self.get_mut(id).ok_or_else(|| ModelError::CommentNotFound(id.clone()))?;
        comment.text = text.into();
        comment.modified_at = unix_now();
        Ok(())
    }

    pub fn set_resolved(&mut self, id: &CommentId, resolved: bool) -> ModelResult<()> {
        let comment = self.get_mut(id).ok_or_else(|| ModelError::CommentNotFound(id.clone()))?;
        comment.resolved = resolved;
        comment.modified_at = unix_now();
        Ok(())
    }

    /// Delete a comment. Deleting a thread root removes its replies too.
    pub fn delete(&mut self, id: &CommentId) -> ModelResult<Comment> {
        if let Some(index) = self.threads.iter().position(|root| &root.id == id) {
            return Ok(self.threads.remove(index));
        }
        for root in &mut self.threads {
            if let Some(index) = root.replies.iter().position(|reply| &reply.id == id) {
                return Ok(root.replies.remove(index));
            }
        }
        Err(ModelError::CommentNotFound(id.clone()))
    }

    pub fn threads_on_page(&self, page: u32) -> Vec<&Comment> {
        self.threads.iter().filter(|root| root.page == page).collect()
    }

    pub fn threads_for_element(&self, element: &ElementId) -> Vec<&Comment> {
        self.threads.iter().filter(|root| root.element.as_ref() == Some(element)).collect()
    }

    /// Remove every thread anchored to `element`. Returns how many were removed.
    pub fn purge_element(&mut self, element: &ElementId) -> usize {
        let before = self.threads.len();
        self.threads.retain(|root| root.element.as_ref() != Some(element));
        before - self.threads.len()
    }

    pub fn unresolved_count(&self) -> usize {
        self.threads.iter().filter(|root| !root.resolved).count()
    }

    fn get_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        for root in &mut self.threads {
            if &root.id == id {
                return Some(root);
            }
            if let Some(reply) = root.replies.iter_mut().find(|reply| &reply.id == id) {
                return Some(reply);
            }
        }
        None
    }
}
