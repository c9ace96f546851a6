use super::{normalize, PostStore, RowRef, StoreError};
use crate::models::Post;

/// Session-only table held in process memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    posts: Vec<Post>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing posts (used by imports and tests)
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self { posts }
    }
}

impl PostStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn add(&mut self, post: Post) -> Result<(), StoreError> {
        self.posts.push(normalize(post)?);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self.posts.clone())
    }

    fn update(&mut self, target: &RowRef, post: Post) -> Result<(), StoreError> {
        let post = normalize(post)?;
        let index = target.resolve(&self.posts)?;
        self.posts[index] = post;
        Ok(())
    }

    fn delete(&mut self, target: &RowRef) -> Result<(), StoreError> {
        let index = target.resolve(&self.posts)?;
        self.posts.remove(index);
        Ok(())
    }
}
