use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ClientError;

/// Answers whether a full login identifier (handle + domain suffix) is
/// already taken within an organizational unit.
#[async_trait]
pub trait ExistenceCheck: Send + Sync {
    async fn exists(&self, full_identifier: &str, scope: &str) -> Result<bool, ClientError>;
}

#[async_trait]
impl<T: ExistenceCheck + ?Sized> ExistenceCheck for Arc<T> {
    async fn exists(&self, full_identifier: &str, scope: &str) -> Result<bool, ClientError> {
        (**self).exists(full_identifier, scope).await
    }
}
