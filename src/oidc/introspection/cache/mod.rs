use async_trait::async_trait;
use std::fmt::Debug;
use std::ops::Deref;

pub mod in_memory;

pub type Response = super::SessionIntrospectionResponse;

/// Stores introspection results keyed by access token, so repeated requests
/// with the same token skip the round trip to the authority.
#[async_trait]
pub trait IntrospectionCache: Send + Sync + std::fmt::Debug {
    async fn get(&self, token: &str) -> Option<Response>;

    /// Only active responses carrying an `exp` are worth keeping.
    async fn set(&self, token: &str, response: Response);

    async fn remove(&self, token: &str);

    async fn clear(&self);
}

#[async_trait]
impl<T, V> IntrospectionCache for T
where
    T: Deref<Target = V> + Send + Sync + Debug,
    V: IntrospectionCache,
{
    async fn get(&self, token: &str) -> Option<Response> {
        self.deref().get(token).await
    }

    async fn set(&self, token: &str, response: Response) {
        self.deref().set(token, response).await
    }

    async fn remove(&self, token: &str) {
        self.deref().remove(token).await
    }

    async fn clear(&self) {
        self.deref().clear().await
    }
}
