use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::{DateTime, Utc};
use openidconnect::TokenIntrospectionResponse;

use super::Response;

#[derive(Debug, Clone, Default)]
pub struct InMemoryIntrospectionCache {
    entries: Arc<RwLock<HashMap<String, (Response, DateTime<Utc>)>>>,
}

impl InMemoryIntrospectionCache {
    /// Creates a new in memory cache backed by a HashMap.
    /// No max capacity limit is enforced. Expired entries are dropped when read
    /// and swept whenever a new entry is stored.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl super::IntrospectionCache for InMemoryIntrospectionCache {
    async fn get(&self, token: &str) -> Option<Response> {
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                None => return None,
                Some((response, expires_at)) if *expires_at > Utc::now() => {
                    return Some(response.clone())
                }
                Some(_) => {}
            }
        }

        self.entries.write().await.remove(token);
        None
    }

    async fn set(&self, token: &str, response: Response) {
        let expires_at = match response.exp() {
            Some(exp) if response.active() => exp,
            _ => return,
        };

        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, exp)| *exp > now);
        entries.insert(token.to_string(), (response, expires_at));
    }

    async fn remove(&self, token: &str) {
        self.entries.write().await.remove(token);
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
