//! Redis-based implementation of Transport
//!
//! Key layout:
//! - `turtle:topic:<topic>` pub/sub channel per topic
//! - `turtle:service:<name>:presence` exists while a server is up
//! - `turtle:service:<name>:requests` list the server pops requests from
//! - `turtle:reply:<correlation_id>` list the reply is pushed onto

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use tracing::{debug, error};

use crate::{
    error::{MeshError, MeshResult},
    mesh::{MessageStream, Transport},
    message::{Message, REPLY_TO_KEY},
    types::{ServiceName, Topic},
};

/// How long a single BRPOP blocks before the reply wait loops
const REPLY_POLL_SECS: f64 = 1.0;

/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Maximum number of connections in the pool
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 4,
        }
    }
}

impl RedisConfig {
    /// Create a new Redis configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the pool size
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }
}

/// Redis-backed transport
pub struct RedisTransport {
    pool: deadpool_redis::Pool,
    config: RedisConfig,
}

impl RedisTransport {
    /// Connect with default configuration
    pub async fn new(url: impl Into<String>) -> MeshResult<Self> {
        Self::with_config(RedisConfig::new(url)).await
    }

    /// Connect with custom configuration
    pub async fn with_config(config: RedisConfig) -> MeshResult<Self> {
        let mut redis_config = deadpool_redis::Config::from_url(&config.url);
        redis_config.pool = Some(deadpool_redis::PoolConfig::new(config.pool_size));

        let pool = redis_config
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| MeshError::ConnectionFailed(e.to_string()))?;

        // Test connection
        let mut conn = pool
            .get()
            .await
            .map_err(|e| MeshError::ConnectionFailed(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| MeshError::ConnectionFailed(format!("PING failed: {}", e)))?;

        debug!("Redis transport connected to {}", config.url);

        Ok(Self { pool, config })
    }

    async fn get_connection(&self) -> MeshResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| MeshError::ConnectionFailed(e.to_string()))
    }

    fn topic_key(topic: &Topic) -> String {
        format!("turtle:topic:{}", topic)
    }

    fn presence_key(service: &ServiceName) -> String {
        format!("turtle:service:{}:presence", service)
    }

    fn requests_key(service: &ServiceName) -> String {
        format!("turtle:service:{}:requests", service)
    }

    fn reply_key(correlation_id: &str) -> String {
        format!("turtle:reply:{}", correlation_id)
    }

    fn presence_from(service: &ServiceName, exists: redis::RedisResult<bool>) -> bool {
        match exists {
            Ok(ready) => ready,
            Err(e) => {
                error!("Failed to check presence of service {}: {}", service, e);
                false
            }
        }
    }
}

#[async_trait]
impl Transport for RedisTransport {
    async fn publish(&self, topic: &Topic, message: Message) -> MeshResult<()> {
        let json = message.to_json()?;

        let mut conn = self.get_connection().await?;
        conn.publish::<_, _, ()>(Self::topic_key(topic), json)
            .await
            .map_err(|e| MeshError::SendFailed(e.to_string()))?;

        debug!("Published message {} to topic {}", message.id, topic);
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> MeshResult<MessageStream> {
        // Pub/sub needs a dedicated connection
        let client = redis::Client::open(self.config.url.as_str())
            .map_err(|e| MeshError::ConnectionFailed(e.to_string()))?;

        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| MeshError::ConnectionFailed(e.to_string()))?;

        pubsub
            .subscribe(Self::topic_key(topic))
            .await
            .map_err(|e| MeshError::SubscribeFailed(e.to_string()))?;

        debug!("Subscribed to topic {}", topic);

        let stream = pubsub.into_on_message().map(|msg| {
            let payload: String = msg.get_payload().map_err(|e| {
                error!("Failed to get message payload: {}", e);
                MeshError::DeserializationFailed(e.to_string())
            })?;

            Message::from_json(&payload).map_err(|e| {
                error!("Failed to deserialize message: {}", e);
                MeshError::DeserializationFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn service_ready(&self, service: &ServiceName) -> bool {
        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get connection: {}", e);
                return false;
            }
        };

        let exists = conn.exists::<_, bool>(Self::presence_key(service)).await;
        Self::presence_from(service, exists)
    }

    async fn call(&self, service: &ServiceName, request: Message) -> MeshResult<Message> {
        let correlation_id = request.id.to_string();
        let reply_key = Self::reply_key(&correlation_id);
        let request = request.with_metadata(REPLY_TO_KEY, reply_key.clone());
        let json = request.to_json()?;

        let mut conn = self.get_connection().await?;
        conn.lpush::<_, _, ()>(Self::requests_key(service), json)
            .await
            .map_err(|e| MeshError::SendFailed(e.to_string()))?;

        debug!("Sent request {} to service {}", correlation_id, service);

        loop {
            let popped: Option<(String, String)> = conn
                .brpop(&reply_key, REPLY_POLL_SECS)
                .await
                .map_err(|e| MeshError::ReceiveFailed(e.to_string()))?;

            let Some((_key, json)) = popped else {
                continue;
            };

            let reply = Message::from_json(&json)
                .map_err(|e| MeshError::DeserializationFailed(e.to_string()))?;
            debug!("Received reply for request {}", correlation_id);

            if let Some(reason) = reply.error() {
                return Err(MeshError::CallFailed {
                    service: service.to_string(),
                    reason: reason.to_string(),
                });
            }
            return Ok(reply);
        }
    }
}
