//! Wire encodings for cached products

use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::product::Product;
use crate::domain::DomainError;

/// Marshals products to and from cache values
pub trait ProductCodec: Send + Sync + Debug {
    fn encode(&self, product: &Product) -> Result<Vec<u8>, DomainError>;

    fn decode(&self, data: &[u8]) -> Result<Product, DomainError>;

    /// Short codec name used in logs and configuration
    fn name(&self) -> &'static str;
}

/// JSON encoding via serde_json
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl ProductCodec for JsonCodec {
    fn encode(&self, product: &Product) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(product)
            .map_err(|e| DomainError::cache(format!("Failed to encode product as JSON: {}", e)))
    }

    fn decode(&self, data: &[u8]) -> Result<Product, DomainError> {
        serde_json::from_slice(data)
            .map_err(|e| DomainError::cache(format!("Failed to decode JSON product: {}", e)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// MessagePack encoding via rmp-serde, with named struct fields
#[derive(Debug, Clone, Default)]
pub struct MessagePackCodec;

impl ProductCodec for MessagePackCodec {
    fn encode(&self, product: &Product) -> Result<Vec<u8>, DomainError> {
        rmp_serde::to_vec_named(product).map_err(|e| {
            DomainError::cache(format!("Failed to encode product as MessagePack: {}", e))
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Product, DomainError> {
        rmp_serde::from_slice(data).map_err(|e| {
            DomainError::cache(format!("Failed to decode MessagePack product: {}", e))
        })
    }

    fn name(&self) -> &'static str {
        "msgpack"
    }
}

/// Supported codecs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodecType {
    #[default]
    Json,
    MessagePack,
}

impl CodecType {
    pub fn build(self) -> Arc<dyn ProductCodec> {
        match self {
            CodecType::Json => Arc::new(JsonCodec),
            CodecType::MessagePack => Arc::new(MessagePackCodec),
        }
    }
}

impl std::fmt::Display for CodecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecType::Json => write!(f, "json"),
            CodecType::MessagePack => write!(f, "msgpack"),
        }
    }
}

impl std::str::FromStr for CodecType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(CodecType::Json),
            "msgpack" | "messagepack" => Ok(CodecType::MessagePack),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache codec: {}. Valid codecs: json, msgpack",
                s
            ))),
        }
    }
}
