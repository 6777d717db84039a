//! Cache infrastructure - Product cache implementations

mod codec;
mod factory;
mod in_memory;
mod redis;

pub use codec::{CodecType, JsonCodec, MessagePackCodec, ProductCodec};
pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::InMemoryProductCache;
pub use redis::{RedisCacheConfig, RedisProductCache};
