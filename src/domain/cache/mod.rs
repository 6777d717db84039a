//! Cache domain - product cache contract and key conventions

mod key;
mod repository;

pub use key::{DefaultProductKeyGenerator, ProductKeyGenerator};
pub use repository::ProductCache;

#[cfg(test)]
pub use repository::mock::MockProductCache;
