//! Request payloads and session identifiers.
//!
//! # Design
//! The cart mutation wire shape (`items` array of `{product_id, quantity}`)
//! must be reproduced exactly, so it is a serde struct with fixed field order
//! rather than an ad-hoc JSON tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::error::ClientError;

/// One line of a cart mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: u64,
    pub quantity: i64,
}

/// Request payload for `POST /cart/items/`. May be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartMutation {
    pub items: Vec<CartItem>,
}

impl CartMutation {
    pub fn new(items: impl IntoIterator<Item = CartItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Wrap a single product/quantity pair.
    pub fn single(product_id: u64, quantity: i64) -> Self {
        let mutation = Self::new([CartItem {
            product_id,
            quantity,
        }]);
        debug!(body = %mutation.to_json().unwrap_or_default(), "built cart mutation");
        mutation
    }

    pub fn push(&mut self, product_id: u64, quantity: i64) {
        self.items.push(CartItem {
            product_id,
            quantity,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|e| ClientError::Serialization(e.to_string()))
    }

    pub fn to_document(&self) -> Result<Document, ClientError> {
        let value =
            serde_json::to_value(self).map_err(|e| ClientError::Serialization(e.to_string()))?;
        Document::try_from(value)
    }
}

/// Server-issued session token, sent back as `Cookie: sessionid=<token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn cookie_value(&self) -> String {
        format!("sessionid={}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}
