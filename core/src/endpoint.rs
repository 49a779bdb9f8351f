//! The fixed set of backend endpoints the client speaks to.

use url::form_urlencoded;

use crate::http::HttpMethod;

/// Whether a failed call emits a diagnostic on the log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticPolicy {
    Log,
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Cart,
    CartItems,
    Product(u64),
    Categories,
    Category(u64),
    Search(String),
}

impl Endpoint {
    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Login | Endpoint::CartItems => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    /// Path relative to the API root. The search query is form-encoded.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Login => "/user/login/".to_string(),
            Endpoint::Cart => "/cart/".to_string(),
            Endpoint::CartItems => "/cart/items/".to_string(),
            Endpoint::Product(id) => format!("/products/{id}/"),
            Endpoint::Categories => "/productcategories/".to_string(),
            Endpoint::Category(id) => format!("/productcategories/{id}/"),
            Endpoint::Search(query) => {
                let q: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
                format!("/search/?q={q}")
            }
        }
    }

    /// Stable label for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Login => "login",
            Endpoint::Cart => "cart",
            Endpoint::CartItems => "cart_items",
            Endpoint::Product(_) => "product",
            Endpoint::Categories => "categories",
            Endpoint::Category(_) => "category",
            Endpoint::Search(_) => "search",
        }
    }

    pub fn default_diagnostics(&self) -> DiagnosticPolicy {
        match self {
            Endpoint::Category(_) => DiagnosticPolicy::Silent,
            _ => DiagnosticPolicy::Log,
        }
    }
}
