//! Session-aware client for the grocery API.
//!
//! # Design
//! `SessionClient` owns the only mutable state in the crate: the current
//! session token and the last profile returned by login. It is constructed
//! explicitly and shared by reference, one session per instance.
//!
//! Every operation runs the same pipeline: build an `HttpRequest` (the
//! `build_*` methods, pure apart from reading the session), hand it to the
//! `Transport` once, classify the response, and report failures according
//! to the endpoint's diagnostic policy. Operations never panic and never
//! retry; callers get `Ok(Document)` or the reason there is no result.
//!
//! Session state sits behind a lock that is released before any await, so
//! independent requests may run concurrently. Concurrent `authenticate` and
//! `logout` calls race; callers are expected to serialize them.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, instrument};

use crate::classify::{classify, report};
use crate::config::ClientConfig;
use crate::document::Document;
use crate::endpoint::{DiagnosticPolicy, Endpoint};
use crate::error::ClientError;
use crate::headers::request_headers;
use crate::http::{HttpRequest, RequestBody, ReqwestTransport, Transport};
use crate::types::{CartMutation, SessionToken};

/// Field of the login response that carries the session token.
const SESSION_FIELD: &str = "sessionid";

#[derive(Debug, Default)]
struct SessionState {
    token: Option<SessionToken>,
    profile: Option<Document>,
}

pub struct SessionClient<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    state: RwLock<SessionState>,
}

impl SessionClient<ReqwestTransport> {
    /// Client over `reqwest`, honoring the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> SessionClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Session state
    // -----------------------------------------------------------------------

    pub fn is_authenticated(&self) -> bool {
        self.read_state().token.is_some()
    }

    pub fn session_token(&self) -> Option<SessionToken> {
        self.read_state().token.clone()
    }

    /// Profile from the last successful login. Survives `logout`.
    pub fn profile(&self) -> Option<Document> {
        self.read_state().profile.clone()
    }

    /// Forget the session token. Idempotent.
    pub fn logout(&self) {
        if self.write_state().token.take().is_some() {
            info!("session cleared");
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The retained profile if a session is already open.
    fn open_session_profile(&self) -> Option<Document> {
        let state = self.read_state();
        state
            .token
            .as_ref()
            .map(|_| state.profile.clone().unwrap_or_default())
    }

    fn store_session(&self, token: SessionToken, profile: Document) {
        let mut state = self.write_state();
        state.token = Some(token);
        state.profile = Some(profile);
    }

    // -----------------------------------------------------------------------
    // Request construction
    // -----------------------------------------------------------------------

    /// Assemble a request for `endpoint`, attaching identity headers, body
    /// headers, and the session cookie if a session is open right now.
    pub fn build_request(&self, endpoint: &Endpoint, body: RequestBody) -> HttpRequest {
        let session = self.session_token();
        HttpRequest {
            method: endpoint.method(),
            url: format!("{}{}", self.config.base_url, endpoint.path()),
            headers: request_headers(&self.config.credentials, body.kind(), session.as_ref()),
            body: body.into_string(),
        }
    }

    pub fn build_login(&self, username: &str, password: &str) -> HttpRequest {
        let body = RequestBody::form([("username", username), ("password", password)]);
        self.build_request(&Endpoint::Login, body)
    }

    pub fn build_fetch_cart(&self) -> HttpRequest {
        self.build_request(&Endpoint::Cart, RequestBody::Empty)
    }

    pub fn build_update_cart(&self, mutation: &CartMutation) -> Result<HttpRequest, ClientError> {
        let body = RequestBody::Json(mutation.to_json()?);
        Ok(self.build_request(&Endpoint::CartItems, body))
    }

    pub fn build_fetch_product(&self, product_id: u64) -> HttpRequest {
        self.build_request(&Endpoint::Product(product_id), RequestBody::Empty)
    }

    pub fn build_fetch_categories(&self) -> HttpRequest {
        self.build_request(&Endpoint::Categories, RequestBody::Empty)
    }

    pub fn build_fetch_products_by_category(&self, category_id: u64) -> HttpRequest {
        self.build_request(&Endpoint::Category(category_id), RequestBody::Empty)
    }

    pub fn build_search_products(&self, query: &str) -> HttpRequest {
        self.build_request(&Endpoint::Search(query.to_string()), RequestBody::Empty)
    }

    /// Cart mutation for a single product, ready for `update_cart`.
    pub fn build_cart_mutation(&self, product_id: u64, quantity: i64) -> CartMutation {
        CartMutation::single(product_id, quantity)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Log in and open a session.
    ///
    /// When a session is already open this performs no request and returns
    /// the retained profile. A failed login leaves the state untouched.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Document, ClientError> {
        if let Some(profile) = self.open_session_profile() {
            debug!("already authenticated, skipping login");
            return Ok(profile);
        }

        let endpoint = Endpoint::Login;
        let request = self.build_login(username, password);
        let profile = self.send(&endpoint, request).await?;

        let Some(token) = profile.get_str(SESSION_FIELD).map(SessionToken::new) else {
            let err = ClientError::MissingSessionToken;
            report(endpoint.name(), self.diagnostics_for(&endpoint), &err);
            return Err(err);
        };

        self.store_session(token, profile.clone());
        info!("session opened");
        Ok(profile)
    }

    /// Items in the cart and the total price.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Document, ClientError> {
        let request = self.build_fetch_cart();
        self.send(&Endpoint::Cart, request).await
    }

    /// Apply `mutation` to the server-side cart and return the updated cart.
    #[instrument(skip(self, mutation), fields(items = mutation.len()))]
    pub async fn update_cart(&self, mutation: &CartMutation) -> Result<Document, ClientError> {
        let endpoint = Endpoint::CartItems;
        let request = match self.build_update_cart(mutation) {
            Ok(request) => request,
            Err(err) => {
                report(endpoint.name(), self.diagnostics_for(&endpoint), &err);
                return Err(err);
            }
        };
        self.send(&endpoint, request).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_product(&self, product_id: u64) -> Result<Document, ClientError> {
        let request = self.build_fetch_product(product_id);
        self.send(&Endpoint::Product(product_id), request).await
    }

    /// All categories with their child categories.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> Result<Document, ClientError> {
        let request = self.build_fetch_categories();
        self.send(&Endpoint::Categories, request).await
    }

    /// Products in one category. Failures are not logged unless
    /// `ClientConfig::category_diagnostics` asks for it.
    #[instrument(skip(self))]
    pub async fn fetch_products_by_category(&self, category_id: u64) -> Result<Document, ClientError> {
        let request = self.build_fetch_products_by_category(category_id);
        self.send(&Endpoint::Category(category_id), request).await
    }

    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Document, ClientError> {
        let request = self.build_search_products(query);
        self.send(&Endpoint::Search(query.to_string()), request).await
    }

    fn diagnostics_for(&self, endpoint: &Endpoint) -> DiagnosticPolicy {
        match endpoint {
            Endpoint::Category(_) => self.config.category_diagnostics,
            other => other.default_diagnostics(),
        }
    }

    async fn send(&self, endpoint: &Endpoint, request: HttpRequest) -> Result<Document, ClientError> {
        debug!(
            endpoint = endpoint.name(),
            method = request.method.as_str(),
            url = %request.url,
            "sending request"
        );
        let outcome = classify(self.transport.execute(request).await);
        if let Err(err) = &outcome {
            report(endpoint.name(), self.diagnostics_for(endpoint), err);
        }
        outcome
    }
}

impl<T: Transport> std::fmt::Debug for SessionClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let authenticated = self.is_authenticated();
        f.debug_struct("SessionClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &authenticated)
            .finish_non_exhaustive()
    }
}
