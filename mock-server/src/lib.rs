use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEMO_USERNAME: &str = "kari@example.no";
pub const DEMO_PASSWORD: &str = "hemmelig";
pub const CLIENT_TOKEN_HEADER: &str = "x-client-token";

#[derive(Clone, Debug, Serialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub category_id: u64,
    /// Price in øre.
    #[serde(skip)]
    pub price: u64,
    pub gross_price: String,
}

#[derive(Clone, Debug)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub children: Vec<u64>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CartItemInput {
    pub product_id: u64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CartItemsInput {
    pub items: Vec<CartItemInput>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, (String, Value)>,
    sessions: HashMap<String, String>,
    carts: HashMap<String, BTreeMap<u64, i64>>,
    products: BTreeMap<u64, Product>,
    categories: Vec<Category>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn error(status: StatusCode, detail: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": detail })))
}

fn price(ore: u64) -> String {
    format!("{}.{:02}", ore / 100, ore % 100)
}

fn product(id: u64, name: &str, category_id: u64, ore: u64) -> Product {
    Product {
        id,
        name: name.to_string(),
        category_id,
        price: ore,
        gross_price: price(ore),
    }
}

impl Store {
    /// Demo catalog with one user account.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.users.insert(
            DEMO_USERNAME.to_string(),
            (
                DEMO_PASSWORD.to_string(),
                json!({
                    "id": 1001,
                    "first_name": "Kari",
                    "last_name": "Nordmann",
                    "email": DEMO_USERNAME,
                }),
            ),
        );
        for p in [
            product(1, "Lettmelk 1 l", 10, 2190),
            product(7, "Brunost 500 g", 20, 5990),
            product(42, "Grovbrød", 30, 3950),
            product(9329, "Egg 12 stk", 20, 4500),
        ] {
            store.products.insert(p.id, p);
        }
        store.categories = vec![
            Category { id: 1, name: "Meieri og egg".to_string(), children: vec![10, 20] },
            Category { id: 10, name: "Melk".to_string(), children: Vec::new() },
            Category { id: 20, name: "Ost og egg".to_string(), children: Vec::new() },
            Category { id: 2, name: "Bakeri".to_string(), children: vec![30] },
            Category { id: 30, name: "Brød".to_string(), children: Vec::new() },
        ];
        store
    }

    fn category(&self, id: u64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn category_tree(&self) -> Value {
        let roots: Vec<Value> = self
            .categories
            .iter()
            .filter(|c| !c.children.is_empty())
            .map(|root| {
                let children: Vec<Value> = root
                    .children
                    .iter()
                    .filter_map(|id| self.category(*id))
                    .map(|c| json!({ "id": c.id, "name": c.name }))
                    .collect();
                json!({ "id": root.id, "name": root.name, "children": children })
            })
            .collect();
        json!({ "results": roots })
    }

    fn cart_document(&self, user: &str) -> Value {
        let mut total: u64 = 0;
        let items: Vec<Value> = self
            .carts
            .get(user)
            .into_iter()
            .flatten()
            .filter_map(|(id, qty)| self.products.get(id).map(|p| (p, *qty)))
            .map(|(p, qty)| {
                let line = p.price.saturating_mul(qty.unsigned_abs());
                total = total.saturating_add(line);
                json!({ "product": p, "quantity": qty, "display_price_total": price(line) })
            })
            .collect();
        json!({ "items": items, "total": price(total) })
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/user/login/", post(login))
        .route("/cart/", get(get_cart))
        .route("/cart/items/", post(update_cart_items))
        .route("/products/{id}/", get(get_product))
        .route("/productcategories/", get(list_categories))
        .route("/productcategories/{id}/", get(get_category))
        .route("/search/", get(search))
        .layer(middleware::from_fn(require_client_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_client_token(request: Request, next: Next) -> Response {
    let present = request
        .headers()
        .get(CLIENT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.is_empty());
    if !present {
        return error(StatusCode::FORBIDDEN, "Missing client token.").into_response();
    }
    next.run(request).await
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| pair.trim().strip_prefix("sessionid=").map(str::to_string))
}

/// Username bound to the request's session cookie.
fn session_user(store: &Store, headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
    session_id(headers)
        .and_then(|id| store.sessions.get(&id).cloned())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Authentication credentials were not provided."))
}

async fn login(State(db): State<Db>, Form(input): Form<LoginForm>) -> ApiResult {
    let mut store = db.write().await;
    let profile = match store.users.get(&input.username) {
        Some((password, profile)) if *password == input.password => profile.clone(),
        _ => {
            warn!(username = %input.username, "rejected login");
            return Err(error(StatusCode::UNAUTHORIZED, "Invalid username or password."));
        }
    };
    let session = Uuid::new_v4().simple().to_string();
    store.sessions.insert(session.clone(), input.username.clone());
    info!(username = %input.username, "session opened");
    Ok(Json(json!({
        "sessionid": session,
        "is_authenticated": true,
        "user": profile,
    })))
}

async fn get_cart(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    let store = db.read().await;
    let user = session_user(&store, &headers)?;
    Ok(Json(store.cart_document(&user)))
}

async fn update_cart_items(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CartItemsInput>,
) -> ApiResult {
    let mut store = db.write().await;
    let user = session_user(&store, &headers)?;
    if let Some(unknown) = input.items.iter().find(|i| !store.products.contains_key(&i.product_id)) {
        return Err(error(
            StatusCode::BAD_REQUEST,
            &format!("Unknown product {}.", unknown.product_id),
        ));
    }
    let out_of_range = input.items.iter().find(|i| {
        i.quantity > 0
            && store
                .products
                .get(&i.product_id)
                .and_then(|p| p.price.checked_mul(i.quantity.unsigned_abs()))
                .is_none()
    });
    if let Some(item) = out_of_range {
        return Err(error(
            StatusCode::BAD_REQUEST,
            &format!("Quantity {} is out of range for product {}.", item.quantity, item.product_id),
        ));
    }
    let cart = store.carts.entry(user.clone()).or_default();
    for item in &input.items {
        if item.quantity <= 0 {
            cart.remove(&item.product_id);
        } else {
            cart.insert(item.product_id, item.quantity);
        }
    }
    Ok(Json(store.cart_document(&user)))
}

async fn get_product(State(db): State<Db>, Path(id): Path<u64>) -> ApiResult {
    let store = db.read().await;
    store
        .products
        .get(&id)
        .map(|p| Json(json!(p)))
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "No Product matches the given query."))
}

async fn list_categories(State(db): State<Db>) -> ApiResult {
    Ok(Json(db.read().await.category_tree()))
}

async fn get_category(State(db): State<Db>, Path(id): Path<u64>) -> ApiResult {
    let store = db.read().await;
    let category = store
        .category(id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "No ProductCategory matches the given query."))?;
    let products: Vec<&Product> = store.products.values().filter(|p| p.category_id == id).collect();
    Ok(Json(json!({
        "id": category.id,
        "name": category.name,
        "products": products,
    })))
}

async fn search(State(db): State<Db>, Query(params): Query<SearchParams>) -> ApiResult {
    let store = db.read().await;
    let query = params.q.unwrap_or_default();
    let needle = query.to_lowercase();
    let products: Vec<&Product> = if needle.is_empty() {
        Vec::new()
    } else {
        store
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    };
    Ok(Json(json!({ "query": query, "products": products })))
}
