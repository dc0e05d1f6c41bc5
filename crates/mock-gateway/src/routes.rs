//! HTTP handlers.
//!
//! Everything under `/api/product-service` and `/api/user-service`, and the
//! password change, requires an access token in the `Authorization: Bearer`
//! header. Expired or malformed tokens get `401 {"message": ...}`, which is
//! what drives the client's refresh cycle.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Json, Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::Router;
use medmarket_models::{
    Cart, Company, CompanyDraft, CredentialPair, Order, OrderStatus, Page, PasswordChange, Product,
    Receipt, RegisterUser, UpdateCompany, UpdateUser, User,
};
use serde::Deserialize;
use tracing::info;

use crate::error::GatewayError;
use crate::state::{AppState, CompanyFilter, UserFilter};
use crate::tokens::TokenKind;

type Shared = State<Arc<AppState>>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the gateway router, everything mounted under `/api`.
pub fn router(state: Arc<AppState>) -> Router {
    let auth = Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/password/{email}", put(change_password));

    let products = Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_to_cart))
        .route(
            "/cart/items/{product_id}",
            put(set_cart_quantity).delete(remove_from_cart),
        )
        .route("/orders", get(all_orders))
        .route("/orders/create", post(create_order))
        .route("/orders/user", get(my_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(set_order_status))
        .route("/orders/{id}/receipt", get(order_receipt))
        .route("/orders/receipt/{number}", get(receipt_by_number));

    let users = Router::new()
        .route("/users", get(list_users))
        .route("/users/register", post(register_user))
        .route("/users/profile", get(user_profile))
        .route("/users/{id}", put(update_user).patch(set_user_availability))
        .route("/users/to-director/{id}", patch(promote_to_director))
        .route("/companies", get(list_companies).post(create_company))
        .route("/companies/limited", get(limited_companies))
        .route(
            "/companies/{id}",
            get(get_company).put(update_company).patch(set_company_availability),
        )
        .route("/companies/user/{email}", get(company_for_user));

    Router::new()
        .nest("/api/auth", auth)
        .nest("/api/product-service", products)
        .nest("/api/user-service", users)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Bearer extraction
// ---------------------------------------------------------------------------

/// The caller behind a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User e-mail (`sub`).
    pub email: String,
    /// Roles carried by the token.
    pub roles: Vec<String>,
}

impl AuthUser {
    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Sellers and admins see every order.
    fn is_privileged(&self) -> bool {
        self.has_role("ROLE_SELLER") || self.has_role("ROLE_ADMIN")
    }

    fn is_admin(&self) -> bool {
        self.has_role("ROLE_ADMIN")
    }

    fn require_admin(&self) -> Result<(), GatewayError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(GatewayError::Forbidden("Admin role required".into()))
        }
    }

    /// Admins manage every company, directors their own.
    fn require_manager_of(&self, state: &AppState, company_id: u64) -> Result<(), GatewayError> {
        if self.is_admin() {
            return Ok(());
        }
        let directs = self.has_role("ROLE_DIRECTOR")
            && state
                .account(&self.email)
                .is_some_and(|account| account.company_id == company_id);
        if directs {
            Ok(())
        } else {
            Err(GatewayError::Forbidden(
                "Director of this company or admin role required".into(),
            ))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| GatewayError::Unauthorized("missing bearer token".into()))?;

        let claims = state.issuer.verify(token, TokenKind::Access)?;
        Ok(Self {
            email: claims.sub,
            roles: claims.roles,
        })
    }
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    refresh: String,
}

#[derive(Deserialize)]
struct ProductFilter {
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItem {
    product_id: u64,
    quantity: u32,
}

#[derive(Deserialize)]
struct QuantityParam {
    quantity: u32,
}

#[derive(Deserialize)]
struct StatusFilter {
    status: Option<String>,
}

impl StatusFilter {
    fn parse(&self) -> Result<Option<OrderStatus>, GatewayError> {
        self.status
            .as_deref()
            .map(OrderStatus::parse)
            .transpose()
            .map_err(|e| GatewayError::BadRequest(e.to_string()))
    }
}

#[derive(Deserialize)]
struct StatusUpdate {
    status: String,
}

#[derive(Deserialize)]
struct AvailabilityParam {
    availability: bool,
}

#[derive(Deserialize)]
struct EmailParam {
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserParams {
    company_id: Option<u64>,
    availability: Option<bool>,
    full_name: Option<String>,
}

#[derive(Deserialize)]
struct CompanyParams {
    /// Comma-separated ids.
    ids: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    company_type: Option<String>,
    availability: Option<bool>,
}

impl CompanyParams {
    fn into_filter(self) -> Result<CompanyFilter, GatewayError> {
        let ids = self
            .ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<u64>()
                    .map_err(|_| GatewayError::BadRequest(format!("Invalid company id \"{id}\"")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompanyFilter {
            ids,
            name: self.name,
            company_type: self.company_type,
            availability: self.availability,
        })
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// `POST /api/auth/login`: exchange e-mail and password for a token pair.
async fn login(
    State(state): Shared,
    Json(req): Json<LoginRequest>,
) -> Result<Json<CredentialPair>, GatewayError> {
    let account = state.authenticate(&req.email, &req.password)?;
    let pair = state.issuer.issue_pair(&req.email, &account.roles)?;
    info!(user = %req.email, "login succeeded");
    Ok(Json(pair))
}

/// `POST /api/auth/refresh`: answer with the new access token as raw text.
async fn refresh(
    State(state): Shared,
    Json(req): Json<RefreshRequest>,
) -> Result<String, GatewayError> {
    let claims = state.issuer.verify(&req.refresh, TokenKind::Refresh)?;
    let roles = state.roles_of(&claims.sub)?;
    let token = state.issuer.issue(&claims.sub, &roles, TokenKind::Access)?;
    info!(user = %claims.sub, "access token refreshed");
    Ok(token)
}

/// `PUT /api/auth/password/{email}`: users change their own password.
async fn change_password(
    user: AuthUser,
    State(state): Shared,
    Path(email): Path<String>,
    Json(change): Json<PasswordChange>,
) -> Result<StatusCode, GatewayError> {
    if user.email != email {
        return Err(GatewayError::Forbidden(
            "Cannot change another user's password".into(),
        ));
    }
    state.change_password(&email, &change)?;
    info!(user = %email, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

async fn list_products(
    _user: AuthUser,
    State(state): Shared,
    Query(filter): Query<ProductFilter>,
) -> Json<Page<Product>> {
    Json(Page::single(state.products(filter.name.as_deref())))
}

async fn get_product(
    _user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
) -> Result<Json<Product>, GatewayError> {
    state.product(id).map(Json)
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

async fn get_cart(user: AuthUser, State(state): Shared) -> Result<Json<Cart>, GatewayError> {
    state.cart(&user.email).map(Json)
}

async fn add_to_cart(
    user: AuthUser,
    State(state): Shared,
    Json(item): Json<AddItem>,
) -> Result<Json<Cart>, GatewayError> {
    state
        .add_to_cart(&user.email, item.product_id, item.quantity)
        .map(Json)
}

async fn set_cart_quantity(
    user: AuthUser,
    State(state): Shared,
    Path(product_id): Path<u64>,
    Query(param): Query<QuantityParam>,
) -> Result<Json<Cart>, GatewayError> {
    state
        .set_cart_quantity(&user.email, product_id, param.quantity)
        .map(Json)
}

async fn remove_from_cart(
    user: AuthUser,
    State(state): Shared,
    Path(product_id): Path<u64>,
) -> StatusCode {
    state.remove_from_cart(&user.email, product_id);
    StatusCode::NO_CONTENT
}

async fn clear_cart(user: AuthUser, State(state): Shared) -> StatusCode {
    state.clear_cart(&user.email);
    StatusCode::NO_CONTENT
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

async fn create_order(user: AuthUser, State(state): Shared) -> Result<Json<Order>, GatewayError> {
    let order = state.create_order(&user.email)?;
    info!(user = %user.email, order = order.id, "order created");
    Ok(Json(order))
}

async fn my_orders(
    user: AuthUser,
    State(state): Shared,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Page<Order>>, GatewayError> {
    let status = filter.parse()?;
    Ok(Json(Page::single(state.orders_of(&user.email, status))))
}

async fn all_orders(
    user: AuthUser,
    State(state): Shared,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Page<Order>>, GatewayError> {
    if !user.is_privileged() {
        return Err(GatewayError::Forbidden("Seller or admin role required".into()));
    }
    let status = filter.parse()?;
    Ok(Json(Page::single(state.all_orders(status))))
}

async fn get_order(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
) -> Result<Json<Order>, GatewayError> {
    state.order(id, &user.email, user.is_privileged()).map(Json)
}

async fn set_order_status(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>, GatewayError> {
    if !user.is_privileged() {
        return Err(GatewayError::Forbidden("Seller or admin role required".into()));
    }
    let status =
        OrderStatus::parse(&update.status).map_err(|e| GatewayError::BadRequest(e.to_string()))?;
    let order = state.set_order_status(id, status)?;
    info!(order = id, %status, by = %user.email, "order status changed");
    Ok(Json(order))
}

async fn order_receipt(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
) -> Result<Json<Receipt>, GatewayError> {
    state
        .order(id, &user.email, user.is_privileged())?
        .receipt
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("Order {id} has no receipt")))
}

async fn receipt_by_number(
    user: AuthUser,
    State(state): Shared,
    Path(number): Path<String>,
) -> Result<Json<Receipt>, GatewayError> {
    state
        .receipt(&number, &user.email, user.is_privileged())
        .map(Json)
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

async fn get_company(
    _user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
) -> Result<Json<Company>, GatewayError> {
    state.company(id).map(Json)
}

async fn company_for_user(
    _user: AuthUser,
    State(state): Shared,
    Path(email): Path<String>,
) -> Result<Json<Company>, GatewayError> {
    state.company_of(&email).map(Json)
}

async fn list_companies(
    user: AuthUser,
    State(state): Shared,
    Query(params): Query<CompanyParams>,
) -> Result<Json<Page<Company>>, GatewayError> {
    user.require_admin()?;
    Ok(Json(Page::single(state.companies(&params.into_filter()?))))
}

/// Public company cards: no type, contact or availability details.
async fn limited_companies(
    _user: AuthUser,
    State(state): Shared,
    Query(params): Query<CompanyParams>,
) -> Result<Json<Page<Company>>, GatewayError> {
    let mut filter = params.into_filter()?;
    filter.availability = Some(true);
    let cards = state
        .companies(&filter)
        .into_iter()
        .map(|company| Company {
            company_type: String::new(),
            contact_email: None,
            availability: None,
            ..company
        })
        .collect();
    Ok(Json(Page::single(cards)))
}

async fn create_company(
    user: AuthUser,
    State(state): Shared,
    Json(draft): Json<CompanyDraft>,
) -> Result<(StatusCode, Json<Company>), GatewayError> {
    user.require_admin()?;
    let company = state.create_company(&draft)?;
    info!(company = company.id, by = %user.email, "company created");
    Ok((StatusCode::CREATED, Json(company)))
}

async fn update_company(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
    Json(update): Json<UpdateCompany>,
) -> Result<Json<Company>, GatewayError> {
    user.require_manager_of(&state, id)?;
    state.update_company(id, &update).map(Json)
}

async fn set_company_availability(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
    Query(param): Query<AvailabilityParam>,
) -> Result<Json<Company>, GatewayError> {
    user.require_admin()?;
    state.set_company_availability(id, param.availability).map(Json)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn list_users(
    user: AuthUser,
    State(state): Shared,
    Query(params): Query<UserParams>,
) -> Result<Json<Page<User>>, GatewayError> {
    let company_id = if user.is_admin() {
        params.company_id
    } else {
        // Directors only see their own staff.
        let own = state
            .account(&user.email)
            .map(|account| account.company_id)
            .ok_or_else(|| GatewayError::Unauthorized("Unknown user".into()))?;
        user.require_manager_of(&state, own)?;
        Some(own)
    };
    let filter = UserFilter {
        company_id,
        availability: params.availability,
        full_name: params.full_name,
    };
    Ok(Json(Page::single(state.users(&filter))))
}

async fn user_profile(
    user: AuthUser,
    State(state): Shared,
    Query(param): Query<EmailParam>,
) -> Result<Json<User>, GatewayError> {
    if param.email != user.email && !user.is_admin() {
        return Err(GatewayError::Forbidden("Cannot read another user's profile".into()));
    }
    state.profile(&param.email).map(Json)
}

async fn register_user(
    user: AuthUser,
    State(state): Shared,
    Json(registration): Json<RegisterUser>,
) -> Result<(StatusCode, Json<User>), GatewayError> {
    user.require_manager_of(&state, registration.user.company_id)?;
    let created = state.register_user(&registration)?;
    info!(user = %created.email, by = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_user(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
    Json(update): Json<UpdateUser>,
) -> Result<Json<User>, GatewayError> {
    let target = state.user(id)?;
    if target.email != user.email {
        user.require_manager_of(&state, target.company_id)?;
    }
    state.update_user(id, &update).map(Json)
}

async fn set_user_availability(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
    Query(param): Query<AvailabilityParam>,
) -> Result<Json<User>, GatewayError> {
    let target = state.user(id)?;
    user.require_manager_of(&state, target.company_id)?;
    state.set_user_availability(id, param.availability).map(Json)
}

async fn promote_to_director(
    user: AuthUser,
    State(state): Shared,
    Path(id): Path<u64>,
) -> Result<Json<User>, GatewayError> {
    let target = state.user(id)?;
    user.require_manager_of(&state, target.company_id)?;
    let promoted = state.promote_to_director(id)?;
    info!(user = %promoted.email, by = %user.email, "promoted to director");
    Ok(Json(promoted))
}
