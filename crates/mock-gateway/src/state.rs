//! In-memory marketplace data behind the gateway routes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use medmarket_models::{
    Cart, CartItem, Category, Company, CompanyDraft, CompanyRole, ModelError, Order, OrderItem,
    OrderStatus, PasswordChange, Product, Receipt, RegisterUser, UpdateCompany, UpdateUser, User,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::tokens::TokenIssuer;

/// A user account.
#[derive(Debug, Clone)]
pub struct Account {
    /// User identifier.
    pub id: u64,
    /// Login e-mail.
    pub email: String,
    /// Login password (plain text; this is a mock).
    pub password: String,
    /// Granted roles.
    pub roles: Vec<String>,
    /// Company the user belongs to.
    pub company_id: u64,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Disabled accounts cannot sign in.
    pub availability: bool,
}

impl Account {
    /// Whether the account holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The account as the user service renders it.
    pub fn to_user(&self) -> User {
        let role = if self.has_role("ROLE_DIRECTOR") {
            CompanyRole::Director.to_string()
        } else if let Some(role) = self.roles.iter().find(|r| *r != "ROLE_USER") {
            role.trim_start_matches("ROLE_").to_string()
        } else {
            CompanyRole::Operator.to_string()
        };
        User {
            id: self.id,
            name: self.name.clone(),
            surname: self.surname.clone(),
            birth_date: self.birth_date,
            email: self.email.clone(),
            availability: self.availability,
            role,
            company_id: Some(self.company_id),
        }
    }
}

/// Filters for [`AppState::companies`].
#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    /// Only these ids, when non-empty.
    pub ids: Vec<u64>,
    /// Name substring, case-insensitive.
    pub name: Option<String>,
    /// Company type, case-insensitive.
    pub company_type: Option<String>,
    /// Availability flag.
    pub availability: Option<bool>,
}

impl CompanyFilter {
    fn matches(&self, company: &Company) -> bool {
        (self.ids.is_empty() || self.ids.contains(&company.id))
            && self
                .name
                .as_deref()
                .is_none_or(|n| company.name.to_lowercase().contains(&n.to_lowercase()))
            && self
                .company_type
                .as_deref()
                .is_none_or(|t| company.company_type.eq_ignore_ascii_case(t))
            && self
                .availability
                .is_none_or(|a| company.availability.unwrap_or(true) == a)
    }
}

/// Filters for [`AppState::users`].
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Staff of this company.
    pub company_id: Option<u64>,
    /// Availability flag.
    pub availability: Option<bool>,
    /// Substring of `"name surname"`, case-insensitive.
    pub full_name: Option<String>,
}

impl UserFilter {
    fn matches(&self, account: &Account) -> bool {
        self.company_id.is_none_or(|id| account.company_id == id)
            && self.availability.is_none_or(|a| account.availability == a)
            && self.full_name.as_deref().is_none_or(|needle| {
                format!("{} {}", account.name, account.surname)
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
    }
}

#[derive(Debug, Default)]
struct Directory {
    accounts: Vec<Account>,
    companies: Vec<Company>,
}

impl Directory {
    fn account_mut(&mut self, id: u64) -> Result<&mut Account, GatewayError> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("User {id} not found")))
    }

    fn company_mut(&mut self, id: u64) -> Result<&mut Company, GatewayError> {
        self.companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("Company {id} not found")))
    }

    fn ensure_email_free(&self, email: &str) -> Result<(), GatewayError> {
        if self.accounts.iter().any(|a| a.email.eq_ignore_ascii_case(email)) {
            return Err(GatewayError::BadRequest(format!(
                "User with email {email} already exists"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Ledger {
    carts: HashMap<String, Vec<(u64, u32)>>,
    orders: Vec<Order>,
}

/// State shared across all Axum handlers.
pub struct AppState {
    /// Configuration the gateway was started with.
    pub config: GatewayConfig,
    /// Token signer.
    pub issuer: TokenIssuer,
    directory: Mutex<Directory>,
    products: Vec<Product>,
    ledger: Mutex<Ledger>,
    next_id: AtomicU64,
}

impl AppState {
    /// State seeded with demo accounts, companies and products.
    pub fn seeded(config: GatewayConfig) -> Self {
        let issuer = TokenIssuer::new(
            &config.jwt_secret,
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        );
        let now = Utc::now().naive_utc();

        let companies = vec![
            company(1, "City Clinic", "BUYER", "procurement@clinic.org"),
            company(2, "Acme Medical", "SELLER", "sales@acme.com"),
        ];
        let diagnostics = Category {
            id: 1,
            name: "Diagnostics".into(),
            description: Some("Stethoscopes, monitors, thermometers".into()),
            is_active: true,
            availability: Some(true),
        };
        let consumables = Category {
            id: 2,
            name: "Consumables".into(),
            description: None,
            is_active: true,
            availability: Some(true),
        };
        let products = vec![
            product(1, "Dual-head stethoscope", "ST-100", 85.0, 40, &diagnostics, now),
            product(2, "Patient monitor", "PM-220", 1_450.0, 5, &diagnostics, now),
            product(3, "Nitrile gloves (100)", "GL-NIT-100", 9.5, 1_000, &consumables, now),
        ];

        let accounts = [
            ("buyer@clinic.org", "buyer", "ROLE_USER", 1, ("Bella", "Byers")),
            ("director@clinic.org", "director", "ROLE_DIRECTOR", 1, ("Dana", "Dorn")),
            ("seller@acme.com", "seller", "ROLE_SELLER", 2, ("Sam", "Sellers")),
            ("admin@medmarket.io", "admin", "ROLE_ADMIN", 2, ("Ada", "Admin")),
        ]
        .into_iter()
        .zip(1..)
        .map(|((email, password, role, company_id, (name, surname)), id)| Account {
            id,
            email: email.to_string(),
            password: password.to_string(),
            roles: vec![role.to_string()],
            company_id,
            name: name.to_string(),
            surname: surname.to_string(),
            birth_date: None,
            availability: true,
        })
        .collect();

        Self {
            config,
            issuer,
            directory: Mutex::new(Directory {
                accounts,
                companies,
            }),
            products,
            ledger: Mutex::new(Ledger::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Check a login; returns the account on success.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account, GatewayError> {
        let account = self
            .account(email)
            .filter(|account| account.password == password)
            .ok_or_else(|| GatewayError::Unauthorized("Invalid email or password".into()))?;
        if !account.availability {
            return Err(GatewayError::Unauthorized("Account is disabled".into()));
        }
        Ok(account)
    }

    /// An account by e-mail.
    pub fn account(&self, email: &str) -> Option<Account> {
        self.directory()
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned()
    }

    /// Roles of a known, enabled user.
    pub fn roles_of(&self, email: &str) -> Result<Vec<String>, GatewayError> {
        self.account(email)
            .filter(|account| account.availability)
            .map(|account| account.roles)
            .ok_or_else(|| GatewayError::Unauthorized("Unknown user".into()))
    }

    /// Replace a user's password after checking the current one.
    pub fn change_password(&self, email: &str, change: &PasswordChange) -> Result<(), GatewayError> {
        if change.new_password != change.repeat_password {
            return Err(GatewayError::BadRequest(ModelError::PasswordMismatch.to_string()));
        }
        let mut directory = self.directory();
        let account = directory
            .accounts
            .iter_mut()
            .find(|a| a.email == email)
            .ok_or_else(|| GatewayError::NotFound(format!("User {email} not found")))?;
        if account.password != change.old_password {
            return Err(GatewayError::BadRequest("Old password is incorrect".into()));
        }
        account.password.clone_from(&change.new_password);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Users matching `filter`, by id.
    pub fn users(&self, filter: &UserFilter) -> Vec<User> {
        self.directory()
            .accounts
            .iter()
            .filter(|a| filter.matches(a))
            .map(Account::to_user)
            .collect()
    }

    /// A user by id.
    pub fn user(&self, id: u64) -> Result<Account, GatewayError> {
        self.directory()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("User {id} not found")))
    }

    /// A user by e-mail.
    pub fn profile(&self, email: &str) -> Result<User, GatewayError> {
        self.account(email)
            .map(|a| a.to_user())
            .ok_or_else(|| GatewayError::NotFound(format!("User {email} not found")))
    }

    /// Create an account in an existing company.
    ///
    /// Operators of seller companies get `ROLE_SELLER`, other operators
    /// `ROLE_USER`.
    pub fn register_user(&self, registration: &RegisterUser) -> Result<User, GatewayError> {
        let data = &registration.register_data;
        let profile = &registration.user;
        if data.password != data.repeat_password {
            return Err(GatewayError::BadRequest(ModelError::PasswordMismatch.to_string()));
        }
        if data.password.is_empty() {
            return Err(GatewayError::BadRequest("Password must not be empty".into()));
        }

        let mut directory = self.directory();
        directory.ensure_email_free(&profile.email)?;
        let seller = directory.company_mut(profile.company_id)?.is_seller();
        let role = match profile.role {
            CompanyRole::Director => "ROLE_DIRECTOR",
            CompanyRole::Operator if seller => "ROLE_SELLER",
            CompanyRole::Operator => "ROLE_USER",
        };
        let id = directory.accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let account = Account {
            id,
            email: profile.email.clone(),
            password: data.password.clone(),
            roles: vec![role.to_string()],
            company_id: profile.company_id,
            name: profile.name.clone(),
            surname: profile.surname.clone(),
            birth_date: profile.birth_date,
            availability: true,
        };
        let user = account.to_user();
        directory.accounts.push(account);
        Ok(user)
    }

    /// Change profile fields; absent fields are kept.
    pub fn update_user(&self, id: u64, update: &UpdateUser) -> Result<User, GatewayError> {
        let mut directory = self.directory();
        if let Some(email) = &update.email {
            let taken = directory
                .accounts
                .iter()
                .any(|a| a.id != id && a.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(GatewayError::BadRequest(format!(
                    "User with email {email} already exists"
                )));
            }
        }
        let account = directory.account_mut(id)?;
        if let Some(name) = &update.name {
            account.name.clone_from(name);
        }
        if let Some(surname) = &update.surname {
            account.surname.clone_from(surname);
        }
        if update.birth_date.is_some() {
            account.birth_date = update.birth_date;
        }
        if let Some(email) = &update.email {
            account.email.clone_from(email);
        }
        Ok(account.to_user())
    }

    /// Enable or disable an account.
    pub fn set_user_availability(&self, id: u64, available: bool) -> Result<User, GatewayError> {
        let mut directory = self.directory();
        let account = directory.account_mut(id)?;
        account.availability = available;
        Ok(account.to_user())
    }

    /// Grant `ROLE_DIRECTOR`.
    pub fn promote_to_director(&self, id: u64) -> Result<User, GatewayError> {
        let mut directory = self.directory();
        let account = directory.account_mut(id)?;
        if !account.has_role("ROLE_DIRECTOR") {
            account.roles.push("ROLE_DIRECTOR".into());
        }
        Ok(account.to_user())
    }

    // ------------------------------------------------------------------
    // Companies
    // ------------------------------------------------------------------

    /// Company of a known user.
    pub fn company_of(&self, email: &str) -> Result<Company, GatewayError> {
        let account = self
            .account(email)
            .ok_or_else(|| GatewayError::NotFound(format!("User {email} not found")))?;
        self.company(account.company_id)
    }

    /// A company by id.
    pub fn company(&self, id: u64) -> Result<Company, GatewayError> {
        self.directory()
            .companies
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Company {id} not found")))
    }

    /// Companies matching `filter`, by id.
    pub fn companies(&self, filter: &CompanyFilter) -> Vec<Company> {
        self.directory()
            .companies
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    /// Register a company.
    pub fn create_company(&self, draft: &CompanyDraft) -> Result<Company, GatewayError> {
        if draft.name.trim().is_empty() {
            return Err(GatewayError::BadRequest("Company name must not be empty".into()));
        }
        let mut directory = self.directory();
        let id = directory.companies.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let company = Company {
            id,
            name: draft.name.clone(),
            company_type: draft.company_type.to_uppercase(),
            address: Some(draft.address.clone()),
            contact_email: Some(draft.contact_email.clone()),
            logo_url: draft.logo_url.clone(),
            availability: Some(true),
        };
        directory.companies.push(company.clone());
        Ok(company)
    }

    /// Change company fields; absent fields are kept.
    pub fn update_company(&self, id: u64, update: &UpdateCompany) -> Result<Company, GatewayError> {
        let mut directory = self.directory();
        let company = directory.company_mut(id)?;
        if let Some(name) = &update.name {
            company.name.clone_from(name);
        }
        if let Some(company_type) = &update.company_type {
            company.company_type = company_type.to_uppercase();
        }
        if update.address.is_some() {
            company.address.clone_from(&update.address);
        }
        if update.contact_email.is_some() {
            company.contact_email.clone_from(&update.contact_email);
        }
        if update.logo_url.is_some() {
            company.logo_url.clone_from(&update.logo_url);
        }
        Ok(company.clone())
    }

    /// Enable or disable a company.
    pub fn set_company_availability(&self, id: u64, available: bool) -> Result<Company, GatewayError> {
        let mut directory = self.directory();
        let company = directory.company_mut(id)?;
        company.availability = Some(available);
        Ok(company.clone())
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// Products whose name contains `name` (case-insensitive).
    pub fn products(&self, name: Option<&str>) -> Vec<Product> {
        let needle = name.map(str::to_lowercase);
        self.products
            .iter()
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| p.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect()
    }

    /// A product by id.
    pub fn product(&self, id: u64) -> Result<Product, GatewayError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Product {id} not found")))
    }

    // ------------------------------------------------------------------
    // Cart
    // ------------------------------------------------------------------

    /// The user's cart.
    pub fn cart(&self, user: &str) -> Result<Cart, GatewayError> {
        let lines = self.ledger().carts.get(user).cloned().unwrap_or_default();
        self.render_cart(&lines)
    }

    /// Add `quantity` units of a product.
    pub fn add_to_cart(&self, user: &str, product_id: u64, quantity: u32) -> Result<Cart, GatewayError> {
        if quantity == 0 {
            return Err(GatewayError::BadRequest("Quantity must be at least 1".into()));
        }
        self.product(product_id)?;
        let lines = {
            let mut ledger = self.ledger();
            let lines = ledger.carts.entry(user.to_string()).or_default();
            match lines.iter_mut().find(|(id, _)| *id == product_id) {
                Some((_, qty)) => *qty += quantity,
                None => lines.push((product_id, quantity)),
            }
            lines.clone()
        };
        self.render_cart(&lines)
    }

    /// Set the quantity of a product already in the cart.
    pub fn set_cart_quantity(&self, user: &str, product_id: u64, quantity: u32) -> Result<Cart, GatewayError> {
        let lines = {
            let mut ledger = self.ledger();
            let lines = ledger.carts.entry(user.to_string()).or_default();
            let line = lines
                .iter_mut()
                .find(|(id, _)| *id == product_id)
                .ok_or_else(|| GatewayError::NotFound(format!("Product {product_id} not in cart")))?;
            line.1 = quantity;
            lines.retain(|(_, qty)| *qty > 0);
            lines.clone()
        };
        self.render_cart(&lines)
    }

    /// Remove a product from the cart.
    pub fn remove_from_cart(&self, user: &str, product_id: u64) {
        if let Some(lines) = self.ledger().carts.get_mut(user) {
            lines.retain(|(id, _)| *id != product_id);
        }
    }

    /// Empty the cart.
    pub fn clear_cart(&self, user: &str) {
        self.ledger().carts.remove(user);
    }

    fn render_cart(&self, lines: &[(u64, u32)]) -> Result<Cart, GatewayError> {
        let now = Utc::now().naive_utc();
        let items = lines
            .iter()
            .enumerate()
            .map(|(i, (product_id, quantity))| {
                let product = self.product(*product_id)?;
                Ok(CartItem {
                    id: i as u64 + 1,
                    subtotal: product.price * f64::from(*quantity),
                    quantity: *quantity,
                    product,
                })
            })
            .collect::<Result<Vec<_>, GatewayError>>()?;
        Ok(Cart {
            id: 1,
            total_amount: items.iter().map(|i| i.subtotal).sum(),
            items,
            created_at: now,
            updated_at: now,
        })
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Turn the user's cart into a pending order.
    pub fn create_order(&self, user: &str) -> Result<Order, GatewayError> {
        let cart = self.cart(user)?;
        if cart.items.is_empty() {
            return Err(GatewayError::BadRequest("Cart is empty".into()));
        }
        let now = Utc::now().naive_utc();
        let id = self.next_id();
        let order = Order {
            id,
            user_email: user.to_string(),
            items: cart
                .items
                .into_iter()
                .map(|item| OrderItem {
                    id: item.id,
                    price_at_purchase: item.product.price,
                    subtotal: item.subtotal,
                    quantity: item.quantity,
                    product: item.product,
                })
                .collect(),
            total_amount: cart.total_amount,
            status: OrderStatus::Pending,
            receipt: Some(Receipt {
                id,
                receipt_number: format!("R-{id:06}"),
                issued_at: now,
                details: format!("Order {id} for {user}"),
            }),
            created_at: now,
            updated_at: now,
        };

        let mut ledger = self.ledger();
        ledger.carts.remove(user);
        ledger.orders.push(order.clone());
        Ok(order)
    }

    /// Orders placed by `user`, optionally filtered by status.
    pub fn orders_of(&self, user: &str, status: Option<OrderStatus>) -> Vec<Order> {
        self.ledger()
            .orders
            .iter()
            .filter(|o| o.user_email == user && status.map_or(true, |s| o.status == s))
            .cloned()
            .collect()
    }

    /// Every order, optionally filtered by status.
    pub fn all_orders(&self, status: Option<OrderStatus>) -> Vec<Order> {
        self.ledger()
            .orders
            .iter()
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect()
    }

    /// A receipt by its number, visible to the same callers as its order.
    pub fn receipt(&self, number: &str, user: &str, privileged: bool) -> Result<Receipt, GatewayError> {
        self.ledger()
            .orders
            .iter()
            .filter(|o| privileged || o.user_email == user)
            .filter_map(|o| o.receipt.as_ref())
            .find(|r| r.receipt_number == number)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Receipt {number} not found")))
    }

    /// An order visible to `user` (its buyer, or any seller/admin).
    pub fn order(&self, id: u64, user: &str, privileged: bool) -> Result<Order, GatewayError> {
        self.ledger()
            .orders
            .iter()
            .find(|o| o.id == id && (privileged || o.user_email == user))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("Order {id} not found")))
    }

    /// Move an order to a new status.
    pub fn set_order_status(&self, id: u64, status: OrderStatus) -> Result<Order, GatewayError> {
        let mut ledger = self.ledger();
        let order = ledger
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("Order {id} not found")))?;
        if order.status.is_terminal() {
            return Err(GatewayError::BadRequest(format!(
                "Order {id} is already {}",
                order.status
            )));
        }
        order.status = status;
        order.updated_at = Utc::now().naive_utc();
        Ok(order.clone())
    }
}

fn company(id: u64, name: &str, company_type: &str, email: &str) -> Company {
    Company {
        id,
        name: name.to_string(),
        company_type: company_type.to_string(),
        address: None,
        contact_email: Some(email.to_string()),
        logo_url: None,
        availability: Some(true),
    }
}

fn product(
    id: u64,
    name: &str,
    sku: &str,
    net_price: f64,
    stock: u32,
    category: &Category,
    now: NaiveDateTime,
) -> Product {
    Product {
        id,
        company_id: 2,
        company: None,
        name: name.to_string(),
        description: String::new(),
        net_price,
        price: (net_price * 1.2 * 100.0).round() / 100.0,
        sku: sku.to_string(),
        stock,
        is_active: true,
        availability: Some(true),
        created_at: now,
        updated_at: now,
        category: category.clone(),
        images: Vec::new(),
    }
}
