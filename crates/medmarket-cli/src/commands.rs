//! Command implementations.

use anyhow::{bail, Context};
use medmarket_models::{
    AddToCart, Cart, Order, Page, PasswordChange, Product, SalesFilter, SalesStatistics, User,
};
use medmarket_sdk::services::{OrderQuery, ProductQuery, UserQuery};
use medmarket_sdk::{ApiRequest, Session};
use serde::Serialize;
use serde_json::Value;

use crate::{CartCommand, Commands, OrderCommand, RequestArgs};

pub async fn run(session: &Session, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            let claims = session.login_with_password(&email, &password).await?;
            println!(
                "Logged in as {} [{}]",
                claims.email.as_deref().unwrap_or(&email),
                claims.roles.join(", ")
            );
        }
        Commands::Logout => {
            session.logout();
            println!("Logged out");
        }
        Commands::Whoami => whoami(session, json).await?,
        Commands::Products { name } => {
            let query = ProductQuery {
                name,
                ..ProductQuery::default()
            };
            let page = session.client().products().list(&query).await?;
            if json {
                print_json(&page)?;
            } else {
                print_products(&page);
            }
        }
        Commands::Cart(cmd) => cart(session, cmd, json).await?,
        Commands::Orders(cmd) => orders(session, cmd, json).await?,
        Commands::Users { company, name } => {
            let query = UserQuery {
                company_id: company,
                full_name: name,
                ..UserQuery::default()
            };
            let page = session.client().users().list(&query).await?;
            if json {
                print_json(&page)?;
            } else {
                print_users(&page);
            }
        }
        Commands::Password { old, new } => {
            let Some(email) = session.email() else {
                bail!("not logged in");
            };
            let change = PasswordChange::new(&old, &new, &new)?;
            session.client().auth().change_password(&email, &change).await?;
            println!("Password changed");
        }
        Commands::Request(args) => request(session, args).await?,
    }
    Ok(())
}

async fn whoami(session: &Session, json: bool) -> anyhow::Result<()> {
    let Some(claims) = session.claims() else {
        bail!("not logged in");
    };
    let company = session.company().await?;

    if json {
        return print_json(&serde_json::json!({
            "email": claims.email,
            "roles": claims.roles,
            "expiresAt": claims.expires_at,
            "company": company,
        }));
    }

    println!("email:   {}", claims.email.as_deref().unwrap_or("-"));
    println!("roles:   {}", claims.roles.join(", "));
    if let Some(expires_at) = claims.expires_at {
        println!("expires: {}", expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(company) = company {
        println!("company: {} ({})", company.name, company.company_type);
    }
    Ok(())
}

async fn cart(session: &Session, cmd: CartCommand, json: bool) -> anyhow::Result<()> {
    let service = session.client().cart();
    let cart = match cmd {
        CartCommand::Show => service.get().await?,
        CartCommand::Add {
            product_id,
            quantity,
        } => service.add(AddToCart::new(product_id, quantity)?).await?,
        CartCommand::Remove { product_id } => {
            service.remove(product_id).await?;
            service.get().await?
        }
        CartCommand::Clear => {
            service.clear().await?;
            println!("Cart cleared");
            return Ok(());
        }
    };

    if json {
        print_json(&cart)
    } else {
        print_cart(&cart);
        Ok(())
    }
}

async fn orders(session: &Session, cmd: OrderCommand, json: bool) -> anyhow::Result<()> {
    let service = session.client().orders();
    match cmd {
        OrderCommand::List { status, all } => {
            let query = OrderQuery {
                status,
                ..OrderQuery::default()
            };
            let page = if all {
                service.all(&query).await?
            } else {
                service.mine(&query).await?
            };
            if json {
                print_json(&page)?;
            } else {
                print_orders(&page);
            }
        }
        OrderCommand::Create => print_order(&service.create().await?, json)?,
        OrderCommand::Show { id } => print_order(&service.get(id).await?, json)?,
        OrderCommand::Status { id, status } => {
            print_order(&service.set_status(id, status).await?, json)?;
        }
        OrderCommand::Stats { period, category } => {
            let company = session
                .company()
                .await?
                .context("not logged in")?;
            if !company.is_seller() {
                bail!("{} is not a seller company", company.name);
            }
            let now = chrono::Utc::now().naive_utc();
            let mut filter = SalesFilter::last(period, company.id, now);
            if let Some(category) = category {
                filter = filter.in_category(category);
            }
            let stats = service.sales(&filter).await?;
            if json {
                print_json(&stats)?;
            } else {
                print_sales(&stats);
            }
        }
    }
    Ok(())
}

async fn request(session: &Session, args: RequestArgs) -> anyhow::Result<()> {
    let mut req = ApiRequest::new(args.method, args.path);
    for (key, value) in args.query {
        req = req.query(key, value);
    }
    if let Some(body) = args.body {
        let value: Value = serde_json::from_str(&body).context("--body is not valid JSON")?;
        req = req.json_value(value);
    }

    let response = session.client().dispatch(req).await?;
    if response.is_empty() {
        println!("{}", response.status());
        return Ok(());
    }
    match response.json::<Value>() {
        Ok(value) => print_json(&value),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_products(page: &Page<Product>) {
    if page.content.is_empty() {
        println!("No products found");
        return;
    }
    println!("{:>5}  {:<12} {:>10} {:>7}  NAME", "ID", "SKU", "PRICE", "STOCK");
    for p in &page.content {
        println!(
            "{:>5}  {:<12} {:>10.2} {:>7}  {}",
            p.id, p.sku, p.price, p.stock, p.name
        );
    }
    if page.has_next() {
        println!("… {} products in total", page.total_elements);
    }
}

fn print_cart(cart: &Cart) {
    if cart.items.is_empty() {
        println!("Cart is empty");
        return;
    }
    for item in &cart.items {
        println!(
            "{:>4} x {:<30} {:>10.2}",
            item.quantity, item.product.name, item.subtotal
        );
    }
    println!("{:>47.2}", cart.total_amount);
}

fn print_orders(page: &Page<Order>) {
    if page.content.is_empty() {
        println!("No orders");
        return;
    }
    for order in &page.content {
        println!(
            "#{:<6} {:<11} {:>10.2}  {}",
            order.id,
            order.status.to_string(),
            order.total_amount,
            order.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_order(order: &Order, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(order);
    }
    println!("Order #{} ({})", order.id, order.status);
    for item in &order.items {
        println!(
            "{:>4} x {:<30} {:>10.2}",
            item.quantity, item.product.name, item.subtotal
        );
    }
    println!("total {:>41.2}", order.total_amount);
    if let Some(receipt) = &order.receipt {
        println!("receipt {}", receipt.receipt_number);
    }
    Ok(())
}

fn print_users(page: &Page<User>) {
    if page.content.is_empty() {
        println!("No users found");
        return;
    }
    for user in &page.content {
        println!(
            "{:>5}  {:<30} {:<10} {:<4} {}",
            user.id,
            user.email,
            user.role,
            if user.availability { "on" } else { "off" },
            user.full_name()
        );
    }
}

fn print_sales(stats: &SalesStatistics) {
    println!(
        "{} orders, revenue {:.2} ({} delivered, {} pending)",
        stats.total_orders, stats.total_revenue, stats.completed_orders, stats.pending_orders
    );
    if !stats.top_products.is_empty() {
        println!("\nTop products");
        for p in &stats.top_products {
            println!("{:>6} x {:<30} {:>10.2}", p.quantity, p.product_name, p.revenue);
        }
    }
    if !stats.category_sales.is_empty() {
        println!("\nBy category");
        for c in &stats.category_sales {
            println!("{:>6} x {:<30} {:>10.2}", c.quantity, c.category_name, c.revenue);
        }
    }
    if !stats.daily_sales.is_empty() {
        println!("\nBy day");
        for d in &stats.daily_sales {
            println!("{}  {:>4} orders {:>10.2}", d.date, d.orders, d.revenue);
        }
    }
}
