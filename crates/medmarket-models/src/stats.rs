//! Seller sales statistics, computed from order listings.
//!
//! The backend has no statistics endpoint: a seller fetches the orders
//! visible to them and aggregates the lines of their own company's
//! products. Only those lines count towards revenue, but an order counts
//! in full towards `total_orders` as soon as one of its lines does.

use std::collections::BTreeMap;

use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderItem, OrderStatus};

/// How many products [`SalesStatistics::top_products`] keeps.
pub const TOP_PRODUCTS: usize = 10;

/// Reporting window ending now.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SalesPeriod {
    /// The last seven days.
    #[default]
    Week,
    /// The last calendar month.
    Month,
}

impl SalesPeriod {
    /// First instant of the window that ends at `now`.
    pub fn start(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Week => now - Duration::days(7),
            Self::Month => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(NaiveDateTime::MIN),
        }
    }
}

/// Which orders and lines belong in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesFilter {
    /// The seller company whose products are counted.
    pub company_id: u64,
    /// Only lines of this category, when set.
    pub category_id: Option<u64>,
    /// Earliest order creation time, inclusive.
    pub from: NaiveDateTime,
    /// Latest order creation time, inclusive.
    pub to: NaiveDateTime,
}

impl SalesFilter {
    /// The `period` ending at `now` for `company_id`, all categories.
    pub fn last(period: SalesPeriod, company_id: u64, now: NaiveDateTime) -> Self {
        Self {
            company_id,
            category_id: None,
            from: period.start(now),
            to: now,
        }
    }

    /// Restrict to one category.
    #[must_use]
    pub fn in_category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    fn counts(&self, item: &OrderItem) -> bool {
        item.product.company_id == self.company_id
            && self
                .category_id
                .is_none_or(|id| item.product.category.id == id)
    }

    fn includes(&self, order: &Order) -> bool {
        (self.from..=self.to).contains(&order.created_at)
            && order.items.iter().any(|item| self.counts(item))
    }
}

/// Units and revenue of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    /// Product name.
    pub product_name: String,
    /// Units sold.
    pub quantity: u64,
    /// Sum of line subtotals.
    pub revenue: f64,
}

/// Units and revenue of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    /// Category name.
    pub category_name: String,
    /// Units sold.
    pub quantity: u64,
    /// Sum of line subtotals.
    pub revenue: f64,
}

/// Orders and revenue of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySales {
    /// The day.
    pub date: NaiveDate,
    /// Orders placed that day.
    pub orders: usize,
    /// Revenue from the counted lines of those orders.
    pub revenue: f64,
}

/// A seller's sales report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStatistics {
    /// Orders with at least one counted line.
    pub total_orders: usize,
    /// Sum of counted line subtotals.
    pub total_revenue: f64,
    /// Of those orders, how many were delivered.
    pub completed_orders: usize,
    /// Of those orders, how many are pending or processing.
    pub pending_orders: usize,
    /// Best-selling products by revenue, at most [`TOP_PRODUCTS`].
    pub top_products: Vec<ProductSales>,
    /// Every category by revenue.
    pub category_sales: Vec<CategorySales>,
    /// One entry per day with orders, oldest first.
    pub daily_sales: Vec<DailySales>,
}

#[derive(Default)]
struct Tally {
    quantity: u64,
    revenue: f64,
}

impl Tally {
    fn add(&mut self, item: &OrderItem) {
        self.quantity += u64::from(item.quantity);
        self.revenue += item.subtotal;
    }
}

/// Highest revenue first; equal revenue by name.
fn ranked(tallies: BTreeMap<String, Tally>) -> Vec<(String, Tally)> {
    let mut ranked: Vec<_> = tallies.into_iter().collect();
    ranked.sort_by(|(a_name, a), (b_name, b)| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a_name.cmp(b_name))
    });
    ranked
}

impl SalesStatistics {
    /// Aggregate `orders` under `filter`.
    pub fn compute(orders: &[Order], filter: &SalesFilter) -> Self {
        let mut stats = Self::default();
        let mut products: BTreeMap<String, Tally> = BTreeMap::new();
        let mut categories: BTreeMap<String, Tally> = BTreeMap::new();
        let mut days: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();

        for order in orders.iter().filter(|order| filter.includes(order)) {
            stats.total_orders += 1;
            match order.status {
                OrderStatus::Delivered => stats.completed_orders += 1,
                OrderStatus::Pending | OrderStatus::Processing => stats.pending_orders += 1,
                _ => {}
            }

            let mut order_revenue = 0.0;
            for item in order.items.iter().filter(|item| filter.counts(item)) {
                order_revenue += item.subtotal;
                products.entry(item.product.name.clone()).or_default().add(item);
                categories
                    .entry(item.product.category.name.clone())
                    .or_default()
                    .add(item);
            }
            stats.total_revenue += order_revenue;

            let day = days.entry(order.created_at.date()).or_default();
            day.0 += 1;
            day.1 += order_revenue;
        }

        stats.top_products = ranked(products)
            .into_iter()
            .take(TOP_PRODUCTS)
            .map(|(product_name, t)| ProductSales {
                product_name,
                quantity: t.quantity,
                revenue: t.revenue,
            })
            .collect();
        stats.category_sales = ranked(categories)
            .into_iter()
            .map(|(category_name, t)| CategorySales {
                category_name,
                quantity: t.quantity,
                revenue: t.revenue,
            })
            .collect();
        stats.daily_sales = days
            .into_iter()
            .map(|(date, (orders, revenue))| DailySales {
                date,
                orders,
                revenue,
            })
            .collect();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Product};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn product(id: u64, company_id: u64, name: &str, category: (u64, &str)) -> Product {
        Product {
            id,
            company_id,
            company: None,
            name: name.into(),
            description: String::new(),
            net_price: 10.0,
            price: 12.0,
            sku: format!("SKU-{id}"),
            stock: 100,
            is_active: true,
            availability: Some(true),
            created_at: at(1, 0),
            updated_at: at(1, 0),
            category: Category {
                id: category.0,
                name: category.1.into(),
                description: None,
                is_active: true,
                availability: Some(true),
            },
            images: Vec::new(),
        }
    }

    fn line(product: &Product, quantity: u32, unit: f64) -> OrderItem {
        OrderItem {
            id: product.id * 100 + u64::from(quantity),
            product: product.clone(),
            quantity,
            price_at_purchase: unit,
            subtotal: f64::from(quantity) * unit,
        }
    }

    fn order(id: u64, created_at: NaiveDateTime, status: OrderStatus, items: Vec<OrderItem>) -> Order {
        Order {
            id,
            user_email: "buyer@clinic.org".into(),
            total_amount: items.iter().map(|i| i.subtotal).sum(),
            items,
            status,
            receipt: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Seller 2 sells gloves and masks (consumables) and a monitor
    /// (devices); seller 3 is a competitor.
    fn ledger() -> Vec<Order> {
        let gloves = product(1, 2, "Gloves", (1, "Consumables"));
        let masks = product(2, 2, "Masks", (1, "Consumables"));
        let monitor = product(3, 2, "Monitor", (2, "Devices"));
        let rival = product(4, 3, "Rival scalpel", (1, "Consumables"));
        vec![
            order(1, at(10, 9), OrderStatus::Delivered, vec![
                line(&gloves, 10, 5.0),
                line(&rival, 1, 1000.0),
            ]),
            order(2, at(10, 15), OrderStatus::Pending, vec![line(&monitor, 1, 300.0)]),
            order(3, at(12, 8), OrderStatus::Processing, vec![
                line(&masks, 4, 2.5),
                line(&gloves, 2, 5.0),
            ]),
            order(4, at(12, 9), OrderStatus::Shipped, vec![line(&rival, 3, 7.0)]),
            order(5, at(1, 9), OrderStatus::Delivered, vec![line(&monitor, 2, 300.0)]),
        ]
    }

    fn filter() -> SalesFilter {
        SalesFilter::last(SalesPeriod::Week, 2, at(14, 0))
    }

    #[test]
    fn counts_only_the_sellers_lines() {
        let stats = SalesStatistics::compute(&ledger(), &filter());

        // Order 4 has no line of seller 2, order 5 is outside the week.
        assert_eq!(stats.total_orders, 3);
        assert!((stats.total_revenue - (50.0 + 300.0 + 10.0 + 10.0)).abs() < 1e-9);
        assert_eq!(stats.completed_orders, 1);
        assert_eq!(stats.pending_orders, 2);
    }

    #[test]
    fn products_and_categories_are_ranked_by_revenue() {
        let stats = SalesStatistics::compute(&ledger(), &filter());

        let names: Vec<_> = stats.top_products.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, ["Monitor", "Gloves", "Masks"]);
        assert_eq!(stats.top_products[1].quantity, 12);
        assert!((stats.top_products[1].revenue - 60.0).abs() < 1e-9);

        assert_eq!(stats.category_sales.len(), 2);
        assert_eq!(stats.category_sales[0].category_name, "Devices");
        assert_eq!(stats.category_sales[1].quantity, 16);
        assert!((stats.category_sales[1].revenue - 70.0).abs() < 1e-9);
    }

    #[test]
    fn daily_sales_are_grouped_by_day_oldest_first() {
        let stats = SalesStatistics::compute(&ledger(), &filter());

        let days: Vec<_> = stats
            .daily_sales
            .iter()
            .map(|d| (d.date.to_string(), d.orders))
            .collect();
        assert_eq!(days, [("2025-03-10".to_string(), 2), ("2025-03-12".to_string(), 1)]);
        assert!((stats.daily_sales[0].revenue - 350.0).abs() < 1e-9);
    }

    #[test]
    fn category_filter_narrows_orders_and_lines() {
        let stats = SalesStatistics::compute(&ledger(), &filter().in_category(2));

        assert_eq!(stats.total_orders, 1);
        assert!((stats.total_revenue - 300.0).abs() < 1e-9);
        assert_eq!(stats.top_products.len(), 1);
        assert_eq!(stats.pending_orders, 1);
    }

    #[test]
    fn month_window_reaches_back_a_calendar_month() {
        let now = at(14, 0);
        assert_eq!(SalesPeriod::Month.start(now).to_string(), "2025-02-14 00:00:00");

        let stats = SalesStatistics::compute(&ledger(), &SalesFilter::last(SalesPeriod::Month, 2, now));
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.completed_orders, 2);
    }

    #[test]
    fn top_products_are_capped() {
        let orders: Vec<_> = (0..15u32)
            .map(|i| {
                let id = u64::from(i);
                let p = product(id, 2, &format!("Item {i:02}"), (1, "Consumables"));
                order(id, at(10, 9), OrderStatus::Pending, vec![line(&p, 1, f64::from(i))])
            })
            .collect();
        let stats = SalesStatistics::compute(&orders, &filter());
        assert_eq!(stats.total_orders, 15);
        assert_eq!(stats.top_products.len(), TOP_PRODUCTS);
        assert_eq!(stats.top_products[0].product_name, "Item 14");
        assert_eq!(stats.top_products[9].product_name, "Item 05");
    }

    #[test]
    fn empty_ledger_yields_an_empty_report() {
        let stats = SalesStatistics::compute(&[], &filter());
        assert_eq!(stats, SalesStatistics::default());
    }

    #[test]
    fn period_names_parse() {
        assert_eq!("Month".parse::<SalesPeriod>(), Ok(SalesPeriod::Month));
        assert_eq!(SalesPeriod::Week.to_string(), "week");
    }
}
