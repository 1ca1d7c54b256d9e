//! Order creation and fulfilment transitions, as far as the affiliate core
//! is concerned.
//!
//! Order creation is one transaction: stock decrements, attribution resolution,
//! commission computation, and line persistence either all land or all roll
//! back, so a vanished product mid-order can never leave a partial order or a
//! lost stock decrement behind. The Pending -> Paid transition belongs to the
//! payment collaborator; this module performs Paid -> Shipped and
//! Shipped -> Delivered, and the latter credits attributed line commissions.

use crate::{
    config::settings::Settings,
    core::{clicks, commission, ledger},
    entities::{
        Order, OrderLine, OrderStatus, Product, order, order_line, product,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::info;

/// One requested position on a new order.
#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    /// Product to purchase
    pub product_id: i64,
    /// Units to purchase
    pub quantity: i32,
}

/// Creates an order with its lines in a single transaction.
///
/// Per line: the product is loaded, stock is decremented with a guard
/// (`stock_quantity >= quantity` on the UPDATE), attribution is resolved for
/// the buyer, and the commission figure is computed and frozen on the line.
/// Any failure rolls the whole order back, including earlier stock decrements.
pub async fn create_order(
    db: &DatabaseConnection,
    customer_id: i64,
    address: String,
    lines: &[OrderLineRequest],
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<(order::Model, Vec<order_line::Model>)> {
    if lines.is_empty() {
        return Err(Error::EmptyOrder);
    }

    let txn = db.begin().await?;

    let draft = order::ActiveModel {
        customer_id: Set(customer_id),
        total_amount: Set(0.0),
        status: Set(OrderStatus::Pending),
        order_date: Set(now),
        address: Set(address),
        ..Default::default()
    };
    let created = draft.insert(&txn).await?;

    let mut total = 0.0;
    let mut persisted = Vec::with_capacity(lines.len());

    for request in lines {
        if request.quantity <= 0 {
            return Err(Error::InvalidQuantity {
                quantity: request.quantity,
            });
        }

        let item = Product::find_by_id(request.product_id)
            .one(&txn)
            .await?
            .ok_or(Error::ProductNotFound {
                id: request.product_id,
            })?;

        use sea_orm::sea_query::Expr;
        let decremented = Product::update_many()
            .col_expr(
                product::Column::StockQuantity,
                Expr::col(product::Column::StockQuantity).sub(request.quantity),
            )
            .filter(product::Column::Id.eq(request.product_id))
            .filter(product::Column::StockQuantity.gte(request.quantity))
            .exec(&txn)
            .await?;
        if decremented.rows_affected == 0 {
            return Err(Error::InsufficientStock {
                product_id: request.product_id,
                available: item.stock_quantity,
                requested: request.quantity,
            });
        }

        let commission_amount =
            commission::compute(item.commission_rate, item.price, request.quantity);
        let attributed = clicks::resolve_attribution(
            &txn,
            customer_id,
            request.product_id,
            now,
            settings.attribution_window_days,
        )
        .await?;

        let line = order_line::ActiveModel {
            order_id: Set(created.id),
            product_id: Set(request.product_id),
            quantity: Set(request.quantity),
            unit_price: Set(item.price),
            commission_amount: Set(commission_amount),
            affiliate_profile_id: Set(attributed),
            ..Default::default()
        };
        persisted.push(line.insert(&txn).await?);

        total += item.price * f64::from(request.quantity);
    }

    let mut active: order::ActiveModel = created.into();
    active.total_amount = Set(total);
    let finished = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        order_id = finished.id,
        customer_id,
        total,
        lines = persisted.len(),
        "order created"
    );
    Ok((finished, persisted))
}

/// Advances an order's status. Only Paid -> Shipped and Shipped -> Delivered
/// are legal here; everything else is `InvalidTransition`.
///
/// On Delivered, each attributed line's commission is credited to its
/// affiliate's ledger inside the same transaction as the status flip. The
/// transition is one-way, so a line can never be credited twice.
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    new_status: OrderStatus,
) -> Result<order::Model> {
    let txn = db.begin().await?;

    let current = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    let legal = matches!(
        (current.status, new_status),
        (OrderStatus::Paid, OrderStatus::Shipped)
            | (OrderStatus::Shipped, OrderStatus::Delivered)
    );
    if !legal {
        return Err(Error::InvalidTransition {
            from: format!("{:?}", current.status),
            to: format!("{new_status:?}"),
        });
    }

    if new_status == OrderStatus::Delivered {
        let order_lines = OrderLine::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;

        for line in order_lines {
            if let Some(affiliate_profile_id) = line.affiliate_profile_id {
                if line.commission_amount > 0.0 {
                    ledger::credit_earnings(&txn, affiliate_profile_id, line.commission_amount)
                        .await?;
                }
            }
        }
    }

    let mut active: order::ActiveModel = current.into();
    active.status = Set(new_status);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    info!(order_id, status = ?new_status, "order status updated");
    Ok(updated)
}
