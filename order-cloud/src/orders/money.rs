//! 金额计算（rust_decimal 保证精度）
//!
//! 内部全部用 `Decimal` 计算，存储和序列化时再转为 `f64`。
//! 不信任调用方提交的合计，总是根据明细重新计算。

use rust_decimal::prelude::*;
use shared::order::{OrderItem, SelectedItem};

use super::error::OrderError;

/// 金额舍入：保留 2 位小数，四舍五入
const DECIMAL_PLACES: u32 = 2;

/// 单品价格上限
const MAX_PRICE: f64 = 1_000_000.0;
/// 单品数量上限
const MAX_QUANTITY: i32 = 9999;

/// 订单金额合计，恒有 `total = subtotal - discount`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::InvalidItem(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// 校验并规范化提交的明细
pub fn normalize_items(items: &[SelectedItem]) -> Result<Vec<OrderItem>, OrderError> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| normalize_item(idx, item))
        .collect()
}

fn normalize_item(idx: usize, item: &SelectedItem) -> Result<OrderItem, OrderError> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(OrderError::InvalidItem(format!("item #{idx}: name is required")));
    }

    require_finite(item.price, "price")?;
    if !(0.0..=MAX_PRICE).contains(&item.price) {
        return Err(OrderError::InvalidItem(format!(
            "item #{idx}: price must be between 0 and {MAX_PRICE}, got {}",
            item.price
        )));
    }

    if !(1..=MAX_QUANTITY).contains(&item.quantity) {
        return Err(OrderError::InvalidItem(format!(
            "item #{idx}: quantity must be between 1 and {MAX_QUANTITY}, got {}",
            item.quantity
        )));
    }

    require_finite(item.discount, "discount")?;
    if !(0.0..=100.0).contains(&item.discount) {
        return Err(OrderError::InvalidItem(format!(
            "item #{idx}: discount must be between 0 and 100, got {}",
            item.discount
        )));
    }

    Ok(OrderItem {
        id: item.id.clone(),
        name: name.to_string(),
        price: to_f64(to_decimal(item.price)),
        discount: to_f64(to_decimal(item.discount)),
        quantity: item.quantity,
    })
}

/// 明细原价金额（`price × quantity`），已舍入
fn line_gross(item: &OrderItem) -> Decimal {
    round(to_decimal(item.price) * Decimal::from(item.quantity))
}

/// 明细折扣金额，已舍入
fn line_discount(item: &OrderItem, gross: Decimal) -> Decimal {
    round(gross * to_decimal(item.discount) / Decimal::ONE_HUNDRED)
}

/// 根据明细计算订单合计
///
/// 每行先舍入再求和，打印的明细之和总等于打印的合计。
pub fn compute_totals(items: &[OrderItem]) -> Totals {
    let (subtotal, discount) =
        items
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(sub, disc), item| {
                let gross = line_gross(item);
                (sub + gross, disc + line_discount(item, gross))
            });

    Totals {
        subtotal: to_f64(subtotal),
        discount: to_f64(discount),
        total: to_f64(subtotal - discount),
    }
}
