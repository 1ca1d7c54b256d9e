//! Commission math - Sizes the commission for one order line.
//!
//! Rates are stored as 0-100 percentages on the product, so the division by 100
//! happens here and nowhere else. The result is computed and stored on every
//! order line at purchase time, whether or not attribution found an affiliate;
//! an unattributed figure is simply never credited.

/// Computes the commission for one order line.
///
/// `amount = (rate / 100) * unit_price * quantity`; a missing rate counts as 0.
#[must_use]
pub fn compute(rate: Option<f64>, unit_price: f64, quantity: i32) -> f64 {
    let rate = rate.unwrap_or(0.0);
    (rate / 100.0) * unit_price * f64::from(quantity)
}
