use crate::value::Value;
use std::cmp::Ordering;

/// Total order over field values: variant rank first (`Null` lowest), then
/// the payload order of matching variants.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    left.canonical_rank()
        .cmp(&right.canonical_rank())
        .then_with(|| strict_order_cmp(left, right).unwrap_or(Ordering::Equal))
}

/// Payload order for two values of the same variant; `None` across variants.
#[must_use]
pub fn strict_order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    let ordering = match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Int(l), Value::Int(r)) => l.cmp(r),
        (Value::Uint(l), Value::Uint(r)) => l.cmp(r),
        (Value::Text(l), Value::Text(r)) => l.cmp(r),
        (Value::Blob(l), Value::Blob(r)) => l.cmp(r),
        _ => return None,
    };

    Some(ordering)
}
