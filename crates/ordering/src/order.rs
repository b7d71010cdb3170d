use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comanda_core::error::optional_text;
use comanda_core::{ArticleId, DomainError, DomainResult, Entity, OrderId, SupplierId, UnitId};

/// Order status lifecycle.
///
/// The purchasing lead may move an order to any status; only the first move
/// to `Sent` has a side effect (stamping `sent_at`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Sent,
    Received,
    InProcess,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Sent,
        OrderStatus::Received,
        OrderStatus::InProcess,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Wire name, also the key used when sorting by status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Sent => "sent",
            OrderStatus::Received => "received",
            OrderStatus::InProcess => "in_process",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown order status: {s}")))
    }
}

/// One article line of a persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub article_id: ArticleId,
    pub name: String,
    pub unit: UnitId,
    pub quantity: f64,
    #[serde(default)]
    pub price: Option<f64>,
}

impl OrderLine {
    fn validate(&self) -> DomainResult<()> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(DomainError::validation(format!(
                "quantity for '{}' must be positive (got {})",
                self.name, self.quantity
            )));
        }
        Ok(())
    }
}

/// A purchase request directed at one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Creation time.
    pub date: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub supplier: SupplierId,
    pub notes: Option<String>,
    pub created_by: String,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// What a status update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// `sent_at` was set by this change.
    pub stamped_sent: bool,
}

impl Order {
    /// Move to `status`. Entering `Sent` stamps `sent_at` only if it is unset,
    /// so bouncing an order back and forth keeps the first send time.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) -> StatusChange {
        let from = self.status;
        let stamped_sent = status == OrderStatus::Sent && self.sent_at.is_none();
        if stamped_sent {
            self.sent_at = Some(now);
        }
        self.status = status;
        StatusChange {
            from,
            to: status,
            stamped_sent,
        }
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = optional_text(notes);
    }

    /// Sum of `price * quantity`, if every line is priced.
    pub fn estimated_total(&self) -> Option<f64> {
        self.lines
            .iter()
            .map(|l| l.price.map(|p| p * l.quantity))
            .sum()
    }
}

/// An order that has not been persisted yet (no id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub date: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub supplier: SupplierId,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_by: String,
}

impl NewOrder {
    /// Invariant: an order has at least one line and every quantity is > 0.
    pub fn validate(self) -> DomainResult<Self> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("order must contain at least one line"));
        }
        for line in &self.lines {
            line.validate()?;
        }
        Ok(Self {
            notes: optional_text(self.notes),
            ..self
        })
    }

    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            date: self.date,
            sent_at: None,
            lines: self.lines,
            status: self.status,
            supplier: self.supplier,
            notes: self.notes,
            created_by: self.created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(quantity: f64) -> OrderLine {
        OrderLine {
            article_id: ArticleId::new(),
            name: "Tomates".into(),
            unit: UnitId::new(),
            quantity,
            price: None,
        }
    }

    fn test_time(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    fn pending_order() -> Order {
        NewOrder {
            date: test_time(8),
            lines: vec![line(2.0)],
            status: OrderStatus::Pending,
            supplier: SupplierId::new(),
            notes: None,
            created_by: "cocina".into(),
        }
        .validate()
        .unwrap()
        .into_order(OrderId::new())
    }

    #[test]
    fn first_move_to_sent_stamps_sent_at() {
        let mut order = pending_order();

        let change = order.set_status(OrderStatus::Sent, test_time(10));

        assert!(change.stamped_sent);
        assert_eq!(change.from, OrderStatus::Pending);
        assert_eq!(order.sent_at, Some(test_time(10)));
    }

    #[test]
    fn sent_at_is_stamped_exactly_once() {
        let mut order = pending_order();
        order.set_status(OrderStatus::Sent, test_time(10));
        order.set_status(OrderStatus::Pending, test_time(11));

        let change = order.set_status(OrderStatus::Sent, test_time(12));

        assert!(!change.stamped_sent);
        assert_eq!(order.sent_at, Some(test_time(10)));
        assert_eq!(order.status, OrderStatus::Sent);
    }

    #[test]
    fn other_transitions_do_not_touch_sent_at() {
        let mut order = pending_order();
        for status in [OrderStatus::InProcess, OrderStatus::Received, OrderStatus::Cancelled] {
            order.set_status(status, test_time(9));
            assert_eq!(order.sent_at, None);
        }
    }

    #[test]
    fn new_order_rejects_empty_and_non_positive_lines() {
        let base = NewOrder {
            date: test_time(8),
            lines: vec![],
            status: OrderStatus::Pending,
            supplier: SupplierId::new(),
            notes: None,
            created_by: "cocina".into(),
        };
        assert!(base.clone().validate().is_err());

        for bad in [0.0, -1.5, f64::NAN] {
            let order = NewOrder {
                lines: vec![line(bad)],
                ..base.clone()
            };
            assert!(order.validate().is_err(), "accepted quantity {bad}");
        }
    }

    #[test]
    fn status_wire_names_round_trip() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.as_str().to_string()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("enviado".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn estimated_total_needs_every_price() {
        let mut order = pending_order();
        assert_eq!(order.estimated_total(), None);

        order.lines[0].price = Some(1.5);
        assert_eq!(order.estimated_total(), Some(3.0));
    }
}
