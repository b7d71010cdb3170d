//! Order list view-model: filter by date range and status, then sort.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use comanda_catalog::Catalog;
use comanda_core::{DomainError, SupplierId};

use crate::order::{Order, OrderStatus};

/// Filter state. Every field is optional; `None` means "don't filter".
///
/// Dates are calendar days in UTC and both ends are inclusive: `date_to`
/// covers the whole day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(from) = self.date_from {
            if order.date < start_of_day(from) {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            // End of day: anything before the next midnight.
            if let Some(next_day) = to.succ_opt() {
                if order.date >= start_of_day(next_day) {
                    return false;
                }
            }
        }
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Status,
    /// Supplier display name (resolved from the id).
    Supplier,
}

impl core::str::FromStr for SortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortKey::Date),
            "status" => Ok(SortKey::Status),
            "supplier" => Ok(SortKey::Supplier),
            other => Err(DomainError::validation(format!("unknown sort key: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn orient(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl core::str::FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(DomainError::validation(format!("unknown sort direction: {other}"))),
        }
    }
}

/// Full list state: filter plus sort. Defaults to newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub filter: OrderFilter,
    #[serde(default)]
    pub sort_key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderListQuery {
    /// Back to no filter, date descending.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Filter then sort, resolving supplier names through the catalog.
    pub fn apply(&self, orders: &[Order], catalog: &Catalog) -> Vec<Order> {
        self.apply_with(orders, |id| catalog.supplier_name(id))
    }

    /// Filter then stable-sort.
    ///
    /// Equal keys keep their input order in both directions: descending
    /// flips the comparator, never the list.
    pub fn apply_with<F>(&self, orders: &[Order], supplier_name: F) -> Vec<Order>
    where
        F: Fn(&SupplierId) -> String,
    {
        let mut selected: Vec<&Order> = orders.iter().filter(|o| self.filter.matches(o)).collect();

        match self.sort_key {
            SortKey::Date => {
                selected.sort_by(|a, b| self.direction.orient(a.date.cmp(&b.date)));
            }
            SortKey::Status => {
                selected.sort_by(|a, b| {
                    self.direction
                        .orient(a.status.as_str().cmp(b.status.as_str()))
                });
            }
            SortKey::Supplier => {
                let mut names: HashMap<SupplierId, String> = HashMap::new();
                for order in &selected {
                    names
                        .entry(order.supplier)
                        .or_insert_with(|| supplier_name(&order.supplier));
                }
                selected.sort_by(|a, b| {
                    self.direction
                        .orient(names[&a.supplier].cmp(&names[&b.supplier]))
                });
            }
        }

        selected.into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderLine;
    use chrono::TimeZone;
    use comanda_catalog::NewSupplier;
    use comanda_core::{ArticleId, OrderId, UnitId};

    fn order_at(date: DateTime<Utc>, status: OrderStatus, supplier: SupplierId) -> Order {
        Order {
            id: OrderId::new(),
            date,
            sent_at: None,
            lines: vec![OrderLine {
                article_id: ArticleId::new(),
                name: "Tomates".into(),
                unit: UnitId::new(),
                quantity: 1.0,
                price: None,
            }],
            status,
            supplier,
            notes: None,
            created_by: "cocina".into(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_is_inclusive_of_the_whole_end_day() {
        let s = SupplierId::new();
        let orders = vec![
            order_at(at(2023, 12, 31, 23, 59, 59), OrderStatus::Pending, s),
            order_at(at(2024, 1, 1, 0, 0, 0), OrderStatus::Pending, s),
            order_at(at(2024, 1, 15, 12, 0, 0), OrderStatus::Pending, s),
            order_at(at(2024, 1, 31, 23, 59, 59), OrderStatus::Pending, s),
            order_at(at(2024, 2, 1, 0, 0, 0), OrderStatus::Pending, s),
        ];
        let query = OrderListQuery {
            filter: OrderFilter {
                date_from: Some(day(2024, 1, 1)),
                date_to: Some(day(2024, 1, 31)),
                status: None,
            },
            ..OrderListQuery::default()
        };

        let out = query.apply_with(&orders, |id| id.to_string());

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|o| o.date >= at(2024, 1, 1, 0, 0, 0)));
        assert!(out.iter().all(|o| o.date < at(2024, 2, 1, 0, 0, 0)));
    }

    #[test]
    fn status_filter_keeps_only_matching() {
        let s = SupplierId::new();
        let orders = vec![
            order_at(at(2024, 1, 1, 8, 0, 0), OrderStatus::Pending, s),
            order_at(at(2024, 1, 2, 8, 0, 0), OrderStatus::Sent, s),
        ];
        let query = OrderListQuery {
            filter: OrderFilter {
                status: Some(OrderStatus::Sent),
                ..OrderFilter::default()
            },
            ..OrderListQuery::default()
        };

        let out = query.apply_with(&orders, |id| id.to_string());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].status, OrderStatus::Sent);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let s = SupplierId::new();
        let orders = vec![
            order_at(at(2024, 1, 1, 8, 0, 0), OrderStatus::Pending, s),
            order_at(at(2024, 1, 3, 8, 0, 0), OrderStatus::Pending, s),
            order_at(at(2024, 1, 2, 8, 0, 0), OrderStatus::Pending, s),
        ];

        let out = OrderListQuery::default().apply_with(&orders, |id| id.to_string());

        let days: Vec<u32> = out.iter().map(|o| chrono::Datelike::day(&o.date)).collect();
        assert_eq!(days, vec![3, 2, 1]);
    }

    #[test]
    fn supplier_sort_uses_resolved_names() {
        let zeta = NewSupplier::named("Zeta").into_supplier(SupplierId::new());
        let alfa = NewSupplier::named("Alfa").into_supplier(SupplierId::new());
        let catalog = Catalog::new(vec![], vec![zeta.clone(), alfa.clone()], vec![], vec![]);
        let orders = vec![
            order_at(at(2024, 1, 1, 8, 0, 0), OrderStatus::Pending, zeta.id),
            order_at(at(2024, 1, 2, 8, 0, 0), OrderStatus::Pending, alfa.id),
        ];
        let query = OrderListQuery {
            sort_key: SortKey::Supplier,
            direction: SortDirection::Asc,
            ..OrderListQuery::default()
        };

        let out = query.apply(&orders, &catalog);

        let names: Vec<String> = out.iter().map(|o| catalog.supplier_name(&o.supplier)).collect();
        assert_eq!(names, vec!["Alfa", "Zeta"]);
    }

    #[test]
    fn reset_restores_date_descending_without_filter() {
        let mut query = OrderListQuery {
            filter: OrderFilter {
                status: Some(OrderStatus::Cancelled),
                ..OrderFilter::default()
            },
            sort_key: SortKey::Supplier,
            direction: SortDirection::Asc,
        };
        query.reset();
        assert_eq!(query.sort_key, SortKey::Date);
        assert_eq!(query.direction, SortDirection::Desc);
        assert!(query.filter.is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn status() -> impl Strategy<Value = OrderStatus> {
            (0usize..OrderStatus::ALL.len()).prop_map(|i| OrderStatus::ALL[i])
        }

        proptest! {
            /// Property: both directions order by wire name and keep input order
            /// among equal statuses.
            #[test]
            fn status_sort_is_stable_in_both_directions(
                statuses in proptest::collection::vec(status(), 0..30),
            ) {
                let s = SupplierId::new();
                let base = at(2024, 1, 1, 0, 0, 0);
                let orders: Vec<Order> = statuses
                    .iter()
                    .enumerate()
                    .map(|(i, st)| order_at(base + chrono::Duration::minutes(i as i64), *st, s))
                    .collect();
                let index_of = |o: &Order| orders.iter().position(|x| x.id == o.id).unwrap();

                let mut query = OrderListQuery { sort_key: SortKey::Status, direction: SortDirection::Asc, ..OrderListQuery::default() };
                let asc = query.apply_with(&orders, |id| id.to_string());
                query.direction = SortDirection::Desc;
                let desc = query.apply_with(&orders, |id| id.to_string());

                for pair in asc.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    prop_assert!(a.status.as_str() <= b.status.as_str());
                    if a.status == b.status {
                        prop_assert!(index_of(a) < index_of(b));
                    }
                }
                for pair in desc.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    prop_assert!(a.status.as_str() >= b.status.as_str());
                    if a.status == b.status {
                        prop_assert!(index_of(a) < index_of(b));
                    }
                }
            }
        }
    }
}
