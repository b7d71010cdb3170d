//! Order draft builder.
//!
//! A cook picks articles and quantities into a single draft regardless of
//! supplier. On submission the draft is split into one order per supplier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comanda_catalog::{Article, Catalog};
use comanda_core::{ArticleId, FamilyId, SupplierId, UnitId};

use crate::order::{NewOrder, OrderLine, OrderStatus};

/// One selected article with its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftLine {
    pub article_id: ArticleId,
    pub name: String,
    pub unit: UnitId,
    pub family: FamilyId,
    pub supplier: SupplierId,
    pub quantity: f64,
    #[serde(default)]
    pub price: Option<f64>,
}

impl DraftLine {
    fn from_article(article: &Article, quantity: f64) -> Self {
        Self {
            article_id: article.id,
            name: article.name.clone(),
            unit: article.unit,
            family: article.family,
            supplier: article.supplier,
            quantity,
            price: article.price,
        }
    }

    fn to_order_line(&self) -> OrderLine {
        OrderLine {
            article_id: self.article_id,
            name: self.name.clone(),
            unit: self.unit,
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// Draft lines of one family, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFamilyGroup<'a> {
    pub family: FamilyId,
    /// Resolved name, or the raw id if the family no longer exists.
    pub family_name: String,
    pub lines: Vec<&'a DraftLine>,
}

/// The in-progress order a cook is assembling.
///
/// Invariant: every line has a finite quantity > 0. Operations that would
/// leave a line at zero or below remove it instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    lines: Vec<DraftLine>,
}

fn usable(quantity: f64) -> bool {
    quantity.is_finite() && quantity > 0.0
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Current quantity of `article_id` in the draft (0 if absent).
    pub fn quantity_of(&self, article_id: &ArticleId) -> f64 {
        self.line(article_id).map(|l| l.quantity).unwrap_or(0.0)
    }

    fn line(&self, article_id: &ArticleId) -> Option<&DraftLine> {
        self.lines.iter().find(|l| l.article_id == *article_id)
    }

    fn line_mut(&mut self, article_id: &ArticleId) -> Option<&mut DraftLine> {
        self.lines.iter_mut().find(|l| l.article_id == *article_id)
    }

    /// Add `quantity` of `article`, summing into an existing line.
    ///
    /// Returns `false` (and changes nothing) for a non-positive or
    /// non-finite quantity.
    pub fn add_item(&mut self, article: &Article, quantity: f64) -> bool {
        if !usable(quantity) {
            return false;
        }
        match self.line_mut(&article.id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(DraftLine::from_article(article, quantity)),
        }
        true
    }

    pub fn remove_item(&mut self, article_id: &ArticleId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.article_id != *article_id);
        self.lines.len() != before
    }

    /// Overwrite the quantity of an existing line; `<= 0` removes it.
    ///
    /// Unknown articles are ignored (there is nothing to update).
    pub fn set_quantity(&mut self, article_id: &ArticleId, quantity: f64) {
        if !usable(quantity) {
            self.remove_item(article_id);
            return;
        }
        if let Some(line) = self.line_mut(article_id) {
            line.quantity = quantity;
        }
    }

    pub fn increment(&mut self, article: &Article) {
        self.add_item(article, 1.0);
    }

    /// Subtract one; reaching zero or below removes the line.
    pub fn decrement(&mut self, article_id: &ArticleId) {
        let next = self.quantity_of(article_id) - 1.0;
        self.set_quantity(article_id, next);
    }

    /// Lines grouped by family (first-appearance order), for display.
    pub fn grouped_by_family(&self, catalog: &Catalog) -> Vec<DraftFamilyGroup<'_>> {
        let mut groups: Vec<DraftFamilyGroup<'_>> = Vec::new();
        for line in &self.lines {
            match groups.iter_mut().find(|g| g.family == line.family) {
                Some(group) => group.lines.push(line),
                None => groups.push(DraftFamilyGroup {
                    family: line.family,
                    family_name: catalog.family_name(&line.family),
                    lines: vec![line],
                }),
            }
        }
        groups
    }

    /// Suppliers present in the draft, in first-appearance order.
    pub fn suppliers(&self) -> Vec<SupplierId> {
        let mut out: Vec<SupplierId> = Vec::new();
        for line in &self.lines {
            if !out.contains(&line.supplier) {
                out.push(line.supplier);
            }
        }
        out
    }

    /// One pending order per supplier, each holding only that supplier's lines.
    pub fn split_by_supplier(&self, now: DateTime<Utc>, created_by: &str) -> Vec<NewOrder> {
        self.suppliers()
            .into_iter()
            .map(|supplier| NewOrder {
                date: now,
                lines: self
                    .lines
                    .iter()
                    .filter(|l| l.supplier == supplier)
                    .map(DraftLine::to_order_line)
                    .collect(),
                status: OrderStatus::Pending,
                supplier,
                notes: None,
                created_by: created_by.to_string(),
            })
            .collect()
    }

    /// Drop every line for `supplier`; returns how many were removed.
    pub fn remove_supplier(&mut self, supplier: &SupplierId) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| l.supplier != *supplier);
        before - self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use comanda_catalog::{NewArticle, NewFamily, NewSupplier, NewUnit};

    fn article(name: &str, family: FamilyId, supplier: SupplierId) -> Article {
        NewArticle::new(name, UnitId::new(), family, supplier).into_article(ArticleId::new())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn adding_twice_sums_into_one_line() {
        let tomates = article("Tomates", FamilyId::new(), SupplierId::new());
        let mut draft = OrderDraft::new();

        draft.add_item(&tomates, 2.0);
        draft.add_item(&tomates, 0.5);

        assert_eq!(draft.len(), 1);
        assert_eq!(draft.quantity_of(&tomates.id), 2.5);
    }

    #[test]
    fn non_positive_add_is_ignored() {
        let tomates = article("Tomates", FamilyId::new(), SupplierId::new());
        let mut draft = OrderDraft::new();

        assert!(!draft.add_item(&tomates, 0.0));
        assert!(!draft.add_item(&tomates, -3.0));
        assert!(draft.is_empty());
    }

    #[test]
    fn set_quantity_zero_or_negative_removes() {
        let tomates = article("Tomates", FamilyId::new(), SupplierId::new());
        let pollo = article("Pollo", FamilyId::new(), SupplierId::new());
        let mut draft = OrderDraft::new();
        draft.add_item(&tomates, 1.0);
        draft.add_item(&pollo, 1.0);

        draft.set_quantity(&tomates.id, 0.0);
        draft.set_quantity(&pollo.id, -2.0);

        assert!(draft.is_empty());
    }

    #[test]
    fn set_quantity_on_unknown_article_does_not_add() {
        let mut draft = OrderDraft::new();
        draft.set_quantity(&ArticleId::new(), 4.0);
        assert!(draft.is_empty());
    }

    #[test]
    fn increment_and_decrement_step_by_one() {
        let leche = article("Leche", FamilyId::new(), SupplierId::new());
        let mut draft = OrderDraft::new();

        draft.increment(&leche);
        draft.increment(&leche);
        assert_eq!(draft.quantity_of(&leche.id), 2.0);

        draft.decrement(&leche.id);
        assert_eq!(draft.quantity_of(&leche.id), 1.0);

        draft.decrement(&leche.id);
        assert!(draft.is_empty());

        // Decrementing something absent is a no-op.
        draft.decrement(&leche.id);
        assert!(draft.is_empty());
    }

    #[test]
    fn decrement_below_one_removes_fractional_line() {
        let sal = article("Sal", FamilyId::new(), SupplierId::new());
        let mut draft = OrderDraft::new();
        draft.add_item(&sal, 0.25);

        draft.decrement(&sal.id);

        assert!(draft.is_empty());
    }

    #[test]
    fn split_yields_one_pending_order_per_supplier() {
        let family = FamilyId::new();
        let abc = SupplierId::new();
        let xyz = SupplierId::new();
        let tomates = article("Tomates", family, abc);
        let cebollas = article("Cebollas", family, abc);
        let pollo = article("Pollo", family, xyz);

        let mut draft = OrderDraft::new();
        draft.add_item(&tomates, 2.0);
        draft.add_item(&pollo, 1.0);
        draft.add_item(&cebollas, 3.0);
        draft.add_item(&tomates, 1.0);

        let orders = draft.split_by_supplier(now(), "cocina");

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].supplier, abc);
        assert_eq!(orders[0].lines.len(), 2);
        assert_eq!(orders[0].lines[0].quantity, 3.0);
        assert_eq!(orders[1].supplier, xyz);
        assert_eq!(orders[1].lines.len(), 1);
        assert!(orders.iter().all(|o| o.status == OrderStatus::Pending));
        assert!(orders.iter().all(|o| o.date == now() && o.created_by == "cocina"));
    }

    #[test]
    fn grouped_by_family_resolves_names_and_falls_back_to_id() {
        let verduras = NewFamily::named("Verduras").into_family(FamilyId::new());
        let supplier = NewSupplier::named("ABC").into_supplier(SupplierId::new());
        let unit = NewUnit::named("Kg").into_unit(UnitId::new());
        let catalog = Catalog::new(vec![verduras.clone()], vec![supplier.clone()], vec![unit], vec![]);

        let orphan_family = FamilyId::new();
        let mut draft = OrderDraft::new();
        draft.add_item(&article("Tomates", verduras.id, supplier.id), 1.0);
        draft.add_item(&article("Misterio", orphan_family, supplier.id), 1.0);
        draft.add_item(&article("Cebollas", verduras.id, supplier.id), 1.0);

        let groups = draft.grouped_by_family(&catalog);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].family_name, "Verduras");
        assert_eq!(groups[0].lines.len(), 2);
        assert_eq!(groups[1].family_name, orphan_family.to_string());
    }

    #[test]
    fn remove_supplier_drops_only_that_suppliers_lines() {
        let abc = SupplierId::new();
        let xyz = SupplierId::new();
        let mut draft = OrderDraft::new();
        draft.add_item(&article("Tomates", FamilyId::new(), abc), 1.0);
        draft.add_item(&article("Pollo", FamilyId::new(), xyz), 1.0);

        assert_eq!(draft.remove_supplier(&abc), 1);
        assert_eq!(draft.suppliers(), vec![xyz]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(usize, f64),
            Set(usize, f64),
            Inc(usize),
            Dec(usize),
            Remove(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..6, -3.0f64..10.0).prop_map(|(i, q)| Op::Add(i, q)),
                (0usize..6, -3.0f64..10.0).prop_map(|(i, q)| Op::Set(i, q)),
                (0usize..6).prop_map(Op::Inc),
                (0usize..6).prop_map(Op::Dec),
                (0usize..6).prop_map(Op::Remove),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: no line ever holds a non-positive quantity.
            #[test]
            fn lines_stay_positive(ops in proptest::collection::vec(op(), 0..60)) {
                let suppliers = [SupplierId::new(), SupplierId::new()];
                let articles: Vec<Article> = (0..6)
                    .map(|i| article(&format!("A{i}"), FamilyId::new(), suppliers[i % 2]))
                    .collect();
                let mut draft = OrderDraft::new();

                for op in ops {
                    match op {
                        Op::Add(i, q) => { draft.add_item(&articles[i], q); }
                        Op::Set(i, q) => draft.set_quantity(&articles[i].id, q),
                        Op::Inc(i) => draft.increment(&articles[i]),
                        Op::Dec(i) => draft.decrement(&articles[i].id),
                        Op::Remove(i) => { draft.remove_item(&articles[i].id); }
                    }
                    prop_assert!(draft.lines().iter().all(|l| l.quantity > 0.0));
                }

                for order in draft.split_by_supplier(now(), "cocina") {
                    prop_assert!(order.clone().validate().is_ok());
                }
            }

            /// Property: splitting yields exactly one order per distinct supplier,
            /// each holding only its own lines, with quantities summed per article.
            #[test]
            fn split_partitions_by_supplier(
                picks in proptest::collection::vec((0usize..8, 1u32..20), 1..40),
            ) {
                let suppliers = [SupplierId::new(), SupplierId::new(), SupplierId::new()];
                let articles: Vec<Article> = (0..8)
                    .map(|i| article(&format!("A{i}"), FamilyId::new(), suppliers[i % 3]))
                    .collect();

                let mut draft = OrderDraft::new();
                let mut expected = std::collections::HashMap::new();
                for (i, q) in &picks {
                    draft.add_item(&articles[*i], f64::from(*q));
                    *expected.entry(articles[*i].id).or_insert(0.0) += f64::from(*q);
                }

                let orders = draft.split_by_supplier(now(), "cocina");
                let distinct: std::collections::HashSet<_> =
                    picks.iter().map(|(i, _)| articles[*i].supplier).collect();

                prop_assert_eq!(orders.len(), distinct.len());
                let mut seen = 0;
                for order in &orders {
                    for line in &order.lines {
                        let source = articles.iter().find(|a| a.id == line.article_id).unwrap();
                        prop_assert_eq!(source.supplier, order.supplier);
                        prop_assert_eq!(Some(&line.quantity), expected.get(&line.article_id));
                        seen += 1;
                    }
                }
                prop_assert_eq!(seen, expected.len());
            }
        }
    }
}
