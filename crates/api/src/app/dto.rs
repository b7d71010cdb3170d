use serde::Deserialize;

use comanda_auth::{Principal, View};
use comanda_catalog::{
    Article, ArticleUpdate, Catalog, ContactInfo, Family, FamilyArticles, NewArticle, Supplier, Unit,
};
use comanda_core::{ArticleId, DomainError, DomainResult, FamilyId, SupplierId, UnitId};
use comanda_ordering::{Order, OrderFilter, OrderListQuery, OrderStatus, SortDirection, SortKey};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub secret: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    pub family: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArticleListParams {
    /// `true` lists only articles offered for ordering.
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFamilyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
}

#[derive(Debug, Deserialize)]
pub struct UnitRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub name: String,
    pub unit_id: String,
    pub family_id: String,
    pub supplier_id: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    pub name: Option<String>,
    pub unit_id: Option<String>,
    pub family_id: Option<String>,
    pub supplier_id: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub article_id: String,
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrdersRequest {
    pub lines: Vec<OrderLineRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

/// `GET /orders` query string; dates are `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

// -------------------------
// Request → domain
// -------------------------

impl CreateArticleRequest {
    pub fn into_new_article(self) -> DomainResult<NewArticle> {
        let mut new = NewArticle::new(
            self.name,
            self.unit_id.parse::<UnitId>()?,
            self.family_id.parse::<FamilyId>()?,
            self.supplier_id.parse::<SupplierId>()?,
        );
        new.description = self.description;
        new.price = self.price;
        if let Some(active) = self.active {
            new.active = active;
        }
        Ok(new)
    }
}

impl UpdateArticleRequest {
    pub fn into_update(self) -> DomainResult<ArticleUpdate> {
        Ok(ArticleUpdate {
            name: self.name,
            unit: self.unit_id.map(|s| s.parse()).transpose()?,
            family: self.family_id.map(|s| s.parse()).transpose()?,
            supplier: self.supplier_id.map(|s| s.parse()).transpose()?,
            description: self.description,
            price: self.price,
            active: self.active,
        })
    }
}

impl CreateOrdersRequest {
    pub fn lines(&self) -> DomainResult<Vec<(ArticleId, f64)>> {
        self.lines
            .iter()
            .map(|l| Ok((l.article_id.parse::<ArticleId>()?, l.quantity)))
            .collect()
    }
}

impl OrderListParams {
    pub fn into_query(self) -> DomainResult<OrderListQuery> {
        let date = |raw: Option<String>, field: &str| {
            raw.map(|s| {
                s.parse::<chrono::NaiveDate>()
                    .map_err(|e| DomainError::validation(format!("{field}: {e} (expected YYYY-MM-DD)")))
            })
            .transpose()
        };

        Ok(OrderListQuery {
            filter: OrderFilter {
                date_from: date(self.from, "from")?,
                date_to: date(self.to, "to")?,
                status: self.status.map(|s| s.parse::<OrderStatus>()).transpose()?,
            },
            sort_key: self.sort.map(|s| s.parse::<SortKey>()).transpose()?.unwrap_or_default(),
            direction: self
                .direction
                .map(|s| s.parse::<SortDirection>())
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn principal_to_json(principal: &Principal) -> serde_json::Value {
    serde_json::json!({
        "name": principal.name,
        "role": principal.role.as_str(),
        "views": views_to_json(comanda_auth::allowed_views(principal.role)),
    })
}

pub fn views_to_json(views: &[View]) -> Vec<serde_json::Value> {
    views
        .iter()
        .map(|v| serde_json::json!({ "view": v.as_str(), "route": v.route() }))
        .collect()
}

pub fn family_to_json(f: &Family) -> serde_json::Value {
    serde_json::json!({
        "id": f.id.to_string(),
        "name": f.name,
        "description": f.description,
    })
}

pub fn supplier_to_json(s: &Supplier) -> serde_json::Value {
    serde_json::json!({
        "id": s.id.to_string(),
        "name": s.name,
        "contact": s.contact,
    })
}

pub fn unit_to_json(u: &Unit) -> serde_json::Value {
    serde_json::json!({
        "id": u.id.to_string(),
        "name": u.name,
    })
}

/// Article with its references resolved to display names.
pub fn article_to_json(a: &Article, catalog: &Catalog) -> serde_json::Value {
    serde_json::json!({
        "id": a.id.to_string(),
        "name": a.name,
        "unit_id": a.unit.to_string(),
        "unit_name": catalog.unit_name(&a.unit),
        "family_id": a.family.to_string(),
        "family_name": catalog.family_name(&a.family),
        "supplier_id": a.supplier.to_string(),
        "supplier_name": catalog.supplier_name(&a.supplier),
        "description": a.description,
        "price": a.price,
        "active": a.active,
    })
}

/// One family section of the cook's browsing catalog (active articles only).
pub fn family_section_to_json(group: &FamilyArticles<'_>, catalog: &Catalog) -> serde_json::Value {
    serde_json::json!({
        "family": family_to_json(group.family),
        "articles": group
            .articles
            .iter()
            .filter(|a| a.active)
            .map(|a| article_to_json(a, catalog))
            .collect::<Vec<_>>(),
    })
}

pub fn order_to_json(o: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": o.id.to_string(),
        "date": o.date.to_rfc3339(),
        "sent_at": o.sent_at.map(|d| d.to_rfc3339()),
        "status": o.status.as_str(),
        "supplier_id": o.supplier.to_string(),
        "notes": o.notes,
        "created_by": o.created_by,
        "lines": o.lines.iter().map(|l| serde_json::json!({
            "article_id": l.article_id.to_string(),
            "name": l.name,
            "unit_id": l.unit.to_string(),
            "quantity": l.quantity,
            "price": l.price,
        })).collect::<Vec<_>>(),
    })
}

/// Order row for listings, with the supplier's display name.
pub fn order_row_to_json(o: &Order, catalog: &Catalog) -> serde_json::Value {
    let mut row = order_to_json(o);
    row["supplier_name"] = serde_json::Value::String(catalog.supplier_name(&o.supplier));
    row["estimated_total"] = serde_json::json!(o.estimated_total());
    row
}
