//! Record ⇄ document mapping.
//!
//! Bodies carry references as id strings and times as [`ServerTimestamp`]s.
//! The record id is the document id and never appears in the body.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use comanda_catalog::{Article, ContactInfo, Family, Supplier, Unit};
use comanda_core::{ArticleId, FamilyId, OrderId, SupplierId, UnitId};
use comanda_ordering::{Order, OrderLine, OrderStatus};

use crate::document_store::{Document, ServerTimestamp, StoreError};

/// Body field names shared with queries.
pub mod fields {
    pub const NAME: &str = "name";
    pub const DATE: &str = "date";
    pub const ACTIVE: &str = "active";
    pub const FAMILY: &str = "family";
    pub const SUPPLIER: &str = "supplier";
    pub const UNIT: &str = "unit";
    pub const STATUS: &str = "status";
    pub const SENT_AT: &str = "sent_at";
    pub const NOTES: &str = "notes";
}

fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T, StoreError> {
    serde_json::from_value(doc.data.clone())
        .map_err(|e| StoreError::Serialization(format!("document {}: {e}", doc.id)))
}

fn encode<T: Serialize>(body: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(body).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_id<T>(doc: &Document) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    doc.id
        .parse()
        .map_err(|e| StoreError::Serialization(format!("bad document id {}: {e}", doc.id)))
}

fn to_datetime(ts: ServerTimestamp, doc: &Document) -> Result<DateTime<Utc>, StoreError> {
    ts.to_datetime()
        .ok_or_else(|| StoreError::Serialization(format!("document {}: timestamp out of range", doc.id)))
}

/// Encode a partial record as a merge patch.
pub fn patch<T: Serialize>(body: &T) -> Result<Map<String, JsonValue>, StoreError> {
    match encode(body)? {
        JsonValue::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FamilyBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

pub fn family_to_body(family: &Family) -> Result<JsonValue, StoreError> {
    encode(&FamilyBody {
        name: family.name.clone(),
        description: family.description.clone(),
    })
}

pub fn family_from_doc(doc: &Document) -> Result<Family, StoreError> {
    let body: FamilyBody = decode(doc)?;
    Ok(Family {
        id: parse_id::<FamilyId>(doc)?,
        name: body.name,
        description: body.description,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct SupplierBody {
    name: String,
    #[serde(default)]
    contact: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

pub fn supplier_to_body(supplier: &Supplier) -> Result<JsonValue, StoreError> {
    encode(&SupplierBody {
        name: supplier.name.clone(),
        contact: supplier.contact.contact.clone(),
        phone: supplier.contact.phone.clone(),
        email: supplier.contact.email.clone(),
    })
}

pub fn supplier_from_doc(doc: &Document) -> Result<Supplier, StoreError> {
    let body: SupplierBody = decode(doc)?;
    Ok(Supplier {
        id: parse_id::<SupplierId>(doc)?,
        name: body.name,
        contact: ContactInfo {
            contact: body.contact,
            phone: body.phone,
            email: body.email,
        },
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct UnitBody {
    name: String,
}

pub fn unit_to_body(unit: &Unit) -> Result<JsonValue, StoreError> {
    encode(&UnitBody {
        name: unit.name.clone(),
    })
}

pub fn unit_from_doc(doc: &Document) -> Result<Unit, StoreError> {
    let body: UnitBody = decode(doc)?;
    Ok(Unit {
        id: parse_id::<UnitId>(doc)?,
        name: body.name,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct ArticleBody {
    name: String,
    unit: UnitId,
    family: FamilyId,
    supplier: SupplierId,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default = "active_by_default")]
    active: bool,
}

fn active_by_default() -> bool {
    true
}

pub fn article_to_body(article: &Article) -> Result<JsonValue, StoreError> {
    encode(&ArticleBody {
        name: article.name.clone(),
        unit: article.unit,
        family: article.family,
        supplier: article.supplier,
        description: article.description.clone(),
        price: article.price,
        active: article.active,
    })
}

pub fn article_from_doc(doc: &Document) -> Result<Article, StoreError> {
    let body: ArticleBody = decode(doc)?;
    Ok(Article {
        id: parse_id::<ArticleId>(doc)?,
        name: body.name,
        unit: body.unit,
        family: body.family,
        supplier: body.supplier,
        description: body.description,
        price: body.price,
        active: body.active,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderBody {
    date: ServerTimestamp,
    #[serde(default)]
    sent_at: Option<ServerTimestamp>,
    lines: Vec<OrderLine>,
    status: OrderStatus,
    supplier: SupplierId,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    created_by: String,
}

pub fn order_to_body(order: &Order) -> Result<JsonValue, StoreError> {
    encode(&OrderBody {
        date: order.date.into(),
        sent_at: order.sent_at.map(ServerTimestamp::from),
        lines: order.lines.clone(),
        status: order.status,
        supplier: order.supplier,
        notes: order.notes.clone(),
        created_by: order.created_by.clone(),
    })
}

pub fn order_from_doc(doc: &Document) -> Result<Order, StoreError> {
    let body: OrderBody = decode(doc)?;
    Ok(Order {
        id: parse_id::<OrderId>(doc)?,
        date: to_datetime(body.date, doc)?,
        sent_at: body.sent_at.map(|ts| to_datetime(ts, doc)).transpose()?,
        lines: body.lines,
        status: body.status,
        supplier: body.supplier,
        notes: body.notes,
        created_by: body.created_by,
    })
}

/// Patch written when an order's status changes.
#[derive(Debug, Serialize)]
pub struct OrderStatusPatch {
    pub status: OrderStatus,
    pub sent_at: Option<ServerTimestamp>,
}

impl OrderStatusPatch {
    pub fn from_order(order: &Order) -> Self {
        Self {
            status: order.status,
            sent_at: order.sent_at.map(ServerTimestamp::from),
        }
    }
}
