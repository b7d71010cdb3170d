use serde::{Deserialize, Serialize};

use comanda_core::error::{optional_text, required_name};
use comanda_core::{ArticleId, DomainError, DomainResult, Entity, FamilyId, SupplierId, UnitId};

/// A catalog article a cook can put in an order.
///
/// Belongs to exactly one family and one supplier at a time, and is measured
/// in one unit. All three are soft references (ids); see
/// [`Catalog`](crate::Catalog) for how they are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub name: String,
    pub unit: UnitId,
    pub family: FamilyId,
    pub supplier: SupplierId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Entity for Article {
    type Id = ArticleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_price(price: Option<f64>) -> DomainResult<Option<f64>> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err(DomainError::validation(format!(
            "price must be a non-negative number (got {p})"
        ))),
        other => Ok(other),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub name: String,
    pub unit: UnitId,
    pub family: FamilyId,
    pub supplier: SupplierId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl NewArticle {
    pub fn new(name: impl Into<String>, unit: UnitId, family: FamilyId, supplier: SupplierId) -> Self {
        Self {
            name: name.into(),
            unit,
            family,
            supplier,
            description: None,
            price: None,
            active: true,
        }
    }

    /// Field-level validation only; the repository checks that the
    /// referenced family, supplier and unit exist.
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_name("article name", &self.name)?,
            description: optional_text(self.description),
            price: validate_price(self.price)?,
            ..self
        })
    }

    pub fn into_article(self, id: ArticleId) -> Article {
        Article {
            id,
            name: self.name,
            unit: self.unit,
            family: self.family,
            supplier: self.supplier,
            description: self.description,
            price: self.price,
            active: self.active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArticleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<UnitId>,
    #[serde(default)]
    pub family: Option<FamilyId>,
    #[serde(default)]
    pub supplier: Option<SupplierId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ArticleUpdate {
    /// Apply to a copy and return it; the original is untouched on error.
    pub fn applied(&self, article: &Article) -> DomainResult<Article> {
        let mut next = article.clone();
        if let Some(name) = &self.name {
            next.name = required_name("article name", name)?;
        }
        if let Some(unit) = self.unit {
            next.unit = unit;
        }
        if let Some(family) = self.family {
            next.family = family;
        }
        if let Some(supplier) = self.supplier {
            next.supplier = supplier;
        }
        if let Some(description) = &self.description {
            next.description = optional_text(Some(description.clone()));
        }
        if self.price.is_some() {
            next.price = validate_price(self.price)?;
        }
        if let Some(active) = self.active {
            next.active = active;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewArticle {
        NewArticle::new("Tomates", UnitId::new(), FamilyId::new(), SupplierId::new())
    }

    #[test]
    fn negative_or_nan_price_is_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let article = NewArticle {
                price: Some(bad),
                ..sample()
            };
            assert!(article.validate().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn new_articles_default_to_active() {
        let json = serde_json::json!({
            "name": "Leche",
            "unit": UnitId::new(),
            "family": FamilyId::new(),
            "supplier": SupplierId::new(),
        });
        let article: NewArticle = serde_json::from_value(json).unwrap();
        assert!(article.active);
    }

    #[test]
    fn update_can_move_article_to_another_supplier() {
        let article = sample().validate().unwrap().into_article(ArticleId::new());
        let supplier = SupplierId::new();

        let moved = ArticleUpdate {
            supplier: Some(supplier),
            active: Some(false),
            ..ArticleUpdate::default()
        }
        .applied(&article)
        .unwrap();

        assert_eq!(moved.supplier, supplier);
        assert!(!moved.active);
        assert_eq!(moved.family, article.family);
    }
}
