//! Demo catalog for a fresh in-memory store.

use std::collections::HashMap;

use comanda_catalog::{NewArticle, NewFamily, NewSupplier, NewUnit};

use crate::repositories::{CatalogRepository, RepositoryError};

const FAMILIES: [&str; 5] = ["Verduras", "Carnes", "Lácteos", "Frutas", "Condimentos"];
const SUPPLIERS: [&str; 3] = ["Distribuidora ABC", "Proveedor XYZ", "Suministros 123"];
const UNITS: [&str; 5] = ["Kg", "L", "Unidad", "Paquete", "Docena"];

/// (article, unit, family, supplier)
const ARTICLES: [(&str, &str, &str, &str); 10] = [
    ("Tomates", "Kg", "Verduras", "Distribuidora ABC"),
    ("Cebollas", "Kg", "Verduras", "Distribuidora ABC"),
    ("Pollo", "Kg", "Carnes", "Proveedor XYZ"),
    ("Carne de Res", "Kg", "Carnes", "Proveedor XYZ"),
    ("Leche", "L", "Lácteos", "Suministros 123"),
    ("Queso", "Kg", "Lácteos", "Suministros 123"),
    ("Manzanas", "Unidad", "Frutas", "Distribuidora ABC"),
    ("Plátanos", "Docena", "Frutas", "Distribuidora ABC"),
    ("Sal", "Paquete", "Condimentos", "Suministros 123"),
    ("Pimienta", "Paquete", "Condimentos", "Suministros 123"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub families: usize,
    pub suppliers: usize,
    pub units: usize,
    pub articles: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Load the demo catalog unless the store already has families.
pub async fn seed_demo_catalog(repo: &CatalogRepository) -> Result<SeedReport, RepositoryError> {
    if !repo.list_families().await?.is_empty() {
        tracing::info!("catalog already populated; demo seed skipped");
        return Ok(SeedReport::default());
    }

    let mut families = HashMap::new();
    for name in FAMILIES {
        families.insert(name, repo.create_family(NewFamily::named(name)).await?.id);
    }
    let mut suppliers = HashMap::new();
    for name in SUPPLIERS {
        suppliers.insert(name, repo.create_supplier(NewSupplier::named(name)).await?.id);
    }
    let mut units = HashMap::new();
    for name in UNITS {
        units.insert(name, repo.create_unit(NewUnit::named(name)).await?.id);
    }

    let mut articles = 0;
    for (name, unit, family, supplier) in ARTICLES {
        let (Some(unit), Some(family), Some(supplier)) =
            (units.get(unit), families.get(family), suppliers.get(supplier))
        else {
            tracing::warn!(article = name, "demo article skipped: unknown reference");
            continue;
        };
        repo.create_article(NewArticle::new(name, *unit, *family, *supplier))
            .await?;
        articles += 1;
    }

    let report = SeedReport {
        families: families.len(),
        suppliers: suppliers.len(),
        units: units.len(),
        articles,
    };
    tracing::info!(?report, "demo catalog seeded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::document_store::InMemoryDocumentStore;

    #[tokio::test]
    async fn seeds_once() {
        let repo = CatalogRepository::new(Arc::new(InMemoryDocumentStore::new()));

        let report = seed_demo_catalog(&repo).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                families: 5,
                suppliers: 3,
                units: 5,
                articles: 10
            }
        );

        let catalog = repo.load().await.unwrap();
        assert!(catalog.dangling_references().is_empty());
        let pollo = catalog.articles().iter().find(|a| a.name == "Pollo").unwrap();
        assert_eq!(catalog.supplier_name(&pollo.supplier), "Proveedor XYZ");

        assert!(seed_demo_catalog(&repo).await.unwrap().is_empty());
        assert_eq!(repo.list_articles().await.unwrap().len(), 10);
    }
}
