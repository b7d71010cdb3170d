use serde::{Deserialize, Serialize};

use comanda_core::error::required_name;
use comanda_core::{DomainResult, Entity, UnitId};

/// Measurement or packaging unit ("formato"): Kg, L, Paquete...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
}

impl Entity for Unit {
    type Id = UnitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewUnit {
    pub name: String,
}

impl NewUnit {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_name("unit name", &self.name)?,
        })
    }

    pub fn into_unit(self, id: UnitId) -> Unit {
        Unit { id, name: self.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitUpdate {
    #[serde(default)]
    pub name: Option<String>,
}

impl UnitUpdate {
    pub fn apply_to(&self, unit: &mut Unit) -> DomainResult<()> {
        if let Some(name) = &self.name {
            unit.name = required_name("unit name", name)?;
        }
        Ok(())
    }
}
