use serde::{Deserialize, Serialize};

use comanda_core::error::{optional_text, required_name};
use comanda_core::{DomainResult, Entity, FamilyId};

/// Category grouping for catalog articles (e.g. "Verduras", "Lácteos").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Family {
    type Id = FamilyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a family.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewFamily {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewFamily {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Validate and normalise (trimmed name, blank description dropped).
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_name("family name", &self.name)?,
            description: optional_text(self.description),
        })
    }

    pub fn into_family(self, id: FamilyId) -> Family {
        Family {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

/// Partial update; `None` leaves the field untouched, a blank description clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FamilyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FamilyUpdate {
    pub fn apply_to(&self, family: &mut Family) -> DomainResult<()> {
        if let Some(name) = &self.name {
            family.name = required_name("family name", name)?;
        }
        if let Some(description) = &self.description {
            family.description = optional_text(Some(description.clone()));
        }
        Ok(())
    }
}
