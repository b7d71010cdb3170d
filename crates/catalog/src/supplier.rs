use serde::{Deserialize, Serialize};

use comanda_core::error::{optional_text, required_name};
use comanda_core::{DomainError, DomainResult, Entity, SupplierId};

/// Contact information for a supplier. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact person.
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactInfo {
    fn normalise(self) -> DomainResult<Self> {
        let email = optional_text(self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(DomainError::validation(format!("invalid email: {email}")));
            }
        }
        Ok(Self {
            contact: optional_text(self.contact),
            phone: optional_text(self.phone),
            email,
        })
    }
}

/// A supplier every article is bought from; one order goes to one supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

impl NewSupplier {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: ContactInfo::default(),
        }
    }

    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_name("supplier name", &self.name)?,
            contact: self.contact.normalise()?,
        })
    }

    pub fn into_supplier(self, id: SupplierId) -> Supplier {
        Supplier {
            id,
            name: self.name,
            contact: self.contact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupplierUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<ContactInfo>,
}

impl SupplierUpdate {
    pub fn apply_to(&self, supplier: &mut Supplier) -> DomainResult<()> {
        // Validate everything before touching the record.
        let name = self
            .name
            .as_deref()
            .map(|n| required_name("supplier name", n))
            .transpose()?;
        let contact = self.contact.clone().map(ContactInfo::normalise).transpose()?;

        if let Some(name) = name {
            supplier.name = name;
        }
        if let Some(contact) = contact {
            supplier.contact = contact;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_fields_are_normalised() {
        let supplier = NewSupplier {
            name: " Distribuidora ABC ".into(),
            contact: ContactInfo {
                contact: Some("  ".into()),
                phone: Some(" 600 000 000 ".into()),
                email: Some("ventas@abc.es".into()),
            },
        }
        .validate()
        .unwrap();

        assert_eq!(supplier.name, "Distribuidora ABC");
        assert_eq!(supplier.contact.contact, None);
        assert_eq!(supplier.contact.phone.as_deref(), Some("600 000 000"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let err = NewSupplier {
            name: "XYZ".into(),
            contact: ContactInfo {
                email: Some("nope".into()),
                ..ContactInfo::default()
            },
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn failed_update_changes_nothing() {
        let mut supplier = NewSupplier::named("XYZ").validate().unwrap().into_supplier(SupplierId::new());
        let before = supplier.clone();

        let update = SupplierUpdate {
            name: Some("Nuevo".into()),
            contact: Some(ContactInfo {
                email: Some("bad".into()),
                ..ContactInfo::default()
            }),
        };
        assert!(update.apply_to(&mut supplier).is_err());
        assert_eq!(supplier, before);
    }
}
