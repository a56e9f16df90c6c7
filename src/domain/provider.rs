//! Provider records

use crate::domain::client::PLACEHOLDER_NAME;
use crate::domain::ids::ProviderId;
use serde::{Deserialize, Serialize};

/// A stored provider row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Provider {
    pub provider_id: ProviderId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Fields supplied when creating or updating a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewProvider {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl NewProvider {
    /// Creates a provider with just a name
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Self::default()
        }
    }

    /// The minimal row auto-repair writes for a missing provider
    pub fn placeholder() -> Self {
        Self::named(PLACEHOLDER_NAME, PLACEHOLDER_NAME)
    }

    /// Sets the specialty
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    /// Sets the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Combines the supplied fields with a generated id
    pub fn into_provider(self, provider_id: ProviderId) -> Provider {
        Provider {
            provider_id,
            first_name: self.first_name,
            last_name: self.last_name,
            specialty: self.specialty,
            phone: self.phone,
            email: self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_provider() {
        let provider = NewProvider::placeholder();
        assert_eq!(provider.first_name.as_deref(), Some("Unknown"));
        assert_eq!(provider.last_name.as_deref(), Some("Unknown"));
        assert!(provider.specialty.is_none());
    }

    #[test]
    fn test_builder_fields() {
        let provider = NewProvider::named("Grace", "Hopper")
            .with_specialty("Orthodontics")
            .with_email("grace@example.com")
            .into_provider(ProviderId::new(9));
        assert_eq!(provider.provider_id.get(), 9);
        assert_eq!(provider.specialty.as_deref(), Some("Orthodontics"));
        assert!(provider.phone.is_none());
    }
}
