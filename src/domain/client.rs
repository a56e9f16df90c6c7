//! Client records

use crate::domain::ids::ClientId;
use serde::{Deserialize, Serialize};

/// Name used for both name fields of an auto-created client or provider
pub const PLACEHOLDER_NAME: &str = "Unknown";

/// A stored client row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Client {
    pub client_id: ClientId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(rename = "DOB")]
    pub dob: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Fields supplied when creating or updating a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewClient {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, rename = "DOB")]
    pub dob: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewClient {
    /// Creates a client with just a name
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Self::default()
        }
    }

    /// The minimal row auto-repair writes for a missing client
    pub fn placeholder() -> Self {
        Self::named(PLACEHOLDER_NAME, PLACEHOLDER_NAME)
    }

    /// Sets the date of birth (stored as given)
    pub fn with_dob(mut self, dob: impl Into<String>) -> Self {
        self.dob = Some(dob.into());
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

    /// Sets the postal address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Combines the supplied fields with a generated id
    pub fn into_client(self, client_id: ClientId) -> Client {
        Client {
            client_id,
            first_name: self.first_name,
            last_name: self.last_name,
            dob: self.dob,
            phone: self.phone,
            email: self.email,
            address: self.address,
        }
    }
}
