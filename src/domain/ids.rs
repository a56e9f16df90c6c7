//! Domain identifier types
//!
//! Surrogate keys generated by the store are wrapped in integer newtypes so a
//! client id can never be passed where a provider id is expected. Billables are
//! keyed by a caller-chosen business code instead, see [`BillableCode`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares an integer row identifier newtype.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw row id
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|e| format!("Invalid {} '{}': {}", stringify!($name), s, e))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

row_id!(
    /// Client row identifier (`Clients.ClientId`)
    ClientId
);
row_id!(
    /// Provider row identifier (`Providers.ProviderId`)
    ProviderId
);
row_id!(
    /// Visit row identifier (`Visits.VisitId`)
    VisitId
);
row_id!(
    /// Visit detail line identifier (`VisitDetails.VisitDetailId`)
    VisitDetailId
);
row_id!(
    /// Visit image identifier (`VisitImages.ImageId`)
    ImageId
);

/// Billable business code
///
/// The code is the billable's identity (`Billables.BillableCode`), chosen by
/// the practice rather than generated by the store.
///
/// # Examples
///
/// ```
/// use practice_store::domain::ids::BillableCode;
/// use std::str::FromStr;
///
/// let code = BillableCode::from_str("D0120").unwrap();
/// assert_eq!(code.as_str(), "D0120");
/// assert!(BillableCode::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillableCode(String);

impl BillableCode {
    /// Creates a new BillableCode
    ///
    /// # Returns
    ///
    /// Returns `Err` if the code is empty or whitespace only
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err("Billable code cannot be empty".to_string());
        }
        Ok(Self(code))
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for BillableCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BillableCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BillableCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BillableCode> for String {
    fn from(code: BillableCode) -> Self {
        code.0
    }
}

impl AsRef<str> for BillableCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_roundtrip_through_display() {
        let id = ClientId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<ClientId>().unwrap(), id);
    }

    #[test]
    fn test_row_id_rejects_garbage() {
        let err = "abc".parse::<VisitId>().unwrap_err();
        assert!(err.contains("VisitId"));
    }

    #[test]
    fn test_row_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&ProviderId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: ProviderId = serde_json::from_str("7").unwrap();
        assert_eq!(back.get(), 7);
    }

    #[test]
    fn test_billable_code_empty_fails() {
        assert!(BillableCode::new("").is_err());
        assert!(BillableCode::new("   ").is_err());
    }

    #[test]
    fn test_billable_code_deserialize_validates() {
        let ok: BillableCode = serde_json::from_str("\"X1\"").unwrap();
        assert_eq!(ok.as_str(), "X1");
        assert!(serde_json::from_str::<BillableCode>("\"\"").is_err());
    }
}
