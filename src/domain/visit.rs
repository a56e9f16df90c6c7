//! Visit aggregate types
//!
//! A visit row owns zero or more detail lines (billed procedures) and zero or
//! more images. Writes go in as [`NewVisit`]; reads come back as
//! [`VisitAggregate`], which lists image metadata only. Payloads are fetched
//! one at a time as [`VisitImage`].

use crate::domain::ids::{BillableCode, ClientId, ImageId, ProviderId, VisitDetailId, VisitId};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Quantity written when a detail line omits one (or supplies 0)
pub const DEFAULT_QUANTITY: i64 = 1;

/// A stored visit row, without children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Visit {
    pub visit_id: VisitId,
    pub client_id: ClientId,
    pub provider_id: ProviderId,
    pub visit_date: Option<String>,
    pub paid: bool,
    pub notes: Option<String>,
}

/// A stored detail line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VisitDetail {
    pub visit_detail_id: VisitDetailId,
    pub visit_id: VisitId,
    pub billable_code: BillableCode,
    pub quantity: i64,
}

/// Image metadata as listed inside an aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VisitImageMeta {
    pub image_id: ImageId,
    pub image_name: String,
    pub image_type: String,
}

/// A single image including its binary payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VisitImage {
    pub image_id: ImageId,
    pub visit_id: VisitId,
    pub image_name: String,
    pub image_type: String,
    #[serde(with = "base64_payload")]
    pub image_data: Vec<u8>,
}

impl VisitImage {
    /// Drops the payload
    pub fn meta(&self) -> VisitImageMeta {
        VisitImageMeta {
            image_id: self.image_id,
            image_name: self.image_name.clone(),
            image_type: self.image_type.clone(),
        }
    }
}

/// A visit row together with its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitAggregate {
    #[serde(flatten)]
    pub visit: Visit,
    pub details: Vec<VisitDetail>,
    pub images: Vec<VisitImageMeta>,
}

impl VisitAggregate {
    /// Shorthand for the visit id
    pub fn id(&self) -> VisitId {
        self.visit.visit_id
    }
}

/// Request to create a visit aggregate
///
/// Client and provider ids may be absent or unknown; the active reference
/// policy decides what happens to them.
///
/// # Examples
///
/// ```
/// use practice_store::domain::{BillableCode, ClientId, NewVisit, ProviderId};
///
/// let visit = NewVisit::new(Some(ClientId::new(1)), Some(ProviderId::new(2)))
///     .with_date("2024-03-01")
///     .with_detail(BillableCode::new("X1").unwrap(), Some(2))
///     .with_detail(BillableCode::new("X1").unwrap(), None);
/// assert_eq!(visit.details[1].effective_quantity(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewVisit {
    #[serde(default)]
    pub client_id: Option<ClientId>,
    #[serde(default)]
    pub provider_id: Option<ProviderId>,
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub paid: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, rename = "details")]
    pub details: Vec<NewVisitDetail>,
    #[serde(default, rename = "images")]
    pub images: Vec<NewVisitImage>,
}

impl NewVisit {
    /// Row fields for the given resolved references
    pub fn fields(&self, client_id: ClientId, provider_id: ProviderId) -> VisitFields {
        VisitFields {
            client_id,
            provider_id,
            visit_date: self.visit_date.clone(),
            paid: self.paid,
            notes: self.notes.clone(),
        }
    }

    /// Starts a visit for the given references
    pub fn new(client_id: Option<ClientId>, provider_id: Option<ProviderId>) -> Self {
        Self {
            client_id,
            provider_id,
            ..Self::default()
        }
    }

    /// Sets the visit date (stored verbatim, no format check)
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.visit_date = Some(date.into());
        self
    }

    /// Sets the paid flag
    pub fn paid(mut self, paid: bool) -> Self {
        self.paid = paid;
        self
    }

    /// Sets the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Appends a detail line
    pub fn with_detail(mut self, code: BillableCode, quantity: Option<i64>) -> Self {
        self.details.push(NewVisitDetail {
            billable_code: code,
            quantity,
        });
        self
    }

    /// Appends an image
    pub fn with_image(
        mut self,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.images.push(NewVisitImage {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        });
        self
    }
}

/// Detail line of a [`NewVisit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewVisitDetail {
    #[serde(deserialize_with = "code_text")]
    pub billable_code: BillableCode,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
}

impl NewVisitDetail {
    /// Quantity to store: absent and zero both mean [`DEFAULT_QUANTITY`]
    pub fn effective_quantity(&self) -> i64 {
        match self.quantity {
            Some(q) if q != 0 => q,
            _ => DEFAULT_QUANTITY,
        }
    }
}

/// Image attached to a [`NewVisit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisitImage {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub mime_type: String,
    #[serde(with = "base64_payload")]
    pub data: Vec<u8>,
}

/// Scalar columns of a visit row
///
/// Used for the row insert once references are resolved, and as the body of a
/// visit update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VisitFields {
    pub client_id: ClientId,
    pub provider_id: ProviderId,
    #[serde(default)]
    pub visit_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub paid: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Accepts booleans, numbers (non-zero is paid), strings and `null`.
///
/// A string is paid unless it is empty, `"0"` or `"false"`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        Some(Flag::Float(f)) => f != 0.0,
        Some(Flag::Text(s)) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        None => false,
    })
}

/// Accepts integers, floats (truncated) and numeric strings.
///
/// Anything else counts as absent, so the line falls back to
/// [`DEFAULT_QUANTITY`].
fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Int(i64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Quantity>::deserialize(deserializer)? {
        Some(Quantity::Int(i)) => Some(i),
        Some(Quantity::Float(f)) => whole(f),
        Some(Quantity::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole))
        }
        Some(Quantity::Other(_)) | None => None,
    })
}

fn whole(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

/// Billable codes may arrive as JSON numbers; they are stored as their text.
fn code_text<'de, D>(deserializer: D) -> Result<BillableCode, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Int(i64),
        Unsigned(u64),
        Float(f64),
    }

    let raw = match Code::deserialize(deserializer)? {
        Code::Text(s) => s,
        Code::Int(i) => i.to_string(),
        Code::Unsigned(u) => u.to_string(),
        Code::Float(f) => f.to_string(),
    };
    BillableCode::new(raw).map_err(serde::de::Error::custom)
}

/// Binary payloads travel as standard base64 in JSON.
mod base64_payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
