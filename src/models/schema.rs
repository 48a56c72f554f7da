use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Field name → description mapping that constrains structured extraction.
///
/// Passed to the pipeline service as an opaque JSON string. Fields keep the
/// order they were written in; the service emits its result in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ExtractionSchema {
    // Every value is a `Value::String`.
    fields: Map<String, Value>,
}

impl ExtractionSchema {
    /// Parse user-authored JSON. Must be an object whose values are strings.
    pub fn from_json_str(raw: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(raw).map_err(SchemaError::Json)?;
        match value {
            Value::Object(fields) => Self::try_from(fields),
            _ => Err(SchemaError::NotAnObject),
        }
    }

    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }

    /// Field names and descriptions in authored order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, description)| (name.as_str(), description.as_str().unwrap_or_default()))
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json_string(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

impl TryFrom<Map<String, Value>> for ExtractionSchema {
    type Error = SchemaError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        if let Some((field, _)) = fields.iter().find(|(_, description)| !description.is_string()) {
            return Err(SchemaError::NonStringDescription { field: field.clone() });
        }
        Ok(Self { fields })
    }
}

impl From<ExtractionSchema> for Map<String, Value> {
    fn from(schema: ExtractionSchema) -> Self {
        schema.fields
    }
}

/// Identity document kinds with built-in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DocumentKind {
    #[strum(to_string = "nid_front", serialize = "nid-front")]
    NidFront,
    #[strum(to_string = "nid_back", serialize = "nid-back")]
    NidBack,
}

impl DocumentKind {
    pub fn schema(self) -> ExtractionSchema {
        match self {
            DocumentKind::NidFront => ExtractionSchema::from_fields([
                ("name", "Full Name in English"),
                ("name_bn", "Full Name in Bangla"),
                ("father_name", "Father's Name"),
                ("mother_name", "Mother's Name"),
                ("dob", "Date of Birth (YYYY-MM-DD)"),
                ("nid_no", "NID Number (10, 13, or 17 digits)"),
            ]),
            DocumentKind::NidBack => ExtractionSchema::from_fields([
                ("address_bn", "Address in Bangla (Thikana)"),
                ("blood_group", "Blood Group"),
                ("place_of_birth", "Place of Birth"),
                ("issue_date", "Issue Date"),
                ("mrz_line1", "MRZ Line 1"),
                ("mrz_line2", "MRZ Line 2"),
                ("mrz_line3", "MRZ Line 3"),
            ]),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema must be a JSON object of field name to description")]
    NotAnObject,

    #[error("Description for field '{field}' must be a string")]
    NonStringDescription { field: String },
}
