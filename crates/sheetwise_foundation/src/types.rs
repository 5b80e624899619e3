//! Column data types and semantic types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Inferred data type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Unique, numeric-like identifier.
    Id,
    /// Free text.
    Text,
    /// Calendar date.
    Date,
    /// Date with time of day.
    Datetime,
    /// Whole numbers.
    Integer,
    /// Fractional numbers.
    Float,
    /// Monetary amount.
    Currency,
    /// Ratio or percentage.
    Percentage,
    /// Two-valued flag.
    Boolean,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Web address.
    Url,
    /// Small closed set of values.
    Enum,
    /// No values at all.
    Empty,
}

impl DataType {
    /// Returns the lowercase name used in output documents.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Text => "text",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Currency => "currency",
            Self::Percentage => "percentage",
            Self::Boolean => "boolean",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::Enum => "enum",
            Self::Empty => "empty",
        }
    }

    /// Returns true for the numeric family `{id, integer, float}`.
    #[must_use]
    pub const fn is_numeric_family(self) -> bool {
        matches!(self, Self::Id | Self::Integer | Self::Float)
    }

    /// Returns true for any type whose values are numbers.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Id | Self::Integer | Self::Float | Self::Currency | Self::Percentage
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name-based semantic role of a column.
///
/// Serialized as a single string, e.g. `PRIMARY_KEY` or `FOREIGN_KEY:supplier`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// Identifies rows of its own table.
    PrimaryKey,
    /// References the named entity.
    ForeignKey(String),
    /// Display name.
    Name,
    /// Long description or notes.
    Description,
    /// Workflow status.
    Status,
    /// Counted quantity.
    Quantity,
    /// Price or monetary amount.
    Price,
    /// Creation timestamp.
    DateCreated,
    /// Last modification timestamp.
    DateModified,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Postal address.
    Address,
}

impl SemanticType {
    /// Returns the referenced entity for foreign keys.
    #[must_use]
    pub fn foreign_entity(&self) -> Option<&str> {
        match self {
            Self::ForeignKey(entity) => Some(entity),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryKey => f.write_str("PRIMARY_KEY"),
            Self::ForeignKey(entity) => write!(f, "FOREIGN_KEY:{entity}"),
            Self::Name => f.write_str("NAME"),
            Self::Description => f.write_str("DESCRIPTION"),
            Self::Status => f.write_str("STATUS"),
            Self::Quantity => f.write_str("QUANTITY"),
            Self::Price => f.write_str("PRICE"),
            Self::DateCreated => f.write_str("DATE_CREATED"),
            Self::DateModified => f.write_str("DATE_MODIFIED"),
            Self::Email => f.write_str("EMAIL"),
            Self::Phone => f.write_str("PHONE"),
            Self::Address => f.write_str("ADDRESS"),
        }
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(entity) = s.strip_prefix("FOREIGN_KEY:") {
            return Ok(Self::ForeignKey(entity.to_string()));
        }
        match s {
            "PRIMARY_KEY" => Ok(Self::PrimaryKey),
            "NAME" => Ok(Self::Name),
            "DESCRIPTION" => Ok(Self::Description),
            "STATUS" => Ok(Self::Status),
            "QUANTITY" => Ok(Self::Quantity),
            "PRICE" => Ok(Self::Price),
            "DATE_CREATED" => Ok(Self::DateCreated),
            "DATE_MODIFIED" => Ok(Self::DateModified),
            "EMAIL" => Ok(Self::Email),
            "PHONE" => Ok(Self::Phone),
            "ADDRESS" => Ok(Self::Address),
            other => Err(format!("unknown semantic type: {other}")),
        }
    }
}

impl Serialize for SemanticType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
