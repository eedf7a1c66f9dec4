//! Type name resolution for query parameters, filter parameters and scalar
//! returns. Column-bearing values keep the declared type name as written.

use derive_more::Display;
use serde::Serialize;

///
/// BasicType
///
/// Built-in types known by name.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum BasicType {
    #[display("big_decimal")]
    BigDecimal,
    #[display("big_integer")]
    BigInteger,
    #[display("binary")]
    Binary,
    #[display("blob")]
    Blob,
    #[display("boolean")]
    Boolean,
    #[display("byte")]
    Byte,
    #[display("calendar")]
    Calendar,
    #[display("calendar_date")]
    CalendarDate,
    #[display("character")]
    Character,
    #[display("class")]
    Class,
    #[display("clob")]
    Clob,
    #[display("currency")]
    Currency,
    #[display("date")]
    Date,
    #[display("dbtimestamp")]
    DbTimestamp,
    #[display("double")]
    Double,
    #[display("float")]
    Float,
    #[display("integer")]
    Integer,
    #[display("locale")]
    Locale,
    #[display("long")]
    Long,
    #[display("serializable")]
    Serializable,
    #[display("short")]
    Short,
    #[display("string")]
    String,
    #[display("text")]
    Text,
    #[display("time")]
    Time,
    #[display("timestamp")]
    Timestamp,
    #[display("timezone")]
    Timezone,
    #[display("true_false")]
    TrueFalse,
    #[display("yes_no")]
    YesNo,
}

impl BasicType {
    // from_name
    /// Look up a basic type by its short name or a common alias.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "big_decimal" => Self::BigDecimal,
            "big_integer" => Self::BigInteger,
            "binary" | "byte[]" => Self::Binary,
            "blob" => Self::Blob,
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "calendar" => Self::Calendar,
            "calendar_date" => Self::CalendarDate,
            "character" | "char" => Self::Character,
            "class" => Self::Class,
            "clob" => Self::Clob,
            "currency" => Self::Currency,
            "date" => Self::Date,
            "dbtimestamp" => Self::DbTimestamp,
            "double" => Self::Double,
            "float" => Self::Float,
            "integer" | "int" => Self::Integer,
            "locale" => Self::Locale,
            "long" => Self::Long,
            "serializable" => Self::Serializable,
            "short" => Self::Short,
            "string" => Self::String,
            "text" => Self::Text,
            "time" => Self::Time,
            "timestamp" => Self::Timestamp,
            "timezone" => Self::Timezone,
            "true_false" => Self::TrueFalse,
            "yes_no" => Self::YesNo,
            _ => return None,
        };

        Some(ty)
    }
}

///
/// TypeRef
///
/// A resolved type: either built in, or a custom type named by class.
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq, Serialize)]
pub enum TypeRef {
    Basic(BasicType),
    Custom(String),
}

impl TypeRef {
    // heuristic
    /// Resolve a declared type name. Unknown names are kept as custom types.
    #[must_use]
    pub fn heuristic(name: &str) -> Self {
        let name = name.trim();

        BasicType::from_name(name).map_or_else(|| Self::Custom(name.to_string()), Self::Basic)
    }

    #[must_use]
    pub const fn as_basic(&self) -> Option<BasicType> {
        match self {
            Self::Basic(ty) => Some(*ty),
            Self::Custom(_) => None,
        }
    }
}

impl From<BasicType> for TypeRef {
    fn from(ty: BasicType) -> Self {
        Self::Basic(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_and_aliases_resolve_to_the_same_basic_type() {
        assert_eq!(TypeRef::heuristic("integer"), TypeRef::Basic(BasicType::Integer));
        assert_eq!(TypeRef::heuristic("int"), TypeRef::Basic(BasicType::Integer));
        assert_eq!(TypeRef::heuristic(" long "), TypeRef::Basic(BasicType::Long));
    }

    #[test]
    fn unknown_names_become_custom_types() {
        let ty = TypeRef::heuristic("org.zoo.MoneyType");

        assert_eq!(ty, TypeRef::Custom("org.zoo.MoneyType".into()));
        assert_eq!(ty.as_basic(), None);
        assert_eq!(ty.to_string(), "org.zoo.MoneyType");
    }

    #[test]
    fn basic_types_display_their_short_name() {
        assert_eq!(BasicType::DbTimestamp.to_string(), "dbtimestamp");
        assert_eq!(TypeRef::from(BasicType::YesNo).to_string(), "yes_no");
    }
}
