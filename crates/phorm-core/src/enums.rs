//! String-backed enum types for the phorm system.
//!
//! Each enum serializes as its lowercase string form and deserializes any
//! unknown string into an `Other(String)` variant so stored records with
//! unrecognized values survive a round trip. Validation rejects `Other`
//! where the domain requires a known value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident,
        variants: [ $( ($variant:ident, $str:expr) ),+ $(,)? ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            /// Unrecognized value carried through verbatim.
            Other(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::Other(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is a known built-in variant.
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }

            /// All known string forms, for error messages.
            pub fn known_values() -> &'static [&'static str] {
                &[ $( $str ),+ ]
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::Other(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from(s.as_str())
            }
        }
    };
}

string_enum! {
    /// How a dependency drives its target field.
    DependencyKind, default = Value,
    variants: [
        (Value, "value"),
        (Lookup, "lookup"),
        (Visibility, "visibility"),
        (Validation, "validation"),
        (Calculation, "calculation"),
    ]
}

impl DependencyKind {
    /// Kinds whose behavior is defined by an expression.
    pub fn requires_expression(&self) -> bool {
        matches!(self, Self::Calculation | Self::Visibility | Self::Validation)
    }

    /// Kinds that resolve through an external lookup key.
    pub fn requires_lookup_key(&self) -> bool {
        matches!(self, Self::Lookup)
    }

    /// Kinds whose evaluation writes a value into the target field.
    ///
    /// Only these participate in the dependency graph: a rule that never
    /// writes cannot feed another rule's source, so it cannot close a
    /// processing loop. Validation and visibility rules may therefore
    /// reference the very field they guard.
    pub fn writes_target(&self) -> bool {
        matches!(self, Self::Value | Self::Lookup | Self::Calculation)
    }
}

string_enum! {
    /// Lifecycle status of a form submission.
    SubmissionStatus, default = Draft,
    variants: [
        (Draft, "draft"),
        (Submitted, "submitted"),
        (Approved, "approved"),
        (Rejected, "rejected"),
    ]
}

string_enum! {
    /// Input control type of a form field.
    FieldType, default = Text,
    variants: [
        (Text, "text"),
        (Textarea, "textarea"),
        (Number, "number"),
        (Date, "date"),
        (Select, "select"),
        (Checkbox, "checkbox"),
        (Radio, "radio"),
    ]
}
