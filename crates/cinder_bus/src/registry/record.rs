//! # Payload Records
//!
//! Runtime introspection for event payloads: a config loader that only
//! knows an event's name can get a zero-valued record of the right shape
//! from the registry and fill its fields by name.
//!
//! Records are declared with [`payload_record!`](crate::payload_record),
//! which generates the struct plus the by-name accessors.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BusResult;

/// A value assigned to a record field from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean.
    Bool(bool),
    /// Any integer; narrowed on assignment.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// String.
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
        }
    }
}

/// A Rust type usable as a record field.
pub trait FieldKind: Sized {
    /// Name shown in type errors.
    const KIND: &'static str;

    /// Converts from a config value. `None` if the kind or range is wrong.
    fn from_value(value: &FieldValue) -> Option<Self>;

    /// Converts to a config value.
    fn to_value(&self) -> FieldValue;
}

macro_rules! int_field {
    ($($ty:ty),* $(,)?) => {$(
        impl FieldKind for $ty {
            const KIND: &'static str = stringify!($ty);

            fn from_value(value: &FieldValue) -> Option<Self> {
                match value {
                    FieldValue::Int(v) => <$ty>::try_from(*v).ok(),
                    _ => None,
                }
            }

            fn to_value(&self) -> FieldValue {
                FieldValue::Int(i64::from(*self))
            }
        }
    )*};
}

int_field!(i8, i16, i32, i64, u8, u16, u32);

impl FieldKind for u64 {
    const KIND: &'static str = "u64";

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Int(i64::try_from(*self).unwrap_or(i64::MAX))
    }
}

impl FieldKind for f32 {
    const KIND: &'static str = "f32";

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(v) => Some(*v as f32),
            FieldValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Float(f64::from(*self))
    }
}

impl FieldKind for f64 {
    const KIND: &'static str = "f64";

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Float(*self)
    }
}

impl FieldKind for bool {
    const KIND: &'static str = "bool";

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

impl FieldKind for String {
    const KIND: &'static str = "string";

    fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

/// A typed event payload that can be built and filled by name.
pub trait PayloadRecord: Any + Send + Sync + fmt::Debug {
    /// The record's type name.
    fn type_name(&self) -> &'static str;

    /// Field names, in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Assigns a field by name.
    ///
    /// # Errors
    ///
    /// `UnknownField` if there is no such field, `FieldType` if the value
    /// does not fit the field's type.
    fn set_field(&mut self, name: &str, value: FieldValue) -> BusResult<()>;

    /// Reads a field by name.
    fn get_field(&self, name: &str) -> Option<FieldValue>;

    /// A fresh zero-valued record of the same shape.
    fn blank(&self) -> Box<dyn PayloadRecord>;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Owned upcast for downcasting to the concrete type.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// Declares a payload record struct and implements [`PayloadRecord`] for it.
///
/// The struct derives `Clone, Debug, Default, PartialEq`; `Default` is the
/// zero value handed out by the registry. Every field type must implement
/// [`FieldKind`].
///
/// ```rust,ignore
/// cinder_bus::payload_record! {
///     /// An entity took damage.
///     pub struct EntityDamaged {
///         /// Victim.
///         pub entity: u32,
///         /// Hit points removed.
///         pub amount: u32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! payload_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )+
        }

        impl $crate::PayloadRecord for $name {
            fn type_name(&self) -> &'static str {
                stringify!($name)
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::FieldValue,
            ) -> $crate::BusResult<()> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::FieldKind>::from_value(&value)
                                .ok_or_else(|| $crate::BusError::FieldType {
                                    field: name.to_string(),
                                    expected: <$ty as $crate::FieldKind>::KIND,
                                    found: value.to_string(),
                                })?;
                            Ok(())
                        }
                    )+
                    _ => Err($crate::BusError::UnknownField {
                        event: stringify!($name).to_string(),
                        field: name.to_string(),
                    }),
                }
            }

            fn get_field(&self, name: &str) -> Option<$crate::FieldValue> {
                match name {
                    $( stringify!($field) => Some($crate::FieldKind::to_value(&self.$field)), )+
                    _ => None,
                }
            }

            fn blank(&self) -> Box<dyn $crate::PayloadRecord> {
                Box::<Self>::default()
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn std::any::Any + Send> {
                self
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::error::BusError;
    use crate::FieldValue;
    use crate::PayloadRecord;

    crate::payload_record! {
        /// Test record.
        pub struct Probe {
            /// Small unsigned.
            pub id: u8,
            /// Float.
            pub speed: f32,
            /// Flag.
            pub armed: bool,
            /// Label.
            pub label: String,
        }
    }

    #[test]
    fn test_set_and_get_by_name() {
        let mut probe = Probe::default();
        probe.set_field("id", FieldValue::Int(7)).unwrap();
        probe.set_field("speed", FieldValue::Int(3)).unwrap();
        probe.set_field("armed", FieldValue::Bool(true)).unwrap();
        probe.set_field("label", FieldValue::Text("fuse".into())).unwrap();

        assert_eq!(probe.id, 7);
        assert!((probe.speed - 3.0).abs() < f32::EPSILON);
        assert!(probe.armed);
        assert_eq!(probe.get_field("label"), Some(FieldValue::Text("fuse".into())));
        assert_eq!(probe.field_names(), &["id", "speed", "armed", "label"]);
    }

    #[test]
    fn test_out_of_range_int() {
        let mut probe = Probe::default();
        let err = probe.set_field("id", FieldValue::Int(300)).unwrap_err();
        assert_eq!(
            err,
            BusError::FieldType {
                field: "id".into(),
                expected: "u8",
                found: "300".into(),
            }
        );
    }

    #[test]
    fn test_unknown_field() {
        let mut probe = Probe::default();
        let err = probe.set_field("fuel", FieldValue::Int(1)).unwrap_err();
        assert!(matches!(err, BusError::UnknownField { .. }));
    }

    #[test]
    fn test_blank_is_zero_valued() {
        let probe = Probe {
            id: 4,
            speed: 1.5,
            armed: true,
            label: "x".into(),
        };
        let blank = probe.blank();
        assert_eq!(blank.as_any().downcast_ref::<Probe>(), Some(&Probe::default()));
    }

    #[test]
    fn test_untagged_values_from_toml() {
        #[derive(serde::Deserialize)]
        struct Doc {
            a: FieldValue,
            b: FieldValue,
            c: FieldValue,
            d: FieldValue,
        }
        let doc: Doc = toml::from_str("a = 1\nb = 2.5\nc = true\nd = \"hi\"").unwrap();
        assert_eq!(doc.a, FieldValue::Int(1));
        assert_eq!(doc.b, FieldValue::Float(2.5));
        assert_eq!(doc.c, FieldValue::Bool(true));
        assert_eq!(doc.d, FieldValue::Text("hi".into()));
    }
}
