//! Tagged values
//!
//! A [`Value`] holds any primitive, math type, string or opaque handle that
//! entity properties are made of. Values have a canonical text form used by
//! the object-text format, and [`coerce`] converts between kinds on request.
//! Reading a value back from text yields a [`Value::Str`]; typed readers call
//! [`coerce`] instead of mutating what is stored.

use std::fmt;

use crate::foundation::math::{utils, Mat4, Quat, Vec2, Vec3, Vec4};

/// Discriminant of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean
    Bool,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 32-bit integer
    Uint,
    /// Single precision float
    Float,
    /// Double precision float
    Double,
    /// UTF-8 string
    Str,
    /// 2-component vector
    Vec2,
    /// 3-component vector
    Vec3,
    /// 4-component vector
    Vec4,
    /// Unit quaternion
    Quat,
    /// 4x4 matrix
    Mat4,
    /// Opaque handle owned by a collaborator
    Ptr,
}

impl ValueKind {
    /// Name used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Str => "string",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Quat => "quat",
            Self::Mat4 => "mat4",
            Self::Ptr => "ptr",
        }
    }

    const fn is_scalar(self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Uint | Self::Float | Self::Double)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced while parsing or coercing values
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Text could not be read as the requested kind
    #[error("cannot parse '{text}' as {kind}")]
    Parse {
        /// Requested kind
        kind: ValueKind,
        /// Offending text
        text: String,
    },

    /// No conversion exists between the two kinds
    #[error("cannot convert {from} to {to}")]
    IncompatibleKinds {
        /// Kind of the stored value
        from: ValueKind,
        /// Requested kind
        to: ValueKind,
    },
}

/// Discriminated union of property values
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i32),
    /// Unsigned integer
    Uint(u32),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// String
    Str(String),
    /// 2-component vector
    Vec2(Vec2),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector
    Vec4(Vec4),
    /// Rotation
    Quat(Quat),
    /// Matrix
    Mat4(Box<Mat4>),
    /// Opaque collaborator handle
    Ptr(u64),
}

impl Value {
    /// Kind tag of this value
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Uint(_) => ValueKind::Uint,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Str(_) => ValueKind::Str,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Vec3(_) => ValueKind::Vec3,
            Self::Vec4(_) => ValueKind::Vec4,
            Self::Quat(_) => ValueKind::Quat,
            Self::Mat4(_) => ValueKind::Mat4,
            Self::Ptr(_) => ValueKind::Ptr,
        }
    }

    /// Canonical text form
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::Float(v) => format!("{v:.5}"),
            Self::Double(v) => format!("{v:.10}"),
            Self::Str(v) => v.clone(),
            Self::Vec2(v) => join_floats(v.iter()),
            Self::Vec3(v) => join_floats(v.iter()),
            Self::Vec4(v) => join_floats(v.iter()),
            Self::Quat(q) => join_floats(utils::quat_to_xyzw(q).iter()),
            Self::Mat4(m) => join_floats(m.iter()),
            Self::Ptr(v) => format!("{v:#x}"),
        }
    }

    /// Parse `text` as a value of `kind`
    pub fn parse_as(kind: ValueKind, text: &str) -> Result<Self, ValueError> {
        let text = text.trim();
        let fail = || ValueError::Parse { kind, text: text.to_string() };

        let value = match kind {
            ValueKind::Bool => {
                if text.eq_ignore_ascii_case("true") || text == "1" {
                    Self::Bool(true)
                } else if text.eq_ignore_ascii_case("false") || text == "0" {
                    Self::Bool(false)
                } else {
                    return Err(fail());
                }
            }
            ValueKind::Int => Self::Int(text.parse().map_err(|_| fail())?),
            ValueKind::Uint => Self::Uint(text.parse().map_err(|_| fail())?),
            ValueKind::Float => Self::Float(text.parse().map_err(|_| fail())?),
            ValueKind::Double => Self::Double(text.parse().map_err(|_| fail())?),
            ValueKind::Str => Self::Str(text.to_string()),
            ValueKind::Vec2 => {
                let [x, y] = parse_floats::<2>(text).ok_or_else(fail)?;
                Self::Vec2(Vec2::new(x, y))
            }
            ValueKind::Vec3 => {
                let [x, y, z] = parse_floats::<3>(text).ok_or_else(fail)?;
                Self::Vec3(Vec3::new(x, y, z))
            }
            ValueKind::Vec4 => {
                let [x, y, z, w] = parse_floats::<4>(text).ok_or_else(fail)?;
                Self::Vec4(Vec4::new(x, y, z, w))
            }
            ValueKind::Quat => {
                let [x, y, z, w] = parse_floats::<4>(text).ok_or_else(fail)?;
                Self::Quat(utils::quat_from_xyzw(x, y, z, w))
            }
            ValueKind::Mat4 => {
                let values = parse_floats::<16>(text).ok_or_else(fail)?;
                Self::Mat4(Box::new(Mat4::from_column_slice(&values)))
            }
            ValueKind::Ptr => {
                let digits = text
                    .strip_prefix("0x")
                    .or_else(|| text.strip_prefix("0X"))
                    .ok_or_else(fail)?;
                Self::Ptr(u64::from_str_radix(digits, 16).map_err(|_| fail())?)
            }
        };
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Convert `value` to `kind`
///
/// Matching kinds pass through untouched, strings are parsed, numeric
/// scalars convert between each other and anything converts to a string.
pub fn coerce(value: Value, kind: ValueKind) -> Result<Value, ValueError> {
    let from = value.kind();
    if from == kind {
        return Ok(value);
    }

    match (value, kind) {
        (Value::Str(text), _) => Value::parse_as(kind, &text),
        (other, ValueKind::Str) => Ok(Value::Str(other.to_text())),
        (other, _) if from.is_scalar() && kind.is_scalar() => {
            convert_scalar(&other, kind).ok_or(ValueError::IncompatibleKinds { from, to: kind })
        }
        _ => Err(ValueError::IncompatibleKinds { from, to: kind }),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn convert_scalar(value: &Value, kind: ValueKind) -> Option<Value> {
    let number = match *value {
        Value::Bool(v) => f64::from(u8::from(v)),
        Value::Int(v) => f64::from(v),
        Value::Uint(v) => f64::from(v),
        Value::Float(v) => f64::from(v),
        Value::Double(v) => v,
        _ => return None,
    };

    let converted = match kind {
        ValueKind::Bool => Value::Bool(number != 0.0),
        ValueKind::Int => {
            if number < f64::from(i32::MIN) || number > f64::from(i32::MAX) {
                return None;
            }
            Value::Int(number as i32)
        }
        ValueKind::Uint => {
            if number < 0.0 || number > f64::from(u32::MAX) {
                return None;
            }
            Value::Uint(number as u32)
        }
        ValueKind::Float => Value::Float(number as f32),
        ValueKind::Double => Value::Double(number),
        _ => return None,
    };
    Some(converted)
}

fn join_floats<'a>(values: impl Iterator<Item = &'a f32>) -> String {
    values
        .map(|v| format!("{v:.5}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_floats<const N: usize>(text: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = text.split_whitespace();
    for slot in &mut out {
        *slot = parts.next()?.parse().ok()?;
    }
    parts.next().is_none().then_some(out)
}

/// Rust types that can be read out of a [`Value`]
pub trait FromValue: Sized {
    /// Kind the value is coerced to before extraction
    const KIND: ValueKind;

    /// Extract from a value already of [`Self::KIND`]
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl FromValue for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

value_conversions! {
    bool => Bool,
    i32 => Int,
    u32 => Uint,
    f32 => Float,
    f64 => Double,
    String => Str,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Quat => Quat,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<Mat4> for Value {
    fn from(value: Mat4) -> Self {
        Self::Mat4(Box::new(value))
    }
}

impl FromValue for Mat4 {
    const KIND: ValueKind = ValueKind::Mat4;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Mat4(inner) => Some(*inner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::Bool(true).to_text(), "true");
        assert_eq!(Value::Int(-4).to_text(), "-4");
        assert_eq!(Value::Float(1.5).to_text(), "1.50000");
        assert_eq!(Value::Vec3(Vec3::new(1.0, 2.0, 3.0)).to_text(), "1.00000 2.00000 3.00000");
        assert_eq!(Value::Quat(Quat::identity()).to_text(), "0.00000 0.00000 0.00000 1.00000");
        assert_eq!(Value::Ptr(255).to_text(), "0xff");
    }

    #[test]
    fn test_bool_parsing_accepts_digits_and_case() {
        assert_eq!(Value::parse_as(ValueKind::Bool, "TRUE"), Ok(Value::Bool(true)));
        assert_eq!(Value::parse_as(ValueKind::Bool, "0"), Ok(Value::Bool(false)));
        assert!(Value::parse_as(ValueKind::Bool, "yes").is_err());
    }

    #[test]
    fn test_vector_component_count_is_enforced() {
        assert!(Value::parse_as(ValueKind::Vec3, "1 2").is_err());
        assert!(Value::parse_as(ValueKind::Vec3, "1 2 3 4").is_err());
        assert_eq!(
            Value::parse_as(ValueKind::Vec2, " 0.5   -1 "),
            Ok(Value::Vec2(Vec2::new(0.5, -1.0)))
        );
    }

    #[test]
    fn test_matrix_text_is_column_major() {
        let matrix = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let text = Value::from(matrix).to_text();
        assert!(text.ends_with("1.00000 2.00000 3.00000 1.00000"));

        match Value::parse_as(ValueKind::Mat4, &text) {
            Ok(Value::Mat4(parsed)) => assert_relative_eq!(*parsed, matrix),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_coerce_string_to_typed() {
        let stored = Value::from("0.25 0.5 0.75");
        let coerced = coerce(stored.clone(), ValueKind::Vec3).unwrap();
        assert_eq!(coerced, Value::Vec3(Vec3::new(0.25, 0.5, 0.75)));
        // The source value is left as it was
        assert_eq!(stored.kind(), ValueKind::Str);
    }

    #[test]
    fn test_coerce_between_scalars() {
        assert_eq!(coerce(Value::Int(3), ValueKind::Float), Ok(Value::Float(3.0)));
        assert_eq!(coerce(Value::Float(2.9), ValueKind::Int), Ok(Value::Int(2)));
        assert_eq!(coerce(Value::Int(0), ValueKind::Bool), Ok(Value::Bool(false)));
        assert!(coerce(Value::Int(-1), ValueKind::Uint).is_err());
    }

    #[test]
    fn test_coerce_rejects_unrelated_kinds() {
        let err = coerce(Value::Vec2(Vec2::zeros()), ValueKind::Quat).unwrap_err();
        assert_eq!(
            err,
            ValueError::IncompatibleKinds { from: ValueKind::Vec2, to: ValueKind::Quat }
        );
    }

    #[test]
    fn test_coerce_anything_to_string() {
        assert_eq!(coerce(Value::Uint(7), ValueKind::Str), Ok(Value::from("7")));
    }

    #[test]
    fn test_float_text_is_stable_after_reparse() {
        let first = Value::Float(1.234_567).to_text();
        let reparsed = Value::parse_as(ValueKind::Float, &first).unwrap();
        assert_eq!(reparsed.to_text(), first);
    }
}
