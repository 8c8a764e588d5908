//! Runtime values of the constraint language.

use std::cmp::Ordering;
use std::fmt;

use crate::error::ExprError;

/// Longest sequence the interpreter will build.
pub const MAX_SEQUENCE_LEN: usize = 1_000_000;

const SLOT: usize = std::mem::size_of::<Value>();

/// A normalized `(major, minor, micro)` version.
///
/// Deliberately not `Ord`: versions are only compared through a compiled
/// constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VersionTuple {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl VersionTuple {
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }

    /// The fields as a tuple of ints, in order.
    pub fn fields(self) -> [u32; 3] {
        [self.major, self.minor, self.micro]
    }

    /// Read a field by attribute name.
    pub fn attribute(self, name: &str) -> Option<u32> {
        match name {
            "major" => Some(self.major),
            "minor" => Some(self.minor),
            "micro" => Some(self.micro),
            _ => None,
        }
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

/// A value produced while evaluating a constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    /// The candidate version; behaves like a named 3-tuple.
    Version(VersionTuple),
}

impl Value {
    /// Name of the value's type, as shown in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
            Self::Version(_) => "version",
        }
    }

    /// Truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) | Self::List(items) => !items.is_empty(),
            Self::Version(_) => true,
        }
    }

    /// Integer view of ints and bools.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float view of any number.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            other => other.as_int().map(|n| n as f64),
        }
    }

    /// Approximate bytes held by this value, including nested elements.
    pub fn weight(&self) -> usize {
        match self {
            Self::Str(s) => SLOT.saturating_add(s.len()),
            Self::Tuple(items) | Self::List(items) => items
                .iter()
                .map(Value::weight)
                .fold(SLOT, usize::saturating_add),
            _ => SLOT,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Int(_) | Self::Float(_))
    }

    /// Elements of tuple-like values (tuples and versions).
    pub fn tuple_items(&self) -> Option<Vec<Value>> {
        match self {
            Self::Tuple(items) => Some(items.clone()),
            Self::Version(v) => Some(v.fields().into_iter().map(|n| Self::Int(i64::from(n))).collect()),
            _ => None,
        }
    }

    /// Elements of any iterable value; strings yield one-character strings.
    pub fn iter_items(&self) -> Result<Vec<Value>, ExprError> {
        match self {
            Self::List(items) => Ok(items.clone()),
            Self::Str(s) => Ok(s.chars().map(|c| Self::Str(c.to_string())).collect()),
            other => other.tuple_items().ok_or_else(|| {
                ExprError::runtime(format!("'{}' object is not iterable", other.type_name()))
            }),
        }
    }

    /// Equality with numeric coercion; tuples and versions compare as tuples.
    pub fn equals(&self, other: &Value) -> bool {
        if self.is_number() && other.is_number() {
            return match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => self.as_float() == other.as_float(),
            };
        }
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => seq_equals(a, b),
            _ => match (self.tuple_items(), other.tuple_items()) {
                (Some(a), Some(b)) => seq_equals(&a, &b),
                _ => false,
            },
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`.
    ///
    /// Returns `Ok(None)` when both sides are comparable but unordered
    /// (a NaN is involved).
    pub fn compare(&self, other: &Value, op: &str) -> Result<Option<Ordering>, ExprError> {
        if self.is_number() && other.is_number() {
            return Ok(match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => self
                    .as_float()
                    .zip(other.as_float())
                    .and_then(|(a, b)| a.partial_cmp(&b)),
            });
        }
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(Some(a.cmp(b))),
            (Self::List(a), Self::List(b)) => seq_compare(a, b, op),
            _ => match (self.tuple_items(), other.tuple_items()) {
                (Some(a), Some(b)) => seq_compare(&a, &b, op),
                _ => Err(ExprError::runtime(format!(
                    "'{op}' not supported between instances of '{}' and '{}'",
                    self.type_name(),
                    other.type_name()
                ))),
            },
        }
    }

    /// Identity test: same type and equal value.
    pub fn is_same(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other) && self.equals(other)
    }

    /// Membership test `needle in self`.
    pub fn contains(&self, needle: &Value) -> Result<bool, ExprError> {
        match self {
            Self::Str(haystack) => match needle {
                Self::Str(n) => Ok(haystack.contains(n.as_str())),
                other => Err(ExprError::runtime(format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ))),
            },
            Self::List(items) => Ok(items.iter().any(|item| item.equals(needle))),
            other => match other.tuple_items() {
                Some(items) => Ok(items.iter().any(|item| item.equals(needle))),
                None => Err(ExprError::runtime(format!(
                    "argument of type '{}' is not iterable",
                    other.type_name()
                ))),
            },
        }
    }
}

fn seq_equals(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

fn seq_compare(a: &[Value], b: &[Value], op: &str) -> Result<Option<Ordering>, ExprError> {
    for (x, y) in a.iter().zip(b) {
        if !x.equals(y) {
            return x.compare(y, op);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                join(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::List(items) => {
                f.write_str("[")?;
                join(f, items)?;
                f.write_str("]")
            }
            Self::Version(v) => write!(
                f,
                "version(major={}, minor={}, micro={})",
                v.major, v.minor, v.micro
            ),
        }
    }
}
