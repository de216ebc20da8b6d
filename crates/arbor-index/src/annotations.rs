//! Annotation instances and annotation targets.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::types::TypeName;

/// A single annotation member value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Enum { ty: TypeName, constant: SmolStr },
    Class(TypeName),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_class_array(&self) -> Option<Vec<&TypeName>> {
        match self {
            Value::Array(values) => values
                .iter()
                .map(|v| match v {
                    Value::Class(name) => Some(name),
                    _ => None,
                })
                .collect(),
            Value::Class(name) => Some(vec![name]),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Enum { ty, constant } => write!(f, "{}.{constant}", ty.simple_name()),
            Value::Class(name) => write!(f, "{name}.class"),
            Value::Array(values) => {
                f.write_str("{")?;
                for (idx, v) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A named annotation member, e.g. `value = "payment"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationValue {
    pub name: SmolStr,
    pub value: Value,
}

impl AnnotationValue {
    pub fn new(name: impl Into<SmolStr>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An applied annotation: name plus ordered member values.
///
/// Equality is structural. The processor narrows it further for qualifier
/// matching by skipping members marked non-binding.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationInstance {
    pub name: TypeName,
    pub values: Vec<AnnotationValue>,
}

impl AnnotationInstance {
    /// A marker annotation with no members.
    pub fn marker(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(name: impl Into<TypeName>, member: impl Into<SmolStr>, value: Value) -> Self {
        Self {
            name: name.into(),
            values: vec![AnnotationValue::new(member, value)],
        }
    }

    pub fn with_values(
        name: impl Into<TypeName>,
        values: impl IntoIterator<Item = AnnotationValue>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    pub fn value(&self, member: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.name == member).map(|v| &v.value)
    }

    pub fn string_value(&self, member: &str) -> Option<&str> {
        self.value(member).and_then(Value::as_str)
    }

    pub fn int_value(&self, member: &str) -> Option<i64> {
        self.value(member).and_then(Value::as_int)
    }
}

impl fmt::Display for AnnotationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name.simple_name())?;
        if !self.values.is_empty() {
            f.write_str("(")?;
            for (idx, v) in self.values.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}={}", v.name, v.value)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for AnnotationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A location an annotation can be applied to (and that transformations are
/// keyed by). Method and parameter targets address methods by declaration
/// index so that overloads stay distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Class(TypeName),
    Field {
        class: TypeName,
        field: SmolStr,
    },
    Method {
        class: TypeName,
        method: u32,
    },
    Parameter {
        class: TypeName,
        method: u32,
        param: u32,
    },
    Synthetic(SmolStr),
}

impl Target {
    pub fn class_name(&self) -> Option<&TypeName> {
        match self {
            Target::Class(name) => Some(name),
            Target::Field { class, .. } => Some(class),
            Target::Method { class, .. } => Some(class),
            Target::Parameter { class, .. } => Some(class),
            Target::Synthetic(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Class(name) => write!(f, "{name}"),
            Target::Field { class, field } => write!(f, "{class}#{field}"),
            Target::Method { class, method } => write!(f, "{class}#method[{method}]"),
            Target::Parameter {
                class,
                method,
                param,
            } => write!(f, "{class}#method[{method}]/arg{param}"),
            Target::Synthetic(label) => write!(f, "synthetic:{label}"),
        }
    }
}
