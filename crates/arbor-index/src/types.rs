//! The Java-like type representation used throughout the index.
//!
//! Types are plain immutable values. Parameterized types keep their arguments
//! structurally, which is what makes invariant-generics matching in the
//! processor possible.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A dotted binary class name, e.g. `java.util.List`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(SmolStr);

impl TypeName {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The part after the last `.` (or the whole name for unqualified names).
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

// Debug output for names is noisy with the tuple wrapper; render the dotted
// name directly.
impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl Primitive {
    /// Binary name of the boxed counterpart, used when matching a primitive
    /// producer type against a reference-typed injection point.
    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Char => "java.lang.Character",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
        }
    }
}

/// A structural Java type.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Primitive(Primitive),
    /// A non-generic class or interface reference, or a raw generic type.
    Class(TypeName),
    Array {
        element: Box<Type>,
        dimensions: u32,
    },
    Parameterized {
        raw: TypeName,
        args: Vec<Type>,
    },
    /// A type variable with its declared bounds (empty means `extends Object`).
    Variable {
        name: SmolStr,
        bounds: Vec<Type>,
    },
    Wildcard {
        extends_bound: Option<Box<Type>>,
        super_bound: Option<Box<Type>>,
    },
}

impl Type {
    pub fn class(name: impl Into<TypeName>) -> Self {
        Type::Class(name.into())
    }

    pub fn parameterized(raw: impl Into<TypeName>, args: impl IntoIterator<Item = Type>) -> Self {
        Type::Parameterized {
            raw: raw.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn variable(name: impl Into<SmolStr>) -> Self {
        Type::Variable {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn bounded_variable(name: impl Into<SmolStr>, bounds: impl IntoIterator<Item = Type>) -> Self {
        Type::Variable {
            name: name.into(),
            bounds: bounds.into_iter().collect(),
        }
    }

    pub fn wildcard() -> Self {
        Type::Wildcard {
            extends_bound: None,
            super_bound: None,
        }
    }

    pub fn wildcard_extends(bound: Type) -> Self {
        Type::Wildcard {
            extends_bound: Some(Box::new(bound)),
            super_bound: None,
        }
    }

    pub fn wildcard_super(bound: Type) -> Self {
        Type::Wildcard {
            extends_bound: None,
            super_bound: Some(Box::new(bound)),
        }
    }

    pub fn array(element: Type, dimensions: u32) -> Self {
        Type::Array {
            element: Box::new(element),
            dimensions,
        }
    }

    /// The raw class name of this type, if it has one.
    pub fn name(&self) -> Option<&TypeName> {
        match self {
            Type::Class(name) => Some(name),
            Type::Parameterized { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_class_or_parameterized(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Parameterized { .. })
    }

    pub fn is_unbounded_wildcard(&self) -> bool {
        matches!(
            self,
            Type::Wildcard {
                extends_bound: None,
                super_bound: None,
            }
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Primitive(p) => write!(f, "{}", format!("{p:?}").to_lowercase()),
            Type::Class(name) => write!(f, "{name}"),
            Type::Array { element, dimensions } => {
                write!(f, "{element}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            Type::Parameterized { raw, args } => {
                write!(f, "{raw}<")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Type::Variable { name, bounds } => {
                write!(f, "{name}")?;
                if !bounds.is_empty() {
                    f.write_str(" extends ")?;
                    for (idx, bound) in bounds.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(" & ")?;
                        }
                        write!(f, "{bound}")?;
                    }
                }
                Ok(())
            }
            Type::Wildcard {
                extends_bound,
                super_bound,
            } => {
                f.write_str("?")?;
                if let Some(upper) = extends_bound {
                    write!(f, " extends {upper}")?;
                }
                if let Some(lower) = super_bound {
                    write!(f, " super {lower}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A type parameter declared on a class or method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameter {
    pub name: SmolStr,
    pub bounds: Vec<Type>,
}

impl TypeParameter {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn bounded(name: impl Into<SmolStr>, bounds: impl IntoIterator<Item = Type>) -> Self {
        Self {
            name: name.into(),
            bounds: bounds.into_iter().collect(),
        }
    }
}
