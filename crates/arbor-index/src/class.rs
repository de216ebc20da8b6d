//! Class, method and field metadata.

use std::fmt;

use smol_str::SmolStr;

use crate::annotations::AnnotationInstance;
use crate::types::{Type, TypeName, TypeParameter};

/// Conventional JVM name for constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nesting {
    TopLevel,
    /// A member class; only static ones are eligible bean classes.
    Nested { is_static: bool },
    Local,
    Anonymous,
}

#[derive(Clone, Debug)]
pub struct ClassInfo {
    pub name: TypeName,
    pub kind: ClassKind,
    pub nesting: Nesting,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Superclass, possibly parameterized. `None` only for `java.lang.Object`
    /// (and for interfaces/annotations).
    pub super_type: Option<Type>,
    pub interfaces: Vec<Type>,
    pub type_params: Vec<TypeParameter>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub annotations: Vec<AnnotationInstance>,
}

impl ClassInfo {
    /// Declared instance constructors.
    pub fn constructors(&self) -> impl Iterator<Item = (usize, &MethodInfo)> {
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_constructor())
    }

    /// True when the class can be instantiated without arguments. A class
    /// with no declared constructor gets the implicit default one.
    pub fn has_no_args_constructor(&self) -> bool {
        let mut any = false;
        for (_, ctor) in self.constructors() {
            if ctor.params.is_empty() {
                return true;
            }
            any = true;
        }
        !any
    }

    /// The declared no-args constructor, if one is present explicitly.
    pub fn no_args_constructor(&self) -> Option<&MethodInfo> {
        self.constructors()
            .map(|(_, m)| m)
            .find(|m| m.params.is_empty())
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method_at(&self, index: u32) -> Option<&MethodInfo> {
        self.methods.get(index as usize)
    }

    /// Index of the first method with the given name and parameter types.
    pub fn method_index(&self, name: &str, parameter_types: &[Type]) -> Option<u32> {
        self.methods
            .iter()
            .position(|m| m.name == name && m.parameter_types() == parameter_types)
            .map(|idx| idx as u32)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    pub fn annotation(&self, name: &str) -> Option<&AnnotationInstance> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Name of the direct superclass, when there is one in the model.
    pub fn super_name(&self) -> Option<&TypeName> {
        self.super_type.as_ref().and_then(Type::name)
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Debug)]
pub struct FieldInfo {
    pub name: SmolStr,
    pub ty: Type,
    pub is_static: bool,
    pub is_final: bool,
    pub annotations: Vec<AnnotationInstance>,
}

impl FieldInfo {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct ParameterInfo {
    pub name: SmolStr,
    pub ty: Type,
    pub annotations: Vec<AnnotationInstance>,
}

impl ParameterInfo {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct MethodInfo {
    pub name: SmolStr,
    pub params: Vec<ParameterInfo>,
    pub return_type: Type,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_private: bool,
    pub annotations: Vec<AnnotationInstance>,
}

impl MethodInfo {
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn parameter_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    pub fn annotation(&self, name: &str) -> Option<&AnnotationInstance> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Index of the first parameter carrying the given annotation.
    pub fn parameter_with_annotation(&self, name: &str) -> Option<(usize, &ParameterInfo)> {
        self.params
            .iter()
            .enumerate()
            .find(|(_, p)| p.has_annotation(name))
    }
}
