//! Fluent construction of index entries.
//!
//! Index producers (and most tests) assemble `ClassInfo` values through these
//! builders instead of filling the structs by hand.

use smol_str::SmolStr;

use crate::annotations::AnnotationInstance;
use crate::class::{
    ClassInfo, ClassKind, FieldInfo, MethodInfo, Nesting, ParameterInfo, CONSTRUCTOR_NAME,
};
use crate::types::{Type, TypeName, TypeParameter};

#[derive(Clone, Debug)]
pub struct ClassBuilder {
    class: ClassInfo,
}

impl ClassBuilder {
    pub fn new(name: impl Into<TypeName>) -> Self {
        let name = name.into();
        let super_type = if name == "java.lang.Object" {
            None
        } else {
            Some(Type::class("java.lang.Object"))
        };
        Self {
            class: ClassInfo {
                name,
                kind: ClassKind::Class,
                nesting: Nesting::TopLevel,
                is_abstract: false,
                is_final: false,
                super_type,
                interfaces: Vec::new(),
                type_params: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                annotations: Vec::new(),
            },
        }
    }

    pub fn interface(mut self) -> Self {
        self.class.kind = ClassKind::Interface;
        self.class.super_type = None;
        self
    }

    pub fn enum_type(mut self) -> Self {
        self.class.kind = ClassKind::Enum;
        self.class.super_type = Some(Type::class("java.lang.Enum"));
        self
    }

    pub fn annotation_type(mut self) -> Self {
        self.class.kind = ClassKind::Annotation;
        self.class.super_type = None;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.class.is_abstract = true;
        self
    }

    pub fn final_class(mut self) -> Self {
        self.class.is_final = true;
        self
    }

    pub fn nesting(mut self, nesting: Nesting) -> Self {
        self.class.nesting = nesting;
        self
    }

    pub fn extends(mut self, super_type: Type) -> Self {
        self.class.super_type = Some(super_type);
        self
    }

    pub fn implements(mut self, interface: Type) -> Self {
        self.class.interfaces.push(interface);
        self
    }

    pub fn type_param(mut self, param: TypeParameter) -> Self {
        self.class.type_params.push(param);
        self
    }

    pub fn annotate(mut self, annotation: AnnotationInstance) -> Self {
        self.class.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.class.fields.push(field.build());
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.class.methods.push(method.build());
        self
    }

    pub fn constructor(mut self, ctor: MethodBuilder) -> Self {
        let mut method = ctor.build();
        method.name = SmolStr::new(CONSTRUCTOR_NAME);
        method.return_type = Type::Void;
        self.class.methods.push(method);
        self
    }

    pub fn build(self) -> ClassInfo {
        self.class
    }
}

#[derive(Clone, Debug)]
pub struct FieldBuilder {
    field: FieldInfo,
}

impl FieldBuilder {
    pub fn new(name: impl Into<SmolStr>, ty: Type) -> Self {
        Self {
            field: FieldInfo {
                name: name.into(),
                ty,
                is_static: false,
                is_final: false,
                annotations: Vec::new(),
            },
        }
    }

    pub fn static_field(mut self) -> Self {
        self.field.is_static = true;
        self
    }

    pub fn final_field(mut self) -> Self {
        self.field.is_final = true;
        self
    }

    pub fn annotate(mut self, annotation: AnnotationInstance) -> Self {
        self.field.annotations.push(annotation);
        self
    }

    pub fn build(self) -> FieldInfo {
        self.field
    }
}

#[derive(Clone, Debug)]
pub struct MethodBuilder {
    method: MethodInfo,
}

impl MethodBuilder {
    pub fn new(name: impl Into<SmolStr>, return_type: Type) -> Self {
        Self {
            method: MethodInfo {
                name: name.into(),
                params: Vec::new(),
                return_type,
                is_static: false,
                is_final: false,
                is_abstract: false,
                is_private: false,
                annotations: Vec::new(),
            },
        }
    }

    /// Shorthand for constructor builders; the name and return type are
    /// overwritten by [`ClassBuilder::constructor`].
    pub fn ctor() -> Self {
        Self::new(CONSTRUCTOR_NAME, Type::Void)
    }

    pub fn param(mut self, name: impl Into<SmolStr>, ty: Type) -> Self {
        self.method.params.push(ParameterInfo {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        });
        self
    }

    pub fn annotated_param(
        mut self,
        name: impl Into<SmolStr>,
        ty: Type,
        annotations: impl IntoIterator<Item = AnnotationInstance>,
    ) -> Self {
        self.method.params.push(ParameterInfo {
            name: name.into(),
            ty,
            annotations: annotations.into_iter().collect(),
        });
        self
    }

    pub fn static_method(mut self) -> Self {
        self.method.is_static = true;
        self
    }

    pub fn final_method(mut self) -> Self {
        self.method.is_final = true;
        self
    }

    pub fn abstract_method(mut self) -> Self {
        self.method.is_abstract = true;
        self
    }

    pub fn private_method(mut self) -> Self {
        self.method.is_private = true;
        self
    }

    pub fn annotate(mut self, annotation: AnnotationInstance) -> Self {
        self.method.annotations.push(annotation);
        self
    }

    pub fn build(self) -> MethodInfo {
        self.method
    }
}
