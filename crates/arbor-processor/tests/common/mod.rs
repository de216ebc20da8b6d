//! Shared fixture helpers for the integration suite.
#![allow(dead_code)]

use arbor_index::{AnnotationInstance, ClassBuilder, ClassInfo, Value};
use arbor_processor::names;

pub fn qualifier_class(name: &str) -> ClassInfo {
    ClassBuilder::new(name)
        .annotation_type()
        .annotate(AnnotationInstance::marker(names::QUALIFIER))
        .build()
}

pub fn binding_class(name: &str) -> ClassInfo {
    ClassBuilder::new(name)
        .annotation_type()
        .annotate(AnnotationInstance::marker(names::INTERCEPTOR_BINDING))
        .build()
}

pub fn stereotype_class(name: &str) -> ClassBuilder {
    ClassBuilder::new(name)
        .annotation_type()
        .annotate(AnnotationInstance::marker(names::STEREOTYPE))
}

pub fn priority(value: i64) -> AnnotationInstance {
    AnnotationInstance::with_value(names::PRIORITY, "value", Value::Int(value))
}

pub fn named(value: &str) -> AnnotationInstance {
    AnnotationInstance::with_value(names::NAMED, "value", Value::Str(value.into()))
}
