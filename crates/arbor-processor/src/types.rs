//! Bean-type closures and structural assignability.
//!
//! The closure of a bean collects every class and interface the bean is
//! assignable to, with type-variable substitution along the hierarchy, and
//! always includes `Object`. Assignability implements the invariant-generics
//! matching rules of typesafe resolution; a raw required type only accepts a
//! parameterized bean type whose arguments are all unbounded, and vice versa.

use std::collections::{HashMap, HashSet};

use arbor_index::{ClassInfo, SmolStr, Type, TypeIndex, TypeName};

use crate::errors::Problems;
use crate::names;

/// The unrestricted bean-type closure of `ty` (a class or parameterized
/// type): the type itself, its superclasses and interfaces, transitively,
/// plus `Object`. Cycle-safe.
pub fn type_closure(index: &TypeIndex, ty: &Type) -> Vec<Type> {
    let mut seen: HashSet<Type> = HashSet::new();
    let mut result: Vec<Type> = Vec::new();
    let mut stack = vec![ty.clone()];
    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        let class = current.name().and_then(|name| index.class(name));
        if let Some(class) = class {
            let substitution = substitution_for(class, &current);
            if let Some(super_type) = &class.super_type {
                stack.push(substitute(super_type, &substitution));
            }
            for interface in &class.interfaces {
                stack.push(substitute(interface, &substitution));
            }
        }
        result.push(current);
    }
    let object = Type::class(names::OBJECT);
    if !seen.contains(&object) {
        result.push(object);
    }
    result
}

/// The closure of a produced type (producer method return / producer field).
/// Primitives and arrays contribute only themselves plus `Object`.
pub fn producer_type_closure(index: &TypeIndex, ty: &Type) -> Vec<Type> {
    match ty {
        Type::Primitive(_) | Type::Array { .. } => {
            vec![ty.clone(), Type::class(names::OBJECT)]
        }
        _ => type_closure(index, ty),
    }
}

/// Apply a `@Typed`-style restriction: keep only the closure members whose
/// raw name is listed, plus `Object`. A listed name absent from the closure
/// is a definition problem (the restriction may only shrink the set).
pub fn restrict_types(
    types: Vec<Type>,
    restriction: &[&TypeName],
    described: &str,
    problems: &mut Problems,
) -> Vec<Type> {
    let closure_names: HashSet<&TypeName> = types.iter().filter_map(Type::name).collect();
    for name in restriction {
        if !closure_names.contains(*name) && *name != &TypeName::new(names::OBJECT) {
            problems.definition(format!(
                "Restricted bean type {name} is not a type of {described}"
            ));
        }
    }
    let allowed: HashSet<&TypeName> = restriction.iter().copied().collect();
    types
        .into_iter()
        .filter(|ty| {
            ty.name()
                .map(|name| name == &TypeName::new(names::OBJECT) || allowed.contains(name))
                .unwrap_or(false)
        })
        .collect()
}

/// Typesafe-resolution assignability: does `bean_type` satisfy a required
/// `required`?
pub fn matches_type(index: &TypeIndex, required: &Type, bean_type: &Type) -> bool {
    let required = boxed(required);
    let bean_type = boxed(bean_type);
    match (&required, &bean_type) {
        (
            Type::Array {
                element: required_element,
                dimensions: required_dims,
            },
            Type::Array {
                element: bean_element,
                dimensions: bean_dims,
            },
        ) => required_dims == bean_dims && boxed(required_element) == boxed(bean_element),
        (Type::Class(required_name), Type::Class(bean_name)) => required_name == bean_name,
        // A raw required type accepts a parameterized bean type with the same
        // raw type (the container treats the missing arguments as Object).
        (Type::Class(required_name), Type::Parameterized { raw, .. }) => required_name == raw,
        // A parameterized required type accepts a raw bean type only when
        // every required argument is Object or an unbounded wildcard.
        (Type::Parameterized { raw, args }, Type::Class(bean_name)) => {
            raw == bean_name && args.iter().all(is_unbounded_argument)
        }
        (
            Type::Parameterized {
                raw: required_raw,
                args: required_args,
            },
            Type::Parameterized {
                raw: bean_raw,
                args: bean_args,
            },
        ) => {
            required_raw == bean_raw
                && required_args.len() == bean_args.len()
                && required_args
                    .iter()
                    .zip(bean_args)
                    .all(|(r, b)| parameters_match(index, r, b))
        }
        _ => false,
    }
}

/// Delegate-injection-point assignability. Raw and parameterized forms of
/// the same type match each other unconditionally; everything else follows
/// the plain rules.
pub fn matches_delegate_type(index: &TypeIndex, delegate: &Type, bean_type: &Type) -> bool {
    match (delegate, bean_type) {
        (Type::Class(delegate_name), Type::Parameterized { raw, .. }) => delegate_name == raw,
        (Type::Parameterized { raw, .. }, Type::Class(bean_name)) => raw == bean_name,
        _ => matches_type(index, delegate, bean_type),
    }
}

fn is_unbounded_argument(arg: &Type) -> bool {
    match arg {
        Type::Class(name) => name == &TypeName::new(names::OBJECT),
        Type::Wildcard { .. } => arg.is_unbounded_wildcard(),
        Type::Variable { bounds, .. } => bounds.is_empty(),
        _ => false,
    }
}

// Invariant argument matching, with wildcard containment and type-variable
// bound reconciliation.
fn parameters_match(index: &TypeIndex, required: &Type, bean_arg: &Type) -> bool {
    match (required, bean_arg) {
        (Type::Wildcard { .. }, Type::Variable { bounds, .. }) => {
            wildcard_contains_bounds(index, required, bounds)
        }
        (Type::Wildcard { .. }, actual) if actual.is_class_or_parameterized() => {
            wildcard_contains(index, required, actual)
        }
        (actual, Type::Variable { bounds, .. }) if actual.is_class_or_parameterized() => {
            within_bounds(index, actual, bounds)
        }
        (
            Type::Variable {
                bounds: required_bounds,
                ..
            },
            Type::Variable {
                bounds: bean_bounds,
                ..
            },
        ) => bounds_cover(index, required_bounds, bean_bounds),
        (Type::Class(_) | Type::Parameterized { .. }, Type::Class(_) | Type::Parameterized { .. }) => {
            // Actual arguments are invariant.
            matches_type(index, required, bean_arg) && matches_type(index, bean_arg, required)
        }
        (Type::Primitive(r), Type::Primitive(b)) => r == b,
        _ => required == bean_arg,
    }
}

fn wildcard_contains(index: &TypeIndex, wildcard: &Type, actual: &Type) -> bool {
    let Type::Wildcard {
        extends_bound,
        super_bound,
    } = wildcard
    else {
        return false;
    };
    if let Some(upper) = extends_bound {
        if !is_assignable(index, actual, upper) {
            return false;
        }
    }
    if let Some(lower) = super_bound {
        if !is_assignable(index, lower, actual) {
            return false;
        }
    }
    true
}

fn wildcard_contains_bounds(index: &TypeIndex, wildcard: &Type, variable_bounds: &[Type]) -> bool {
    let Type::Wildcard {
        extends_bound,
        super_bound,
    } = wildcard
    else {
        return false;
    };
    if let Some(upper) = extends_bound {
        let covered = variable_bounds.is_empty() && is_object(upper)
            || variable_bounds
                .iter()
                .any(|bound| is_assignable(index, bound, upper));
        if !covered {
            return false;
        }
    }
    if let Some(lower) = super_bound {
        let covered = variable_bounds.is_empty()
            || variable_bounds
                .iter()
                .all(|bound| is_assignable(index, lower, bound));
        if !covered {
            return false;
        }
    }
    true
}

fn within_bounds(index: &TypeIndex, actual: &Type, bounds: &[Type]) -> bool {
    bounds
        .iter()
        .all(|bound| is_assignable(index, actual, bound))
}

// Every bound of `covered` must be assignable to some bound of `covering`
// (empty bounds mean Object and cover everything).
fn bounds_cover(index: &TypeIndex, covering: &[Type], covered: &[Type]) -> bool {
    covering.iter().all(|required_bound| {
        is_object(required_bound)
            || covered
                .iter()
                .any(|bean_bound| is_assignable(index, bean_bound, required_bound))
    })
}

/// Covariant raw-hierarchy assignability (`sub` is-a `sup`).
fn is_assignable(index: &TypeIndex, sub: &Type, sup: &Type) -> bool {
    if is_object(sup) {
        return true;
    }
    match (sub.name(), sup.name()) {
        (Some(sub_name), Some(sup_name)) => index.is_assignable_to_name(sub_name, sup_name),
        _ => false,
    }
}

fn is_object(ty: &Type) -> bool {
    matches!(ty, Type::Class(name) if name == &TypeName::new(names::OBJECT))
}

fn boxed(ty: &Type) -> Type {
    match ty {
        Type::Primitive(p) => Type::class(p.boxed_name()),
        other => other.clone(),
    }
}

fn substitution_for(class: &ClassInfo, usage: &Type) -> HashMap<SmolStr, Type> {
    let mut map = HashMap::new();
    if let Type::Parameterized { args, .. } = usage {
        for (param, arg) in class.type_params.iter().zip(args) {
            map.insert(param.name.clone(), arg.clone());
        }
    }
    map
}

fn substitute(ty: &Type, map: &HashMap<SmolStr, Type>) -> Type {
    match ty {
        Type::Variable { name, .. } => map.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Parameterized { raw, args } => Type::Parameterized {
            raw: raw.clone(),
            args: args.iter().map(|arg| substitute(arg, map)).collect(),
        },
        Type::Array { element, dimensions } => Type::Array {
            element: Box::new(substitute(element, map)),
            dimensions: *dimensions,
        },
        Type::Wildcard {
            extends_bound,
            super_bound,
        } => Type::Wildcard {
            extends_bound: extends_bound
                .as_ref()
                .map(|b| Box::new(substitute(b, map))),
            super_bound: super_bound.as_ref().map(|b| Box::new(substitute(b, map))),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use arbor_index::{ClassBuilder, TypeParameter};
    use pretty_assertions::assert_eq;

    use super::*;

    fn index() -> TypeIndex {
        let mut builder = TypeIndex::builder();
        builder
            .add(
                ClassBuilder::new("java.util.Collection")
                    .interface()
                    .type_param(TypeParameter::new("E"))
                    .build(),
            )
            .add(
                ClassBuilder::new("java.util.List")
                    .interface()
                    .type_param(TypeParameter::new("E"))
                    .implements(Type::parameterized(
                        "java.util.Collection",
                        [Type::variable("E")],
                    ))
                    .build(),
            )
            .add(
                ClassBuilder::new("com.acme.StringList")
                    .implements(Type::parameterized(
                        "java.util.List",
                        [Type::class("java.lang.String")],
                    ))
                    .build(),
            )
            .add(ClassBuilder::new("java.lang.String").build())
            .add(ClassBuilder::new("java.lang.Number").build())
            .add(
                ClassBuilder::new("java.lang.Integer")
                    .extends(Type::class("java.lang.Number"))
                    .build(),
            );
        builder.build()
    }

    #[test]
    fn closure_substitutes_type_variables() {
        let index = index();
        let closure = type_closure(&index, &Type::class("com.acme.StringList"));
        assert!(closure.contains(&Type::parameterized(
            "java.util.List",
            [Type::class("java.lang.String")],
        )));
        assert!(closure.contains(&Type::parameterized(
            "java.util.Collection",
            [Type::class("java.lang.String")],
        )));
        assert!(closure.contains(&Type::class(names::OBJECT)));
    }

    #[test]
    fn invariant_generics() {
        let index = index();
        let list_string = Type::parameterized("java.util.List", [Type::class("java.lang.String")]);
        let list_integer =
            Type::parameterized("java.util.List", [Type::class("java.lang.Integer")]);
        let raw_list = Type::class("java.util.List");

        assert!(matches_type(&index, &list_string, &list_string));
        assert!(!matches_type(&index, &list_string, &list_integer));
        assert!(!matches_type(&index, &list_string, &raw_list));
        // The raw required type accepts any parameterization.
        assert!(matches_type(&index, &raw_list, &list_string));
    }

    #[test]
    fn wildcard_containment() {
        let index = index();
        let list_integer =
            Type::parameterized("java.util.List", [Type::class("java.lang.Integer")]);
        let extends_number = Type::parameterized(
            "java.util.List",
            [Type::wildcard_extends(Type::class("java.lang.Number"))],
        );
        let super_number = Type::parameterized(
            "java.util.List",
            [Type::wildcard_super(Type::class("java.lang.Number"))],
        );
        let unbounded = Type::parameterized("java.util.List", [Type::wildcard()]);

        assert!(matches_type(&index, &extends_number, &list_integer));
        assert!(!matches_type(&index, &super_number, &list_integer));
        assert!(matches_type(&index, &unbounded, &list_integer));
    }

    #[test]
    fn primitives_match_boxed() {
        let index = index();
        assert!(matches_type(
            &index,
            &Type::class("java.lang.Integer"),
            &Type::Primitive(arbor_index::Primitive::Int),
        ));
    }

    #[test]
    fn restriction_may_only_shrink() {
        let mut problems = Problems::new();
        let index = index();
        let closure = type_closure(&index, &Type::class("com.acme.StringList"));
        let list = TypeName::new("java.util.List");
        let restricted = restrict_types(closure, &[&list], "com.acme.StringList", &mut problems);
        assert!(problems.is_empty());
        let names: Vec<_> = restricted
            .iter()
            .filter_map(Type::name)
            .map(TypeName::as_str)
            .collect();
        assert!(names.contains(&"java.util.List"));
        assert!(names.contains(&"java.lang.Object"));
        assert!(!names.contains(&"java.util.Collection"));
        assert!(!names.contains(&"com.acme.StringList"));

        let bogus = TypeName::new("com.acme.Unrelated");
        let mut problems = Problems::new();
        let _ = restrict_types(
            type_closure(&index, &Type::class("com.acme.StringList")),
            &[&bogus],
            "com.acme.StringList",
            &mut problems,
        );
        assert_eq!(problems.len(), 1);
    }
}
