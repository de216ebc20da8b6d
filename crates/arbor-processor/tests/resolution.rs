//! Typesafe resolution through the full pipeline: invariant generics,
//! qualifier matching, alternatives and the failure diagnostics.

mod common;

use arbor_index::{
    AnnotationInstance, ClassBuilder, FieldBuilder, Target, Type, TypeIndex, TypeName,
    TypeParameter, Value,
};
use arbor_processor::{names, DeploymentBuilder, ResolvedDeployment};
use pretty_assertions::assert_eq;

fn process(index: &TypeIndex) -> ResolvedDeployment {
    DeploymentBuilder::new()
        .remove_unused_beans(false)
        .process(index)
        .expect("deployment should succeed")
}

/// The bean resolved for the single field injection point of `class`.
fn resolved_for(deployment: &ResolvedDeployment, class: &str) -> arbor_processor::BeanId {
    deployment
        .injection_points
        .iter()
        .find(|point| {
            matches!(&point.info.target, Target::Field { class: owner, .. } if owner == &TypeName::new(class))
        })
        .expect("field injection point should exist")
        .resolved
        .expect("injection point should be resolved")
}

fn class_of(deployment: &ResolvedDeployment, id: arbor_processor::BeanId) -> String {
    deployment
        .bean(id)
        .expect("resolved bean should be retained")
        .info
        .class_name()
        .expect("class bean expected")
        .to_string()
}

#[test]
fn parameterized_types_match_invariantly() {
    let mut builder = TypeIndex::builder();
    builder
        .add(
            ClassBuilder::new("java.util.List")
                .interface()
                .type_param(TypeParameter::new("E"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.StringList")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .implements(Type::parameterized(
                    "java.util.List",
                    [Type::class("java.lang.String")],
                ))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.IntegerList")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .implements(Type::parameterized(
                    "java.util.List",
                    [Type::class("java.lang.Integer")],
                ))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .field(
                    FieldBuilder::new(
                        "strings",
                        Type::parameterized("java.util.List", [Type::class("java.lang.String")]),
                    )
                    .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let deployment = process(&builder.build());
    let resolved = resolved_for(&deployment, "com.acme.Consumer");
    assert_eq!(class_of(&deployment, resolved), "com.acme.StringList");
}

#[test]
fn wildcard_requirements_use_containment() {
    let mut builder = TypeIndex::builder();
    builder
        .add(
            ClassBuilder::new("java.util.List")
                .interface()
                .type_param(TypeParameter::new("E"))
                .build(),
        )
        .add(ClassBuilder::new("com.acme.Shape").interface().build())
        .add(
            ClassBuilder::new("com.acme.Circle")
                .implements(Type::class("com.acme.Shape"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.CircleList")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .implements(Type::parameterized(
                    "java.util.List",
                    [Type::class("com.acme.Circle")],
                ))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .field(
                    FieldBuilder::new(
                        "shapes",
                        Type::parameterized(
                            "java.util.List",
                            [Type::wildcard_extends(Type::class("com.acme.Shape"))],
                        ),
                    )
                    .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let deployment = process(&builder.build());
    let resolved = resolved_for(&deployment, "com.acme.Consumer");
    assert_eq!(class_of(&deployment, resolved), "com.acme.CircleList");
}

#[test]
fn qualifier_values_discriminate_beans() {
    let mut builder = TypeIndex::builder();
    let tag = |value: &str| {
        AnnotationInstance::with_value("com.acme.Tag", "value", Value::Str(value.into()))
    };
    builder
        .add(common::qualifier_class("com.acme.Tag"))
        .add(ClassBuilder::new("com.acme.Widget").interface().build())
        .add(
            ClassBuilder::new("com.acme.RoundWidget")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(tag("round"))
                .implements(Type::class("com.acme.Widget"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.SquareWidget")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(tag("square"))
                .implements(Type::class("com.acme.Widget"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .field(
                    FieldBuilder::new("widget", Type::class("com.acme.Widget"))
                        .annotate(AnnotationInstance::marker(names::INJECT))
                        .annotate(tag("square")),
                )
                .build(),
        );
    let deployment = process(&builder.build());
    let resolved = resolved_for(&deployment, "com.acme.Consumer");
    assert_eq!(class_of(&deployment, resolved), "com.acme.SquareWidget");
}

#[test]
fn alternative_with_priority_wins_the_tie_break() {
    let mut builder = TypeIndex::builder();
    builder
        .add(ClassBuilder::new("com.acme.Greeting").interface().build())
        .add(
            ClassBuilder::new("com.acme.DefaultGreeting")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .implements(Type::class("com.acme.Greeting"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.MockGreeting")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(AnnotationInstance::marker(names::ALTERNATIVE))
                .annotate(common::priority(100))
                .implements(Type::class("com.acme.Greeting"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .field(
                    FieldBuilder::new("greeting", Type::class("com.acme.Greeting"))
                        .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let deployment = process(&builder.build());
    let resolved = resolved_for(&deployment, "com.acme.Consumer");
    assert_eq!(class_of(&deployment, resolved), "com.acme.MockGreeting");
}

#[test]
fn default_bean_yields_to_a_regular_candidate() {
    let mut builder = TypeIndex::builder();
    builder
        .add(ClassBuilder::new("com.acme.Clock").interface().build())
        .add(
            ClassBuilder::new("com.acme.FallbackClock")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(AnnotationInstance::marker(names::DEFAULT_BEAN))
                .implements(Type::class("com.acme.Clock"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.SystemClock")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .implements(Type::class("com.acme.Clock"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .field(
                    FieldBuilder::new("clock", Type::class("com.acme.Clock"))
                        .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let deployment = process(&builder.build());
    let resolved = resolved_for(&deployment, "com.acme.Consumer");
    assert_eq!(class_of(&deployment, resolved), "com.acme.SystemClock");
}

#[test]
fn unsatisfied_dependency_reports_almost_matching_beans() {
    let mut builder = TypeIndex::builder();
    let tag = |value: &str| {
        AnnotationInstance::with_value("com.acme.Tag", "value", Value::Str(value.into()))
    };
    builder
        .add(common::qualifier_class("com.acme.Tag"))
        .add(
            ClassBuilder::new("com.acme.Widget")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(tag("round"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .field(
                    FieldBuilder::new("widget", Type::class("com.acme.Widget"))
                        .annotate(AnnotationInstance::marker(names::INJECT))
                        .annotate(tag("square")),
                )
                .build(),
        );
    let err = DeploymentBuilder::new()
        .remove_unused_beans(false)
        .process(&builder.build())
        .expect_err("an unsatisfiable injection point must fail");
    let message = err.to_string();
    assert!(message.contains("Unsatisfied dependency"));
    assert!(message.contains("match by type, but none has matching qualifiers"));
    assert!(message.contains("com.acme.Widget"));
}

#[test]
fn ambiguous_dependency_lists_every_candidate() {
    let mut builder = TypeIndex::builder();
    builder
        .add(ClassBuilder::new("com.acme.Greeting").interface().build())
        .add(
            ClassBuilder::new("com.acme.English")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .implements(Type::class("com.acme.Greeting"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.French")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .implements(Type::class("com.acme.Greeting"))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .field(
                    FieldBuilder::new("greeting", Type::class("com.acme.Greeting"))
                        .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let err = DeploymentBuilder::new()
        .remove_unused_beans(false)
        .process(&builder.build())
        .expect_err("two matching beans without a tie-break must fail");
    let message = err.to_string();
    assert!(message.contains("Ambiguous dependencies"));
    assert!(message.contains("com.acme.English"));
    assert!(message.contains("com.acme.French"));
}

#[test]
fn type_variable_injection_points_are_rejected() {
    let mut builder = TypeIndex::builder();
    builder.add(
        ClassBuilder::new("com.acme.Holder")
            .annotate(AnnotationInstance::marker(names::SINGLETON))
            .type_param(TypeParameter::new("T"))
            .field(
                FieldBuilder::new("value", Type::variable("T"))
                    .annotate(AnnotationInstance::marker(names::INJECT)),
            )
            .build(),
    );
    let err = DeploymentBuilder::new()
        .remove_unused_beans(false)
        .process(&builder.build())
        .expect_err("a type variable is not a legal required type");
    assert!(err
        .to_string()
        .contains("Type variable is not a legal injection point type"));
}
