//! Unused-bean removal through the full pipeline.

use arbor_index::{
    AnnotationInstance, ClassBuilder, FieldBuilder, MethodBuilder, Type, TypeIndex,
};
use arbor_processor::{names, DeploymentBuilder, ResolvedDeployment};
use pretty_assertions::assert_eq;

fn removed_classes(deployment: &ResolvedDeployment) -> Vec<String> {
    let mut classes: Vec<String> = deployment
        .removed_beans
        .iter()
        .filter_map(|bean| bean.class_name().map(|n| n.to_string()))
        .collect();
    classes.sort();
    classes
}

fn retained_classes(deployment: &ResolvedDeployment) -> Vec<String> {
    let mut classes: Vec<String> = deployment
        .beans
        .iter()
        .filter_map(|bean| bean.info.class_name().map(|n| n.to_string()))
        .collect();
    classes.sort();
    classes
}

#[test]
fn unreferenced_beans_are_removed_and_named_beans_survive() {
    let mut builder = TypeIndex::builder();
    builder
        .add(
            ClassBuilder::new("com.acme.Orphan")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Page")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(AnnotationInstance::marker(names::NAMED))
                .build(),
        );
    let deployment = DeploymentBuilder::new()
        .process(&builder.build())
        .expect("deployment should succeed");

    assert_eq!(removed_classes(&deployment), vec!["com.acme.Orphan".to_string()]);
    assert_eq!(retained_classes(&deployment), vec!["com.acme.Page".to_string()]);
}

#[test]
fn injected_beans_are_reachable() {
    let mut builder = TypeIndex::builder();
    builder
        .add(
            ClassBuilder::new("com.acme.Engine")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Car")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(AnnotationInstance::marker(names::NAMED))
                .field(
                    FieldBuilder::new("engine", Type::class("com.acme.Engine"))
                        .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let deployment = DeploymentBuilder::new()
        .process(&builder.build())
        .expect("deployment should succeed");

    assert!(deployment.removed_beans.is_empty());
    assert_eq!(
        retained_classes(&deployment),
        vec!["com.acme.Car".to_string(), "com.acme.Engine".to_string()]
    );
}

#[test]
fn unused_producer_chain_disappears_in_one_run() {
    // The factory exists only to declare the producer; once the producer is
    // unused, both go.
    let mut builder = TypeIndex::builder();
    builder
        .add(ClassBuilder::new("com.acme.Widget").build())
        .add(
            ClassBuilder::new("com.acme.WidgetFactory")
                .method(
                    MethodBuilder::new("createWidget", Type::class("com.acme.Widget"))
                        .annotate(AnnotationInstance::marker(names::PRODUCES)),
                )
                .build(),
        );
    let deployment = DeploymentBuilder::new()
        .process(&builder.build())
        .expect("deployment should succeed");

    assert!(deployment.beans.is_empty());
    assert_eq!(deployment.removed_beans.len(), 2);
}

#[test]
fn producer_keeps_its_declaring_bean_alive() {
    let mut builder = TypeIndex::builder();
    builder
        .add(ClassBuilder::new("com.acme.Widget").build())
        .add(
            ClassBuilder::new("com.acme.WidgetFactory")
                .method(
                    MethodBuilder::new("createWidget", Type::class("com.acme.Widget"))
                        .annotate(AnnotationInstance::marker(names::PRODUCES)),
                )
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(AnnotationInstance::marker(names::NAMED))
                .field(
                    FieldBuilder::new("widget", Type::class("com.acme.Widget"))
                        .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let deployment = DeploymentBuilder::new()
        .process(&builder.build())
        .expect("deployment should succeed");

    assert!(deployment.removed_beans.is_empty());
    assert!(deployment
        .beans
        .iter()
        .any(|bean| bean.info.is_producer()));
    assert!(deployment
        .beans
        .iter()
        .any(|bean| bean.info.class_name().map(|n| n.as_str()) == Some("com.acme.WidgetFactory")
            && bean.info.is_class_bean()));
}

#[test]
fn instance_lookups_keep_matching_beans() {
    let mut builder = TypeIndex::builder();
    builder
        .add(
            ClassBuilder::new("com.acme.Widget")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .build(),
        )
        .add(
            ClassBuilder::new("com.acme.Consumer")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .annotate(AnnotationInstance::marker(names::NAMED))
                .field(
                    FieldBuilder::new(
                        "widgets",
                        Type::parameterized(names::INSTANCE, [Type::class("com.acme.Widget")]),
                    )
                    .annotate(AnnotationInstance::marker(names::INJECT)),
                )
                .build(),
        );
    let deployment = DeploymentBuilder::new()
        .process(&builder.build())
        .expect("deployment should succeed");

    assert!(deployment.removed_beans.is_empty());
    assert!(retained_classes(&deployment).contains(&"com.acme.Widget".to_string()));
}

#[test]
fn removal_exclusions_protect_beans() {
    let mut builder = TypeIndex::builder();
    builder.add(
        ClassBuilder::new("com.acme.Orphan")
            .annotate(AnnotationInstance::marker(names::SINGLETON))
            .build(),
    );
    let deployment = DeploymentBuilder::new()
        .removal_exclusion(|bean| {
            bean.class_name().map(|n| n.as_str()) == Some("com.acme.Orphan")
        })
        .process(&builder.build())
        .expect("deployment should succeed");

    assert!(deployment.removed_beans.is_empty());
    assert_eq!(retained_classes(&deployment), vec!["com.acme.Orphan".to_string()]);
}

#[test]
fn observer_declaring_beans_survive() {
    let mut builder = TypeIndex::builder();
    builder
        .add(ClassBuilder::new("com.acme.OrderPlaced").build())
        .add(
            ClassBuilder::new("com.acme.Listener")
                .annotate(AnnotationInstance::marker(names::SINGLETON))
                .method(MethodBuilder::new("onOrder", Type::Void).annotated_param(
                    "event",
                    Type::class("com.acme.OrderPlaced"),
                    [AnnotationInstance::marker(names::OBSERVES)],
                ))
                .build(),
        );
    let deployment = DeploymentBuilder::new()
        .process(&builder.build())
        .expect("deployment should succeed");

    assert!(deployment.removed_beans.is_empty());
    assert_eq!(retained_classes(&deployment), vec!["com.acme.Listener".to_string()]);
}
