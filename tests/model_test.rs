//! Tests for the arena model, its builder and TOML model documents

use comptree::domain::{
    AggregationKind, AssociationSpec, EndSpec, FeatureKind, FeatureSpec, ModelBuilder,
    ModelError, ModelQuery, TypeKind, UpperBound,
};
use comptree::infrastructure::{ModelDocument, ModelFileError};
use comptree::util::testing;
use rstest::rstest;

// ============================================================
// Builder and queries
// ============================================================

#[test]
fn given_diamond_hierarchy_when_computing_ancestry_then_each_type_once() {
    // Arrange
    let mut b = ModelBuilder::new();
    let top = b.class("Top");
    let left = b.class("Left");
    let right = b.class("Right");
    let bottom = b.class("Bottom");
    b.generalize(left, top).unwrap();
    b.generalize(right, top).unwrap();
    b.generalize(bottom, left).unwrap();
    b.generalize(bottom, right).unwrap();
    let model = b.build();

    // Act
    let ancestry = model.ancestry(bottom).unwrap();

    // Assert
    assert_eq!(ancestry, vec![bottom, left, right, top]);
}

#[test]
fn given_hierarchy_when_checking_conformance_then_reflexive_and_transitive() {
    let mut b = ModelBuilder::new();
    let thing = b.class("Thing");
    let vehicle = b.class("Vehicle");
    let car = b.class("Car");
    b.generalize(vehicle, thing).unwrap();
    b.generalize(car, vehicle).unwrap();
    let model = b.build();

    assert!(model.conforms_to(car, car).unwrap());
    assert!(model.conforms_to(car, thing).unwrap());
    assert!(!model.conforms_to(thing, car).unwrap());
    assert!(model.related(thing, car).unwrap());
}

#[test]
fn given_types_when_listing_then_insertion_order_and_lookup_by_name() {
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    b.data_type("Mass");
    let model = b.build();

    let names: Vec<String> = model
        .types()
        .unwrap()
        .iter()
        .map(|t| t.display_name())
        .collect();

    assert_eq!(names, vec!["Car", "Mass"]);
    assert_eq!(model.find_type("Car").unwrap().map(|t| t.id), Some(car));
    assert!(model.find_type("Boat").unwrap().is_none());
}

#[test]
fn given_type_from_other_model_when_adding_feature_then_unknown_type() {
    let mut other = ModelBuilder::new();
    let foreign = other.class("Foreign");
    let mut b = ModelBuilder::new();

    let result = b.add_feature(foreign, FeatureSpec::untyped());

    assert!(matches!(result, Err(ModelError::UnknownType(_))));
}

#[test]
fn given_associations_when_querying_composites_then_only_reachable_ones() {
    // Arrange
    let mut b = ModelBuilder::new();
    let vehicle = b.class("Vehicle");
    let car = b.class("Car");
    let wheel = b.class("Wheel");
    let boat = b.class("Boat");
    b.generalize(car, vehicle).unwrap();
    b.add_association(AssociationSpec::composite("Mount", vehicle, FeatureSpec::property("w", wheel)))
        .unwrap();
    b.add_association(AssociationSpec::composite("Hull", boat, FeatureSpec::property("h", wheel)))
        .unwrap();
    b.add_association(
        AssociationSpec::new(Some("Loose"))
            .end(EndSpec::association_owned(
                FeatureSpec::untyped().with_type(Some(car)).aggregation(AggregationKind::None),
            ))
            .end(EndSpec::association_owned(
                FeatureSpec::property("x", wheel).aggregation(AggregationKind::Shared),
            )),
    )
    .unwrap();
    let model = b.build();

    // Act
    let associations = model.composite_associations(car).unwrap();

    // Assert
    let names: Vec<_> = associations.iter().filter_map(|a| a.name.clone()).collect();
    assert_eq!(names, vec!["Mount".to_string()]);
}

#[test]
fn given_redefined_attribute_when_listing_attributes_then_only_redefining_one() {
    let mut b = ModelBuilder::new();
    let vehicle = b.class("Vehicle");
    let car = b.class("Car");
    let engine = b.class("Engine");
    b.generalize(car, vehicle).unwrap();
    let old = b.add_feature(vehicle, FeatureSpec::property("engine", engine)).unwrap();
    let new = b.add_feature(car, FeatureSpec::property("motor", engine)).unwrap();
    b.redefine_feature(new, old).unwrap();
    let model = b.build();

    let names: Vec<_> = model
        .attributes(car)
        .unwrap()
        .into_iter()
        .filter_map(|f| f.name)
        .collect();

    assert_eq!(names, vec!["motor".to_string()]);
    assert_eq!(model.attributes(vehicle).unwrap().len(), 1);
}

#[test]
fn given_redefining_type_after_redefined_one_in_ancestry_when_listing_attributes_then_redefined_hidden() {
    // Arrange: ancestry of Leaf is [Leaf, Base, Mid]
    let mut b = ModelBuilder::new();
    let base = b.class("Base");
    let mid = b.class("Mid");
    let leaf = b.class("Leaf");
    let engine = b.class("Engine");
    let turbo = b.class("Turbo");
    b.generalize(mid, base).unwrap();
    b.generalize(leaf, base).unwrap();
    b.generalize(leaf, mid).unwrap();
    let old = b.add_feature(base, FeatureSpec::property("engine", engine)).unwrap();
    let new = b.add_feature(mid, FeatureSpec::property("engine", turbo)).unwrap();
    b.redefine_feature(new, old).unwrap();
    let model = b.build();

    // Act
    let attributes = model.attributes(leaf).unwrap();

    // Assert
    assert_eq!(model.ancestry(leaf).unwrap(), vec![leaf, base, mid]);
    let ids: Vec<_> = attributes.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![new]);
    assert_eq!(attributes[0].declared_type, Some(turbo));
}

#[test]
fn given_typed_feature_when_listing_attributes_then_type_key_prefers_stable_id() {
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    let engine = b.add_type(Some("Engine"), TypeKind::Class, Some("engine-1"));
    let wheel = b.class("Wheel");
    b.add_feature(car, FeatureSpec::property("engine", engine)).unwrap();
    b.add_feature(car, FeatureSpec::property("wheel", wheel)).unwrap();
    b.add_feature(car, FeatureSpec::untyped().with_name(Some("blob"))).unwrap();
    let model = b.build();

    let keys: Vec<_> = model
        .attributes(car)
        .unwrap()
        .into_iter()
        .map(|f| f.declared_type_key)
        .collect();

    assert_eq!(
        keys,
        vec![Some("engine-1".to_string()), Some("Wheel".to_string()), None]
    );
}

#[test]
fn given_type_owned_end_when_listing_attributes_then_it_appears_with_its_association() {
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    let wheel = b.class("Wheel");
    let association = b
        .add_association(
            AssociationSpec::new(Some("Mount"))
                .end(EndSpec::association_owned(FeatureSpec::untyped().with_type(Some(car))))
                .end(EndSpec::type_owned(FeatureSpec::property("wheel", wheel), car)),
        )
        .unwrap();
    let model = b.build();

    let attributes = model.attributes(car).unwrap();

    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].association, Some(association));
    assert_eq!(attributes[0].owner, Some(car));
}

// ============================================================
// Model documents
// ============================================================

const VEHICLE_MODEL: &str = r#"
[[types]]
name = "Thing"

[[types]]
name = "Vehicle"
generals = ["Thing"]

[[types.features]]
name = "engine"
type = "Engine"

[[types.features]]
name = "sensors"
type = "Sensor"
lower = 0
upper = "*"

[[types.features]]
name = "plug"
type = "Socket"
kind = "port"

[[types]]
name = "Car"
generals = ["Vehicle"]

[[types.features]]
name = "motor"
type = "Engine"
redefines = ["Vehicle::engine"]

[[types]]
name = "Engine"

[[types]]
name = "Sensor"

[[types]]
name = "Socket"

[[types]]
name = "Mass"
kind = "data_type"

[[types]]
name = "Wheel"
id = "wheel-1"

[[associations]]
name = "Mount"
id = "mount-1"

[[associations.ends]]
type = "Vehicle"

[[associations.ends]]
name = "wheel"
type = "Wheel"
navigable = true
aggregation = "composite"
"#;

#[test]
fn given_vehicle_document_when_building_model_then_elements_resolve() {
    testing::init_test_setup();
    // Arrange
    let doc = ModelDocument::parse(VEHICLE_MODEL).unwrap();

    // Act
    let model = doc.into_model().unwrap();

    // Assert
    assert_eq!(model.type_count(), 8);
    assert_eq!(model.association_count(), 1);
    let vehicle = model.find_type("Vehicle").unwrap().unwrap();
    let car = model.find_type("Car").unwrap().unwrap();
    let mass = model.find_type("Mass").unwrap().unwrap();
    let wheel = model.find_type("Wheel").unwrap().unwrap();
    assert!(model.conforms_to(car.id, vehicle.id).unwrap());
    assert_eq!(mass.kind, TypeKind::DataType);
    assert_eq!(wheel.stable_id.as_deref(), Some("wheel-1"));

    let sensors = model
        .attributes(vehicle.id)
        .unwrap()
        .into_iter()
        .find(|f| f.name.as_deref() == Some("sensors"))
        .unwrap();
    assert_eq!((sensors.lower, sensors.upper), (0, UpperBound::Unbounded));
    assert_eq!(sensors.aggregation, AggregationKind::Composite);
    assert!(sensors.navigable);

    let plug = model
        .attributes(vehicle.id)
        .unwrap()
        .into_iter()
        .find(|f| f.name.as_deref() == Some("plug"))
        .unwrap();
    assert_eq!(plug.kind, FeatureKind::Port);
}

#[test]
fn given_redefines_reference_when_building_model_then_redefined_feature_hidden() {
    let model = ModelDocument::parse(VEHICLE_MODEL).unwrap().into_model().unwrap();
    let car = model.find_type("Car").unwrap().unwrap();

    let names: Vec<_> = model
        .attributes(car.id)
        .unwrap()
        .into_iter()
        .filter_map(|f| f.name)
        .collect();

    assert!(names.contains(&"motor".to_string()));
    assert!(!names.contains(&"engine".to_string()));
}

#[test]
fn given_association_document_when_building_model_then_end_defaults_apply() {
    let model = ModelDocument::parse(VEHICLE_MODEL).unwrap().into_model().unwrap();
    let car = model.find_type("Car").unwrap().unwrap();

    let associations = model.composite_associations(car.id).unwrap();

    assert_eq!(associations.len(), 1);
    let mount = &associations[0];
    assert_eq!(mount.stable_id.as_deref(), Some("mount-1"));
    let whole = &mount.member_ends[0];
    assert_eq!(whole.aggregation, AggregationKind::None);
    assert!(!whole.navigable);
    assert_eq!(whole.owner, None);
}

#[rstest]
#[case::unknown_feature_type(
    "[[types]]\nname = \"A\"\n[[types.features]]\nname = \"b\"\ntype = \"Missing\"\n"
)]
#[case::unknown_general("[[types]]\nname = \"A\"\ngenerals = [\"Missing\"]\n")]
#[case::unknown_end_type(
    "[[types]]\nname = \"A\"\n[[associations]]\nname = \"R\"\n[[associations.ends]]\ntype = \"Missing\"\n"
)]
fn given_dangling_type_reference_when_building_model_then_unknown_type(#[case] content: &str) {
    let result = ModelDocument::parse(content).unwrap().into_model();

    assert!(matches!(result, Err(ModelFileError::UnknownType { .. })));
}

#[test]
fn given_duplicate_type_names_when_building_model_then_duplicate_type() {
    let content = "[[types]]\nname = \"A\"\n[[types]]\nname = \"A\"\n";

    let result = ModelDocument::parse(content).unwrap().into_model();

    assert!(matches!(result, Err(ModelFileError::DuplicateType(name)) if name == "A"));
}

#[test]
fn given_unknown_redefines_target_when_building_model_then_unknown_feature() {
    let content = "[[types]]\nname = \"A\"\n[[types.features]]\nname = \"b\"\nredefines = [\"A::zzz\"]\n";

    let result = ModelDocument::parse(content).unwrap().into_model();

    assert!(matches!(result, Err(ModelFileError::UnknownFeature(_))));
}

#[rstest]
#[case::bad_upper("[[types]]\nname = \"A\"\n[[types.features]]\nname = \"b\"\nupper = \"many\"\n")]
fn given_invalid_upper_bound_when_building_model_then_invalid_upper_bound(#[case] content: &str) {
    let result = ModelDocument::parse(content).unwrap().into_model();

    assert!(matches!(result, Err(ModelFileError::InvalidUpperBound(_))));
}

#[rstest]
#[case::unknown_field("[[types]]\nname = \"A\"\ncolour = \"red\"\n")]
#[case::bad_kind("[[types]]\nname = \"A\"\nkind = \"widget\"\n")]
#[case::not_toml("[[types]\n")]
fn given_malformed_document_when_parsing_then_parse_error(#[case] content: &str) {
    let result = ModelDocument::parse(content);

    assert!(matches!(result, Err(ModelFileError::Parse(_))));
}
