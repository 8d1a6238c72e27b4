//! Tests for tree values: construction invariants, flattening, rendering and ordering

use std::collections::{BTreeMap, BTreeSet};

use comptree::domain::ordering::{compare_branches, sort_associations, structural_fingerprint};
use comptree::domain::{
    AllClosedWorld, AssociationInfo, AssociationSpec, BranchOrder, Explanation, FeatureInfo, FeatureSpec,
    IllFormedBranch, IllFormedTree, ModelArena, ModelBuilder, ModelQuery, TreeAnalyzer,
    TreeError, TreeFeatureBranch, TreeRender, TreeType, TypeId, TypedBranch, WellFormedTree,
};

struct Fixture {
    model: ModelArena,
    car: TypeId,
    engine: TypeId,
}

fn fixture() -> Fixture {
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    let engine = b.class("Engine");
    b.add_feature(car, FeatureSpec::property("engine", engine)).unwrap();
    b.add_feature(car, FeatureSpec::port("plug", engine)).unwrap();
    Fixture {
        model: b.build(),
        car,
        engine,
    }
}

fn feature(fx: &Fixture, name: &str) -> FeatureInfo {
    fx.model
        .attributes(fx.car)
        .unwrap()
        .into_iter()
        .find(|f| f.name.as_deref() == Some(name))
        .unwrap()
}

fn leaf(fx: &Fixture, ty: TypeId) -> TreeType {
    let info = fx.model.type_info(ty).unwrap();
    TreeType::WellFormed(WellFormedTree::new(info, vec![]).unwrap())
}

// ============================================================
// Construction invariants
// ============================================================

#[test]
fn given_port_feature_when_building_property_branch_then_invariant_violation() {
    let fx = fixture();

    let result = TypedBranch::property(feature(&fx, "plug"), leaf(&fx, fx.engine));

    assert!(matches!(result, Err(TreeError::InvariantViolation(_))));
}

#[test]
fn given_child_of_other_type_when_building_branch_then_invariant_violation() {
    let fx = fixture();

    let result = TypedBranch::property(feature(&fx, "engine"), leaf(&fx, fx.car));

    assert!(matches!(result, Err(TreeError::InvariantViolation(_))));
}

#[test]
fn given_duplicate_branch_names_when_building_well_formed_tree_then_invariant_violation() {
    let fx = fixture();
    let branch = TypedBranch::property(feature(&fx, "engine"), leaf(&fx, fx.engine)).unwrap();
    let info = fx.model.type_info(fx.car).unwrap();

    let result = WellFormedTree::new(
        info,
        vec![
            TreeFeatureBranch::Typed(branch.clone()),
            TreeFeatureBranch::Typed(branch),
        ],
    );

    assert!(matches!(result, Err(TreeError::InvariantViolation(_))));
}

#[test]
fn given_no_explanation_when_building_ill_formed_values_then_invariant_violation() {
    let fx = fixture();
    let info = fx.model.type_info(fx.car).unwrap();

    assert!(IllFormedTree::new(info, BTreeSet::new(), BTreeMap::new()).is_err());
    assert!(IllFormedBranch::new(Some(feature(&fx, "engine")), None, vec![]).is_err());
}

#[test]
fn given_neither_feature_nor_association_when_building_ill_formed_branch_then_invariant_violation() {
    let result = IllFormedBranch::new(None, None, vec![Explanation::UntypedProperty]);

    assert!(matches!(result, Err(TreeError::InvariantViolation(_))));
}

#[test]
fn given_type_level_code_when_building_ill_formed_branch_then_invariant_violation() {
    let fx = fixture();

    let result = IllFormedBranch::new(
        Some(feature(&fx, "engine")),
        None,
        vec![Explanation::FeatureNameConflicts],
    );

    assert!(matches!(result, Err(TreeError::InvariantViolation(_))));
}

// ============================================================
// Flattening
// ============================================================

fn nested_model() -> (ModelArena, TypeId) {
    // Car -> engine: Engine -> (blob untyped, pistons 0..*)
    //     -> loose untyped
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    let engine = b.class("Engine");
    let piston = b.class("Piston");
    b.add_feature(car, FeatureSpec::property("engine", engine)).unwrap();
    b.add_feature(car, FeatureSpec::untyped().with_name(Some("loose"))).unwrap();
    b.add_feature(engine, FeatureSpec::untyped().with_name(Some("blob"))).unwrap();
    b.add_feature(
        engine,
        FeatureSpec::property("pistons", piston)
            .multiplicity(0, comptree::domain::UpperBound::Unbounded),
    )
    .unwrap();
    (b.build(), car)
}

#[test]
fn given_nested_ill_formed_branches_when_flattening_then_preorder_grouped_by_owner() {
    // Arrange
    let (model, car) = nested_model();
    let tree = TreeAnalyzer::new(&model, &AllClosedWorld).analyze_root(car).unwrap();

    // Act
    let pairs = tree.ill_formed_branches();

    // Assert
    let flat: Vec<(String, String)> = pairs
        .iter()
        .map(|(owner, branch)| (owner.tree_type().display_name(), branch.label()))
        .collect();
    assert_eq!(
        flat,
        vec![
            ("Car".to_string(), "loose".to_string()),
            ("Engine".to_string(), "blob".to_string()),
            ("Engine".to_string(), "pistons".to_string()),
        ]
    );
}

#[test]
fn given_tree_when_flattening_twice_then_results_are_identical() {
    let (model, car) = nested_model();
    let tree = TreeAnalyzer::new(&model, &AllClosedWorld).analyze_root(car).unwrap();

    assert_eq!(tree.ill_formed_branches(), tree.ill_formed_branches());
}

#[test]
fn given_well_formed_tree_when_flattening_then_empty() {
    let fx = fixture();
    let tree = leaf(&fx, fx.engine);

    assert!(tree.ill_formed_branches().is_empty());
    assert!(tree.ill_formed_trees().is_empty());
    assert!(tree.is_fully_well_formed());
}

// ============================================================
// Rendering
// ============================================================

#[test]
fn given_tree_when_rendering_then_shows_branches_and_codes() {
    let (model, car) = nested_model();
    let tree = TreeAnalyzer::new(&model, &AllClosedWorld).analyze_root(car).unwrap();

    let rendered = tree.to_tree_string(BranchOrder::Discovery).to_string();

    assert!(rendered.starts_with("Car"));
    assert!(rendered.contains("engine (Property) : Engine"));
    assert!(rendered.contains("loose [UntypedProperty]"));
    assert!(rendered.contains("pistons [OptionalMultiplicity, CollectionMultiplicity]"));
}

#[test]
fn given_sorted_order_when_rendering_then_typed_branches_precede_ill_formed() {
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    let wheel = b.class("Wheel");
    b.add_feature(car, FeatureSpec::untyped().with_name(Some("aaa"))).unwrap();
    b.add_feature(car, FeatureSpec::property("zzz", wheel)).unwrap();
    let model = b.build();
    let tree = TreeAnalyzer::new(&model, &AllClosedWorld).analyze_root(car).unwrap();

    let discovery = tree.to_tree_string(BranchOrder::Discovery).to_string();
    let sorted = tree.to_tree_string(BranchOrder::Sorted).to_string();

    let position = |text: &str, needle: &str| text.find(needle).unwrap();
    assert!(position(&discovery, "aaa") < position(&discovery, "zzz"));
    assert!(position(&sorted, "zzz") < position(&sorted, "aaa"));
}

// ============================================================
// Ordering
// ============================================================

#[test]
fn given_typed_and_ill_formed_branch_when_comparing_then_typed_first() {
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    let wheel = b.class("Wheel");
    b.add_feature(car, FeatureSpec::untyped().with_name(Some("a"))).unwrap();
    b.add_feature(car, FeatureSpec::property("b", wheel)).unwrap();
    let model = b.build();
    let tree = TreeAnalyzer::new(&model, &AllClosedWorld).analyze_root(car).unwrap();

    let mut branches = tree.branches().to_vec();
    branches.sort_by(compare_branches);

    assert!(branches[0].is_typed());
    assert!(!branches[1].is_typed());
}

#[test]
fn given_unidentified_associations_when_sorting_then_fingerprint_order_is_stable() {
    // Arrange: the same two associations declared in opposite orders
    let build = |swap: bool| {
        let mut b = ModelBuilder::new();
        let car = b.class("Car");
        let wheel = b.class("Wheel");
        let first = AssociationSpec::composite("Front", car, FeatureSpec::property("f", wheel));
        let second = AssociationSpec::composite("Rear", car, FeatureSpec::property("r", wheel));
        let (x, y) = if swap { (second, first) } else { (first, second) };
        b.add_association(x).unwrap();
        b.add_association(y).unwrap();
        let model = b.build();
        let mut associations = model.composite_associations(car).unwrap();
        sort_associations(&mut associations);
        associations
            .iter()
            .map(|a| a.name.clone().unwrap())
            .collect::<Vec<_>>()
    };

    // Act & Assert
    assert_eq!(build(false), build(true));
}

#[test]
fn given_structurally_equal_associations_when_fingerprinting_then_equal_digests() {
    let mut b = ModelBuilder::new();
    let car = b.class("Car");
    let wheel = b.class("Wheel");
    b.add_association(AssociationSpec::composite("Mount", car, FeatureSpec::property("w", wheel)))
        .unwrap();
    b.add_association(AssociationSpec::composite("Mount", car, FeatureSpec::property("w", wheel)))
        .unwrap();
    let model = b.build();

    let associations = model.composite_associations(car).unwrap();

    assert_eq!(associations.len(), 2);
    let digest = structural_fingerprint(&associations[0]);
    assert_eq!(digest, structural_fingerprint(&associations[1]));
    assert_eq!(digest.len(), 64);
}

#[test]
fn given_associations_differing_only_in_part_type_when_sorting_then_order_ignores_declaration() {
    // Arrange
    let build = |swap: bool| {
        let mut b = ModelBuilder::new();
        let car = b.class("Car");
        let wheel = b.class("Wheel");
        let tire = b.class("Tire");
        let first = AssociationSpec::composite("Mount", car, FeatureSpec::property("w", wheel));
        let second = AssociationSpec::composite("Mount", car, FeatureSpec::property("w", tire));
        let (x, y) = if swap { (second, first) } else { (first, second) };
        b.add_association(x).unwrap();
        b.add_association(y).unwrap();
        let model = b.build();
        let mut associations = model.composite_associations(car).unwrap();
        sort_associations(&mut associations);
        associations
    };

    // Act
    let declared = build(false);
    let swapped = build(true);

    // Assert
    assert_ne!(
        structural_fingerprint(&declared[0]),
        structural_fingerprint(&declared[1])
    );
    let part_types = |associations: &[AssociationInfo]| {
        associations
            .iter()
            .map(|a| a.member_ends[1].declared_type_key.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(part_types(&declared), part_types(&swapped));
}
