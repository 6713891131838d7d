use std::fs;
use std::path::{Path, PathBuf};

use mph::{Category, Error, Group, HostValue, Model, NdArray, Node, Selected, Selector, Toggle};
use tempfile::TempDir;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("capacitor.json")
}

fn load() -> Model {
    mph::memory::open(&fixture()).unwrap_or_else(|e| panic!("failed to load fixture: {e}"))
}

fn names(nodes: &[Node<'_>]) -> Vec<String> {
    nodes.iter().map(|node| node.name().to_string()).collect()
}

#[test]
fn funcname_of_step_function() {
    let model = load();
    let functions = model.node("functions");
    let step = &functions / "step";
    assert_eq!(step.path().to_string(), "functions/step");
    assert_eq!(step.property("funcname").unwrap(), HostValue::from("step"));

    step.set_property("funcname", "ramp").unwrap();
    assert_eq!(
        model.property("function/step", "funcname").unwrap(),
        HostValue::from("ramp")
    );
}

#[test]
fn parent_and_join() {
    let model = load();
    let size = model.node("meshes/mesh/Size");
    assert_eq!(size.parent(), Some(model.node("meshes/mesh")));
    assert_eq!(model.node("functions").parent(), Some(model.root()));
    assert_eq!(model.root().parent(), None);
    assert_eq!(&model / "mesh" / "mesh" / "Size", size);
    assert_eq!(size.to_string(), "meshes/mesh/Size");
    assert_eq!(format!("{size:?}"), "Node(\"meshes/mesh/Size\")");
}

#[test]
fn structural_operations_are_forbidden_on_root_and_groups() {
    let model = load();
    let mut root = model.root();
    let mut group = model.node("functions");

    assert!(root.rename("x").unwrap_err().is_permission());
    assert!(group.rename("x").unwrap_err().is_permission());
    assert!(root.remove().unwrap_err().is_permission());
    assert!(group.remove().unwrap_err().is_permission());
    assert!(group.retag("x").unwrap_err().is_permission());
    assert!(root
        .create(&[HostValue::from("Analytic")], None)
        .unwrap_err()
        .is_permission());
    assert!(group.property("funcname").unwrap_err().is_permission());

    assert_eq!(root.path().to_string(), "");
    assert_eq!(group.path().to_string(), "functions");
    assert_eq!(model.functions().unwrap(), ["step"]);
}

#[test]
fn operations_on_missing_nodes_are_lookup_failures() {
    let model = load();
    let ghost = model.node("functions/ghost");
    assert!(ghost.property("funcname").unwrap_err().is_lookup());
    assert!(ghost.remove().unwrap_err().is_lookup());
    assert!(ghost.toggle(Toggle::Flip).unwrap_err().is_lookup());
    assert!(ghost.as_argument().unwrap_err().is_lookup());
}

#[test]
fn create_with_and_without_name() {
    let model = load();
    let functions = model.node("functions");

    let named = functions.create(&[HostValue::from("Analytic")], Some("f")).unwrap();
    assert_eq!(named.path().to_string(), "functions/f");
    assert_eq!(named.tag().unwrap().as_deref(), Some("ana1"));
    assert_eq!(named.entity_type().unwrap().as_deref(), Some("Analytic"));

    let unnamed = functions.create(&[HostValue::from("Analytic")], None).unwrap();
    assert_eq!(unnamed.name(), "Analytic 1");
    assert_eq!(unnamed.tag().unwrap().as_deref(), Some("ana2"));

    let bare = functions.create(&[], None).unwrap();
    assert_eq!(bare.tag().unwrap().as_deref(), Some("tag1"));

    assert_eq!(model.functions().unwrap(), ["step", "f", "Analytic 1", "tag1"]);

    let err = functions.create(&[HostValue::from("Analytic")], Some("a/b")).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "{err}");

    let sub = model
        .node("geometries/geometry")
        .create(&[HostValue::from("Circle")], Some("hole"))
        .unwrap();
    assert!(sub.exists().unwrap());
    assert_eq!(sub.tag().unwrap().as_deref(), Some("cir1"));

    let leaf = model.node("meshes/mesh/Size");
    assert!(matches!(
        leaf.create(&[HostValue::from("Size")], None),
        Err(Error::Runtime(_))
    ));
}

#[test]
fn create_with_separator_in_type() {
    let model = load();
    let functions = model.node("functions");
    let created = functions.create(&[HostValue::from("A/B")], None).unwrap();
    assert_eq!(created.name(), "A/B 1");
    assert_eq!(created.path().depth(), 2);
    assert_eq!(created.parent().unwrap(), functions);
    assert!(created.exists().unwrap());
    assert_eq!(created.entity_type().unwrap().as_deref(), Some("A/B"));
    assert!(names(&functions.children().unwrap()).contains(&"A/B 1".to_string()));

    created.set_property("scale", 2.0).unwrap();
    assert_eq!(created.property("scale").unwrap(), HostValue::Float(2.0));
    created.remove().unwrap();
    assert!(!created.exists().unwrap());
}

#[test]
fn create_through_the_model() {
    let model = load();
    let created = model.create("functions/g", &[HostValue::from("Analytic")]).unwrap();
    assert_eq!(created.path().to_string(), "functions/g");
    let child = model.create("geometries/geometry", &[HostValue::from("Block")]).unwrap();
    assert_eq!(child.path().to_string(), "geometries/geometry/Block 1");
}

#[test]
fn remove_leaves_siblings() {
    let model = load();
    let anode = model.node("physics/electrostatic/anode");
    anode.remove().unwrap();
    assert!(!anode.exists().unwrap());
    assert_eq!(
        names(&model.node("physics/electrostatic").children().unwrap()),
        ["cathode"]
    );
    assert!(anode.remove().unwrap_err().is_lookup());
}

#[test]
fn rename_moves_the_handle() {
    let model = load();
    let mut step = model.node("functions/step");
    step.rename("ramp").unwrap();
    assert_eq!(step.path().to_string(), "functions/ramp");
    assert!(step.exists().unwrap());
    assert!(!model.node("functions/step").exists().unwrap());
    assert_eq!(step.tag().unwrap().as_deref(), Some("step1"));

    assert!(matches!(step.rename(""), Err(Error::InvalidArgument(_))));
    assert_eq!(step.path().to_string(), "functions/ramp");
}

#[test]
fn retag_and_reference() {
    let model = load();
    let step = model.node("functions/step");
    step.retag("stp").unwrap();
    assert_eq!(step.as_argument().unwrap(), HostValue::Node("stp".to_string()));

    model.create("functions/other", &[HostValue::from("Analytic")]).unwrap();
    let err = model.node("functions/other").retag("stp").unwrap_err();
    assert!(matches!(err, Error::Engine(_)), "{err}");
}

#[test]
fn children_are_stable_and_ordered() {
    let model = load();
    let root = model.root().children().unwrap();
    assert_eq!(root.len(), Group::ALL.len());
    assert_eq!(root[0].name(), "parameters");
    assert_eq!(root[20].name(), "exports");

    let physics = model.node("physics/electrostatic");
    let first = names(&physics.children().unwrap());
    let second = names(&physics.children().unwrap());
    assert_eq!(first, ["anode", "cathode"]);
    assert_eq!(first, second);

    assert!(model.node("meshes/mesh/Size").children().unwrap().is_empty());
    assert!(model.node("functions/ghost").children().unwrap_err().is_lookup());
    assert!(model.node("evaluations").children().unwrap().is_empty());
}

#[test]
fn toggle_activation() {
    let model = load();
    let anode = model.node("physics/electrostatic/anode");
    anode.toggle(Toggle::Flip).unwrap();
    anode.toggle("on".parse().unwrap()).unwrap();
    anode.toggle(Toggle::Off).unwrap();
    anode.toggle(Toggle::Flip).unwrap();
    anode.toggle(Toggle::default()).unwrap();

    let electrostatic = match model.document().group(Group::Physics) {
        Ok(container) => container.get("es").unwrap(),
        Err(e) => panic!("{e}"),
    };
    let pot = electrostatic.features().unwrap().get("pot1").unwrap();
    assert!(!pot.is_active().unwrap());
}

#[test]
fn properties_sorted_by_name() {
    let model = load();
    let step = model.node("functions/step");
    let properties = step.properties_map().unwrap();
    assert_eq!(
        properties.keys().collect::<Vec<_>>(),
        ["funcname", "location", "smooth"]
    );
    assert_eq!(properties["location"], HostValue::Float(0.5));
    assert_eq!(step.properties().unwrap(), ["funcname", "location", "smooth"]);
    assert_eq!(model.properties("functions/step").unwrap(), properties);
}

#[test]
fn comments() {
    let model = load();
    let step = model.node("functions/step");
    assert_eq!(step.comment().unwrap(), "");
    step.set_comment("rises at the middle").unwrap();
    assert_eq!(step.comment().unwrap(), "rises at the middle");
}

#[test]
fn run_and_import() {
    let model = load();
    model.node("geometries/geometry").run().unwrap();
    let err = model.node("functions/step").run().unwrap_err();
    assert!(matches!(err, Error::Runtime(_)), "{err}");

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("table.txt");
    fs::write(&file, "% t U\n0 1\n1, 2\n").unwrap();
    let table = model.node("tables/table");
    table.import(&file).unwrap();
    assert_eq!(
        table.property("table").unwrap(),
        HostValue::List(vec![
            HostValue::List(vec![HostValue::from("0"), HostValue::from("1")]),
            HostValue::List(vec![HostValue::from("1"), HostValue::from("2")]),
        ])
    );
    assert_eq!(table.property("filename").unwrap(), HostValue::Path(file.clone()));

    let missing = dir.path().join("missing.txt");
    assert!(matches!(table.import(&missing), Err(Error::Io(_))));
    assert!(model.import("tables/ghost", &file).unwrap_err().is_lookup());
    model.import("tables/table", &file).unwrap();
}

#[test]
fn selections_named_and_manual() {
    let model = load();
    let anode = model.node("physics/electrostatic/anode");
    let cathode = model.node("physics/electrostatic/cathode");
    let named = model.node("selections/anode");

    assert_eq!(anode.selection().unwrap(), Some(Selected::Named(named.clone())));
    assert_eq!(cathode.selection().unwrap(), Some(Selected::Entities(vec![3])));
    assert_eq!(named.selection().unwrap(), Some(Selected::Entities(vec![1, 2])));

    cathode.select((&named).into()).unwrap();
    assert_eq!(cathode.selection().unwrap(), Some(Selected::Named(named.clone())));
    cathode.select(vec![2, 3].into()).unwrap();
    assert_eq!(cathode.selection().unwrap(), Some(Selected::Entities(vec![2, 3])));
    cathode.select(4.into()).unwrap();
    assert_eq!(cathode.selection().unwrap(), Some(Selected::Entities(vec![4])));
    cathode.select(Selector::All).unwrap();
    assert_eq!(cathode.selection().unwrap(), Some(Selected::Entities(vec![1, 2, 3])));
    cathode.select(Selector::Clear).unwrap();
    assert_eq!(cathode.selection().unwrap(), None);
    cathode.select(Vec::new().into()).unwrap();
    assert_eq!(cathode.selection().unwrap(), None);

    named.select(Selector::All).unwrap();
    assert_eq!(named.selection().unwrap(), Some(Selected::Entities(vec![1, 2, 3])));
    assert_eq!(
        anode.selection().unwrap(),
        Some(Selected::Named(named.clone())),
        "named selections follow their source"
    );
}

#[test]
fn selectors_from_host_values() {
    let cases: Vec<(HostValue, Selector<'_, '_>)> = vec![
        (HostValue::None, Selector::Clear),
        (HostValue::from("all"), Selector::All),
        (HostValue::Int(2), Selector::Entities(vec![2])),
        (HostValue::from(vec![1i64, 2]), Selector::Entities(vec![1, 2])),
        (
            HostValue::IntArray(NdArray::from_vec(vec![3, 4])),
            Selector::Entities(vec![3, 4]),
        ),
        (HostValue::List(Vec::new()), Selector::Entities(Vec::new())),
    ];
    for (value, expected) in cases {
        assert_eq!(Selector::try_from(value.clone()).unwrap(), expected, "for {value:?}");
    }
    for value in [
        HostValue::from("some"),
        HostValue::Float(1.0),
        HostValue::Int(1 << 40),
        HostValue::List(vec![HostValue::Int(1), HostValue::from("2")]),
    ] {
        let err = Selector::try_from(value.clone()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)), "for {value:?}: {err}");
    }
}

#[test]
fn selection_failures() {
    let model = load();
    let named = model.node("selections/anode");

    let ghost = model.node("physics/electrostatic/ghost");
    assert!(ghost.selection().unwrap_err().is_lookup());
    assert!(ghost.select(Selector::All).unwrap_err().is_lookup());

    let missing = model.node("selections/ghost");
    let cathode = model.node("physics/electrostatic/cathode");
    assert!(cathode.select((&missing).into()).unwrap_err().is_lookup());

    let rectangle = model.node("geometries/geometry/anode");
    assert!(matches!(rectangle.selection(), Err(Error::Runtime(_))));
    assert!(matches!(rectangle.select(vec![1].into()), Err(Error::Runtime(_))));

    let step = model.node("functions/step");
    assert!(matches!(step.selection(), Err(Error::InvalidArgument(_))));
    assert!(matches!(step.select(Selector::All), Err(Error::InvalidArgument(_))));

    let other = model.node("selections").create(&[HostValue::from("Explicit")], Some("other")).unwrap();
    assert!(matches!(other.select((&named).into()), Err(Error::InvalidArgument(_))));
    assert!(model.node("physics").selection().unwrap_err().is_permission());

    // A followed selection that disappears can no longer be reported.
    named.remove().unwrap();
    assert!(model.node("physics/electrostatic/anode").selection().unwrap_err().is_lookup());
}

#[test]
fn problems_of_node_and_descendants() {
    let model = load();
    let geometry = model.node("geometries/geometry");
    let problems = geometry.problems().unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0].message, "Rectangles overlap.");
    assert_eq!(problems[0].category, Some(Category::Error));
    assert_eq!(problems[0].node, model.node("geometries/geometry/cathode"));
    assert_eq!(problems[0].selection, "");
    assert_eq!(problems[1].message, "Domain 2 is empty.");
    assert_eq!(problems[1].category, Some(Category::Warning));
    assert_eq!(problems[1].node, problems[0].node);

    let physics = model.node("physics/electrostatic").problems().unwrap();
    assert_eq!(physics.len(), 1);
    assert_eq!(physics[0].selection, "boundary 4");
    assert_eq!(physics[0].node, model.node("physics/electrostatic"));

    let everything = model.root().problems().unwrap();
    assert_eq!(everything.len(), 3);
    assert!(model.node("functions/step").problems().unwrap().is_empty());
    assert!(model.node("functions/ghost").problems().unwrap_err().is_lookup());
}
