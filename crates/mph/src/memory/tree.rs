//! Containers and features of the reference engine.

use indexmap::IndexMap;
use log::debug;
use mph_node_path::Group;
use std::cell::{Cell, RefCell};
use std::fs;
use std::rc::{Rc, Weak};

use super::selection::MemorySelection;
use super::snapshot::{FeatureSnapshot, ProblemSnapshot, PropertySnapshot, SolutionData, StoredResult};
use super::MemoryDocument;
use crate::engine::{
    Container, ContainerRef, EngineResult, Entity, EntityRef, EvalData, ProblemReport, SelectionRef,
};
use crate::error::{EngineError, Error};
use crate::host::NdArray;
use crate::value::{Value, ValueType};

type Items = Rc<RefCell<Vec<Rc<MemoryFeature>>>>;

/// Groups whose top-level features hold sub-features.
const NESTING: [Group; 11] = [
    Group::Components,
    Group::Geometries,
    Group::Views,
    Group::Physics,
    Group::Multiphysics,
    Group::Materials,
    Group::Meshes,
    Group::Studies,
    Group::Solutions,
    Group::Batches,
    Group::Plots,
];

/// Ordered features of one group, or the sub-features of one feature.
pub struct MemoryContainer {
    group: Group,
    nested: bool,
    items: Items,
    document: Weak<MemoryDocument>,
}

impl MemoryContainer {
    pub(crate) fn new(group: Group, nested: bool, document: Weak<MemoryDocument>) -> Rc<Self> {
        Rc::new(Self {
            group,
            nested,
            items: Rc::new(RefCell::new(Vec::new())),
            document,
        })
    }

    pub fn find(&self, tag: &str) -> Option<Rc<MemoryFeature>> {
        self.items
            .borrow()
            .iter()
            .find(|item| *item.tag.borrow() == tag)
            .cloned()
    }

    pub(crate) fn first_tag(&self) -> Option<String> {
        self.items.borrow().first().map(|item| item.tag.borrow().clone())
    }

    pub(crate) fn features(&self) -> Vec<Rc<MemoryFeature>> {
        self.items.borrow().clone()
    }

    /// Fill the container from snapshots, after everything else is cleared.
    pub(crate) fn restore(&self, snapshots: &[FeatureSnapshot]) -> Result<(), Error> {
        let mut restored = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            if restored.iter().any(|item: &Rc<MemoryFeature>| *item.tag.borrow() == snapshot.tag) {
                return Err(Error::InvalidArgument(format!(
                    "feature tag \"{}\" appears twice in group \"{}\"",
                    snapshot.tag, self.group
                )));
            }
            restored.push(MemoryFeature::restore(self, snapshot)?);
        }
        *self.items.borrow_mut() = restored;
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Vec<FeatureSnapshot> {
        self.items.borrow().iter().map(|item| item.snapshot()).collect()
    }

    fn sub_container(&self, explicit: bool) -> Option<Rc<MemoryContainer>> {
        if explicit || (!self.nested && NESTING.contains(&self.group)) {
            Some(MemoryContainer::new(self.group, true, self.document.clone()))
        } else {
            None
        }
    }

    /// Label for a new feature of `kind`: the kind and the lowest unused number.
    fn next_label(&self, kind: &str, tag: &str) -> String {
        if kind.is_empty() {
            return tag.to_string();
        }
        let items = self.items.borrow();
        (1..)
            .map(|n| format!("{kind} {n}"))
            .find(|label| items.iter().all(|item| *item.label.borrow() != *label))
            .unwrap_or_else(|| tag.to_string())
    }

    /// Properties a new feature starts out with.
    fn defaults(&self, kind: &str) -> IndexMap<String, Property> {
        let mut properties = IndexMap::new();
        let first_tag = |group: Group| {
            self.document
                .upgrade()
                .and_then(|document| document.container(group).ok().and_then(|c| c.first_tag()))
                .unwrap_or_default()
        };
        let mut add = |name: &str, declared: ValueType, value: Value| {
            properties.insert(name.to_string(), Property { declared, value });
        };
        match (self.group, kind) {
            (Group::Evaluations, "Global" | "Eval" | "EvalPoint") => {
                add("expr", ValueType::String, Value::String(String::new()));
                add("unit", ValueType::String, Value::String(String::new()));
                add("data", ValueType::String, Value::String(first_tag(Group::Datasets)));
                add("outersolnum", ValueType::Int, Value::Int(1));
                if kind == "EvalPoint" {
                    add("innerinput", ValueType::String, Value::String("all".to_string()));
                    add("solnum", ValueType::IntArray, Value::IntArray(Vec::new()));
                }
            }
            (Group::Exports, _) | (Group::Tables, _) => {
                add("filename", ValueType::File, Value::String(String::new()));
            }
            (Group::Datasets, _) => {
                add("solution", ValueType::String, Value::String(first_tag(Group::Solutions)));
            }
            _ => {}
        }
        properties
    }
}

impl Container for MemoryContainer {
    fn tags(&self) -> Vec<String> {
        self.items.borrow().iter().map(|item| item.tag.borrow().clone()).collect()
    }

    fn get(&self, tag: &str) -> EngineResult<EntityRef> {
        match self.find(tag) {
            Some(item) => Ok(item as EntityRef),
            None => Err(EngineError::NoSuchTag(tag.to_string())),
        }
    }

    fn create(&self, tag: &str, args: &[Value]) -> EngineResult<EntityRef> {
        if self.find(tag).is_some() {
            return Err(EngineError::DuplicateTag(tag.to_string()));
        }
        let kind = args.iter().find_map(Value::as_str).unwrap_or_default().to_string();
        let label = self.next_label(&kind, tag);
        let properties = self.defaults(&kind);
        let item = Rc::new_cyclic(|me| MemoryFeature {
            tag: RefCell::new(tag.to_string()),
            label: RefCell::new(label),
            group: self.group,
            comments: RefCell::new(String::new()),
            active: Cell::new(true),
            properties: RefCell::new(properties),
            features: self.sub_container(false),
            solution: RefCell::new(None),
            problems: Vec::new(),
            runs: Cell::new(0),
            siblings: Rc::downgrade(&self.items),
            document: self.document.clone(),
            me: me.clone(),
            kind,
        });
        debug!("Created feature \"{tag}\" in group \"{}\".", self.group);
        self.items.borrow_mut().push(item.clone());
        Ok(item as EntityRef)
    }

    fn remove(&self, tag: &str) -> EngineResult<()> {
        let mut items = self.items.borrow_mut();
        match items.iter().position(|item| *item.tag.borrow() == tag) {
            Some(index) => {
                items.remove(index);
                Ok(())
            }
            None => Err(EngineError::NoSuchTag(tag.to_string())),
        }
    }

    fn unique_tag(&self, prefix: &str) -> String {
        let items = self.items.borrow();
        (1u32..)
            .map(|n| format!("{prefix}{n}"))
            .find(|tag| items.iter().all(|item| *item.tag.borrow() != *tag))
            .unwrap_or_else(|| prefix.to_string())
    }

    fn clear_stored_data(&self) -> EngineResult<()> {
        if self.group == Group::Plots && !self.nested {
            debug!("Cleared stored plot data.");
            Ok(())
        } else {
            Err(EngineError::Unsupported("clear_stored_data"))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Property {
    declared: ValueType,
    value: Value,
}

/// One feature node.
pub struct MemoryFeature {
    tag: RefCell<String>,
    label: RefCell<String>,
    kind: String,
    group: Group,
    comments: RefCell<String>,
    active: Cell<bool>,
    properties: RefCell<IndexMap<String, Property>>,
    features: Option<Rc<MemoryContainer>>,
    /// Stored results, for solutions.
    solution: RefCell<Option<SolutionData>>,
    problems: Vec<ProblemSnapshot>,
    /// Times the sequence was run since it was last cleared.
    runs: Cell<u32>,
    siblings: Weak<RefCell<Vec<Rc<MemoryFeature>>>>,
    document: Weak<MemoryDocument>,
    me: Weak<MemoryFeature>,
}

impl MemoryFeature {
    fn restore(container: &MemoryContainer, snapshot: &FeatureSnapshot) -> Result<Rc<Self>, Error> {
        let invalid = |message: String| {
            Error::InvalidArgument(format!("feature \"{}\": {message}", snapshot.tag))
        };
        let mut properties = IndexMap::new();
        for (name, property) in &snapshot.properties {
            let (declared, value) = property.decode().map_err(invalid)?;
            properties.insert(name.clone(), Property { declared, value });
        }
        let features = container.sub_container(snapshot.features.is_some());
        if let (Some(sub), Some(items)) = (&features, &snapshot.features) {
            sub.restore(items)?;
        }
        Ok(Rc::new_cyclic(|me| Self {
            tag: RefCell::new(snapshot.tag.clone()),
            label: RefCell::new(snapshot.label.clone().unwrap_or_else(|| snapshot.tag.clone())),
            kind: snapshot.kind.clone(),
            group: container.group,
            comments: RefCell::new(snapshot.comments.clone()),
            active: Cell::new(snapshot.active),
            properties: RefCell::new(properties),
            features,
            solution: RefCell::new(snapshot.solution.clone()),
            problems: snapshot.problems.clone(),
            runs: Cell::new(0),
            siblings: Rc::downgrade(&container.items),
            document: container.document.clone(),
            me: me.clone(),
        }))
    }

    fn snapshot(&self) -> FeatureSnapshot {
        FeatureSnapshot {
            tag: self.tag.borrow().clone(),
            label: Some(self.label.borrow().clone()),
            kind: self.kind.clone(),
            active: self.active.get(),
            comments: self.comments.borrow().clone(),
            properties: self
                .properties
                .borrow()
                .iter()
                .map(|(name, p)| (name.clone(), PropertySnapshot::encode(&p.declared, &p.value)))
                .collect(),
            features: self.features.as_ref().map(|sub| sub.snapshot()),
            solution: self.solution.borrow().clone(),
            problems: self.problems.clone(),
        }
    }

    /// Number of times the feature was run since it was last cleared.
    pub fn runs(&self) -> u32 {
        self.runs.get()
    }

    pub(super) fn document(&self) -> EngineResult<Rc<MemoryDocument>> {
        self.document
            .upgrade()
            .ok_or_else(|| EngineError::Call("the model document was closed".to_string()))
    }

    pub(super) fn value(&self, name: &str) -> EngineResult<Value> {
        self.properties
            .borrow()
            .get(name)
            .map(|p| p.value.clone())
            .ok_or_else(|| EngineError::NoSuchProperty(name.to_string()))
    }

    fn text(&self, name: &str) -> EngineResult<String> {
        match self.value(name)? {
            Value::String(s) => Ok(s),
            other => Err(EngineError::Call(format!(
                "property \"{name}\" holds {}, not a string",
                other.kind()
            ))),
        }
    }

    fn has_property(&self, name: &str) -> bool {
        self.properties.borrow().contains_key(name)
    }

    /// Store a property under an explicit type, replacing any current one.
    pub(super) fn put(&self, name: &str, declared: ValueType, value: Value) {
        self.properties
            .borrow_mut()
            .insert(name.to_string(), Property { declared, value });
    }

    pub(super) fn drop_property(&self, name: &str) {
        self.properties.borrow_mut().shift_remove(name);
    }

    fn require_group(&self, groups: &[Group], operation: &'static str) -> EngineResult<()> {
        if groups.contains(&self.group) {
            Ok(())
        } else {
            Err(EngineError::Unsupported(operation))
        }
    }

    fn compute(&self) {
        let mut solution = self.solution.borrow_mut();
        solution.get_or_insert_with(SolutionData::default).computed = true;
    }

    /// Solutions whose `study` property names this study.
    fn solve_study(&self) -> EngineResult<()> {
        let document = self.document()?;
        let tag = self.tag.borrow().clone();
        let mut solved = 0;
        for solution in document.container(Group::Solutions)?.features() {
            if solution.text("study").ok().as_deref() == Some(tag.as_str()) {
                solution.compute();
                solved += 1;
            }
        }
        debug!("Study \"{tag}\" computed {solved} solution(s).");
        Ok(())
    }

    fn write_export(&self) -> EngineResult<()> {
        let file = self.text("filename")?;
        if file.is_empty() {
            return Err(EngineError::Call(format!(
                "export \"{}\" has no file name",
                self.label.borrow()
            )));
        }
        let content = format!("% {}\n", self.label.borrow());
        fs::write(&file, content).map_err(|err| EngineError::Call(format!("cannot write \"{file}\": {err}")))
    }

    /// The solution an evaluation refers to, through its dataset.
    fn evaluated_solution(&self) -> EngineResult<Rc<MemoryFeature>> {
        let document = self.document()?;
        let data = self.text("data")?;
        let dataset = document
            .container(Group::Datasets)?
            .find(&data)
            .ok_or_else(|| EngineError::Call(format!("unknown dataset \"{data}\"")))?;
        let tag = dataset.text("solution").or_else(|_| dataset.text("data"))?;
        document
            .container(Group::Solutions)?
            .find(&tag)
            .ok_or_else(|| EngineError::Call(format!("dataset \"{data}\" refers to no solution")))
    }

    /// Inner solutions selected on a point evaluation, zero-based.
    fn inner_selection(&self, steps: usize) -> EngineResult<Vec<usize>> {
        if self.kind != "EvalPoint" {
            return Ok((0..steps).collect());
        }
        match self.text("innerinput")?.as_str() {
            "all" => Ok((0..steps).collect()),
            "first" => Ok((0..steps.min(1)).collect()),
            "last" => Ok(steps.checked_sub(1).into_iter().collect()),
            "manual" => match self.value("solnum")? {
                Value::IntArray(indices) => indices
                    .iter()
                    .map(|&i| match usize::try_from(i) {
                        Ok(i) if (1..=steps).contains(&i) => Ok(i - 1),
                        _ => Err(EngineError::Call(format!("solution number {i} out of range"))),
                    })
                    .collect(),
                other => Err(EngineError::Call(format!(
                    "solution numbers must be integers, not {}",
                    other.kind()
                ))),
            },
            other => Err(EngineError::Call(format!("invalid inner input \"{other}\""))),
        }
    }
}

/// Values of one outer solution, as (inner, point).
fn outer_slice<'r>(result: &'r StoredResult, outer: usize, imag: bool) -> Option<&'r Vec<Vec<f64>>> {
    if imag {
        result.imag.as_ref()?.get(outer)
    } else {
        result.real.get(outer)
    }
}

/// Numbers with the declared type, converting integers where a floating
/// point type is declared.
fn fit(declared: &ValueType, value: Value) -> (ValueType, Value) {
    match (declared, value) {
        (ValueType::File, value @ Value::String(_)) => (ValueType::File, value),
        (ValueType::Selection, value @ Value::StringArray(_)) => (ValueType::Selection, value),
        (ValueType::DoubleRowMatrix, value @ Value::DoubleMatrix(_)) => (ValueType::DoubleRowMatrix, value),
        (ValueType::Double, Value::Int(i)) => (ValueType::Double, Value::Double(f64::from(i))),
        (ValueType::DoubleArray, Value::IntArray(v)) => (
            ValueType::DoubleArray,
            Value::DoubleArray(v.into_iter().map(f64::from).collect()),
        ),
        (ValueType::DoubleMatrix, Value::IntMatrix(m)) => (
            ValueType::DoubleMatrix,
            Value::DoubleMatrix(m.into_iter().map(|row| row.into_iter().map(f64::from).collect()).collect()),
        ),
        (declared, value) => (value.value_type().unwrap_or_else(|| declared.clone()), value),
    }
}

impl Entity for MemoryFeature {
    fn tag(&self) -> String {
        self.tag.borrow().clone()
    }

    fn set_tag(&self, tag: &str) -> EngineResult<()> {
        if let Some(siblings) = self.siblings.upgrade() {
            let taken = siblings
                .borrow()
                .iter()
                .any(|item| !std::ptr::eq(Rc::as_ptr(item), self) && *item.tag.borrow() == tag);
            if taken {
                return Err(EngineError::DuplicateTag(tag.to_string()));
            }
        }
        *self.tag.borrow_mut() = tag.to_string();
        Ok(())
    }

    fn label(&self) -> String {
        self.label.borrow().clone()
    }

    fn set_label(&self, label: &str) -> EngineResult<()> {
        *self.label.borrow_mut() = label.to_string();
        Ok(())
    }

    fn entity_type(&self) -> EngineResult<String> {
        Ok(self.kind.clone())
    }

    fn comments(&self) -> EngineResult<String> {
        Ok(self.comments.borrow().clone())
    }

    fn set_comments(&self, text: &str) -> EngineResult<()> {
        *self.comments.borrow_mut() = text.to_string();
        Ok(())
    }

    fn features(&self) -> Option<ContainerRef> {
        self.features.clone().map(|sub| sub as ContainerRef)
    }

    fn properties(&self) -> EngineResult<Vec<String>> {
        Ok(self.properties.borrow().keys().cloned().collect())
    }

    fn value_type(&self, name: &str) -> EngineResult<String> {
        self.properties
            .borrow()
            .get(name)
            .map(|p| p.declared.to_string())
            .ok_or_else(|| EngineError::NoSuchProperty(name.to_string()))
    }

    fn get(&self, name: &str, as_type: &ValueType) -> EngineResult<Value> {
        let properties = self.properties.borrow();
        let property = properties
            .get(name)
            .ok_or_else(|| EngineError::NoSuchProperty(name.to_string()))?;
        if property.declared != *as_type {
            return Err(EngineError::Call(format!(
                "property \"{name}\" is of type {}, not {as_type}",
                property.declared
            )));
        }
        Ok(property.value.clone())
    }

    fn set(&self, name: &str, value: Value) -> EngineResult<()> {
        let value = match value {
            Value::List(items) => typed_list(items).ok_or_else(|| {
                EngineError::Call(format!("cannot store a mixed list in property \"{name}\""))
            })?,
            value => value,
        };
        let mut properties = self.properties.borrow_mut();
        let property = match properties.get(name) {
            Some(current) => {
                let (declared, value) = fit(&current.declared, value);
                Property { declared, value }
            }
            None => {
                let (declared, value) = fit(&ValueType::None, value);
                Property { declared, value }
            }
        };
        properties.insert(name.to_string(), property);
        Ok(())
    }

    fn is_active(&self) -> EngineResult<bool> {
        Ok(self.active.get())
    }

    fn set_active(&self, active: bool) -> EngineResult<()> {
        self.active.set(active);
        Ok(())
    }

    fn run(&self) -> EngineResult<()> {
        match self.group {
            Group::Geometries | Group::Meshes | Group::Batches | Group::Plots => {
                self.runs.set(self.runs.get() + 1);
                Ok(())
            }
            Group::Studies => {
                self.runs.set(self.runs.get() + 1);
                self.solve_study()
            }
            Group::Solutions => {
                self.compute();
                Ok(())
            }
            Group::Exports => self.write_export(),
            _ => Err(EngineError::Unsupported("run")),
        }
    }

    fn import_data(&self) -> EngineResult<()> {
        if !self.has_property("filename") {
            return Err(EngineError::Unsupported("import_data"));
        }
        let file = self.text("filename")?;
        let content = fs::read_to_string(&file)
            .map_err(|err| EngineError::Call(format!("cannot read \"{file}\": {err}")))?;
        let table = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('%'))
            .map(|line| {
                line.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|cell| !cell.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        self.properties.borrow_mut().insert(
            "table".to_string(),
            Property {
                declared: ValueType::StringMatrix,
                value: Value::StringMatrix(table),
            },
        );
        Ok(())
    }

    fn discard_data(&self) -> EngineResult<()> {
        if !self.has_property("filename") {
            return Err(EngineError::Unsupported("discard_data"));
        }
        self.properties.borrow_mut().shift_remove("table");
        Ok(())
    }

    fn is_empty(&self) -> EngineResult<bool> {
        self.require_group(&[Group::Solutions], "is_empty")?;
        Ok(!self.solution.borrow().as_ref().is_some_and(|data| data.computed))
    }

    fn clear(&self) -> EngineResult<()> {
        self.require_group(&[Group::Solutions, Group::Meshes], "clear")?;
        if let Some(data) = self.solution.borrow_mut().as_mut() {
            data.computed = false;
        }
        self.runs.set(0);
        Ok(())
    }

    fn evaluate(&self) -> EngineResult<EvalData> {
        if self.group != Group::Evaluations {
            return Err(EngineError::Unsupported("evaluate"));
        }
        let expressions = match self.value("expr")? {
            Value::String(expression) => vec![expression],
            Value::StringArray(expressions) => expressions,
            other => {
                return Err(EngineError::Call(format!(
                    "expressions must be strings, not {}",
                    other.kind()
                )))
            }
        };
        let outer = match self.value("outersolnum") {
            Ok(Value::Int(n)) if n >= 1 => n as usize - 1,
            Ok(other) => {
                return Err(EngineError::Call(format!("invalid outer solution number {other:?}")))
            }
            Err(_) => 0,
        };

        let solution = self.evaluated_solution()?;
        let stored = solution.solution.borrow();
        let Some(data) = stored.as_ref().filter(|data| data.computed) else {
            return Err(EngineError::Call("solution has not been computed".to_string()));
        };

        let mut results = Vec::with_capacity(expressions.len());
        for expression in &expressions {
            let result = data
                .results
                .get(expression.trim())
                .ok_or_else(|| EngineError::Call(format!("undefined expression \"{expression}\"")))?;
            if self.kind == "Global" && !result.global {
                return Err(EngineError::Call(format!(
                    "\"{expression}\" is not a global expression"
                )));
            }
            results.push(result);
        }
        let complex = results.iter().any(|result| result.imag.is_some());

        let mut shape: Option<(usize, usize)> = None;
        let mut real = Vec::new();
        let mut imag = Vec::new();
        for (expression, result) in expressions.iter().zip(&results) {
            let values = outer_slice(result, outer, false).ok_or_else(|| {
                EngineError::Call(format!("no outer solution {} for \"{expression}\"", outer + 1))
            })?;
            let selection = self.inner_selection(values.len())?;
            let points = values.first().map_or(0, Vec::len);
            match shape {
                None => shape = Some((selection.len(), points)),
                Some(known) if known != (selection.len(), points) => {
                    return Err(EngineError::Call(
                        "expressions differ in the number of solutions or points".to_string(),
                    ))
                }
                Some(_) => {}
            }
            let imaginary = outer_slice(result, outer, true);
            for &step in &selection {
                let row = &values[step];
                if row.len() != points {
                    return Err(EngineError::Call(format!("ragged results for \"{expression}\"")));
                }
                real.extend_from_slice(row);
                if complex {
                    match imaginary.and_then(|steps| steps.get(step)) {
                        Some(row) if row.len() == points => imag.extend_from_slice(row),
                        Some(_) => {
                            return Err(EngineError::Call(format!(
                                "imaginary part of \"{expression}\" differs in shape"
                            )))
                        }
                        None => imag.extend(std::iter::repeat(0.0).take(points)),
                    }
                }
            }
        }

        let (steps, points) = shape.unwrap_or((0, 0));
        let dims = vec![expressions.len(), steps, points];
        let shaped = |values: Vec<f64>| {
            NdArray::new(dims.clone(), values).map_err(|err| EngineError::Call(err.to_string()))
        };
        Ok(EvalData {
            real: shaped(real)?,
            imag: if complex { Some(shaped(imag)?) } else { None },
        })
    }

    fn inner_solutions(&self) -> EngineResult<(Vec<i32>, Vec<f64>)> {
        self.require_group(&[Group::Solutions], "inner_solutions")?;
        let values = self.solution.borrow().as_ref().map(|data| data.inner.clone()).unwrap_or_default();
        Ok((numbering(values.len()), values))
    }

    fn outer_solutions(&self) -> EngineResult<(Vec<i32>, Vec<f64>)> {
        self.require_group(&[Group::Solutions], "outer_solutions")?;
        let values = self.solution.borrow().as_ref().map(|data| data.outer.clone()).unwrap_or_default();
        Ok((numbering(values.len()), values))
    }

    fn selection(&self) -> EngineResult<SelectionRef> {
        let explicit = match self.group {
            Group::Selections => true,
            Group::Physics | Group::Materials => false,
            _ => return Err(EngineError::Unsupported("selection")),
        };
        Ok(Rc::new(MemorySelection::new(self.me.clone(), explicit)) as SelectionRef)
    }

    fn problems(&self) -> EngineResult<Vec<ProblemReport>> {
        Ok(self.problems.iter().map(ProblemReport::from).collect())
    }
}

/// The typed array or matrix an untyped list stands for, if its items agree.
fn typed_list(items: Vec<Value>) -> Option<Value> {
    if items.iter().all(|item| matches!(item, Value::String(_))) {
        return Some(Value::StringArray(
            items.into_iter().filter_map(|item| item.as_str().map(str::to_string)).collect(),
        ));
    }
    if items.iter().all(|item| matches!(item, Value::Boolean(_))) {
        return Some(Value::BooleanArray(
            items.iter().filter_map(|item| match item {
                Value::Boolean(b) => Some(*b),
                _ => None,
            }).collect(),
        ));
    }
    if items.iter().all(|item| matches!(item, Value::Int(_))) {
        return Some(Value::IntArray(
            items.iter().filter_map(|item| match item {
                Value::Int(i) => Some(*i),
                _ => None,
            }).collect(),
        ));
    }
    if items.iter().all(|item| matches!(item, Value::Int(_) | Value::Double(_))) {
        return Some(Value::DoubleArray(
            items.iter().filter_map(|item| match item {
                Value::Int(i) => Some(f64::from(*i)),
                Value::Double(x) => Some(*x),
                _ => None,
            }).collect(),
        ));
    }
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        match typed_list(match item {
            Value::List(cells) => cells,
            _ => return None,
        })? {
            Value::StringArray(row) => rows.push(row),
            _ => return None,
        }
    }
    Some(Value::StringMatrix(rows))
}

/// One-based solution numbers.
fn numbering(count: usize) -> Vec<i32> {
    (1..).take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(group: Group) -> Rc<MemoryContainer> {
        MemoryContainer::new(group, false, Weak::new())
    }

    #[test]
    fn test_create_labels_and_tags() {
        let functions = container(Group::Functions);
        let tag = functions.unique_tag("ste");
        assert_eq!(tag, "ste1");
        let step = functions.create(&tag, &[Value::String("Step".into())]).unwrap();
        assert_eq!(step.label(), "Step 1");
        assert_eq!(functions.unique_tag("ste"), "ste2");
        let second = functions.create("ste2", &[Value::String("Step".into())]).unwrap();
        assert_eq!(second.label(), "Step 2");

        assert_eq!(
            functions.create("ste1", &[]).err(),
            Some(EngineError::DuplicateTag("ste1".into()))
        );
        let bare = functions.create("tag1", &[]).unwrap();
        assert_eq!(bare.label(), "tag1");
        assert_eq!(functions.tags(), ["ste1", "ste2", "tag1"]);
    }

    #[test]
    fn test_remove_and_retag() {
        let functions = container(Group::Functions);
        let a = functions.create("a", &[]).unwrap();
        functions.create("b", &[]).unwrap();
        assert_eq!(a.set_tag("b"), Err(EngineError::DuplicateTag("b".into())));
        a.set_tag("c").unwrap();
        assert_eq!(functions.tags(), ["c", "b"]);
        functions.remove("c").unwrap();
        assert_eq!(functions.tags(), ["b"]);
        assert_eq!(functions.remove("c"), Err(EngineError::NoSuchTag("c".into())));
    }

    #[test]
    fn test_property_types() {
        let functions = container(Group::Functions);
        let step = functions.create("step1", &[]).unwrap();
        step.set("location", Value::Double(0.5)).unwrap();
        assert_eq!(step.value_type("location").unwrap(), "Double");
        step.set("location", Value::Int(1)).unwrap();
        assert_eq!(step.get("location", &ValueType::Double).unwrap(), Value::Double(1.0));
        assert!(matches!(step.get("location", &ValueType::Int), Err(EngineError::Call(_))));
        assert_eq!(
            step.get("missing", &ValueType::Int),
            Err(EngineError::NoSuchProperty("missing".into()))
        );
        step.set("names", Value::List(vec![Value::String("a".into())])).unwrap();
        assert_eq!(step.value_type("names").unwrap(), "StringArray");
        step.set("sizes", Value::List(vec![Value::Int(1), Value::Double(0.5)])).unwrap();
        assert_eq!(
            step.get("sizes", &ValueType::DoubleArray).unwrap(),
            Value::DoubleArray(vec![1.0, 0.5])
        );
        assert!(step.set("mixed", Value::List(vec![Value::Int(1), Value::String("a".into())])).is_err());
    }

    #[test]
    fn test_nesting() {
        let geometries = container(Group::Geometries);
        let geometry = geometries.create("geom1", &[]).unwrap();
        let features = geometry.features().unwrap();
        let block = features.create("blk1", &[Value::String("Block".into())]).unwrap();
        assert!(block.features().is_none());

        let functions = container(Group::Functions);
        assert!(functions.create("fn1", &[]).unwrap().features().is_none());
    }

    #[test]
    fn test_run_support() {
        let meshes = container(Group::Meshes);
        let mesh = meshes.create("mesh1", &[]).unwrap();
        mesh.run().unwrap();
        mesh.clear().unwrap();

        let functions = container(Group::Functions);
        let function = functions.create("fn1", &[]).unwrap();
        assert_eq!(function.run(), Err(EngineError::Unsupported("run")));
        assert_eq!(function.is_empty(), Err(EngineError::Unsupported("is_empty")));
    }

    #[test]
    fn test_clear_stored_data_only_on_plots() {
        assert!(container(Group::Plots).clear_stored_data().is_ok());
        assert!(container(Group::Meshes).clear_stored_data().is_err());
    }
}
