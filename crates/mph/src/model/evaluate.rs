//! Solution indices and evaluation of results.

use log::{debug, error, info};
use mph_node_path::Group;
use num_complex::Complex64;

use super::{Model, Reference};
use crate::engine::EvalData;
use crate::error::Error;
use crate::host::{HostValue, NdArray};
use crate::node::Node;

/// Selection of inner solutions, such as time steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inner {
    First,
    Last,
    /// One-based solution indices.
    Indices(Vec<usize>),
}

/// Where and how to evaluate.
#[derive(Debug, Clone, Default)]
pub struct EvalOptions<'a, 'm> {
    /// Dataset to evaluate on. The model's default dataset if not given.
    pub dataset: Option<Reference<'a, 'm>>,
    pub inner: Option<Inner>,
    /// One-based index of the outer solution, in parametric sweeps.
    pub outer: Option<i32>,
}

/// Evaluation results before they are split per expression.
enum Numbers {
    Real(NdArray<f64>),
    Complex(NdArray<Complex64>),
}

impl Numbers {
    fn from_data(data: EvalData) -> Result<Self, Error> {
        match data.imag {
            None => Ok(Numbers::Real(data.real)),
            Some(imag) => {
                if imag.shape() != data.real.shape() {
                    return Err(Error::Runtime(
                        "real and imaginary parts of evaluation differ in shape".to_string(),
                    ));
                }
                let shape = data.real.shape().to_vec();
                let values = data
                    .real
                    .into_data()
                    .into_iter()
                    .zip(imag.into_data())
                    .map(|(re, im)| Complex64::new(re, im))
                    .collect();
                Ok(Numbers::Complex(NdArray::new(shape, values)?))
            }
        }
    }

    fn shape(&self) -> &[usize] {
        match self {
            Numbers::Real(a) => a.shape(),
            Numbers::Complex(a) => a.shape(),
        }
    }

    fn select(&self, axis: usize, indices: &[usize]) -> Result<Self, Error> {
        Ok(match self {
            Numbers::Real(a) => Numbers::Real(a.select(axis, indices)?),
            Numbers::Complex(a) => Numbers::Complex(a.select(axis, indices)?),
        })
    }

    fn index_axis(&self, axis: usize, index: usize) -> Result<Self, Error> {
        Ok(match self {
            Numbers::Real(a) => Numbers::Real(a.index_axis(axis, index)?),
            Numbers::Complex(a) => Numbers::Complex(a.index_axis(axis, index)?),
        })
    }

    /// Squeezed host value. Zero-dimensional results become scalars.
    fn into_host(self) -> HostValue {
        match self {
            Numbers::Real(a) => {
                let a = a.squeeze();
                match (a.ndim(), a.data().first()) {
                    (0, Some(&x)) => HostValue::Float(x),
                    _ => HostValue::FloatArray(a),
                }
            }
            Numbers::Complex(a) => {
                let a = a.squeeze();
                match (a.ndim(), a.data().first()) {
                    (0, Some(&z)) => HostValue::Complex(z),
                    _ => HostValue::ComplexArray(a),
                }
            }
        }
    }
}

impl Model {
    /// Indices and values of the inner solutions of a dataset, such as the
    /// time steps of a time-dependent study.
    pub fn inner(&self, dataset: Option<Reference<'_, '_>>) -> Result<(Vec<i32>, Vec<f64>), Error> {
        let dataset = self.dataset(dataset)?;
        let solution = self.solution_of(&dataset)?;
        Ok(solution.feature("read solutions of")?.inner_solutions()?)
    }

    /// Indices and values of the outer solutions of a dataset, such as the
    /// steps of a parametric sweep.
    pub fn outer(&self, dataset: Option<Reference<'_, '_>>) -> Result<(Vec<i32>, Vec<f64>), Error> {
        let dataset = self.dataset(dataset)?;
        let solution = self.solution_of(&dataset)?;
        Ok(solution.feature("read solutions of")?.outer_solutions()?)
    }

    /// Evaluate one expression.
    ///
    /// A global evaluation is tried first. If that fails, the expression is
    /// evaluated as a field, or as particle data on particle datasets.
    /// Singleton dimensions are squeezed out of the result.
    pub fn evaluate(
        &self,
        expression: &str,
        unit: Option<&str>,
        options: &EvalOptions<'_, '_>,
    ) -> Result<HostValue, Error> {
        let units = unit.map(HostValue::from);
        let mut results = self.evaluate_all(HostValue::from(expression), units, 1, options)?;
        results
            .pop()
            .ok_or_else(|| Error::Runtime("evaluation returned no results".to_string()))
    }

    /// Evaluate several expressions at once, one result per expression.
    pub fn evaluate_many(
        &self,
        expressions: &[&str],
        units: Option<&[&str]>,
        options: &EvalOptions<'_, '_>,
    ) -> Result<Vec<HostValue>, Error> {
        if let Some(units) = units {
            if units.len() != expressions.len() {
                let message = format!(
                    "got {} units for {} expressions",
                    units.len(),
                    expressions.len()
                );
                error!("{message}");
                return Err(Error::InvalidArgument(message));
            }
        }
        self.evaluate_all(
            HostValue::from(expressions.to_vec()),
            units.map(|u| HostValue::from(u.to_vec())),
            expressions.len(),
            options,
        )
    }

    fn evaluate_all(
        &self,
        expression: HostValue,
        unit: Option<HostValue>,
        count: usize,
        options: &EvalOptions<'_, '_>,
    ) -> Result<Vec<HostValue>, Error> {
        if let Some(Inner::Indices(indices)) = &options.inner {
            if indices.contains(&0) {
                let message = "inner solution indices start at 1".to_string();
                error!("{message}");
                return Err(Error::InvalidArgument(message));
            }
        }
        let dataset = self.dataset(options.dataset)?;
        info!("Evaluating {} on dataset \"{}\".", describe(&expression), dataset.name());

        let solution = self.solution_of(&dataset)?;
        if solution.feature("evaluate")?.is_empty()? {
            let message = "the solution has not been computed".to_string();
            error!("{message}");
            return Err(Error::Runtime(message));
        }

        let setup = Setup {
            expression: &expression,
            unit: unit.as_ref(),
            dataset: &dataset,
            outer: options.outer,
        };

        debug!("Trying global evaluation.");
        let global = self
            .run_evaluation("Global", &setup, |_| Ok(()))
            .and_then(|data| select_inner(Numbers::from_data(data)?, options.inner.as_ref()))
            .and_then(|numbers| split(numbers, count));
        match global {
            Ok(values) => {
                info!("Finished global evaluation.");
                return Ok(values);
            }
            Err(err) => debug!("Global evaluation failed, moving on: {err}"),
        }

        let particles = dataset.entity_type()?.as_deref() == Some("Particle");
        info!("Retrieving data.");
        let numbers = if particles {
            let data = self.run_evaluation("EvalPoint", &setup, |eval| match &options.inner {
                None => Ok(()),
                Some(Inner::First) => eval.set_property("innerinput", "first"),
                Some(Inner::Last) => eval.set_property("innerinput", "last"),
                Some(Inner::Indices(indices)) => {
                    eval.set_property("innerinput", "manual")?;
                    let indices = indices.iter().map(|&i| i as i64).collect::<Vec<_>>();
                    eval.set_property("solnum", indices)
                }
            })?;
            Numbers::from_data(data)?
        } else {
            let data = self.run_evaluation("Eval", &setup, |_| Ok(()))?;
            select_inner(Numbers::from_data(data)?, options.inner.as_ref())?
        };
        info!("Finished retrieving data.");
        split(numbers, count)
    }

    /// Create a temporary evaluation feature, evaluate, and remove it again
    /// whatever the outcome.
    fn run_evaluation(
        &self,
        kind: &str,
        setup: &Setup<'_, '_>,
        extra: impl Fn(&Node<'_>) -> Result<(), Error>,
    ) -> Result<EvalData, Error> {
        let eval = Node::new(self, Group::Evaluations).create(&[HostValue::from(kind)], None)?;
        let outcome = setup
            .apply(&eval)
            .and_then(|()| extra(&eval))
            .and_then(|()| Ok(eval.feature("evaluate")?.evaluate()?));
        eval.remove()?;
        outcome
    }

    /// Dataset given by reference, or the model's default one.
    fn dataset(&self, reference: Option<Reference<'_, '_>>) -> Result<Node<'_>, Error> {
        match reference {
            Some(reference) => self.member(Group::Datasets, reference, "dataset"),
            None => self.default_dataset(),
        }
    }

    /// The dataset a new evaluation feature refers to when not told otherwise.
    fn default_dataset(&self) -> Result<Node<'_>, Error> {
        let eval = Node::new(self, Group::Evaluations).create(&[HostValue::from("Eval")], None)?;
        let tag = eval.property("data");
        eval.remove()?;
        if let HostValue::Str(tag) = tag? {
            for dataset in Node::new(self, Group::Datasets).children()? {
                if dataset.tag()?.as_deref() == Some(tag.as_str()) {
                    return Ok(dataset);
                }
            }
        }
        let message = "could not determine default dataset".to_string();
        error!("{message}");
        Err(Error::Runtime(message))
    }

    /// The solution a dataset refers to.
    fn solution_of<'s>(&'s self, dataset: &Node<'_>) -> Result<Node<'s>, Error> {
        let properties = dataset.properties()?;
        let tag = if properties.iter().any(|p| p == "solution") {
            dataset.property("solution")?
        } else if properties.iter().any(|p| p == "data") {
            dataset.property("data")?
        } else {
            HostValue::None
        };
        if let HostValue::Str(tag) = tag {
            for solution in Node::new(self, Group::Solutions).children()? {
                if solution.tag()?.as_deref() == Some(tag.as_str()) {
                    return Ok(solution);
                }
            }
        }
        let message = format!("dataset \"{}\" does not refer to a solution", dataset.name());
        error!("{message}");
        Err(Error::Runtime(message))
    }
}

/// Properties shared by all evaluation features.
struct Setup<'v, 'm> {
    expression: &'v HostValue,
    unit: Option<&'v HostValue>,
    dataset: &'v Node<'m>,
    outer: Option<i32>,
}

impl Setup<'_, '_> {
    fn apply(&self, eval: &Node<'_>) -> Result<(), Error> {
        eval.set_property("expr", self.expression.clone())?;
        if let Some(unit) = self.unit {
            eval.set_property("unit", unit.clone())?;
        }
        eval.set_property("data", self.dataset.as_argument()?)?;
        if let Some(outer) = self.outer {
            eval.set_property("outersolnum", outer)?;
        }
        Ok(())
    }
}

fn describe(expression: &HostValue) -> String {
    match expression {
        HostValue::Str(s) => format!("\"{s}\""),
        other => other.to_json().to_string(),
    }
}

/// Apply an inner selection to results shaped (expression, inner, point).
fn select_inner(numbers: Numbers, inner: Option<&Inner>) -> Result<Numbers, Error> {
    let Some(inner) = inner else {
        return Ok(numbers);
    };
    let steps = match numbers.shape().get(1) {
        Some(&n) if n > 0 => n,
        _ => {
            return Err(Error::Runtime(
                "evaluation returned no inner solutions to select from".to_string(),
            ))
        }
    };
    match inner {
        Inner::First => numbers.index_axis(1, 0),
        Inner::Last => numbers.index_axis(1, steps - 1),
        Inner::Indices(indices) => {
            let zero_based = indices.iter().map(|i| i - 1).collect::<Vec<_>>();
            numbers.select(1, &zero_based)
        }
    }
}

/// One squeezed result per expression.
fn split(numbers: Numbers, count: usize) -> Result<Vec<HostValue>, Error> {
    if numbers.shape().first() != Some(&count) {
        return Err(Error::Runtime(format!(
            "evaluation returned shape {:?} for {count} expressions",
            numbers.shape()
        )));
    }
    (0..count)
        .map(|i| -> Result<HostValue, Error> { Ok(numbers.index_axis(0, i)?.into_host()) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> Numbers {
        // (1 expression, 3 inner, 2 points)
        Numbers::Real(NdArray::new(vec![1, 3, 2], vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0]).unwrap())
    }

    fn real(values: HostValue) -> Vec<f64> {
        match values {
            HostValue::FloatArray(a) => a.into_data(),
            HostValue::Float(x) => vec![x],
            other => panic!("expected floats, got {other:?}"),
        }
    }

    #[test]
    fn test_select_inner() {
        let first = split(select_inner(cube(), Some(&Inner::First)).unwrap(), 1).unwrap();
        assert_eq!(real(first[0].clone()), vec![0.0, 1.0]);

        let last = split(select_inner(cube(), Some(&Inner::Last)).unwrap(), 1).unwrap();
        assert_eq!(real(last[0].clone()), vec![20.0, 21.0]);

        let some = select_inner(cube(), Some(&Inner::Indices(vec![3, 1]))).unwrap();
        assert_eq!(some.shape(), [1, 2, 2]);
        let some = split(some, 1).unwrap();
        assert_eq!(real(some[0].clone()), vec![20.0, 21.0, 0.0, 1.0]);

        assert!(select_inner(cube(), Some(&Inner::Indices(vec![4]))).is_err());
    }

    #[test]
    fn test_split_squeezes_to_scalar() {
        let numbers = Numbers::Real(NdArray::new(vec![2, 1, 1], vec![1.5, 2.5]).unwrap());
        let results = split(numbers, 2).unwrap();
        assert_eq!(results, vec![HostValue::Float(1.5), HostValue::Float(2.5)]);
    }

    #[test]
    fn test_split_checks_expression_count() {
        assert!(split(cube(), 2).is_err());
    }

    #[test]
    fn test_complex_numbers() {
        let data = EvalData {
            real: NdArray::new(vec![1, 1, 1], vec![1.0]).unwrap(),
            imag: Some(NdArray::new(vec![1, 1, 1], vec![-1.0]).unwrap()),
        };
        let results = split(Numbers::from_data(data).unwrap(), 1).unwrap();
        assert_eq!(results, vec![HostValue::Complex(Complex64::new(1.0, -1.0))]);
    }
}
