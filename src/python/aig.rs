use std::fmt::{Display, Formatter};

use pyo3::prelude::*;

use crate::aig::{Aig, Valuation};

#[pyclass(name = "Aig", str)]
#[derive(Clone)]
pub struct PyAig {
    inner: Aig,
}

impl From<Aig> for PyAig {
    fn from(inner: Aig) -> Self {
        PyAig { inner }
    }
}

impl Display for PyAig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[pymethods]
impl PyAig {
    #[staticmethod]
    pub fn from_file(path: &str) -> eyre::Result<Self> {
        let aig = Aig::parse_file(path)?;
        Ok(aig.into())
    }

    #[staticmethod]
    pub fn parse(input: &str) -> eyre::Result<Self> {
        let aig = Aig::parse_str(input)?;
        Ok(aig.into())
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inner.inputs().map(String::from).collect()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.inner.outputs().map(String::from).collect()
    }

    pub fn latches(&self) -> Vec<String> {
        self.inner.latches().map(String::from).collect()
    }

    pub fn gates(&self) -> Vec<u32> {
        self.inner.and_gates().map(|gate| gate.id).collect()
    }

    pub fn children(&self, id: u32) -> Vec<u32> {
        let node = self.inner.node(id);
        node.children().iter().map(|r| r.raw()).collect()
    }

    pub fn is_input(&self, id: u32) -> bool {
        self.inner.is_input(id)
    }

    pub fn is_latch(&self, id: u32) -> bool {
        self.inner.is_latch(id)
    }

    pub fn is_gate(&self, id: u32) -> bool {
        self.inner.is_gate(id)
    }

    pub fn __contains__(&self, id: u32) -> bool {
        self.inner.contains(id)
    }

    pub fn layers_input(&self) -> Vec<Vec<u32>> {
        self.inner.layers_input().collect()
    }

    pub fn layers_output(&self) -> Vec<Vec<u32>> {
        self.inner.layers_output().collect()
    }

    pub fn to_cnf(&self) -> Vec<Vec<i32>> {
        self.inner.to_cnf().clauses
    }

    pub fn write(&self) -> eyre::Result<String> {
        self.inner.write_to_string()
    }

    pub fn write_file(&self, path: &str) -> eyre::Result<()> {
        self.inner.write_to_file(path)
    }

    #[pyo3(signature = (inputs, latches=None))]
    pub fn __call__(
        &self,
        inputs: Valuation,
        latches: Option<Valuation>,
    ) -> eyre::Result<(Valuation, Valuation)> {
        self.inner.eval(&inputs, latches.as_ref())
    }

    pub fn __rshift__(&self, other: PyRef<'_, PyAig>) -> eyre::Result<Self> {
        Ok(self.inner.seq(&other.inner)?.into())
    }

    pub fn __or__(&self, other: PyRef<'_, PyAig>) -> eyre::Result<Self> {
        Ok(self.inner.par(&other.inner)?.into())
    }
}
