use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use pyo3::exceptions::{PyNotImplementedError, PyValueError};
use pyo3::prelude::*;
use pyo3::pyclass::CompareOp;
use pyo3::types::PySlice;

use super::aig::PyAig;
use crate::bundle::encode_int;
use crate::expr::{self, BvExpr, Operand, Val};

#[pyclass(name = "BvExpr", str)]
#[derive(Clone)]
pub struct PyBvExpr {
    inner: BvExpr,
}

impl From<BvExpr> for PyBvExpr {
    fn from(inner: BvExpr) -> Self {
        PyBvExpr { inner }
    }
}

impl Display for PyBvExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[derive(FromPyObject)]
pub enum PyOperand {
    Expr(PyBvExpr),
    Int(i64),
}

impl From<PyOperand> for Operand {
    fn from(operand: PyOperand) -> Self {
        match operand {
            PyOperand::Expr(e) => Operand::Expr(e.inner),
            PyOperand::Int(value) => Operand::Int(value),
        }
    }
}

#[derive(FromPyObject)]
pub enum PyVal {
    Name(String),
    Int(i64),
}

#[derive(FromPyObject)]
pub enum PyIndex<'py> {
    Int(usize),
    Slice(Bound<'py, PySlice>),
}

/// Atom of `wordlen` bits reading an input word, a constant or (with `None`) a fresh input.
#[pyfunction]
#[pyo3(signature = (wordlen, val=None, signed=true))]
pub fn atom(wordlen: usize, val: Option<PyVal>, signed: bool) -> eyre::Result<PyBvExpr> {
    let val = match val {
        None => Val::Fresh,
        Some(PyVal::Name(name)) => Val::Name(name),
        Some(PyVal::Int(value)) => {
            encode_int(wordlen, value, signed)?;
            Val::Int(value)
        }
    };
    Ok(expr::atom(wordlen, val, signed).into())
}

#[pyfunction]
pub fn ite(test: PyBvExpr, then: PyBvExpr, other: PyBvExpr) -> PyResult<PyBvExpr> {
    if test.inner.size() != 1 {
        return Err(PyValueError::new_err("Condition of ite must be a single bit"));
    }
    if then.inner.size() != other.inner.size() {
        return Err(PyValueError::new_err("Branches of ite differ in size"));
    }
    Ok(expr::ite(&test.inner, &then.inner, &other.inner).into())
}

impl PyBvExpr {
    fn check_size(&self, other: &PyOperand) -> PyResult<()> {
        match other {
            PyOperand::Expr(e) if e.inner.size() != self.inner.size() => Err(PyValueError::new_err(
                format!("Operands differ in size: {} and {}", self.inner.size(), e.inner.size()),
            )),
            _ => Ok(()),
        }
    }
}

#[pymethods]
impl PyBvExpr {
    #[getter]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    #[getter]
    pub fn output(&self) -> String {
        self.inner.output().to_owned()
    }

    #[getter]
    pub fn inputs(&self) -> Vec<String> {
        self.inner.inputs().map(String::from).collect()
    }

    #[getter]
    pub fn signed(&self) -> bool {
        self.inner.is_signed()
    }

    #[getter]
    pub fn aig(&self) -> PyAig {
        self.inner.aig().clone().into()
    }

    #[pyo3(signature = (inputs=HashMap::new()))]
    pub fn __call__(&self, inputs: HashMap<String, i64>) -> eyre::Result<i64> {
        self.inner
            .eval_int(inputs.iter().map(|(name, &value)| (name.as_str(), value)))
    }

    pub fn __getitem__(&self, index: PyIndex<'_>) -> PyResult<Self> {
        let size = self.inner.size();
        let range = match index {
            PyIndex::Int(i) => i..i + 1,
            PyIndex::Slice(slice) => {
                let indices = slice.indices(size as isize)?;
                if indices.step != 1 {
                    return Err(PyNotImplementedError::new_err("Slice steps are not supported"));
                }
                indices.start as usize..indices.stop as usize
            }
        };
        if range.start >= range.end || range.end > size {
            return Err(PyValueError::new_err(format!(
                "Invalid slice {:?} of a {}-bit word",
                range, size
            )));
        }
        Ok(self.inner.slice(range).into())
    }

    pub fn concat(&self, other: PyRef<'_, PyBvExpr>) -> Self {
        self.inner.concat(&other.inner).into()
    }

    pub fn repeat(&self, times: usize) -> PyResult<Self> {
        if times == 0 {
            return Err(PyValueError::new_err("Can not repeat a word zero times"));
        }
        Ok(self.inner.repeat(times).into())
    }

    pub fn with_output(&self, name: &str) -> Self {
        self.inner.with_output(name).into()
    }

    pub fn __invert__(&self) -> Self {
        (!&self.inner).into()
    }

    pub fn __neg__(&self) -> Self {
        (-&self.inner).into()
    }

    pub fn __abs__(&self) -> Self {
        self.inner.abs().into()
    }

    pub fn __lshift__(&self, shift: usize) -> Self {
        (&self.inner << shift).into()
    }

    pub fn __rshift__(&self, shift: usize) -> Self {
        (&self.inner >> shift).into()
    }

    pub fn __add__(&self, other: PyOperand) -> PyResult<Self> {
        self.check_size(&other)?;
        Ok((&self.inner + Operand::from(other)).into())
    }

    pub fn __sub__(&self, other: PyOperand) -> PyResult<Self> {
        self.check_size(&other)?;
        Ok((&self.inner - Operand::from(other)).into())
    }

    pub fn __and__(&self, other: PyOperand) -> PyResult<Self> {
        self.check_size(&other)?;
        Ok((&self.inner & Operand::from(other)).into())
    }

    pub fn __or__(&self, other: PyOperand) -> PyResult<Self> {
        self.check_size(&other)?;
        Ok((&self.inner | Operand::from(other)).into())
    }

    pub fn __xor__(&self, other: PyOperand) -> PyResult<Self> {
        self.check_size(&other)?;
        Ok((&self.inner ^ Operand::from(other)).into())
    }

    pub fn __matmul__(&self, other: PyOperand) -> PyResult<Self> {
        self.check_size(&other)?;
        Ok(self.inner.dot(Operand::from(other)).into())
    }

    pub fn __richcmp__(&self, other: PyOperand, op: CompareOp) -> PyResult<Self> {
        self.check_size(&other)?;
        let other = Operand::from(other);
        let result = match op {
            CompareOp::Lt => self.inner.lt(other),
            CompareOp::Le => self.inner.le(other),
            CompareOp::Eq => self.inner.eq(other),
            CompareOp::Ne => self.inner.ne(other),
            CompareOp::Gt => self.inner.gt(other),
            CompareOp::Ge => self.inner.ge(other),
        };
        Ok(result.into())
    }
}
