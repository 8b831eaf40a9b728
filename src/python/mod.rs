use pyo3::prelude::*;

mod aig;
mod expr;

#[pymodule]
pub fn aiger_bv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    m.add_class::<aig::PyAig>()?;
    m.add_class::<expr::PyBvExpr>()?;
    m.add_function(wrap_pyfunction!(expr::atom, m)?)?;
    m.add_function(wrap_pyfunction!(expr::ite, m)?)?;
    Ok(())
}
