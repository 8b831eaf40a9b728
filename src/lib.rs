pub mod aig;
pub mod aigbv;
pub mod bundle;
pub mod cnf;
pub mod expr;
pub mod gates;
pub mod node;
pub mod parse;
pub mod reference;
pub mod write;

pub(crate) mod toposort;

#[cfg(feature = "python")]
mod python;
