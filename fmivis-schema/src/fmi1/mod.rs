//! FMI 1.0 model description for Model Exchange (and the `Implementation` element that marks a
//! Co-Simulation unit).

mod model_description;
mod scalar_variable;

pub use model_description::*;
pub use scalar_variable::*;
