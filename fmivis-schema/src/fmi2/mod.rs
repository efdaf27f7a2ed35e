//! FMI 2.0 model description for Model Exchange and Co-Simulation units.

mod interface_type;
mod model_description;
mod scalar_variable;

pub use interface_type::*;
pub use model_description::*;
pub use scalar_variable::*;
