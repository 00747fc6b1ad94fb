pub mod aggregates;
pub mod models;
pub mod money;
pub mod validation;

pub use money::Amount;
pub use validation::{FieldError, Validate, ValidationErrors};
