mod helpers;
mod minor_units;
mod secret;

pub mod op;

pub use helpers::parse_boolean_flag;
pub use minor_units::{major_units, MinorUnits, MinorUnitsConversionError, DEFAULT_CURRENCY_CODE, MINOR_UNITS_PER_MAJOR};
pub use secret::Secret;
