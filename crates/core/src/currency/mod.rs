//! Currency amounts: decimal text to integer minor units and back.

pub mod minor_units;

#[cfg(test)]
mod props;

pub use minor_units::{AmountError, MAX_EXPONENT, from_minor_units, to_minor_units};
