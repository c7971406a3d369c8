//! The refresh pipeline: join countries with exchange rates, derive the GDP
//! estimate and persist the result in one transaction.

pub mod derive;
pub mod refresh;
pub mod validate;

pub use derive::*;
pub use refresh::*;
pub use validate::*;
