//! Domain rules: lifecycle derivation, tenure arithmetic and document extraction.

pub mod extract;
pub mod lifecycle;
pub mod tenure;

pub use lifecycle::{Clock, Lifecycle, EXPIRING_SOON_DAYS};
pub use tenure::{Tenure, TenureUnit};
