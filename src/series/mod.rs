//! Pure series transforms between the fetch layer and the theme builders.
//!
//! - raw records -> display series (`normalize`)
//! - several series -> one record stream on a shared date axis (`align`)
//! - per-group series -> per-category sums and shares (`aggregate`)

pub mod aggregate;
pub mod align;
pub mod normalize;

pub use aggregate::*;
pub use align::*;
pub use normalize::*;
