//! Command implementations
//!
//! One module per command family, mirroring the `Commands` enum in `cli`.

mod budget;
mod classify;
mod core;
mod forecast;
mod goals;
mod persona;
mod recurring;
mod transactions;

pub use budget::*;
pub use classify::*;
pub use core::*;
pub use forecast::*;
pub use goals::*;
pub use persona::*;
pub use recurring::*;
pub use transactions::*;
