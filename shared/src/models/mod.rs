//! Domain models for the café inventory

mod category;
mod count;
mod item;
mod order;
mod receipt;

pub use category::*;
pub use count::*;
pub use item::*;
pub use order::*;
pub use receipt::*;
