//! HTTP handlers

pub mod category;
pub mod count;
pub mod dashboard;
pub mod health;
pub mod item;
pub mod order;
pub mod receiving;

pub use category::*;
pub use count::*;
pub use dashboard::*;
pub use health::*;
pub use item::*;
pub use order::*;
pub use receiving::*;
