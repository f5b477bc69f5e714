mod set;
mod typed;

pub use set::{SetEntry, SetRepository};
pub use typed::{DocumentRepository, TypedRepository};
