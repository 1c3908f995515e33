pub mod client;
pub mod factory;

pub use factory::{FactoryError, TransactionFactory};
