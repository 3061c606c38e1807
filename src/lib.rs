// src/lib.rs

pub mod core;
pub mod corpus;
pub mod distance;
pub mod error;
pub mod frontend;
pub mod persistence;

pub use crate::core::engine::{Encoding, MarkovEncoder};
pub use crate::core::matrix::TransitionMatrix;
pub use crate::core::tables::IndexTables;
pub use crate::error::{EncodeError, Result};
