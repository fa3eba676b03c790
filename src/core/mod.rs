pub mod report;
pub mod resolver;
pub mod service;
pub mod token;

pub use crate::domain::model::{Credentials, EvaluationYear, StudentEvaluation};
pub use crate::domain::ports::{Directory, EvaluationStore};
pub use crate::utils::error::Result;
