pub mod estimator;
pub mod etl;
pub mod grouping;
pub mod pipeline;
pub mod reader;
pub mod rounding;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
