pub mod bundle;
pub mod data_set;
pub mod engine;
pub mod matchers;
pub mod report;
pub mod validator;

pub use crate::domain::model::{Attribute, AttributeType, BaseType};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
