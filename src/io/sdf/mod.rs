mod reader;

pub use reader::{SdfReader, SdfRecord};
