//! Catalyst Core: list query pipeline, error taxonomy and console domain models.

pub mod error;
pub mod model;
pub mod query;

pub use error::{ApiError, ApiResult, ErrorEnvelope, OrInternal};
pub use query::{
    ListEnvelope, ListRequest, MetaData, PageResult, Predicate, QueryDescriptor, RawListRequest,
    ResourceSchema,
};
