//! Core module containing the fundamental traits and types of the admin

pub mod error;
pub mod model;
pub mod pagination;
pub mod query;
pub mod querydict;
pub mod request;
pub mod response;
pub mod source;

pub use error::{ConfigError, RequestError, StarkError, StorageError};
pub use model::{Choice, FieldKind, FieldMeta, Model, ModelMeta};
pub use pagination::{PageLink, Pagination};
pub use query::{Condition, Lookup, LookupOp, OrderBy, QuerySet};
pub use querydict::QueryDict;
pub use request::{Method, RequestContext};
pub use response::{StarkResponse, TEMPLATE_HEADER};
pub use source::{DataSource, RelatedItem, RelatedSource, SourceRegistry};
