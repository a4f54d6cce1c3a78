//! # Stark
//!
//! A generic CRUD admin for web applications. Register a model with a data
//! source and the site serves list, add, change and delete views for it.
//!
//! ## Features
//!
//! - **Declarative handlers**: columns, search fields, facets, ordering, bulk
//!   actions and page size in one [`HandlerConfig`](handler::HandlerConfig)
//! - **Faceted filtering**: enumerated and relation fields rendered as toggle
//!   links, single or multi-select
//! - **State round trips**: the list's query string travels in `_filter`
//!   through add, change and delete and is restored afterwards
//! - **Named routes**: every view has a stable name that can be reversed into
//!   a path
//! - **Storage-agnostic**: views talk to a [`DataSource`](core::DataSource);
//!   an in-memory source is included
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stark::prelude::*;
//!
//! let hosts = InMemorySource::<Host>::new();
//! let mut site = StarkSite::new();
//! site.register_handler(
//!     StarkHandler::new(
//!         hosts,
//!         HandlerConfig::new()
//!             .list_display([Column::from("name"), "ip".into(), display_edit(), display_del()])
//!             .search_list(["name__contains"])
//!             .action_list([BulkAction::multi_delete()]),
//!     ),
//!     None,
//! )?;
//!
//! // GET /stark/app/host/list/?q=web&page=1
//! site.serve("127.0.0.1:8000").await?;
//! ```

pub mod config;
pub mod core;
pub mod forms;
pub mod handler;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        Choice, Condition, ConfigError, DataSource, FieldKind, FieldMeta, Method, Model,
        ModelMeta, OrderBy, Pagination, QueryDict, QuerySet, RequestContext, RequestError,
        StarkError, StarkResponse, StorageError,
    };

    // === Configuration ===
    pub use crate::config::SiteConfig;

    // === Forms ===
    pub use crate::forms::{ModelFormSpec, StarkModelForm, filters, validators};

    // === Handlers ===
    pub use crate::handler::{
        Action, BulkAction, Column, DefaultHooks, FacetItem, FacetOption, FacetRow, HandlerConfig,
        HandlerHooks, StarkHandler, display_check, display_del, display_edit, get_choice_text,
    };

    // === Server ===
    pub use crate::server::{Route, RouteArgs, RouteGroup, SiteUrls, StarkSite};

    // === Storage ===
    pub use crate::storage::InMemorySource;

    // === Common external dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
