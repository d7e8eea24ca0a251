//! Convenient re-exports of commonly used types from docquery.
//!
//! ```ignore
//! use docquery::prelude::*;
//! ```
//!
//! The builder traits ([`FilterBuilder`], [`UpdateBuilder`], [`StageBuilder`]) must be in scope
//! for their chained methods to resolve, so importing the prelude is the usual way in.

pub use bson::{Bson, Document, doc};

pub use docquery_core::{
    aggregate::Aggregate,
    backend::{Backend, BackendBuilder, DeleteSummary, UpdateSummary},
    collection::{Collection, ID_FIELD},
    database::Database,
    entity::{Entity, EntityExt},
    error::{DocQueryError, DocQueryResult},
    filter::{FieldOp, Filter, FilterBuilder, Term},
    output::{MultipleOutput, QueryOutput, SingleOutput},
    page::{Page, PageRequest},
    pipeline::{Pipeline, Stage, StageBuilder},
    query::Query,
    sort::{Sort, SortDirection},
    update::{Update, UpdateBuilder, UpdateOp},
};
