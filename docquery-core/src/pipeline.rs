//! Aggregation pipeline construction.
//!
//! Stages compile one-to-one into native pipeline stages and run in insertion order, so
//! `match_filter` before `lookup` filters the local side before the join.

use bson::Document;

use crate::{
    compile,
    filter::Filter,
    sort::{Sort, SortDirection},
};

/// One aggregation pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// `$match` on a conjunctive filter.
    Match(Filter),
    /// `$sort` on a single key.
    Sort(Sort),
    /// `$limit`.
    Limit(u64),
    /// `$skip`.
    Skip(u64),
    /// `$lookup` equality join against another collection of the same database.
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// `$unwind` of an array field.
    Unwind(String),
}

/// Ordered list of pipeline stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    /// Returns the stages in insertion order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Compiles the stages into pipeline documents.
    pub fn to_documents(&self) -> Vec<Document> {
        compile::render_pipeline(&self.stages)
    }
}

/// Chainable stage vocabulary shared by every value that accumulates pipeline stages.
pub trait StageBuilder: Sized {
    /// Appends a stage.
    fn with_stage(self, stage: Stage) -> Self;

    /// Appends a `$match` stage for `filter`.
    fn match_filter(self, filter: Filter) -> Self {
        self.with_stage(Stage::Match(filter))
    }

    /// Appends a `$sort` stage on one key.
    fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.with_stage(Stage::Sort(Sort::new(field, direction)))
    }

    /// Appends a `$limit` stage.
    fn limit(self, limit: u64) -> Self {
        self.with_stage(Stage::Limit(limit))
    }

    /// Appends a `$skip` stage.
    fn offset(self, offset: u64) -> Self {
        self.with_stage(Stage::Skip(offset))
    }

    /// Appends a `$lookup` stage joining `from` where `local_field == foreign_field`, storing the
    /// matches as an array under `as_field`.
    fn lookup(
        self,
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        self.with_stage(Stage::Lookup {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        })
    }

    /// Appends an `$unwind` stage for the array `field`. A leading `$` is optional.
    fn unwind(self, field: impl Into<String>) -> Self {
        self.with_stage(Stage::Unwind(field.into()))
    }
}

impl StageBuilder for Pipeline {
    fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterBuilder;
    use bson::doc;

    #[test]
    fn stages_compile_in_chain_order() {
        let pipeline = Pipeline::new()
            .match_filter(Filter::new().eq("name", "Trevor"))
            .lookup("cars", "car_id", "_id", "cars")
            .unwind("cars")
            .sort("age", SortDirection::Desc)
            .offset(5)
            .limit(10);

        assert_eq!(
            pipeline.to_documents(),
            vec![
                doc! { "$match": { "$and": [{ "name": { "$eq": "Trevor" } }] } },
                doc! {
                    "$lookup": {
                        "from": "cars",
                        "localField": "car_id",
                        "foreignField": "_id",
                        "as": "cars",
                    }
                },
                doc! { "$unwind": "$cars" },
                doc! { "$sort": { "age": -1 } },
                doc! { "$skip": 5_i64 },
                doc! { "$limit": 10_i64 },
            ]
        );
    }

    #[test]
    fn empty_match_matches_everything() {
        let pipeline = Pipeline::new().match_filter(Filter::new());

        assert_eq!(pipeline.to_documents(), vec![doc! { "$match": {} }]);
    }

    #[test]
    fn unwind_keeps_an_explicit_prefix() {
        let pipeline = Pipeline::new().unwind("$items");

        assert_eq!(pipeline.to_documents(), vec![doc! { "$unwind": "$items" }]);
    }
}
