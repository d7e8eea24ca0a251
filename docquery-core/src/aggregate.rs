//! Collection-bound aggregation.

use tracing::debug;

use crate::{
    backend::Backend,
    collection::Collection,
    output::{MultipleOutput, QueryOutput},
    pipeline::{Pipeline, Stage, StageBuilder},
};

/// An aggregation pipeline bound to the collection it runs against.
///
/// ```ignore
/// let owners: Vec<Owner> = people
///     .aggregate()
///     .match_filter(Filter::new().gte("age", 18))
///     .lookup("cars", "car_id", "_id", "cars")
///     .unwind("cars")
///     .exec()
///     .await
///     .consume()
///     .await?;
/// ```
#[derive(Debug)]
pub struct Aggregate<'a, B: Backend> {
    collection: Collection<'a, B>,
    pipeline: Pipeline,
}

impl<'a, B: Backend> Clone for Aggregate<'a, B> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<'a, B: Backend> Aggregate<'a, B> {
    pub(crate) fn new(collection: Collection<'a, B>, pipeline: Pipeline) -> Self {
        Self { collection, pipeline }
    }

    /// Returns the accumulated pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Runs the pipeline. Aggregation output is always a multiple output, even when it can hold at
    /// most one document.
    pub async fn exec(&self) -> QueryOutput {
        let pipeline = self.pipeline.to_documents();

        debug!(collection = %self.collection.name(), ?pipeline, "aggregate");

        MultipleOutput::new(
            self.collection
                .backend()
                .aggregate(self.collection.name(), pipeline)
                .await,
        )
        .into()
    }
}

impl<'a, B: Backend> StageBuilder for Aggregate<'a, B> {
    fn with_stage(mut self, stage: Stage) -> Self {
        self.pipeline = self.pipeline.with_stage(stage);
        self
    }
}
