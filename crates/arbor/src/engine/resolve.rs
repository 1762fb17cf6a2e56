use super::{
    lower, materialize, select,
    tail::{self, Children, Tail},
    Engine, Query,
};

use arbor_core::{Document, Error, Result, Value};
use async_recursion::async_recursion;
use tokio::task::JoinSet;

impl Engine {
    /// Resolves a list query: runs the root statement, fetches the tails,
    /// then finalizes the documents.
    #[async_recursion]
    pub(super) async fn resolve(&self, query: Query) -> Result<Vec<Document>> {
        let model = self.schema.model(&query.model)?;
        let aliases = self.plan(model, &query)?;

        let columns = select::columns(&self.schema, model, &aliases, &query)?;
        let statement = lower::list(&self.schema, model, &query, &aliases, &columns)?;
        let rows = self.exec(statement).await?;
        let mut docs = materialize::scan(&columns, rows)?;

        if let (Some(_), Some(limit)) = (&query.keys, query.limit) {
            if docs.len() as u64 >= limit {
                tracing::debug!(
                    model = %query.model,
                    limit,
                    "tail batch reached the has-many limit; children may be truncated"
                );
            }
        }

        if docs.is_empty() {
            return Ok(docs);
        }

        let tails = tail::collect(&self.schema, model, &query, &aliases)?;
        if !tails.is_empty() {
            self.fetch_tails(&query, &tails, &mut docs).await?;
        }

        let docs = self.finalize(model, &query, &aliases, docs)?;

        Ok(match &query.unwrap {
            Some(link) => tail::unwrap(link, docs),
            None => docs,
        })
    }

    pub(super) async fn resolve_count(&self, query: Query) -> Result<u64> {
        let model = self.schema.model(&query.model)?;
        let aliases = self.plan(model, &query)?;

        let statement = lower::count(&self.schema, model, &query, &aliases)?;
        let rows = self.exec(statement).await?;

        let value = rows.into_iter().next().and_then(|row| row.into_iter().next());
        match value {
            Some(Value::I64(count)) if count >= 0 => Ok(count as u64),
            Some(Value::String(text)) => text
                .trim()
                .parse()
                .map_err(|_| arbor_core::err!("count returned a non-numeric value `{text}`")),
            other => Err(arbor_core::err!("count returned an unexpected value: {other:?}")),
        }
    }

    /// Fetches every tail concurrently, one task per child request, and
    /// merges the results. The first failure aborts the remaining tasks.
    async fn fetch_tails(&self, query: &Query, tails: &[Tail<'_>], docs: &mut [Document]) -> Result<()> {
        let mut fetches = vec![];
        for (index, tail) in tails.iter().enumerate() {
            fetches.extend(tail.fetches(index, &self.schema, &self.config, query, docs)?);
        }

        let mut tasks = JoinSet::new();

        for fetch in fetches {
            tracing::trace!(
                model = %fetch.query.model,
                keys = fetch.query.keys.as_ref().map_or(0, |keys| keys.values.len()),
                "fetching tail"
            );

            let engine = self.clone();
            tasks.spawn(async move {
                let docs = engine.resolve(fetch.query).await?;
                Ok::<_, Error>((fetch.tail, fetch.discriminator, docs))
            });
        }

        let mut children: Vec<Children> = tails.iter().map(|_| Children::default()).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((index, discriminator, docs))) => children[index].add(discriminator, docs),
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(err);
                }
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => return Err(arbor_core::err!("tail fetch did not complete: {err}")),
            }
        }

        for (tail, children) in tails.iter().zip(&children) {
            tail.merge(children, docs);
        }

        Ok(())
    }
}
