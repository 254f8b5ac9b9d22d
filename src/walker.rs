use std::marker::PhantomData;

use serde_json::Value;

use crate::{client::Api, fetcher::Fetcher, models::Params, result::Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Start,
    Next(String),
    Done,
}

/// Walks every page of a paginated endpoint, yielding records one by one.
///
/// Pages are fetched lazily as the previous one is drained. The walk is
/// forward-only and ends when a page has no cursor or its cursor reports
/// no more pages.
///
/// ```rust,ignore
/// let mut threads = Walker::<_, Thread>::new(fetcher, "forums.listThreads", params);
/// while let Some(thread) = threads.next().await? {
///     println!("{}", thread.display_title());
/// }
/// ```
#[derive(Debug)]
pub struct Walker<'a, A: ?Sized, T> {
    fetcher: Fetcher<'a, A>,
    endpoint: String,
    params: Params,
    buffer: std::vec::IntoIter<Value>,
    state: State,
    pages: usize,
    _record: PhantomData<fn() -> T>,
}

impl<'a, A, T> Walker<'a, A, T>
where
    A: Api + ?Sized,
    T: From<Value>,
{
    /// Prepares a walk over `endpoint`. Nothing is fetched until the first
    /// call to [`Walker::next`].
    pub fn new(fetcher: Fetcher<'a, A>, endpoint: impl Into<String>, params: Params) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
            params,
            buffer: Vec::new().into_iter(),
            state: State::Start,
            pages: 0,
            _record: PhantomData,
        }
    }

    /// Returns the next record, fetching the following page when needed.
    ///
    /// `Ok(None)` marks the end of the collection.
    ///
    /// # Errors
    ///
    /// Returns any error the fetcher did not absorb.
    pub async fn next(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(raw) = self.buffer.next() {
                return Ok(Some(T::from(raw)));
            }

            let params = match &self.state {
                State::Done => return Ok(None),
                State::Start => self.params.clone(),
                State::Next(token) => {
                    let mut params = self.params.clone();
                    params.insert("cursor".to_string(), token.clone());
                    params
                }
            };

            let page = self.fetcher.fetch(&self.endpoint, &params).await?;
            self.pages += 1;

            let (records, cursor) = page.into_parts();
            self.state = match cursor {
                Some(cursor) if cursor.more() => match cursor.id() {
                    Some(id) => State::Next(id.to_string()),
                    None => {
                        log::warn!(
                            "{} reported more pages without a cursor id, stopping",
                            self.endpoint
                        );
                        State::Done
                    }
                },
                _ => State::Done,
            };
            log::trace!(
                "{} page {} held {} records",
                self.endpoint,
                self.pages,
                records.len()
            );
            self.buffer = records.into_iter();
        }
    }

    /// Drains the walk into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, discarding records read so far.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Returns how many pages have been fetched so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }
}
