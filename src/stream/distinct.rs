//! Suppression of repeated stream items

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Extension trait to drop consecutive duplicates from any Stream
pub trait DistinctExt: Stream {
    /// Skip items that `same` considers equal to the last emitted item
    ///
    /// Only consecutive duplicates are dropped; an item equal to one emitted
    /// earlier but not directly before is still yielded.
    fn distinct_by<F>(self, same: F) -> Distinct<Self, F>
    where
        Self: Sized,
        Self::Item: Clone,
        F: FnMut(&Self::Item, &Self::Item) -> bool,
    {
        Distinct::new(self, same)
    }
}

impl<T: Stream> DistinctExt for T {}

pin_project! {
    /// A stream combinator that drops consecutive duplicates
    pub struct Distinct<S: Stream, F> {
        #[pin]
        stream: S,
        same: F,
        last: Option<S::Item>,
    }
}

impl<S: Stream, F> Distinct<S, F> {
    pub fn new(stream: S, same: F) -> Self {
        Self { stream, same, last: None }
    }
}

impl<S, F> Stream for Distinct<S, F>
where
    S: Stream,
    S::Item: Clone,
    F: FnMut(&S::Item, &S::Item) -> bool,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            let Some(item) = ready!(this.stream.as_mut().poll_next(cx)) else {
                return Poll::Ready(None);
            };

            let repeated = match this.last.as_ref() {
                Some(last) => (this.same)(last, &item),
                None => false,
            };
            if !repeated {
                *this.last = Some(item.clone());
                return Poll::Ready(Some(item));
            }
        }
    }
}
