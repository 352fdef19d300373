//! Carry the last seen bid or ask into quote bars that lack one.

use std::sync::Arc;

use lacuna_core::{DataPoint, LacunaError, Ohlc, Payload};

use crate::enumerator::{LivePoll, LiveSource};

/// Decorator that fills a missing quote side from the most recent bar that
/// had it.
///
/// The carried side is the same `Arc` as the earlier bar's, not a copy. A
/// bar's `value` is recomputed from the completed sides only when a side was
/// filled in. Trade bars and auxiliary events pass through unchanged.
///
/// Wraps either enumerator: as an [`Iterator`] over the bounded one, and as a
/// [`LiveSource`] over the live one.
#[derive(Debug)]
pub struct QuoteSideCarry<S> {
    inner: S,
    last_bid: Option<Arc<Ohlc>>,
    last_ask: Option<Arc<Ohlc>>,
}

impl<S> QuoteSideCarry<S> {
    /// Wrap `inner`.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            last_bid: None,
            last_ask: None,
        }
    }

    /// The wrapped source.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutable access to the wrapped source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap, dropping the carried sides.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Complete `point` from the carried sides and remember its own.
    #[must_use]
    pub fn carry(&mut self, mut point: DataPoint) -> DataPoint {
        if let Payload::Quote(bar) = &mut point.payload {
            let mut filled = false;
            if bar.bid.is_some() {
                self.last_bid.clone_from(&bar.bid);
            } else if let Some(bid) = &self.last_bid {
                bar.bid = Some(Arc::clone(bid));
                filled = true;
            }
            if bar.ask.is_some() {
                self.last_ask.clone_from(&bar.ask);
            } else if let Some(ask) = &self.last_ask {
                bar.ask = Some(Arc::clone(ask));
                filled = true;
            }
            if filled {
                point.value = bar.mid_close();
            }
        }
        point
    }
}

impl<S> Iterator for QuoteSideCarry<S>
where
    S: Iterator<Item = Result<DataPoint, LacunaError>>,
{
    type Item = Result<DataPoint, LacunaError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(item.map(|p| self.carry(p)))
    }
}

impl<S> std::iter::FusedIterator for QuoteSideCarry<S> where
    S: std::iter::FusedIterator<Item = Result<DataPoint, LacunaError>>
{
}

impl<S: LiveSource> LiveSource for QuoteSideCarry<S> {
    fn advance(&mut self) -> Result<LivePoll, LacunaError> {
        Ok(match self.inner.advance()? {
            LivePoll::Data(p) => LivePoll::Data(self.carry(p)),
            other => other,
        })
    }
}
