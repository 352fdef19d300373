use std::iter::FusedIterator;

use chrono::{DateTime, Utc};
use lacuna_core::{DataPoint, FillForwardResolution, LacunaError};

use super::{EnumeratorState, Gap, Setup, Synthesizer};

/// Replays a finite, time-ordered sequence and inserts synthetic bars in
/// its gaps.
///
/// Yields `Result` items: a calendar that cannot answer within its
/// lookahead surfaces as one `Err`, after which the enumerator is exhausted.
/// Enumeration also ends after a final delisting event, and once the
/// subscription end is reached after the underlying sequence runs dry.
///
/// The underlying sequence must be sorted by `end_time`; it is not
/// re-sorted. A point ending before its predecessor is emitted as-is,
/// without fill.
pub struct FillForward<I> {
    underlying: Option<I>,
    synth: Synthesizer,
    gap: Option<Gap>,
    state: EnumeratorState,
}

impl<I> std::fmt::Debug for FillForward<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillForward")
            .field("state", &self.state)
            .field("last_end", &self.synth.last_end())
            .field("in_gap", &self.gap.is_some())
            .finish_non_exhaustive()
    }
}

impl<I> FillForward<I>
where
    I: Iterator<Item = DataPoint>,
{
    pub(crate) const fn new(underlying: I, setup: Setup) -> Self {
        Self {
            underlying: Some(underlying),
            synth: Synthesizer::new(setup),
            gap: None,
            state: EnumeratorState::Initial,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EnumeratorState {
        self.state
    }

    /// End time of the last emitted tradable bar, real or synthesized.
    #[must_use]
    pub const fn last_end(&self) -> Option<DateTime<Utc>> {
        self.synth.last_end()
    }

    /// Handle to the shared fill-forward cadence.
    #[must_use]
    pub const fn fill_forward_resolution(&self) -> &FillForwardResolution {
        &self.synth.setup.fill_forward
    }

    /// Release the underlying sequence and end enumeration. Idempotent.
    pub fn close(&mut self) {
        self.state = EnumeratorState::Exhausted;
        self.underlying = None;
        self.gap = None;
    }

    fn release(&mut self, point: DataPoint) -> DataPoint {
        self.synth.record(&point);
        if point.is_terminal() {
            #[cfg(feature = "tracing")]
            tracing::info!(
                target = "lacuna::fill_forward",
                symbol = %point.symbol,
                at = %point.time,
                "delisted; ending enumeration"
            );
            self.close();
        }
        point
    }

    fn past_subscription_end(&self, point: &DataPoint) -> bool {
        self.synth
            .setup
            .subscription_end
            .is_some_and(|end| point.end_time > end)
    }
}

impl<I> Iterator for FillForward<I>
where
    I: Iterator<Item = DataPoint>,
{
    type Item = Result<DataPoint, LacunaError>;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "lacuna::fill_forward::next",
            level = "trace",
            skip(self),
            fields(state = ?self.state),
        )
    )]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                EnumeratorState::Exhausted => return None,
                EnumeratorState::Initial => self.state = EnumeratorState::Streaming,
                EnumeratorState::Streaming => {}
            }

            if let Some(gap) = self.gap.as_mut() {
                match gap.next_step(self.synth.calendar()) {
                    Ok(Some(step)) => {
                        if let Some(bar) = self.synth.synthesize(step) {
                            return Some(Ok(bar));
                        }
                        continue;
                    }
                    Ok(None) => match self.gap.take().and_then(|g| g.deferred) {
                        Some(point) => return Some(Ok(self.release(point))),
                        None => {
                            #[cfg(feature = "tracing")]
                            tracing::info!(
                                target = "lacuna::fill_forward",
                                last_end = ?self.synth.last_end(),
                                "subscription end reached"
                            );
                            self.close();
                            return None;
                        }
                    },
                    Err(e) => {
                        self.close();
                        return Some(Err(e));
                    }
                }
            }

            let Some(point) = self.underlying.as_mut().and_then(Iterator::next) else {
                // exhausted: drop the source, then fill through the subscription end
                self.underlying = None;
                let tail = self
                    .synth
                    .setup
                    .subscription_end
                    .and_then(|end| self.synth.steps_through(end));
                if let Some(steps) = tail {
                    self.gap = Some(Gap::new(steps, None));
                    continue;
                }
                self.close();
                return None;
            };

            if self.past_subscription_end(&point) {
                self.underlying = None;
                continue;
            }
            if let Err(e) = point.validate() {
                self.close();
                return Some(Err(e));
            }

            match self.synth.steps_for(&point) {
                Some(steps) => self.gap = Some(Gap::new(steps, Some(point))),
                None => return Some(Ok(self.release(point))),
            }
        }
    }
}

impl<I> FusedIterator for FillForward<I> where I: Iterator<Item = DataPoint> {}
