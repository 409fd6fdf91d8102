//! Mock Quote Stream
//!
//! Timer-driven emitter of synthetic quotes. Each running stream owns one
//! tokio task that wakes on a fixed interval and pushes one quote per
//! subscribed symbol into a bounded channel.
//!
//! Sends never wait: a subscriber that falls behind loses quotes rather than
//! stalling the timer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{QuoteStream, StreamControl, StreamId};
use crate::domain::clock::Clock;
use crate::domain::instrument::InstrumentSymbol;
use crate::domain::quote::{Quote, synthesize};
use crate::infrastructure::config::MockStreamSettings;
use crate::infrastructure::metrics;

/// A simulated quote stream.
#[derive(Debug)]
pub struct MockStream {
    id: StreamId,
    symbols: Vec<InstrumentSymbol>,
    interval: Duration,
    sink: mpsc::Sender<Quote>,
    clock: Arc<dyn Clock>,
    timer: Mutex<Option<CancellationToken>>,
}

impl MockStream {
    /// Open an idle stream for `symbols`.
    #[must_use]
    pub fn open(
        symbols: Vec<InstrumentSymbol>,
        settings: &MockStreamSettings,
        clock: Arc<dyn Clock>,
    ) -> QuoteStream {
        let (sink, quotes) = mpsc::channel(settings.capacity);
        let stream = Arc::new(Self {
            id: StreamId::new_v4(),
            symbols,
            interval: settings.interval,
            sink,
            clock,
            timer: Mutex::new(None),
        });
        QuoteStream::new(stream, quotes)
    }

    async fn run(
        id: StreamId,
        symbols: Vec<InstrumentSymbol>,
        period: Duration,
        sink: mpsc::Sender<Quote>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let tick = clock.now();
            for &symbol in &symbols {
                match sink.try_send(synthesize(symbol, tick)) {
                    Ok(()) => metrics::record_quote_emitted(symbol),
                    Err(TrySendError::Full(_)) => {
                        metrics::record_quote_dropped(symbol);
                        tracing::debug!(
                            stream_id = %id,
                            %symbol,
                            "Subscriber lagging, quote dropped"
                        );
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(stream_id = %id, "Subscriber gone, stopping timer");
                        cancel.cancel();
                        return;
                    }
                }
            }
        }

        tracing::debug!(stream_id = %id, "Stream timer stopped");
    }
}

impl StreamControl for MockStream {
    fn id(&self) -> StreamId {
        self.id
    }

    fn symbols(&self) -> &[InstrumentSymbol] {
        &self.symbols
    }

    fn start(&self) {
        let cancel = CancellationToken::new();
        if let Some(previous) = self.timer.lock().replace(cancel.clone()) {
            previous.cancel();
        }

        tokio::spawn(Self::run(
            self.id,
            self.symbols.clone(),
            self.interval,
            self.sink.clone(),
            Arc::clone(&self.clock),
            cancel,
        ));
        tracing::debug!(stream_id = %self.id, symbols = self.symbols.len(), "Stream started");
    }

    fn stop(&self) {
        if let Some(cancel) = self.timer.lock().take() {
            cancel.cancel();
        }
    }

    fn is_running(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|cancel| !cancel.is_cancelled())
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use tokio_stream::StreamExt;

    use super::*;
    use crate::domain::clock::SystemClock;

    const PERIOD: Duration = Duration::from_millis(2000);

    fn open(symbols: &[InstrumentSymbol], capacity: usize) -> QuoteStream {
        let settings = MockStreamSettings {
            interval: PERIOD,
            capacity,
        };
        MockStream::open(symbols.to_vec(), &settings, Arc::new(SystemClock))
    }

    #[tokio::test(start_paused = true)]
    async fn emits_each_symbol_per_tick_in_order() {
        let mut stream = open(&[InstrumentSymbol::Es, InstrumentSymbol::Nq], 16);
        let started = Instant::now();
        stream.start();

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(stream.recv().await.unwrap().symbol);
        }

        assert!(started.elapsed() >= PERIOD * 2);
        assert_eq!(
            seen,
            [
                InstrumentSymbol::Es,
                InstrumentSymbol::Nq,
                InstrumentSymbol::Es,
                InstrumentSymbol::Nq,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_emission_waits_one_interval() {
        let mut stream = open(&[InstrumentSymbol::Gc], 16);
        let started = Instant::now();
        stream.start();

        stream.recv().await.unwrap();
        assert!(started.elapsed() >= PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_does_not_duplicate_timer() {
        let mut stream = open(&[InstrumentSymbol::Es, InstrumentSymbol::Nq], 16);
        stream.start();
        stream.start();
        assert!(stream.is_running());

        stream.recv().await.unwrap();
        stream.recv().await.unwrap();
        let extra = tokio::time::timeout(PERIOD / 2, stream.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_emission() {
        let mut stream = open(&[InstrumentSymbol::Cl], 16);
        stream.start();
        stream.recv().await.unwrap();

        stream.stop();
        stream.stop();
        assert!(!stream.is_running());

        let after = tokio::time::timeout(PERIOD * 3, stream.recv()).await;
        assert!(after.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn full_channel_drops_instead_of_blocking() {
        let mut stream = open(&[InstrumentSymbol::Es, InstrumentSymbol::Nq], 1);
        stream.start();

        tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
        assert!(stream.is_running());

        let first = stream.recv().await.unwrap();
        assert_eq!(first.symbol, InstrumentSymbol::Es);
        let backlog = tokio::time::timeout(PERIOD / 4, stream.recv()).await;
        assert!(backlog.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ends_when_subscriber_drops() {
        let stream = open(&[InstrumentSymbol::Ym], 4);
        stream.start();

        let (control, quotes) = stream.into_parts();
        drop(quotes);

        tokio::time::sleep(PERIOD * 2).await;
        assert!(!control.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn quotes_as_stream() {
        let stream = open(&[InstrumentSymbol::Zn], 4);
        stream.start();

        let (control, quotes) = stream.into_parts();
        let collected: Vec<_> = quotes.take(3).collect().await;

        assert_eq!(collected.len(), 3);
        assert!(collected.iter().all(|q| q.symbol == InstrumentSymbol::Zn));
        control.stop();
    }
}
