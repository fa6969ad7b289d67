use std::time::Duration;

use crossterm::event::{Event as TermEvent, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    /// Terminal size changed; the next draw picks it up.
    Resize,
    Tick,
    /// Time to compare the data files against the loaded snapshot.
    StaleCheck,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, stale_check: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stale_check = stale_check.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut input_open = true;
            let mut tick_interval = tokio::time::interval(tick_rate);
            // First check one full period after startup; the data was just loaded.
            let mut stale_interval = interval_at(Instant::now() + stale_check, stale_check);
            stale_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let event = tokio::select! {
                    maybe_event = reader.next(), if input_open => match maybe_event {
                        // Filter for Press only (Windows compatibility)
                        Some(Ok(TermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Event::Key(key)
                        }
                        Some(Ok(TermEvent::Resize(..))) => Event::Resize,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            log::debug!("terminal event error: {}", e);
                            continue;
                        }
                        None => {
                            input_open = false;
                            continue;
                        }
                    },
                    _ = tick_interval.tick() => Event::Tick,
                    _ = stale_interval.tick() => Event::StaleCheck,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        EventHandler { rx }
    }

    pub async fn next(&mut self) -> Event {
        self.rx.recv().await.unwrap_or(Event::Tick)
    }
}
