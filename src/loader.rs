use crate::model::{DisplayDate, TimeRange};
use crate::search::MeetupSource;
use crate::AppEvent;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Runs meetup queries in the background and reports them to the event loop.
///
/// Only one query is live at a time: starting a new one aborts the previous
/// task. Results are tagged with the month they were issued for so the
/// receiver can still drop a result that raced past the abort.
pub struct MeetupLoader<S: MeetupSource> {
    source: Arc<S>,
    tx: mpsc::Sender<AppEvent>,
    in_flight: Option<(DisplayDate, JoinHandle<()>)>,
}

impl<S: MeetupSource> MeetupLoader<S> {
    pub fn new(source: Arc<S>, tx: mpsc::Sender<AppEvent>) -> Self {
        Self {
            source,
            tx,
            in_flight: None,
        }
    }

    pub fn load(&mut self, display_date: DisplayDate, range: TimeRange) {
        if let Some((previous, handle)) = self.in_flight.take() {
            if !handle.is_finished() {
                debug!(
                    "Aborting query for {}/{} superseded by {}/{}.",
                    previous.year, previous.month, display_date.year, display_date.month
                );
                handle.abort();
            }
        }

        info!(
            "Loading meetups for {}/{} ({} .. {}).",
            display_date.year, display_date.month, range.start_unix, range.end_unix
        );

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let result = source.fetch_meetups(range).await;
            let _ = tx
                .send(AppEvent::MeetupsLoaded {
                    display_date,
                    result,
                })
                .await;
        });
        self.in_flight = Some((display_date, handle));
    }
}

impl<S: MeetupSource> Drop for MeetupLoader<S> {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::dates::REFERENCE_TIMEZONE;
    use crate::model::RawEventRecord;
    use crate::route::HistoryMode;
    use crate::search::SearchError;
    use chrono::NaiveDate;
    use serde_json::Map;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Source whose answers are released by the test, one gate per range start.
    struct GatedSource {
        gates: Mutex<HashMap<i64, oneshot::Receiver<Vec<RawEventRecord>>>>,
    }

    impl MeetupSource for GatedSource {
        fn fetch_meetups(
            &self,
            range: TimeRange,
        ) -> impl Future<Output = Result<Vec<RawEventRecord>, SearchError>> + Send {
            let gate = self.gates.lock().unwrap().remove(&range.start_unix);
            async move {
                match gate {
                    Some(rx) => Ok(rx.await.unwrap_or_default()),
                    None => Err(SearchError::MissingResult),
                }
            }
        }
    }

    fn hit(id: &str, start: i64) -> RawEventRecord {
        RawEventRecord {
            object_id: id.to_string(),
            name: Some(id.to_string()),
            start_date: Some(start),
            end_date: None,
            url: None,
            description: None,
            picture_main: None,
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn superseded_month_never_reaches_the_grid() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut app = App::new(REFERENCE_TIMEZONE, HistoryMode::Push, "/2024/3", today);
        let march = app.display_date;
        let march_range = app.begin_query().unwrap();

        app.next_month();
        let april = app.display_date;
        assert_ne!(march, april);
        let april_range = app.begin_query().unwrap();

        let (march_tx, march_rx) = oneshot::channel();
        let (april_tx, april_rx) = oneshot::channel();
        let source = Arc::new(GatedSource {
            gates: Mutex::new(HashMap::from([
                (march_range.start_unix, march_rx),
                (april_range.start_unix, april_rx),
            ])),
        });

        let (tx, mut rx) = mpsc::channel(8);
        let mut loader = MeetupLoader::new(source, tx);
        loader.load(march, march_range);
        loader.load(april, april_range);

        // March resolves after April was requested.
        let _ = march_tx.send(vec![hit("march", march_range.start_unix + 3600)]);
        april_tx
            .send(vec![hit("april", april_range.start_unix + 3600)])
            .unwrap();

        let mut delivered = 0;
        while let Some(AppEvent::MeetupsLoaded {
            display_date,
            result,
        }) = rx.recv().await
        {
            app.accept_meetups(display_date, result);
            delivered += 1;
            if display_date == april {
                break;
            }
        }

        assert!(delivered >= 1);
        let ids: Vec<&str> = app.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["april"]);
    }

    #[tokio::test]
    async fn failure_is_reported_not_thrown() {
        let source = Arc::new(GatedSource {
            gates: Mutex::new(HashMap::new()),
        });
        let (tx, mut rx) = mpsc::channel(1);
        let mut loader = MeetupLoader::new(source, tx);
        let date = DisplayDate::new(2024, 3);
        loader.load(
            date,
            TimeRange {
                start_unix: 0,
                end_unix: 1,
            },
        );

        match rx.recv().await {
            Some(AppEvent::MeetupsLoaded {
                display_date,
                result,
            }) => {
                assert_eq!(display_date, date);
                assert!(matches!(result, Err(SearchError::MissingResult)));
            }
            _ => panic!("expected a load result"),
        }
    }
}
