//! Daily quote rotation.
//!
//! The quotes document holds one entry per day of the year. Selection is a
//! pure function of the calendar date; the rollover timer only computes how
//! long to wait until local midnight and ticks the session when it passes.

use crate::content::Quote;
use chrono::{DateTime, Datelike, Duration as TimeDelta, Local, NaiveDate, TimeZone};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Number of entries in the rotation.
pub const ROTATION_DAYS: u32 = 365;

/// Index of the quote featured on `date`: the zero-based day of the year,
/// modulo 365. Day 366 of a leap year wraps back to entry 0.
pub fn select_index(date: NaiveDate) -> usize {
    (date.ordinal0() % ROTATION_DAYS) as usize
}

/// Today's quote, if the collection is long enough to have one.
pub fn quote_for(quotes: &[Quote], date: NaiveDate) -> Option<&Quote> {
    quotes.get(select_index(date))
}

/// The first instant of the day after `now`, in `now`'s time zone.
///
/// Midnight can fall into a DST gap in a few zones; the first valid hour
/// after it is used then.
pub fn next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let tomorrow = now
        .date_naive()
        .succ_opt()
        .unwrap_or_else(|| now.date_naive());
    let midnight = tomorrow.and_time(chrono::NaiveTime::MIN);
    for hours in 0..3 {
        let candidate = midnight + TimeDelta::hours(hours);
        if let Some(instant) = tz.from_local_datetime(&candidate).earliest() {
            return instant;
        }
    }
    now.clone() + TimeDelta::days(1)
}

/// How long until the next local midnight. Never zero.
pub fn delay_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let target = next_midnight(now);
    target
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
        .max(Duration::from_millis(1))
}

/// Emitted by the rollover timer once a new day has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverTick {
    pub date: NaiveDate,
}

/// The single midnight timer. Arming it again first cancels the running
/// instance so two rollovers can never be pending at once.
#[derive(Debug, Default)]
pub struct RolloverTimer {
    handle: Option<JoinHandle<()>>,
}

impl RolloverTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, ticks: mpsc::UnboundedSender<RolloverTick>) {
        self.disarm();
        self.handle = Some(tokio::spawn(async move {
            let mut base = Local::now();
            loop {
                let target = next_midnight(&base);
                let delay = delay_until_next_midnight(&base);
                tracing::debug!(?delay, "next quote rollover scheduled");
                tokio::time::sleep(delay).await;
                let tick = RolloverTick {
                    date: target.date_naive(),
                };
                if ticks.send(tick).is_err() {
                    break;
                }
                // Never schedule from before the midnight just handled.
                let now = Local::now();
                base = if now < target { target } else { now };
            }
        }));
    }

    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RolloverTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn quotes(n: usize) -> Vec<Quote> {
        (0..n)
            .map(|i| Quote {
                quote: format!("q{}", i),
                bhaavarth: format!("b{}", i),
            })
            .collect()
    }

    #[test]
    fn every_day_of_a_common_year_maps_to_itself() {
        let jan1 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for d in 0..365u64 {
            let date = jan1 + chrono::Days::new(d);
            assert_eq!(select_index(date), d as usize);
            assert_eq!(select_index(date), select_index(date));
        }
    }

    #[test]
    fn leap_day_366_wraps_to_first_entry() {
        let dec31 = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(dec31.ordinal0(), 365);
        assert_eq!(select_index(dec31), 0);
        let dec30 = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(select_index(dec30), 364);
    }

    #[test]
    fn quote_for_handles_short_collections() {
        let all = quotes(365);
        let feb1 = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(quote_for(&all, feb1).unwrap().quote, "q31");
        assert!(quote_for(&quotes(10), feb1).is_none());
    }

    #[test]
    fn delay_runs_to_local_midnight() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let now = ist.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(delay_until_next_midnight(&now), Duration::from_secs(30 * 60));

        let at_midnight = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(
            delay_until_next_midnight(&at_midnight),
            Duration::from_secs(24 * 3600)
        );
    }

    #[test]
    fn next_midnight_crosses_year_end() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 18, 0, 0).unwrap();
        let target = next_midnight(&now);
        assert_eq!(target.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(select_index(target.date_naive()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn armed_timer_ticks_at_midnight() {
        let mut timer = RolloverTimer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        timer.arm(tx);
        assert!(timer.is_armed());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.date, Local::now().date_naive().succ_opt().unwrap());

        timer.disarm();
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_the_earlier_timer() {
        let mut timer = RolloverTimer::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        timer.arm(tx.clone());
        timer.arm(tx);

        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.date, Local::now().date_naive().succ_opt().unwrap());

        // Well past midnight but short of the following one.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
        assert!(timer.is_armed());
    }
}
