//! Completion reconciler.
//!
//! Turns a consumed session into its history record and the next daily
//! stats. Everything is computed into fresh values first; the engine swaps
//! them in together with the countdown reset, so no observer ever sees a
//! record without its stats update or the other way round.

use chrono::{DateTime, Duration, Local, Utc};
use tracing::info;
use uuid::Uuid;

use crate::clock::date_key;
use crate::history::{HistoryLog, SessionRecord};
use crate::stats::DailyStats;
use crate::task::TaskBacklog;
use crate::timer::{SessionKind, SessionTimerState, TimerSettings};

pub(crate) struct Completion {
    pub record: SessionRecord,
    pub history: HistoryLog,
    pub stats: DailyStats,
}

pub(crate) struct CompletionInput<'a> {
    pub kind: SessionKind,
    pub now: DateTime<Local>,
    pub run: SessionTimerState,
    pub settings: &'a TimerSettings,
    pub tasks: &'a TaskBacklog,
    pub history: &'a HistoryLog,
    pub stats: &'a DailyStats,
}

pub(crate) fn reconcile(input: CompletionInput<'_>) -> Completion {
    let CompletionInput {
        kind,
        now,
        run,
        settings,
        tasks,
        history,
        stats,
    } = input;

    let end_time: DateTime<Utc> = now.with_timezone(&Utc);
    // Minutes are u32, so the seconds always fit in a TimeDelta.
    let duration = Duration::seconds(settings.duration_secs(kind) as i64);
    let start_time = end_time.checked_sub_signed(duration).unwrap_or(end_time);

    let task_label = match kind {
        SessionKind::Focus => tasks.effective_label().map(str::to_string),
        _ => None,
    };

    let record = SessionRecord {
        id: Uuid::new_v4().to_string(),
        kind,
        start_time,
        end_time,
        completed: true,
        task_label,
        is_clutch: run.is_clutch,
    };

    let today = date_key(now);
    info!(
        %kind,
        date = %today,
        clutch = record.is_clutch,
        task = record.task_label.as_deref().unwrap_or(""),
        "session completed"
    );

    Completion {
        history: history.with_prepended(record.clone()),
        stats: stats.with_completion(&today, kind),
        record,
    }
}
