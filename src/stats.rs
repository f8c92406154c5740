//! Per-firm cohort statistics.
//!
//! Whenever an application is fetched or updated, the handler pulls every
//! user's rows for that firm in one query and hands them to
//! [`firm_summary`], which derives the aggregate the grid shows next to
//! the record: overall success rate, median time-to-response per stage
//! split by outcome, funnel conversion rates, recent response activity,
//! and the earliest observed date per stage.
//!
//! Everything here is pure so the grouping and divide-by-zero guards can
//! be unit-tested without a database.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::types::{ApplicationRow, Stage};

/// Slim projection of an applications row, one per application the firm
/// has ever received across all users.
#[derive(Debug, Clone, FromRow)]
pub struct FirmCohortRow {
    pub user_id: String,
    pub stage: Stage,
    pub applied_to_response: Option<i64>,
    pub screener_to_response: Option<i64>,
    pub callback_to_response: Option<i64>,
    pub applied_response_date: Option<NaiveDate>,
    pub screener_date: Option<NaiveDate>,
    pub screener_response_date: Option<NaiveDate>,
    pub callback_date: Option<NaiveDate>,
    pub callback_response_date: Option<NaiveDate>,
}

/// Median day-count split by whether the stage was ultimately passed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MedianSplit {
    pub success: f64,
    pub not_success: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MedianResponses {
    pub median_applied_to_response: MedianSplit,
    pub median_screener_to_response: MedianSplit,
    pub median_callback_to_response: MedianSplit,
}

/// A funnel conversion step. The numerator and denominator are reported
/// alongside the rate so the UI can render "n of m".
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct StageRate {
    pub rate: f64,
    pub numerator: i64,
    pub denominator: i64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct FunnelRates {
    pub application_to_screener_rate: StageRate,
    pub screener_to_callback_rate: StageRate,
    pub callback_to_offer_rate: StageRate,
}

/// Earliest observed date per stage across the firm's cohort, a proxy
/// for when the firm started moving this season.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct StartDates {
    pub screener_start: Option<NaiveDate>,
    pub callback_start: Option<NaiveDate>,
    pub offer_start: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub total_users_for_firm: i64,
    pub total_applications: i64,
    pub successful_applications: i64,
    pub success_rate: f64,
    pub median_responses: MedianResponses,
    pub recent_responses_at_current_stage: i64,
    pub current_stage: String,
    pub success_rate_granular: FunnelRates,
    pub start_dates: StartDates,
}

/// Median with the historical floor: an empty set or a zero median
/// reports as 1, so downstream day-count ratios never divide by zero.
pub fn median_or_floor(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    let m = if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
    };
    if m == 0.0 {
        1.0
    } else {
        m
    }
}

/// Percentage rounded to one decimal; 0.0 when the denominator is zero.
pub fn rate_pct(numerator: i64, denominator: i64) -> f64 {
    if denominator > 0 {
        ((numerator as f64 / denominator as f64) * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

fn reached_screener(r: &FirmCohortRow) -> bool {
    matches!(r.stage, Stage::ScreenerInvite | Stage::CallbackInvite | Stage::Offer)
        || (r.stage == Stage::Rejection
            && (r.screener_to_response.is_some() || r.callback_to_response.is_some()))
}

fn reached_callback(r: &FirmCohortRow) -> bool {
    matches!(r.stage, Stage::CallbackInvite | Stage::Offer)
        || (r.stage == Stage::Rejection && r.callback_to_response.is_some())
}

fn median_responses(cohort: &[FirmCohortRow]) -> MedianResponses {
    // Applied: success means the application advanced past the initial
    // submission, whether or not day counts were ever recorded for the
    // later stages.
    let applied_success: Vec<i64> = cohort
        .iter()
        .filter(|r| {
            r.applied_to_response.is_some()
                && (r.screener_to_response.is_some()
                    || r.callback_to_response.is_some()
                    || matches!(r.stage, Stage::ScreenerInvite | Stage::CallbackInvite | Stage::Offer))
        })
        .filter_map(|r| r.applied_to_response)
        .collect();
    let applied_not_success: Vec<i64> = cohort
        .iter()
        .filter(|r| {
            r.applied_to_response.is_some()
                && r.screener_to_response.is_none()
                && r.callback_to_response.is_none()
                && matches!(r.stage, Stage::SubmittedApplication | Stage::Rejection)
        })
        .filter_map(|r| r.applied_to_response)
        .collect();

    let screener_success: Vec<i64> = cohort
        .iter()
        .filter(|r| {
            r.screener_to_response.is_some()
                && r.callback_to_response.is_some()
                && matches!(r.stage, Stage::CallbackInvite | Stage::Offer)
        })
        .filter_map(|r| r.screener_to_response)
        .collect();
    let screener_not_success: Vec<i64> = cohort
        .iter()
        .filter(|r| {
            r.screener_to_response.is_some()
                && r.callback_to_response.is_none()
                && matches!(r.stage, Stage::ScreenerInvite | Stage::Rejection)
        })
        .filter_map(|r| r.screener_to_response)
        .collect();

    let callback_success: Vec<i64> = cohort
        .iter()
        .filter(|r| {
            r.callback_to_response.is_some() && matches!(r.stage, Stage::CallbackInvite | Stage::Offer)
        })
        .filter_map(|r| r.callback_to_response)
        .collect();
    let callback_not_success: Vec<i64> = cohort
        .iter()
        .filter(|r| r.callback_to_response.is_some() && r.stage == Stage::Rejection)
        .filter_map(|r| r.callback_to_response)
        .collect();

    MedianResponses {
        median_applied_to_response: MedianSplit {
            success: median_or_floor(&applied_success),
            not_success: median_or_floor(&applied_not_success),
        },
        median_screener_to_response: MedianSplit {
            success: median_or_floor(&screener_success),
            not_success: median_or_floor(&screener_not_success),
        },
        median_callback_to_response: MedianSplit {
            success: median_or_floor(&callback_success),
            not_success: median_or_floor(&callback_not_success),
        },
    }
}

fn funnel_rates(cohort: &[FirmCohortRow]) -> FunnelRates {
    let total = cohort.len() as i64;
    let with_screener = cohort.iter().filter(|r| reached_screener(r)).count() as i64;
    let with_callback = cohort.iter().filter(|r| reached_callback(r)).count() as i64;
    let with_offer = cohort.iter().filter(|r| r.stage == Stage::Offer).count() as i64;

    FunnelRates {
        application_to_screener_rate: StageRate {
            rate: rate_pct(with_screener, total),
            numerator: with_screener,
            denominator: total,
        },
        screener_to_callback_rate: StageRate {
            rate: rate_pct(with_callback, with_screener),
            numerator: with_callback,
            denominator: with_screener,
        },
        callback_to_offer_rate: StageRate {
            rate: rate_pct(with_offer, with_callback),
            numerator: with_offer,
            denominator: with_callback,
        },
    }
}

/// How many of the firm's applications saw a response at the subject's
/// current stage inside the window. For Rejection the grid shows the
/// firm's all-time rejection count instead.
fn recent_responses(subject_stage: Stage, cohort: &[FirmCohortRow], cutoff: NaiveDate) -> i64 {
    let after = |d: Option<NaiveDate>| d.map(|d| d >= cutoff).unwrap_or(false);
    let count = |pred: &dyn Fn(&FirmCohortRow) -> bool| cohort.iter().filter(|r| pred(r)).count() as i64;

    match subject_stage {
        Stage::SubmittedApplication => count(&|r| after(r.applied_response_date)),
        Stage::ScreenerInvite => count(&|r| after(r.screener_response_date)),
        Stage::CallbackInvite => count(&|r| after(r.callback_response_date)),
        Stage::NotSubmitted | Stage::Offer => count(&|r| {
            after(r.applied_response_date)
                || after(r.screener_response_date)
                || after(r.callback_response_date)
        }),
        Stage::Rejection => count(&|r| r.stage == Stage::Rejection),
    }
}

fn start_dates(cohort: &[FirmCohortRow]) -> StartDates {
    StartDates {
        screener_start: cohort.iter().filter_map(|r| r.screener_date).min(),
        callback_start: cohort.iter().filter_map(|r| r.callback_date).min(),
        offer_start: cohort
            .iter()
            .filter(|r| r.stage == Stage::Offer)
            .filter_map(|r| r.callback_response_date)
            .min(),
    }
}

/// Placeholder summary for an application whose firm is still blank.
pub fn empty_summary() -> SummaryStats {
    let zero_rate = StageRate { rate: 0.0, numerator: 0, denominator: 0 };
    SummaryStats {
        total_users_for_firm: 0,
        total_applications: 0,
        successful_applications: 0,
        success_rate: 0.0,
        median_responses: MedianResponses {
            median_applied_to_response: MedianSplit { success: 0.0, not_success: 1.0 },
            median_screener_to_response: MedianSplit { success: 0.0, not_success: 1.0 },
            median_callback_to_response: MedianSplit { success: 0.0, not_success: 1.0 },
        },
        recent_responses_at_current_stage: 0,
        current_stage: "Firm not specified".to_string(),
        success_rate_granular: FunnelRates {
            application_to_screener_rate: zero_rate,
            screener_to_callback_rate: zero_rate,
            callback_to_offer_rate: zero_rate,
        },
        start_dates: StartDates { screener_start: None, callback_start: None, offer_start: None },
    }
}

/// Computes the full firm summary for `subject` over the firm's cohort.
///
/// `today` is passed in (rather than read from the clock) so the recent
/// window is deterministic under test; `recent_window_days` comes from
/// the `[stats]` config section.
pub fn firm_summary(
    subject: &ApplicationRow,
    cohort: &[FirmCohortRow],
    today: NaiveDate,
    recent_window_days: i64,
) -> SummaryStats {
    if subject.firm.is_none() {
        return empty_summary();
    }

    let total_applications = cohort.len() as i64;
    let successful_applications = cohort.iter().filter(|r| r.stage == Stage::Offer).count() as i64;
    let total_users_for_firm = {
        let mut users: Vec<&str> = cohort.iter().map(|r| r.user_id.as_str()).collect();
        users.sort_unstable();
        users.dedup();
        users.len() as i64
    };

    let cutoff = today - chrono::Duration::days(recent_window_days);

    SummaryStats {
        total_users_for_firm,
        total_applications,
        successful_applications,
        success_rate: rate_pct(successful_applications, total_applications),
        median_responses: median_responses(cohort),
        recent_responses_at_current_stage: recent_responses(subject.stage, cohort, cutoff),
        current_stage: subject.stage.as_str().to_string(),
        success_rate_granular: funnel_rates(cohort),
        start_dates: start_dates(cohort),
    }
}

/// Fetches the firm's full cohort (all users) in one query.
pub async fn fetch_firm_cohort(db: &sqlx::SqlitePool, firm: &str) -> sqlx::Result<Vec<FirmCohortRow>> {
    sqlx::query_as(
        r#"SELECT user_id, stage,
                  applied_to_response, screener_to_response, callback_to_response,
                  applied_response_date,
                  screener_date, screener_response_date,
                  callback_date, callback_response_date
           FROM applications WHERE firm = ?1"#,
    )
    .bind(firm)
    .fetch_all(db)
    .await
}
