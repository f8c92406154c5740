#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::stats::{empty_summary, firm_summary, median_or_floor, rate_pct, FirmCohortRow};
    use crate::types::{ApplicationRow, Stage};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn cohort_row(user: &str, stage: Stage) -> FirmCohortRow {
        FirmCohortRow {
            user_id: user.to_string(),
            stage,
            applied_to_response: None,
            screener_to_response: None,
            callback_to_response: None,
            applied_response_date: None,
            screener_date: None,
            screener_response_date: None,
            callback_date: None,
            callback_response_date: None,
        }
    }

    fn subject(stage: Stage) -> ApplicationRow {
        ApplicationRow {
            application_id: 1,
            user_id: "u-subject".to_string(),
            firm: Some("Cravath".to_string()),
            city: None,
            networked: None,
            applied_date: None,
            applied_response_date: None,
            applied_to_response: None,
            screener_date: None,
            screener_response_date: None,
            screener_to_response: None,
            callback_date: None,
            callback_response_date: None,
            callback_to_response: None,
            stage,
            notes: None,
            last_updated: None,
        }
    }

    const TODAY: &str = "2025-08-20";
    const WINDOW: i64 = 7;

    #[test]
    fn median_floors_empty_and_zero() {
        assert_eq!(median_or_floor(&[]), 1.0);
        assert_eq!(median_or_floor(&[0]), 1.0);
        assert_eq!(median_or_floor(&[0, 0, 0]), 1.0);
    }

    #[test]
    fn median_of_odd_and_even_sets() {
        assert_eq!(median_or_floor(&[5]), 5.0);
        assert_eq!(median_or_floor(&[9, 1, 5]), 5.0);
        assert_eq!(median_or_floor(&[1, 2, 3, 10]), 2.5);
    }

    #[test]
    fn rate_rounds_to_one_decimal_and_guards_zero() {
        assert_eq!(rate_pct(1, 3), 33.3);
        assert_eq!(rate_pct(2, 3), 66.7);
        assert_eq!(rate_pct(0, 0), 0.0);
        assert_eq!(rate_pct(3, 3), 100.0);
    }

    #[test]
    fn summary_counts_users_once() {
        let cohort = vec![
            cohort_row("u1", Stage::SubmittedApplication),
            cohort_row("u1", Stage::Offer),
            cohort_row("u2", Stage::Rejection),
        ];
        let s = firm_summary(&subject(Stage::SubmittedApplication), &cohort, d(TODAY), WINDOW);
        assert_eq!(s.total_users_for_firm, 2);
        assert_eq!(s.total_applications, 3);
        assert_eq!(s.successful_applications, 1);
        assert_eq!(s.success_rate, 33.3);
        assert_eq!(s.current_stage, "Submitted Application");
    }

    #[test]
    fn funnel_counts_rejections_with_recorded_day_counts() {
        // A rejection that carries a screener day count went through a
        // screener even though the terminal stage no longer says so.
        let mut rejected_after_screener = cohort_row("u1", Stage::Rejection);
        rejected_after_screener.screener_to_response = Some(4);

        let mut rejected_after_callback = cohort_row("u2", Stage::Rejection);
        rejected_after_callback.callback_to_response = Some(6);

        let cohort = vec![
            rejected_after_screener,
            rejected_after_callback,
            cohort_row("u3", Stage::Offer),
            cohort_row("u4", Stage::SubmittedApplication),
        ];

        let s = firm_summary(&subject(Stage::SubmittedApplication), &cohort, d(TODAY), WINDOW);
        let funnel = s.success_rate_granular;
        // screener: both rejections plus the offer
        assert_eq!(funnel.application_to_screener_rate.numerator, 3);
        assert_eq!(funnel.application_to_screener_rate.denominator, 4);
        // callback: the callback rejection plus the offer
        assert_eq!(funnel.screener_to_callback_rate.numerator, 2);
        assert_eq!(funnel.screener_to_callback_rate.denominator, 3);
        assert_eq!(funnel.callback_to_offer_rate.numerator, 1);
        assert_eq!(funnel.callback_to_offer_rate.denominator, 2);
    }

    #[test]
    fn funnel_is_all_zero_for_empty_cohort() {
        let s = firm_summary(&subject(Stage::NotSubmitted), &[], d(TODAY), WINDOW);
        let funnel = s.success_rate_granular;
        assert_eq!(funnel.application_to_screener_rate.rate, 0.0);
        assert_eq!(funnel.screener_to_callback_rate.rate, 0.0);
        assert_eq!(funnel.callback_to_offer_rate.rate, 0.0);
    }

    #[test]
    fn median_split_separates_outcomes() {
        // Advanced: applied response plus a later-stage day count
        let mut advanced = cohort_row("u1", Stage::CallbackInvite);
        advanced.applied_to_response = Some(10);
        advanced.screener_to_response = Some(3);
        advanced.callback_to_response = Some(8);

        // Stalled at submission
        let mut stalled = cohort_row("u2", Stage::SubmittedApplication);
        stalled.applied_to_response = Some(30);

        let cohort = vec![advanced, stalled];
        let s = firm_summary(&subject(Stage::SubmittedApplication), &cohort, d(TODAY), WINDOW);

        assert_eq!(s.median_responses.median_applied_to_response.success, 10.0);
        assert_eq!(s.median_responses.median_applied_to_response.not_success, 30.0);
        // Screener success requires a recorded callback day count
        assert_eq!(s.median_responses.median_screener_to_response.success, 3.0);
        assert_eq!(s.median_responses.median_screener_to_response.not_success, 1.0);
        assert_eq!(s.median_responses.median_callback_to_response.success, 8.0);
    }

    #[test]
    fn recent_responses_follow_subject_stage() {
        let mut inside = cohort_row("u1", Stage::ScreenerInvite);
        inside.screener_response_date = Some(d("2025-08-18"));

        let mut outside = cohort_row("u2", Stage::ScreenerInvite);
        outside.screener_response_date = Some(d("2025-08-01"));

        let mut applied_recent = cohort_row("u3", Stage::SubmittedApplication);
        applied_recent.applied_response_date = Some(d("2025-08-19"));

        let cohort = vec![inside, outside, applied_recent];

        // A subject at the screener stage only counts screener responses
        let s = firm_summary(&subject(Stage::ScreenerInvite), &cohort, d(TODAY), WINDOW);
        assert_eq!(s.recent_responses_at_current_stage, 1);

        // Applied-stage subject counts applied responses
        let s = firm_summary(&subject(Stage::SubmittedApplication), &cohort, d(TODAY), WINDOW);
        assert_eq!(s.recent_responses_at_current_stage, 1);

        // Offer subjects count any response in the window
        let s = firm_summary(&subject(Stage::Offer), &cohort, d(TODAY), WINDOW);
        assert_eq!(s.recent_responses_at_current_stage, 2);
    }

    #[test]
    fn rejected_subject_sees_all_time_rejections() {
        let cohort = vec![
            cohort_row("u1", Stage::Rejection),
            cohort_row("u2", Stage::Rejection),
            cohort_row("u3", Stage::Offer),
        ];
        let s = firm_summary(&subject(Stage::Rejection), &cohort, d(TODAY), WINDOW);
        assert_eq!(s.recent_responses_at_current_stage, 2);
    }

    #[test]
    fn start_dates_take_cohort_minimums() {
        let mut early = cohort_row("u1", Stage::CallbackInvite);
        early.screener_date = Some(d("2025-07-05"));
        early.callback_date = Some(d("2025-07-20"));

        let mut late = cohort_row("u2", Stage::Offer);
        late.screener_date = Some(d("2025-07-10"));
        late.callback_date = Some(d("2025-07-25"));
        late.callback_response_date = Some(d("2025-08-01"));

        // Callback response on a non-offer row must not count as an offer date
        let mut rejected = cohort_row("u3", Stage::Rejection);
        rejected.callback_response_date = Some(d("2025-07-15"));

        let cohort = vec![early, late, rejected];
        let s = firm_summary(&subject(Stage::Offer), &cohort, d(TODAY), WINDOW);

        assert_eq!(s.start_dates.screener_start, Some(d("2025-07-05")));
        assert_eq!(s.start_dates.callback_start, Some(d("2025-07-20")));
        assert_eq!(s.start_dates.offer_start, Some(d("2025-08-01")));
    }

    #[test]
    fn blank_firm_yields_placeholder() {
        let mut app = subject(Stage::SubmittedApplication);
        app.firm = None;
        let s = firm_summary(&app, &[], d(TODAY), WINDOW);
        assert_eq!(s.current_stage, "Firm not specified");
        assert_eq!(s.total_applications, 0);

        let direct = empty_summary();
        assert_eq!(direct.current_stage, "Firm not specified");
    }
}
