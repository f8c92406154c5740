#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::tests::support::{bare_request, body_json, json_request, register_and_login, setup_test_app};

    #[tokio::test]
    async fn test_create_application_derives_day_counts() {
        let (app, _, _db) = setup_test_app().await;
        let token = register_and_login(&app, "alex@law.example.edu").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/applications",
                Some(&token),
                json!({
                    "firm": "Cravath",
                    "city": "New York",
                    "applied_date": "2025-07-01",
                    "applied_response_date": "2025-07-11",
                    // day counts sent by the client must be ignored
                    "applied_to_response": 999,
                    "stage": "Screener Invite"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["application"]["firm"], "Cravath");
        assert_eq!(body["application"]["applied_to_response"], 10);
        assert!(body["application"]["screener_to_response"].is_null());
        assert_eq!(body["application"]["stage"], "Screener Invite");
        assert_eq!(body["summary_stats"]["total_applications"], 1);
        assert_eq!(body["summary_stats"]["current_stage"], "Screener Invite");
    }

    #[tokio::test]
    async fn test_create_without_firm_gets_placeholder_summary() {
        let (app, _, _db) = setup_test_app().await;
        let token = register_and_login(&app, "blank@law.example.edu").await;

        let response = app
            .oneshot(json_request("POST", "/applications", Some(&token), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["application"]["stage"], "Not Submitted");
        assert_eq!(body["summary_stats"]["current_stage"], "Firm not specified");
        assert_eq!(body["summary_stats"]["total_applications"], 0);
    }

    #[tokio::test]
    async fn test_duplicate_firm_city_conflicts() {
        let (app, _, _db) = setup_test_app().await;
        let token = register_and_login(&app, "dupapp@law.example.edu").await;

        let payload = json!({ "firm": "Skadden", "city": "Chicago" });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/applications", Some(&token), payload.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response =
            app.oneshot(json_request("POST", "/applications", Some(&token), payload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_date_order_is_validated() {
        let (app, _, _db) = setup_test_app().await;
        let token = register_and_login(&app, "dates@law.example.edu").await;

        // Response before the application went out
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/applications",
                Some(&token),
                json!({
                    "firm": "Latham",
                    "applied_date": "2025-07-10",
                    "applied_response_date": "2025-07-01"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Callback scheduled before the screener
        let response = app
            .oneshot(json_request(
                "POST",
                "/applications",
                Some(&token),
                json!({
                    "firm": "Latham",
                    "screener_date": "2025-07-20",
                    "callback_date": "2025-07-15"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_is_404_when_empty_then_returns_rows() {
        let (app, _, _db) = setup_test_app().await;
        let token = register_and_login(&app, "list@law.example.edu").await;

        let response =
            app.clone().oneshot(bare_request("GET", "/applications/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        for firm in ["A", "B", "C"] {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/applications", Some(&token), json!({ "firm": firm })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response =
            app.clone().oneshot(bare_request("GET", "/applications/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let response = app
            .oneshot(bare_request("GET", "/applications/me?limit=2", Some(&token)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_single_application_is_owner_scoped() {
        let (app, _, _db) = setup_test_app().await;
        let owner = register_and_login(&app, "owner@law.example.edu").await;
        let other = register_and_login(&app, "other@law.example.edu").await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/applications", Some(&owner), json!({ "firm": "Sidley" })))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["application"]["application_id"].as_i64().unwrap();

        let uri = format!("/applications/me/{}", id);
        let response = app.clone().oneshot(bare_request("GET", &uri, Some(&owner))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Someone else's record is indistinguishable from a missing one
        let response = app.oneshot(bare_request("GET", &uri, Some(&other))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let (app, _, _db) = setup_test_app().await;
        let owner = register_and_login(&app, "owner2@law.example.edu").await;
        let other = register_and_login(&app, "other2@law.example.edu").await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/applications", Some(&owner), json!({ "firm": "Kirkland" })))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["application"]["application_id"].as_i64().unwrap();

        let uri = format!("/applications/{}", id);
        let response = app
            .oneshot(json_request("PUT", &uri, Some(&other), json!({ "stage": "Offer" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_recomputes_day_counts_and_stats() {
        let (app, _, _db) = setup_test_app().await;
        let token = register_and_login(&app, "update@law.example.edu").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/applications",
                Some(&token),
                json!({ "firm": "Jones Day", "applied_date": "2025-07-01" }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["application"]["application_id"].as_i64().unwrap();
        assert!(body["application"]["applied_to_response"].is_null());

        let uri = format!("/applications/{}", id);
        let response = app
            .oneshot(json_request(
                "PUT",
                &uri,
                Some(&token),
                json!({ "applied_response_date": "2025-07-15", "stage": "Offer" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["application"]["applied_to_response"], 14);
        assert_eq!(body["application"]["stage"], "Offer");
        assert_eq!(body["summary_stats"]["successful_applications"], 1);
        assert_eq!(body["summary_stats"]["success_rate"], 100.0);
    }

    #[tokio::test]
    async fn test_delete_application() {
        let (app, _, _db) = setup_test_app().await;
        let token = register_and_login(&app, "delete@law.example.edu").await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/applications", Some(&token), json!({ "firm": "WLRK" })))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["application"]["application_id"].as_i64().unwrap();

        let uri = format!("/applications/{}", id);
        let response = app.clone().oneshot(bare_request("DELETE", &uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Application deleted successfully");

        let response = app.oneshot(bare_request("DELETE", &uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_total_is_public_and_counts_everyone() {
        let (app, _, _db) = setup_test_app().await;

        let response =
            app.clone().oneshot(bare_request("GET", "/applications/total", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_applications"], 0);

        let a = register_and_login(&app, "tot-a@law.example.edu").await;
        let b = register_and_login(&app, "tot-b@law.example.edu").await;
        for (token, firm) in [(&a, "F1"), (&a, "F2"), (&b, "F1")] {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/applications", Some(token), json!({ "firm": firm })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app.oneshot(bare_request("GET", "/applications/total", None)).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total_applications"], 3);
        assert_eq!(body["total_users"], 2);
    }

    #[tokio::test]
    async fn test_cohort_stats_span_users() {
        let (app, _, _db) = setup_test_app().await;
        let a = register_and_login(&app, "cohort-a@law.example.edu").await;
        let b = register_and_login(&app, "cohort-b@law.example.edu").await;

        // Two users applied to the same firm; one has an offer
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/applications",
                Some(&a),
                json!({ "firm": "Debevoise", "stage": "Offer" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(json_request(
                "POST",
                "/applications",
                Some(&b),
                json!({ "firm": "Debevoise", "stage": "Submitted Application" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;

        let stats = &body["summary_stats"];
        assert_eq!(stats["total_users_for_firm"], 2);
        assert_eq!(stats["total_applications"], 2);
        assert_eq!(stats["successful_applications"], 1);
        assert_eq!(stats["success_rate"], 50.0);
    }
}
