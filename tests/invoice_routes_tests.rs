mod common;

#[cfg(test)]
mod invoice_routes_tests {
    use super::common::*;
    use actix_web::{http::StatusCode, test, web, App};
    use frame_orders_server::api_config;
    use serde_json::Value;

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state)
                    .service(web::scope("/api").configure(api_config)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_preview_renders_rows_and_totals() {
        let config = test_config(views_dir(), "wkhtmltopdf");
        let state = test_state(MockRecordStore::new(), RecordingMailer::new(), &config);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/invoice/preview")
            .insert_header(auth_header())
            .set_json(sample_payload())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));

        let body = test::read_body(resp).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Item 1"));
        assert!(html.contains("£100.00"));
        assert!(html.contains("Mount"));
        assert!(html.contains("£20.00"));
        assert!(html.contains("£144.00"));
        assert!(html.contains("15/06/2024"));
        assert!(html.contains("Please quote your invoice number in reference."));
    }

    #[actix_web::test]
    async fn test_preview_renders_with_null_sections() {
        let config = test_config(views_dir(), "wkhtmltopdf");
        let state = test_state(MockRecordStore::new(), RecordingMailer::new(), &config);
        let app = app!(state);

        let mut payload = sample_payload();
        payload["customer"] = Value::Null;
        payload["order"] = Value::Null;
        payload["totals"] = Value::Null;

        let req = test::TestRequest::post()
            .uri("/api/invoice/preview")
            .insert_header(auth_header())
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("£100.00"));
    }

    #[actix_web::test]
    async fn test_preview_rejects_malformed_json() {
        let config = test_config(views_dir(), "wkhtmltopdf");
        let state = test_state(MockRecordStore::new(), RecordingMailer::new(), &config);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/invoice/preview")
            .insert_header(auth_header())
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"customer\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Invalid payload.");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .starts_with("json decode failed"));
    }

    #[actix_web::test]
    async fn test_preview_rejects_empty_body() {
        let config = test_config(views_dir(), "wkhtmltopdf");
        let state = test_state(MockRecordStore::new(), RecordingMailer::new(), &config);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/invoice/preview")
            .insert_header(auth_header())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["details"], "empty body");
    }

    #[actix_web::test]
    async fn test_preview_requires_token() {
        let config = test_config(views_dir(), "wkhtmltopdf");
        let state = test_state(MockRecordStore::new(), RecordingMailer::new(), &config);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/invoice/preview")
            .set_json(sample_payload())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_preview_reports_template_path_when_missing() {
        let empty_views = tempfile::tempdir().unwrap();
        let config = test_config(empty_views.path().to_path_buf(), "wkhtmltopdf");
        let state = test_state(MockRecordStore::new(), RecordingMailer::new(), &config);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/invoice/preview")
            .insert_header(auth_header())
            .set_json(sample_payload())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Failed to render invoice.");
        assert!(body["path"]
            .as_str()
            .unwrap()
            .ends_with("invoice.preview.html"));
    }
}
