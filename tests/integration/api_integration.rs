/// End-to-end tests through the HTTP router
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use habit_rules::*;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::util::ServiceExt; // for `oneshot`

#[cfg(test)]
mod api_integration_tests {
    use super::*;

    const OWNER: i64 = 1;
    const OTHER: i64 = 2;

    fn test_server() -> (HabitServer, NamedTempFile) {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = HabitServer::new(temp_file.path().to_path_buf(), ServerConfig::default())
            .expect("Failed to create server");
        (server, temp_file)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn groceries() -> Value {
        json!({
            "place": "Store",
            "time": "18:00:00",
            "action": "Buy groceries",
            "duration": 60,
            "periodicity": 1,
            "sunday": true,
            "monday": true,
            "tuesday": true,
            "wednesday": true,
            "thursday": true,
            "friday": true,
            "saturday": true
        })
    }

    fn bath() -> Value {
        json!({
            "place": "Home",
            "time": "21:00:00",
            "action": "Take a bath",
            "duration": 120,
            "periodicity": 1,
            "is_nice": true
        })
    }

    async fn create(app: &Router, user: i64, body: Value) -> Value {
        let (status, habit) = send(app, "POST", "/habits/create/", Some(user), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", habit);
        habit
    }

    fn rules(body: &Value) -> Vec<String> {
        body["errors"]
            .as_array()
            .expect("rejection body")
            .iter()
            .map(|v| v["rule"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_create_echoes_fields() {
        let (server, _db) = test_server();
        let app = server.router();

        let habit = create(&app, OWNER, groceries()).await;
        assert_eq!(habit["owner"], OWNER);
        assert_eq!(habit["place"], "Store");
        assert_eq!(habit["time"], "18:00:00");
        assert_eq!(habit["action"], "Buy groceries");
        assert_eq!(habit["duration"], 60);
        assert_eq!(habit["periodicity"], 1);
        assert_eq!(habit["friday"], true);
        assert_eq!(habit["is_nice"], false);
        assert_eq!(habit["is_public"], true);

        // Stored record matches what was returned
        let uri = format!("/habits/{}/", habit["id"].as_str().unwrap());
        let (status, stored) = send(&app, "GET", &uri, Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored, habit);
    }

    #[tokio::test]
    async fn test_create_reports_both_bounds() {
        let (server, _db) = test_server();
        let app = server.router();

        let mut body = groceries();
        body["duration"] = json!(180);
        body["periodicity"] = json!(8);

        let (status, errors) = send(&app, "POST", "/habits/create/", Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["periodicity_bound", "duration_bound"]);
        assert_eq!(errors["errors"][0]["kind"], "field_bound");
    }

    #[tokio::test]
    async fn test_create_without_weekdays() {
        let (server, _db) = test_server();
        let app = server.router();

        let mut body = groceries();
        for day in ["sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday"] {
            body[day] = json!(false);
        }

        let (status, errors) = send(&app, "POST", "/habits/create/", Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["weekday_coverage"]);
        assert_eq!(errors["errors"][0]["kind"], "coverage");
    }

    #[tokio::test]
    async fn test_nice_habit_with_prize() {
        let (server, _db) = test_server();
        let app = server.router();

        let mut body = bath();
        body["prize"] = json!("cognac");

        let (status, errors) = send(&app, "POST", "/habits/create/", Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["nice_habit_purity"]);
        assert_eq!(errors["errors"][0]["kind"], "relationship");
    }

    #[tokio::test]
    async fn test_related_and_prize_are_exclusive() {
        let (server, _db) = test_server();
        let app = server.router();
        let nice = create(&app, OWNER, bath()).await;

        let mut body = groceries();
        body["related"] = nice["id"].clone();
        body["prize"] = json!("more cognac");

        let (status, errors) = send(&app, "POST", "/habits/create/", Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["reward_exclusivity"]);
    }

    #[tokio::test]
    async fn test_related_must_point_at_nice_habit() {
        let (server, _db) = test_server();
        let app = server.router();
        let ordinary = create(&app, OWNER, groceries()).await;

        let mut body = groceries();
        body["action"] = json!("Clean the flat");
        body["related"] = ordinary["id"].clone();

        let (status, errors) = send(&app, "POST", "/habits/create/", Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["related_must_be_nice"]);

        // Nothing was written
        let (_, list) = send(&app, "GET", "/habits/list/", Some(OWNER), None).await;
        assert_eq!(list["count"], 1);
    }

    #[tokio::test]
    async fn test_related_to_unknown_habit() {
        let (server, _db) = test_server();
        let app = server.router();
        let foreign_nice = create(&app, OTHER, bath()).await;

        let mut body = groceries();
        body["related"] = foreign_nice["id"].clone();

        let (status, errors) = send(&app, "POST", "/habits/create/", Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["related_reference"]);
        assert_eq!(errors["errors"][0]["kind"], "reference");
    }

    #[tokio::test]
    async fn test_related_to_nice_habit_is_accepted() {
        let (server, _db) = test_server();
        let app = server.router();
        let nice = create(&app, OWNER, bath()).await;

        let mut body = groceries();
        body["related"] = nice["id"].clone();
        let habit = create(&app, OWNER, body).await;
        assert_eq!(habit["related"], nice["id"]);
        assert!(habit["prize"].is_null());
    }

    #[tokio::test]
    async fn test_list_and_public_list() {
        let (server, _db) = test_server();
        let app = server.router();

        create(&app, OWNER, groceries()).await;
        let mut private = groceries();
        private["action"] = json!("Clean the flat");
        private["is_public"] = json!(false);
        create(&app, OWNER, private).await;

        let (status, list) = send(&app, "GET", "/habits/list/", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["count"], 2);
        assert_eq!(list["results"].as_array().unwrap().len(), 2);

        // Same answer whoever asks, or nobody at all
        for user in [Some(OWNER), Some(OTHER), None] {
            let (status, public) = send(&app, "GET", "/habits/public/", user, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(public["count"], 1);
            assert_eq!(public["results"][0]["action"], "Buy groceries");
        }

        let (_, other) = send(&app, "GET", "/habits/list/", Some(OTHER), None).await;
        assert_eq!(other["count"], 0);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (server, _db) = test_server();
        let app = server.router();
        for action in ["One", "Two", "Three"] {
            let mut body = groceries();
            body["action"] = json!(action);
            create(&app, OWNER, body).await;
        }

        let (status, page) =
            send(&app, "GET", "/habits/list/?page=2&page_size=2", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 3);
        assert_eq!(page["results"][0]["action"], "Three");

        let (status, _) = send(&app, "GET", "/habits/list/?page=first", Some(OWNER), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_habit() {
        let (server, _db) = test_server();
        let app = server.router();
        let habit = create(&app, OWNER, groceries()).await;
        let uri = format!("/habits/{}/update/", habit["id"].as_str().unwrap());

        let body = json!({
            "place": "Gym",
            "time": "19:00:00",
            "action": "Work out",
            "duration": 120
        });
        let (status, updated) = send(&app, "PUT", &uri, Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["owner"], OWNER);
        assert_eq!(updated["place"], "Gym");
        assert_eq!(updated["time"], "19:00:00");
        assert_eq!(updated["duration"], 120);
        assert_eq!(updated["periodicity"], 1);
        assert_eq!(updated["created_at"], habit["created_at"]);

        // The merged state is what gets validated
        let (status, errors) =
            send(&app, "PUT", &uri, Some(OWNER), Some(json!({ "duration": 121 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["duration_bound"]);

        // Someone else can't touch it
        let (status, _) = send(&app, "PUT", &uri, Some(OTHER), Some(json!({ "place": "Bar" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_habit() {
        let (server, _db) = test_server();
        let app = server.router();
        let habit = create(&app, OWNER, groceries()).await;
        let id = habit["id"].as_str().unwrap().to_string();

        let (status, _) =
            send(&app, "DELETE", &format!("/habits/{}/delete/", id), Some(OTHER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send(&app, "DELETE", &format!("/habits/{}/delete/", id), Some(OWNER), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (status, body) = send(&app, "GET", &format!("/habits/{}/", id), Some(OWNER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn test_referenced_nice_habit_cannot_be_deleted() {
        let (server, _db) = test_server();
        let app = server.router();
        let nice = create(&app, OWNER, bath()).await;
        let nice_id = nice["id"].as_str().unwrap().to_string();

        let mut body = groceries();
        body["related"] = json!(nice_id);
        create(&app, OWNER, body).await;

        let uri = format!("/habits/{}/delete/", nice_id);
        let (status, errors) = send(&app, "DELETE", &uri, Some(OWNER), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["referenced_nice_habit"]);

        let uri = format!("/habits/{}/update/", nice_id);
        let (status, errors) =
            send(&app, "PUT", &uri, Some(OWNER), Some(json!({ "is_nice": false }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rules(&errors), vec!["referenced_nice_habit"]);
    }

    #[tokio::test]
    async fn test_owner_endpoints_require_caller() {
        let (server, _db) = test_server();
        let app = server.router();

        let (status, body) = send(&app, "POST", "/habits/create/", None, Some(groceries())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthenticated");

        let (status, _) = send(&app, "GET", "/habits/list/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unparseable_time_is_invalid_payload() {
        let (server, _db) = test_server();
        let app = server.router();

        let mut body = groceries();
        body["time"] = json!("evening");

        let (status, errors) = send(&app, "POST", "/habits/create/", Some(OWNER), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(errors["error"]["code"], "invalid_payload");
    }

    #[tokio::test]
    async fn test_habits_survive_restart() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();

        let server = HabitServer::new(db_path.clone(), ServerConfig::default()).unwrap();
        let habit = create(&server.router(), OWNER, groceries()).await;
        drop(server);

        let server = HabitServer::new(db_path, ServerConfig::default()).unwrap();
        let uri = format!("/habits/{}/", habit["id"].as_str().unwrap());
        let (status, stored) = send(&server.router(), "GET", &uri, Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored, habit);
    }
}
