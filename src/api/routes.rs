use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    classics::{create_classic, list_classics},
    duels::{create_duel, get_duel, list_completed, list_pending, report_tournament_duel, respond_to_duel},
    notifications::{delete_notification, list_notifications},
    players::{get_me, get_players},
    tournaments::{get_tournament, join_tournament, list_round_games, list_rounds, list_tournaments},
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/players", get(get_players))
        .route("/api/players/me", get(get_me))
        .route("/api/classics", get(list_classics).post(create_classic))
        .route("/api/duels", post(create_duel))
        .route("/api/duels/completed", get(list_completed))
        .route("/api/duels/pending", get(list_pending))
        .route("/api/duels/:id", get(get_duel).patch(respond_to_duel))
        .route("/api/duels/:id/tournament", patch(report_tournament_duel))
        .route("/api/tournaments", get(list_tournaments))
        .route("/api/tournaments/:id", get(get_tournament))
        .route("/api/tournaments/:id/participations", post(join_tournament))
        .route("/api/tournaments/:id/rounds", get(list_rounds))
        .route("/api/tournaments/:id/round_games/:number", get(list_round_games))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/:id", delete(delete_notification))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::database::connection::test_pool;
    use crate::services::notifications::StoredNotifications;
    use crate::services::tournament::NewTournament;
    use crate::services::GameServices;

    struct TestApp {
        state: Arc<AppState>,
    }

    impl TestApp {
        fn new() -> Self {
            let config = AppConfig::new();
            let services = GameServices::new(&config, Arc::new(StoredNotifications));
            let state = Arc::new(AppState {
                pool: test_pool(),
                config,
                services,
            });
            Self { state }
        }

        fn register(&self, username: &str) -> String {
            let mut conn = self.state.pool.get().unwrap();
            let (_, token) = self.state.services.identity.register(&mut conn, username).unwrap();
            token.key
        }

        fn tournament(&self, max_players: i64) -> i64 {
            let mut conn = self.state.pool.get().unwrap();
            let request = NewTournament {
                name: "Spring Cup".into(),
                description: String::new(),
                max_players,
                word_length: 5,
            };
            self.state.services.tournaments.create(&mut conn, request).unwrap().id
        }

        async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header("Authorization", format!("Token {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = create_router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }
    }

    #[tokio::test]
    async fn requests_without_valid_token_are_rejected() {
        let app = TestApp::new();

        let (status, body) = app.call("GET", "/api/players/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = app.call("GET", "/api/players/me", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_requests_get_a_json_error() {
        let app = TestApp::new();
        let alice = app.register("alice");
        app.register("bob");

        let wrong_type = json!({
            "player2": "bob", "word": "plant",
            "player1_xp": "lots", "player1_time": 30, "player1_attempts": 2
        });
        let (status, body) = app.call("POST", "/api/duels", Some(&alice), Some(wrong_type)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("player1_xp"));

        let (status, body) = app.call("GET", "/api/duels/abc", Some(&alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn challenge_with_null_winner_is_rejected() {
        let app = TestApp::new();
        let alice = app.register("alice");
        app.register("bob");

        let challenge = json!({
            "player2": "bob", "word": "plant", "winner": null,
            "player1_xp": 10, "player1_time": 30, "player1_attempts": 2
        });
        let (status, body) = app.call("POST", "/api/duels", Some(&alice), Some(challenge)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn joining_unknown_tournament_is_a_bad_request() {
        let app = TestApp::new();
        let alice = app.register("alice");

        let (status, body) = app
            .call("POST", "/api/tournaments/999/participations", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Tournament does not exist.");

        let (status, _) = app.call("GET", "/api/tournaments/999", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn open_duel_round_trip() {
        let app = TestApp::new();
        let alice = app.register("alice");
        let bob = app.register("bob");

        let challenge = json!({
            "player2": "bob", "word": "Crane",
            "player1_xp": 120, "player1_time": 50, "player1_attempts": 3
        });
        let (status, duel) = app.call("POST", "/api/duels", Some(&alice), Some(challenge)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(duel["word"], "crane");
        assert_eq!(duel["winner"], Value::Null);
        let uri = format!("/api/duels/{}", duel["id"]);

        let (_, pending) = app.call("GET", "/api/duels/pending", Some(&bob), None).await;
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let answer = json!({"player2_xp": 80, "player2_time": 40, "player2_attempts": 4});
        let (status, body) = app.call("PATCH", &uri, Some(&bob), Some(answer.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["winner"], "alice");

        let (status, body) = app.call("PATCH", &uri, Some(&bob), Some(answer)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "This game already has a winner.");

        let (_, me) = app.call("GET", "/api/players/me", Some(&alice), None).await;
        assert_eq!(me["wins_pvp"], 1);
        assert_eq!(me["xp"], 120);

        let (_, completed) = app.call("GET", "/api/duels/completed", Some(&alice), None).await;
        assert_eq!(completed.as_array().unwrap().len(), 1);

        let (_, inbox) = app.call("GET", "/api/notifications", Some(&alice), None).await;
        assert!(inbox.as_array().unwrap().iter().any(|n| n["kind"] == "duel_result"));
    }

    #[tokio::test]
    async fn duel_visibility_and_ownership() {
        let app = TestApp::new();
        let alice = app.register("alice");
        app.register("bob");
        let eve = app.register("eve");

        let challenge = json!({
            "player2": "bob", "word": "plant",
            "player1_xp": 10, "player1_time": 30, "player1_attempts": 2
        });
        let (_, duel) = app.call("POST", "/api/duels", Some(&alice), Some(challenge)).await;
        let uri = format!("/api/duels/{}", duel["id"]);

        let (status, _) = app.call("GET", &uri, Some(&eve), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let answer = json!({"player2_xp": 80, "player2_time": 40, "player2_attempts": 4});
        let (status, _) = app.call("PATCH", &uri, Some(&eve), Some(answer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.call("GET", "/api/duels/9999", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn two_player_tournament_crowns_a_champion() {
        let app = TestApp::new();
        let alice = app.register("alice");
        let bob = app.register("bob");
        let id = app.tournament(2);

        let join = format!("/api/tournaments/{id}/participations");
        let (status, _) = app.call("POST", &join, Some(&alice), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = app.call("POST", &join, Some(&bob), None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, rounds) = app.call("GET", &format!("/api/tournaments/{id}/rounds"), Some(&alice), None).await;
        assert_eq!(rounds.as_array().unwrap().len(), 1);

        let (_, games) = app
            .call("GET", &format!("/api/tournaments/{id}/round_games/1"), Some(&alice), None)
            .await;
        let game = &games.as_array().unwrap()[0];
        let report_uri = format!("/api/duels/{}/tournament", game["id"]);
        let alice_is_player1 = game["player1"] == "alice";
        let (alice_prefix, bob_prefix) = if alice_is_player1 {
            ("player1", "player2")
        } else {
            ("player2", "player1")
        };

        let mut first = serde_json::Map::new();
        first.insert(format!("{alice_prefix}_xp"), json!(150));
        first.insert(format!("{alice_prefix}_time"), json!(30));
        first.insert(format!("{alice_prefix}_attempts"), json!(3));
        first.insert("word".into(), json!("crane"));
        let (status, body) = app.call("PATCH", &report_uri, Some(&alice), Some(Value::Object(first))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Game updated successfully.");

        let mut second = serde_json::Map::new();
        second.insert(format!("{bob_prefix}_xp"), json!(90));
        second.insert(format!("{bob_prefix}_time"), json!(45));
        second.insert(format!("{bob_prefix}_attempts"), json!(5));
        let (status, body) = app.call("PATCH", &report_uri, Some(&bob), Some(Value::Object(second))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["winner"], "alice");

        let (_, detail) = app.call("GET", &format!("/api/tournaments/{id}"), Some(&bob), None).await;
        assert_eq!(detail["state"], "complete");
        assert_eq!(detail["champion"], "alice");

        let (_, me) = app.call("GET", "/api/players/me", Some(&alice), None).await;
        assert_eq!(me["wins_tournament"], 1);
        assert_eq!(me["xp"], 150 + 1000);
    }

    #[tokio::test]
    async fn outsiders_cannot_inspect_the_bracket() {
        let app = TestApp::new();
        app.register("alice");
        let eve = app.register("eve");
        let id = app.tournament(4);

        let (status, _) = app
            .call("GET", &format!("/api/tournaments/{id}/rounds"), Some(&eve), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.call("GET", "/api/tournaments", Some(&eve), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["state"], "open");
    }

    #[tokio::test]
    async fn notifications_can_be_dismissed_by_owner_only() {
        let app = TestApp::new();
        let alice = app.register("alice");
        let bob = app.register("bob");

        let challenge = json!({
            "player2": "bob", "word": "plant",
            "player1_xp": 10, "player1_time": 30, "player1_attempts": 2
        });
        app.call("POST", "/api/duels", Some(&alice), Some(challenge)).await;

        let (_, inbox) = app.call("GET", "/api/notifications", Some(&bob), None).await;
        let notice_uri = format!("/api/notifications/{}", inbox[0]["id"]);

        let (status, _) = app.call("DELETE", &notice_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.call("DELETE", &notice_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn classic_sessions_are_recorded_for_the_caller() {
        let app = TestApp::new();
        let alice = app.register("alice");

        let session = json!({"word": "grape", "time_consumed": 70, "attempts": 4, "xp_gained": 50, "won": true});
        let (status, _) = app.call("POST", "/api/classics", Some(&alice), Some(session)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, history) = app.call("GET", "/api/classics", Some(&alice), None).await;
        assert_eq!(history.as_array().unwrap().len(), 1);

        let (_, players) = app.call("GET", "/api/players", Some(&alice), None).await;
        assert_eq!(players[0]["wins"], 1);
        assert_eq!(players[0]["xp"], 50);
    }
}
