//! Integration tests for the Ammora client.
//! These tests run the HTTP client against a scripted local server.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use ammora::chat::{Message, Renderer, SubmitOutcome};
    use ammora::{
        Ammora, App, ChatBackend, ChatParams, FileSessionStore, MessageRole, Preferences,
        PreferencesParams, Profile, RegisterParams, Screen, Session, SessionStore,
    };

    #[derive(Clone)]
    struct Route {
        method: &'static str,
        path: &'static str,
        status: u16,
        body: String,
        delay: Option<Duration>,
    }

    fn route(method: &'static str, path: &'static str, status: u16, body: &str) -> Route {
        Route {
            method,
            path,
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    #[derive(Clone, Debug)]
    struct Recorded {
        method: String,
        path: String,
        body: serde_json::Value,
    }

    struct MockServer {
        base_url: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl MockServer {
        async fn start(routes: Vec<Route>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}/api/", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));
            let recorded = requests.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = routes.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move { handle(stream, routes, recorded).await });
                }
            });
            Self { base_url, requests }
        }

        fn client(&self) -> Ammora {
            self.client_with_timeout(Duration::from_secs(5))
        }

        fn client_with_timeout(&self, timeout: Duration) -> Ammora {
            Ammora::with_options(Some(self.base_url.clone()), Some(timeout)).unwrap()
        }

        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn handle(mut stream: TcpStream, routes: Vec<Route>, recorded: Arc<Mutex<Vec<Recorded>>>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.trim().parse::<usize>().unwrap())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let mut request_line = head.lines().next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or_default().to_string();
        let path = request_line.next().unwrap_or_default().to_string();
        let body = serde_json::from_slice(&buf[header_end..]).unwrap_or(serde_json::Value::Null);
        recorded.lock().unwrap().push(Recorded {
            method: method.clone(),
            path: path.clone(),
            body,
        });

        let (status, body, delay) = routes
            .iter()
            .find(|r| r.method == method && r.path == path)
            .map(|r| (r.status, r.body.clone(), r.delay))
            .unwrap_or((404, r#"{"error": "Not found"}"#.to_string(), None));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let response = format!(
            "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    /// Renderer that draws nothing.
    struct Quiet;

    impl Renderer for Quiet {
        fn show_screen(&mut self, _: Screen, _: Option<&Session>) {}
        fn print_welcome(&mut self, _: &Session) {}
        fn print_message(&mut self, _: &Message) {}
        fn show_typing(&mut self) {}
        fn hide_typing(&mut self) {}
        fn print_profile(&mut self, _: &Profile) {}
        fn print_error(&mut self, _: &str) {}
        fn print_info(&mut self, _: &str) {}
    }

    #[tokio::test]
    async fn register_posts_username_and_age() {
        let server = MockServer::start(vec![route(
            "POST",
            "/api/user/register",
            201,
            r#"{"message": "User registered successfully", "user_id": "u1", "username": "Alex"}"#,
        )])
        .await;

        let user = server
            .client()
            .register(RegisterParams::new("Alex", 30))
            .await
            .unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.username, "Alex");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].body,
            serde_json::json!({"username": "Alex", "age": 30})
        );
    }

    #[tokio::test]
    async fn chat_and_history_round_trip() {
        let server = MockServer::start(vec![
            route("POST", "/api/chat", 200, r#"{"message": "Hi Alex!", "model": "m"}"#),
            route(
                "GET",
                "/api/messages/u1",
                200,
                r#"{"messages": [{"role": "user", "content": "Hi"}, {"role": "assistant", "content": "Hello!"}]}"#,
            ),
        ])
        .await;
        let client = server.client();

        let reply = client.chat(ChatParams::new("u1", "Hello")).await.unwrap();
        assert_eq!(reply.message, "Hi Alex!");

        let history = client.history("u1").await.unwrap();
        let roles: Vec<_> = history.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);

        let requests = server.requests();
        assert_eq!(
            requests[0].body,
            serde_json::json!({"user_id": "u1", "message": "Hello"})
        );
        assert_eq!(requests[1].method, "GET");
    }

    #[tokio::test]
    async fn preferences_ignore_response_body() {
        let server = MockServer::start(vec![route(
            "POST",
            "/api/user/preferences",
            200,
            "not json at all",
        )])
        .await;
        let preferences = Preferences::new().with_love_language("words");
        server
            .client()
            .save_preferences(PreferencesParams::new("u1", preferences))
            .await
            .unwrap();
        assert_eq!(
            server.requests()[0].body["preferences"]["love_language"],
            "words"
        );
    }

    #[tokio::test]
    async fn server_errors_keep_their_message() {
        let server = MockServer::start(vec![
            route("POST", "/api/chat", 404, r#"{"error": "User not found"}"#),
            route("GET", "/api/user/u1", 503, r#"{"detail": "maintenance"}"#),
        ])
        .await;
        let client = server.client();

        let err = client.chat(ChatParams::new("u1", "Hello")).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.user_message("Failed to send message"), "User not found");

        let err = client.profile("u1").await.unwrap_err();
        assert!(err.is_server_reported());
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(err.user_message("Failed to load profile"), "Failed to load profile");
    }

    #[tokio::test]
    async fn html_error_pages_are_transport_failures() {
        let server = MockServer::start(vec![
            route("POST", "/api/chat", 502, "<html>Bad Gateway</html>"),
            route("GET", "/api/user/u1", 500, "<html>Internal Server Error</html>"),
        ])
        .await;
        let client = server.client();

        let err = client.chat(ChatParams::new("u1", "Hello")).await.unwrap_err();
        assert!(!err.is_server_reported());
        assert_eq!(
            err.user_message("Failed to send message"),
            "Failed to send message. Please try again."
        );

        let err = client.profile("u1").await.unwrap_err();
        assert!(!err.is_server_reported());
        assert_eq!(
            err.user_message("Failed to load profile"),
            "Failed to load profile. Please try again."
        );
    }

    #[tokio::test]
    async fn unparseable_chat_reply_is_a_transport_failure() {
        let server = MockServer::start(vec![route("POST", "/api/chat", 200, "OK")]).await;

        let err = server
            .client()
            .chat(ChatParams::new("u1", "Hello"))
            .await
            .unwrap_err();
        assert!(!err.is_server_reported());
        assert_eq!(
            err.user_message("Failed to send message"),
            "Failed to send message. Please try again."
        );
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let mut slow = route("POST", "/api/chat", 200, r#"{"message": "late"}"#);
        slow.delay = Some(Duration::from_secs(3));
        let server = MockServer::start(vec![slow]).await;

        let err = server
            .client_with_timeout(Duration::from_millis(200))
            .chat(ChatParams::new("u1", "Hello"))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(
            err.user_message("Failed to send message"),
            "Failed to send message. Please try again."
        );
    }

    #[tokio::test]
    async fn app_walks_every_screen() {
        let server = MockServer::start(vec![
            route(
                "POST",
                "/api/user/register",
                201,
                r#"{"user_id": "u1", "username": "Alex"}"#,
            ),
            route("POST", "/api/user/preferences", 200, r#"{"message": "ok"}"#),
            route("POST", "/api/chat", 200, r#"{"message": "Hi Alex!"}"#),
        ])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        let mut app = App::new(server.client(), store, Box::new(Quiet));

        assert_eq!(app.start().await, Screen::Onboarding);
        app.register("Alex", "30").await.unwrap();
        assert_eq!(app.screen(), Screen::Preferences);
        app.save_preferences(Preferences::new().with_relationship_style("friend"))
            .await
            .unwrap();
        assert_eq!(app.screen(), Screen::Chat);
        assert!(matches!(
            app.submit("Hello").await.unwrap(),
            SubmitOutcome::Replied
        ));
        app.pipeline().with_transcript(|t| assert_eq!(t.messages().len(), 2));

        assert!(app.new_chat(true).unwrap());
        assert_eq!(app.screen(), Screen::Onboarding);
        assert!(app.store().restore().is_none());
    }

    #[test]
    fn stored_session_survives_restart() {
        tokio_test::block_on(async {
            let server = MockServer::start(vec![
                route("POST", "/api/user/register", 201, r#"{"user_id": "u7", "username": "Sam"}"#),
                route(
                    "GET",
                    "/api/messages/u7",
                    200,
                    r#"{"messages": [{"role": "assistant", "content": "Welcome back"}]}"#,
                ),
            ])
            .await;
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("session.json");

            let mut first = App::new(server.client(), FileSessionStore::new(&path), Box::new(Quiet));
            first.start().await;
            first.register("Sam", "41").await.unwrap();
            drop(first);

            let mut second = App::new(server.client(), FileSessionStore::new(&path), Box::new(Quiet));
            assert_eq!(second.start().await, Screen::Chat);
            assert_eq!(second.session(), Some(&Session::new("u7", "Sam")));
            second.pipeline().with_transcript(|t| {
                assert_eq!(t.messages().len(), 1);
                assert_eq!(t.messages()[0].content, "Welcome back");
            });
        });
    }

    #[tokio::test]
    async fn live_registration() {
        // Talks to a real deployment only when AMMORA_LIVE_URL is set
        let Ok(base_url) = std::env::var("AMMORA_LIVE_URL") else {
            eprintln!("Skipping test: AMMORA_LIVE_URL not set");
            return;
        };
        let client = Ammora::with_options(Some(base_url), None).expect("Failed to create client");
        let user = client.register(RegisterParams::new("integration-test", 30)).await;
        assert!(user.is_ok(), "Registration should succeed against a live server");
    }
}
