mod common;
use common::{dt, team_info_page};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wodlogger::crawler::fetcher::parse_attendees;
use wodlogger::crawler::{AttendeeFetcher, HttpClient};
use wodlogger::models::{AuthenticatedSession, SessionDescriptor};

fn session(id: &str) -> SessionDescriptor {
    SessionDescriptor {
        class_type: "CrossFit".into(),
        event_time: dt("2023-06-12T17:00:00"),
        external_id: id.into(),
    }
}

fn fetcher_for(server: &MockServer) -> AttendeeFetcher {
    let http = HttpClient::builder()
        .base_backoff(Duration::from_millis(5))
        .max_attempts(3)
        .session(&AuthenticatedSession {
            cookies: vec![("ASP.NET_SessionId".into(), "s3ss10n".into())],
            user_agent: "ScriptedBrowser/1.0".into(),
        })
        .expect("session headers")
        .build()
        .expect("http client");
    AttendeeFetcher::new(http, format!("{}/Public/TeamInfo/?teamid={{id}}", server.uri()))
}

#[test]
fn waitlisted_rows_produce_no_record() {
    let body = team_info_page(&[
        (1, "Anna Holm", "01-06-2023 08:12:45", None),
        (2, "Bo Berg", "02-06-2023 21:03:10", Some("Venteliste")),
    ]);

    let records = parse_attendees(&body, &session("1001"));

    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.name, "Anna Holm");
    assert_eq!(r.rank, 1);
    assert_eq!(r.signup_time, "01-06-2023 08:12:45");
    assert_eq!(r.class_type, "CrossFit");
    assert_eq!(r.event_time, dt("2023-06-12T17:00:00"));
}

#[test]
fn an_empty_waitlist_cell_is_not_a_marker() {
    let body = team_info_page(&[(3, "Carl Dahl", "03-06-2023 10:00:00", Some("&nbsp;"))]);

    let records = parse_attendees(&body, &session("1001"));

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].rank, 3);
}

#[test]
fn names_are_entity_decoded() {
    let body = team_info_page(&[
        (1, "S&#248;ren &amp; Co", "01-06-2023 08:00:00", None),
        (2, "<a href=\"/m/7\">Ib  Juul</a>", "01-06-2023 09:00:00", None),
    ]);

    let names: Vec<String> = parse_attendees(&body, &session("1"))
        .into_iter()
        .map(|r| r.name)
        .collect();

    assert_eq!(names, vec!["Søren & Co".to_string(), "Ib Juul".to_string()]);
}

#[test]
fn malformed_markup_yields_nothing() {
    assert!(parse_attendees("", &session("1")).is_empty());
    assert!(parse_attendees("<html><body>Holdet er aflyst</body></html>", &session("1")).is_empty());
    let bad_time = team_info_page(&[(1, "Anna Holm", "2023-06-01 08:12", None)]);
    assert!(parse_attendees(&bad_time, &session("1")).is_empty());
    let impossible = team_info_page(&[(1, "Anna Holm", "31-02-2023 08:12:45", None)]);
    assert!(parse_attendees(&impossible, &session("1")).is_empty());
}

#[tokio::test]
async fn fetches_with_the_browser_cookies_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Public/TeamInfo/"))
        .and(query_param("teamid", "1001"))
        .and(header("cookie", "ASP.NET_SessionId=s3ss10n"))
        .and(header("user-agent", "ScriptedBrowser/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(team_info_page(&[
            (1, "Anna Holm", "01-06-2023 08:12:45", None),
            (2, "Bo Berg", "02-06-2023 21:03:10", None),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = fetcher_for(&server).fetch(&session("1001")).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].name, "Bo Berg");
}

#[tokio::test]
async fn retries_server_errors_until_success() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    Mock::given(method("GET"))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if attempts_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_string(team_info_page(&[(
                    1,
                    "Anna Holm",
                    "01-06-2023 08:12:45",
                    None,
                )]))
            }
        })
        .expect(3)
        .mount(&server)
        .await;

    let records = fetcher_for(&server).fetch(&session("1001")).await;

    assert_eq!(records.len(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn a_failing_session_does_not_stop_the_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("teamid", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(team_info_page(&[(
            1,
            "Anna Holm",
            "01-06-2023 08:12:45",
            None,
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("teamid", "2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("teamid", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("teamid", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(team_info_page(&[(
            1,
            "Bo Berg",
            "01-06-2023 09:00:00",
            None,
        )])))
        .mount(&server)
        .await;

    let records = fetcher_for(&server)
        .with_concurrency(3)
        .fetch_all(vec![session("1"), session("2"), session("3"), session("4")])
        .await;

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Anna Holm", "Bo Berg"]);
}

#[tokio::test]
async fn an_unreachable_server_yields_no_records() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let http = HttpClient::builder()
        .base_backoff(Duration::from_millis(1))
        .max_attempts(2)
        .build()
        .expect("http client");
    let fetcher = AttendeeFetcher::new(http, format!("http://{addr}/TeamInfo/?teamid={{id}}"));

    assert!(fetcher.fetch(&session("1")).await.is_empty());
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log lock")).to_string()
    }
}

#[test]
fn rejected_rows_are_logged_with_their_session() {
    let body = team_info_page(&[
        (0, "Nul Rank", "01-06-2023 08:00:00", None),
        (2, "", "01-06-2023 08:00:00", None),
        (3, "Bad Date", "31-02-2023 08:00:00", None),
        (4, "Anna Holm", "01-06-2023 08:00:00", Some("Venteliste")),
        (5, "Bo Berg", "01-06-2023 08:00:00", None),
    ]);
    let captured = CapturedLog::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let records = tracing::subscriber::with_default(subscriber, || {
        parse_attendees(&body, &session("4242"))
    });

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Bo Berg"]);
    let out = captured.text();
    assert_eq!(out.matches("attendee row rejected").count(), 3, "{out}");
    assert!(out.contains("Nul Rank"), "{out}");
    assert!(out.contains("Bad Date"), "{out}");
    assert!(out.contains("signup time"), "{out}");
    assert!(out.contains("waitlisted, skipped"), "{out}");
    assert!(out.contains("4242"), "{out}");
}

#[tokio::test]
async fn a_connection_dropped_mid_request_is_not_retried() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    let http = HttpClient::builder()
        .base_backoff(Duration::from_millis(1))
        .max_attempts(3)
        .build()
        .expect("http client");
    let fetcher = AttendeeFetcher::new(http, format!("http://{addr}/TeamInfo/?teamid={{id}}"));

    assert!(fetcher.fetch(&session("1")).await.is_empty());
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
