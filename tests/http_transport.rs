//! Runs `PortalClient` against a small HTTP server on localhost.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use culearn_grades::config::Portal;
use culearn_grades::errors::FetchFailure;
use culearn_grades::utils::auth::{authenticate, session_cookie};
use culearn_grades::utils::http::{HttpClient, PortalClient};
use culearn_grades::utils::prompt::CredentialSource;

struct LocalPortal {
    base: String,
    requests: Receiver<String>,
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn reply(status: &str, headers: &[&str], body: &str) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n", status, body.len());
    for header in headers {
        out.push_str(header);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(body);
    out.into_bytes()
}

/// Serves one connection at a time; `handler` maps the raw request to a delay and raw reply.
fn serve<F>(handler: F) -> LocalPortal
where
    F: Fn(&str) -> (Duration, Vec<u8>) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/moodle", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let request = read_request(&mut stream);
            let (delay, response) = handler(&request);
            let _ = tx.send(request);
            thread::sleep(delay);
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        }
    });
    LocalPortal { base, requests: rx }
}

fn moodle(request: &str) -> (Duration, Vec<u8>) {
    let response = if request.starts_with("POST /moodle/login/index.php") {
        reply(
            "303 See Other",
            &[
                "Location: /moodle/my/",
                "Set-Cookie: MoodleSession=GOOD; path=/moodle/",
            ],
            r#"<html><body><a href="/moodle/login/index.php?testsession=2">Continue</a></body></html>"#,
        )
    } else if request.starts_with("GET /moodle/login/index.php?testsession=2") {
        reply("303 See Other", &["Location: /moodle/my/", "Set-Cookie: MoodleSession=ANON; path=/"], "")
    } else {
        reply(
            "200 OK",
            &["Set-Cookie: MoodleSession=ANON; path=/"],
            r#"<html><body><a href="/skip">Skip to main content</a></body></html>"#,
        )
    };
    (Duration::ZERO, response)
}

struct Once(Option<(String, String)>);

impl CredentialSource for Once {
    fn username(&mut self) -> Result<Option<String>> {
        Ok(self.0.as_ref().map(|(user, _)| user.clone()))
    }

    fn password(&mut self) -> Result<String> {
        Ok(self.0.take().map(|(_, password)| password).unwrap_or_default())
    }

    fn verbose(&mut self) -> Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn login_redirect_keeps_its_own_cookie_and_body() {
    let server = serve(moodle);
    let client = PortalClient::new().unwrap();
    let url = format!("{}/login/index.php", server.base);

    let response = client
        .post_form(&url, &[("username", "jdoe"), ("password", "pw"), ("Submit", "login")], Some(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(response.status, 303);
    assert_eq!(response.final_url, url);
    let cookies: Vec<_> = response.header_values("set-cookie").collect();
    assert_eq!(cookies, vec!["MoodleSession=GOOD; path=/moodle/"]);
    assert!(response.body.contains("testsession=2"));

    let request = server.requests.recv().unwrap();
    assert!(request.contains("username=jdoe&password=pw&Submit=login"));
    assert!(server.requests.try_recv().is_err());
}

#[tokio::test]
async fn authenticate_over_http_uses_the_login_cookie() {
    let server = serve(moodle);
    let client = PortalClient::new().unwrap();
    let portal = Portal::new(&server.base);
    let mut source = Once(Some(("jdoe".into(), "pw".into())));

    let token = authenticate(&client, &mut source, &portal, Duration::from_secs(5)).await.unwrap();

    assert_eq!(token.as_str(), "GOOD");
    let requests: Vec<_> = server.requests.try_iter().collect();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].starts_with("GET /moodle/login/index.php?testsession=2 "));
}

#[tokio::test]
async fn get_sends_the_session_cookie_and_query() {
    let server = serve(|_| (Duration::ZERO, reply("200 OK", &[], "<html></html>")));
    let client = PortalClient::new().unwrap();
    let url = format!("{}/grade/report/user/index.php", server.base);

    let response = client.get(&url, &[("MoodleSession", "abc")], &[("id", "101")]).await.unwrap();
    assert!(response.is_success());

    let request = server.requests.recv().unwrap();
    assert!(request.starts_with("GET /moodle/grade/report/user/index.php?id=101 "));
    assert!(request
        .lines()
        .any(|line| line.eq_ignore_ascii_case("cookie: MoodleSession=abc")));
}

#[tokio::test]
async fn slow_login_is_a_timeout() {
    let server = serve(|_| (Duration::from_secs(3), reply("200 OK", &[], "late")));
    let client = PortalClient::new().unwrap();
    let url = format!("{}/login/index.php", server.base);

    let err = client
        .post_form(&url, &[("Submit", "login")], Some(Duration::from_millis(200)))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchFailure::Timeout));
}

#[tokio::test]
async fn non_utf8_cookie_headers_are_kept() {
    let server = serve(|_| {
        let mut response = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n".to_vec();
        response.extend_from_slice(b"Set-Cookie: MoodleSession=ok; path=/; comment=caf\xe9\r\n\r\n");
        (Duration::ZERO, response)
    });
    let client = PortalClient::new().unwrap();
    let url = format!("{}/login/index.php", server.base);

    let response = client.post_form(&url, &[("Submit", "login")], None).await.unwrap();

    assert_eq!(session_cookie(&response, "MoodleSession").unwrap().as_str(), "ok");
}
