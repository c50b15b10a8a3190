//! `IonQClient` against a local HTTP stub serving canned responses.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use arvak_adapter_ionq::{
    CalibrationLookup, ClientOptions, IonQApi, IonQClient, IonQCredentials, IonQError,
    RetryPolicies, RetryPolicy, circuit_to_ionq,
};
use arvak_ir::Circuit;

/// One request as received by the stub.
#[derive(Debug, Clone)]
struct Seen {
    /// e.g. `PUT /v0.1/jobs/abc/status/cancel HTTP/1.1`
    request_line: String,
    /// Header block, lowercased.
    headers: String,
    body: String,
}

/// Serves one canned `(status, body)` per connection, in order.
struct StubServer {
    base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl StubServer {
    async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                log.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status} Stub\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}/v0.1"),
            seen,
        }
    }

    fn client(&self, retries: RetryPolicies) -> IonQClient {
        IonQClient::with_options(
            IonQCredentials {
                token: Some("stub-token".into()),
                url: self.base_url.clone(),
            },
            ClientOptions::default().with_retries(retries),
        )
        .unwrap()
    }

    fn request_lines(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.request_line.clone())
            .collect()
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> Seen {
    let mut data = Vec::new();
    let mut buf = [0_u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break data.len();
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let headers = head.to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = (header_end + 4).min(data.len());
    while data.len() < body_start + length {
        let n = stream.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    Seen {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        headers,
        body: String::from_utf8_lossy(&data[body_start..]).into_owned(),
    }
}

/// Single attempt for everything, so error tests see exactly one request.
fn no_retries() -> RetryPolicies {
    RetryPolicies {
        submit: RetryPolicy::attempts(1),
        retrieve: RetryPolicy::attempts(1),
        cancel: RetryPolicy::attempts(1),
        delete: RetryPolicy::attempts(1),
        calibration: RetryPolicy::attempts(1),
    }
}

#[tokio::test]
async fn test_cancel_hits_status_cancel_path_with_auth() {
    let server = StubServer::start(vec![(200, r#"{"id":"abc","status":"canceled"}"#)]).await;
    let client = server.client(no_retries());

    let response = client.cancel_job("abc").await.unwrap();
    assert_eq!(response["status"], "canceled");

    let seen = server.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].request_line.starts_with("PUT /v0.1/jobs/abc/status/cancel "));
    assert!(seen[0].headers.contains("authorization: apikey stub-token"));
    assert!(seen[0].headers.contains("user-agent: arvak-adapter-ionq/"));
}

#[tokio::test]
async fn test_error_status_becomes_api_error() {
    let server = StubServer::start(vec![(
        404,
        r#"{"error":{"type":"not_found","message":"job abc not found"}}"#,
    )])
    .await;
    // Default policies: 404 is not retriable, so one request only.
    let client = server.client(RetryPolicies::default());

    let err = client.retrieve_job("abc").await.unwrap_err();
    assert!(matches!(
        err,
        IonQError::Api { status: 404, ref error_type, ref message }
            if error_type == "not_found" && message == "job abc not found"
    ));
    assert_eq!(server.request_lines().len(), 1);
    assert!(server.request_lines()[0].starts_with("GET /v0.1/jobs/abc "));
}

#[tokio::test]
async fn test_submit_retries_unavailable_then_succeeds() {
    let server = StubServer::start(vec![
        (503, r#"{"error":{"type":"unavailable","message":"busy"}}"#),
        (503, "busy"),
        (200, r#"{"id":"job-7","status":"ready"}"#),
    ])
    .await;
    let retries = RetryPolicies {
        submit: RetryPolicy::attempts(3),
        ..no_retries()
    };
    let client = server.client(retries);

    let request = circuit_to_ionq(&Circuit::bell().unwrap(), "simulator", 100).unwrap();
    let response = client.submit_job(&request).await.unwrap();
    assert_eq!(response.id, "job-7");

    let seen = server.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|s| s.request_line.starts_with("POST /v0.1/jobs ")));
    let body: Value = serde_json::from_str(&seen[2].body).unwrap();
    assert_eq!(body["target"], "simulator");
    assert_eq!(body["shots"], 100);
}

#[tokio::test]
async fn test_submit_gives_up_on_client_error() {
    let server = StubServer::start(vec![
        (400, r#"{"error":"bad_request","message":"shots out of range"}"#),
        (200, r#"{"id":"never"}"#),
    ])
    .await;
    let retries = RetryPolicies {
        submit: RetryPolicy::attempts(3),
        ..no_retries()
    };
    let client = server.client(retries);

    let request = circuit_to_ionq(&Circuit::bell().unwrap(), "qpu", 100).unwrap();
    let err = client.submit_job(&request).await.unwrap_err();
    assert!(matches!(err, IonQError::Api { status: 400, .. }));
    assert_eq!(server.request_lines().len(), 1);
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = StubServer::start(vec![(200, "")]).await;
    let client = server.client(no_retries());

    assert_eq!(client.delete_job("abc").await.unwrap(), Value::Null);
    assert!(server.request_lines()[0].starts_with("DELETE /v0.1/jobs/abc "));
}

#[tokio::test]
async fn test_calibration_follows_characterization_url() {
    let server = StubServer::start(vec![
        (
            200,
            r#"[{"backend":"qpu.harmony","characterization_url":"/characterizations/abc"},
                {"backend":"simulator","characterization_url":""}]"#,
        ),
        (
            200,
            r#"{"id":"abc","date":1700000000,"target":"qpu.harmony","qubits":11,
                "connectivity":[[0,1]],"fidelity":{"spam":{"mean":0.99}},"timing":{}}"#,
        ),
    ])
    .await;
    let client = server.client(no_retries());

    let lookup = client.get_calibration_data("ionq_qpu.harmony").await.unwrap();
    let calibration = match lookup {
        CalibrationLookup::Found(calibration) => calibration,
        other => panic!("expected calibration, got {other:?}"),
    };
    assert_eq!(calibration.id.as_deref(), Some("abc"));
    assert_eq!(calibration.qubits, Some(11));

    let lines = server.request_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("GET /v0.1/backends "));
    assert!(lines[1].starts_with("GET /v0.1/characterizations/abc "));
}

#[tokio::test]
async fn test_calibration_without_characterization_stops_after_listing() {
    let server = StubServer::start(vec![(
        200,
        r#"[{"backend":"simulator","characterization_url":""}]"#,
    )])
    .await;
    let client = server.client(no_retries());

    let lookup = client.get_calibration_data("ionq_simulator").await.unwrap();
    assert_eq!(lookup, CalibrationLookup::NoCharacterization);
    assert_eq!(server.request_lines().len(), 1);
}
