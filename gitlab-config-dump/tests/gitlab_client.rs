use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gitlab_config_dump::gitlab::GitLabClient;
use gitlab_config_dump_core::contract::{ApiError, ProjectId, RepositoryApi};

/// Raw HTTP/1.1 response with a JSON body and the given extra header lines.
fn response(status: &str, headers: &[&str], body: &str) -> String {
    let mut extra = String::new();
    for header in headers {
        extra.push_str(header);
        extra.push_str("\r\n");
    }
    format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n{extra}\r\n{body}",
        body.len()
    )
}

/// Serves the canned responses in order, one connection each, and records every
/// request line it receives.
async fn serve(responses: Vec<String>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Binding local listener failed");
    let address = listener.local_addr().expect("Listener has an address");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        for canned in responses {
            let (mut stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&chunk[..n]),
                }
            }
            let head = String::from_utf8_lossy(&head);
            let request_line = head.lines().next().unwrap_or_default().to_string();
            recorded.lock().unwrap().push(request_line);

            let _ = stream.write_all(canned.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{address}"), requests)
}

fn client(base_url: &str) -> GitLabClient {
    GitLabClient::new(base_url, "glpat-test").expect("Client builds")
}

#[tokio::test]
async fn list_tree_follows_next_page_until_exhausted() {
    let (base_url, requests) = serve(vec![
        response(
            "200 OK",
            &["x-next-page: 2"],
            r#"[{"name": "a.json", "path": "rules/a.json", "type": "blob"}]"#,
        ),
        response(
            "200 OK",
            &["x-next-page: "],
            r#"[{"name": "b.json", "path": "rules/b.json", "type": "blob"}]"#,
        ),
    ])
    .await;

    let entries = client(&base_url)
        .list_tree(ProjectId(7), "main", "rules")
        .await
        .expect("Listing succeeds")
        .expect("Listing has a result");

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.json", "b.json"]);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2, "requests: {requests:?}");
    assert!(requests[0].starts_with("GET /api/v4/projects/7/repository/tree?"));
    assert!(requests[0].contains("ref=main") && requests[0].contains("path=rules"));
    assert!(requests[0].contains("&page=1 "), "first request: {}", requests[0]);
    assert!(requests[1].contains("&page=2 "), "second request: {}", requests[1]);
}

#[tokio::test]
async fn list_tree_maps_not_found_to_no_result() {
    let (base_url, requests) = serve(vec![response(
        "404 Not Found",
        &[],
        r#"{"message": "404 Tree Not Found"}"#,
    )])
    .await;

    let entries = client(&base_url)
        .list_tree(ProjectId(7), "main", "rules")
        .await
        .expect("404 is not an error");

    assert_eq!(entries, None);
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn list_tree_reports_server_errors_as_status() {
    let (base_url, _requests) = serve(vec![response(
        "500 Internal Server Error",
        &[],
        r#"{"message": "500 Internal Server Error"}"#,
    )])
    .await;

    let err = client(&base_url)
        .list_tree(ProjectId(7), "main", "rules")
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, url } => {
            assert_eq!(status, 500);
            assert!(url.contains("/api/v4/projects/7/repository/tree"), "url: {url}");
        }
        other => panic!("Expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn list_member_projects_stops_after_failed_second_page() {
    let (base_url, requests) = serve(vec![
        response(
            "200 OK",
            &["x-next-page: 2"],
            r#"[{"id": 7, "path_with_namespace": "acme/config-repo"}]"#,
        ),
        response("502 Bad Gateway", &[], "{}"),
    ])
    .await;

    let err = client(&base_url).list_member_projects().await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 502, .. }), "got {err:?}");
    let requests = requests.lock().unwrap();
    assert!(requests[0].contains("membership=true"), "request: {}", requests[0]);
}

#[tokio::test]
async fn show_file_requests_encoded_path() {
    let (base_url, requests) = serve(vec![response(
        "200 OK",
        &[],
        r#"{"file_path": "rules/a.json", "encoding": "base64", "content": "eyJ4IjoxfQ=="}"#,
    )])
    .await;

    let file = client(&base_url)
        .show_file(ProjectId(7), "rules/a.json", "main")
        .await
        .expect("File fetch succeeds");

    assert_eq!(file.file_path, "rules/a.json");
    assert_eq!(file.content, "eyJ4IjoxfQ==");
    let requests = requests.lock().unwrap();
    assert!(
        requests[0].starts_with("GET /api/v4/projects/7/repository/files/rules%2Fa.json?ref=main "),
        "request: {}",
        requests[0]
    );
}
