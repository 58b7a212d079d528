use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use reqwest::blocking::Client;
use virascan_core::prediction::Prediction;
use virascan_core::request::PredictionRequest;
use virascan_gateway::{GatewayErrorKind, HttpGateway, PredictionGateway};

const PREDICT_OK: &str = r#"{"success": true, "results": {
    "model_results": [{"model": "Random Forest", "prediction": "Viral", "probability": 93.0, "accuracy": 91.0}],
    "detailed_results": [{"sequence_id": "seq1", "prediction": "Viral", "probability": 0.93, "sequence_length": 4,
                          "raw_probabilities": {"non_viral": 0.07, "viral": 0.93}}],
    "summary": {"total_sequences": 1, "viral_sequences": 1, "non_viral_sequences": 0, "average_confidence": 0.93},
    "metadata": {"model_accuracy": 0.91, "timestamp": "2025-05-01T09:30:00", "file_name": "input.fasta"}
}}"#;

/// Serve one canned response; the receiver yields the raw request.
fn serve_once(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request = String::new();
        let mut content_length = 0usize;
        let mut chunked = false;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let lower = line.to_ascii_lowercase();
            if let Some(v) = lower.strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap();
            }
            if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
                chunked = true;
            }
            request.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let body = if chunked {
            read_chunked(&mut reader)
        } else {
            let mut buf = vec![0; content_length];
            reader.read_exact(&mut buf).unwrap();
            buf
        };
        request.push_str(&String::from_utf8_lossy(&body));

        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        tx.send(request).unwrap();
    });

    (format!("http://{addr}"), rx)
}

fn read_chunked(reader: &mut impl BufRead) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).unwrap();
        let size = usize::from_str_radix(size_line.trim().split(';').next().unwrap(), 16).unwrap();
        let mut chunk = vec![0; size + 2];
        reader.read_exact(&mut chunk).unwrap();
        if size == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..size]);
    }
    body
}

/// A base URL nothing listens on.
fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn gateway(base_url: &str) -> HttpGateway {
    let client = Client::builder().no_proxy().build().unwrap();
    HttpGateway::with_client(client, base_url)
}

fn request() -> PredictionRequest {
    PredictionRequest::new(">seq1\nACGT", "input.fasta", ["xgboost", "random_forest"]).unwrap()
}

#[test]
fn test_health_reports_model_state() {
    let (url, rx) = serve_once(
        "200 OK",
        r#"{"status": "healthy", "model_trained": true, "training_accuracy": 0.91, "csv_file_exists": true}"#,
    );
    let status = gateway(&url).check_health();
    assert!(status.reachable);
    assert_eq!(status.model_trained, Some(true));
    assert_eq!(status.training_accuracy, Some(0.91));
    assert!(rx.recv().unwrap().starts_with("GET /health "));
}

#[test]
fn test_health_untrained_model() {
    let (url, _rx) = serve_once(
        "200 OK",
        r#"{"status": "healthy", "model_trained": false, "training_accuracy": null}"#,
    );
    let status = gateway(&url).check_health();
    assert!(status.reachable);
    assert_eq!(status.model_trained, Some(false));
    assert_eq!(status.training_accuracy, None);
}

#[test]
fn test_health_error_status_is_unreachable() {
    let (url, _rx) = serve_once("500 Internal Server Error", "{}");
    assert!(!gateway(&url).check_health().reachable);
}

#[test]
fn test_health_closed_port_is_unreachable() {
    assert!(!gateway(&closed_url()).check_health().reachable);
}

#[test]
fn test_predict_sends_multipart() {
    let (url, rx) = serve_once("200 OK", PREDICT_OK);
    let result = gateway(&url).predict(&request()).unwrap();
    assert_eq!(result.detailed_results[0].prediction, Prediction::Viral);
    assert_eq!(result.summary.total, 1);

    let raw = rx.recv().unwrap();
    assert!(raw.starts_with("POST /predict "));
    assert!(raw.contains("name=\"file\""));
    assert!(raw.contains("filename=\"input.fasta\""));
    assert!(raw.contains(">seq1\nACGT"));
    assert!(raw.contains("name=\"models\""));
    assert!(raw.contains(r#"["random_forest","xgboost"]"#));
}

#[test]
fn test_predict_server_rejected() {
    let (url, _rx) = serve_once(
        "400 BAD REQUEST",
        r#"{"success": false, "error": "No valid sequences found in file"}"#,
    );
    let err = gateway(&url).predict(&request()).unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::ServerRejected);
    assert!(err.to_string().contains("No valid sequences found in file"));
}

#[test]
fn test_predict_malformed_success() {
    let (url, _rx) = serve_once("200 OK", r#"{"success": true, "results": {"summary": {}}}"#);
    let err = gateway(&url).predict(&request()).unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::MalformedResponse);
}

#[test]
fn test_predict_network_unavailable() {
    let err = gateway(&closed_url()).predict(&request()).unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::NetworkUnavailable);
}
