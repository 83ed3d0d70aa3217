// Integration tests for tls-scout
use tls_scout::filter::DomainFilter;
use tls_scout::geo::NoGeo;
use tls_scout::hosts::{enumerate, ScanTarget};
use tls_scout::output::csv::CsvOutput;
use tls_scout::output::OutputSink;
use tls_scout::prober::TlsProber;
use tls_scout::scan::{EngineConfig, ScanEngine, ScanReport, WorkerExit};
use tls_scout::stats::{ProbeStats, StatsSnapshot};

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start a TLS server on 127.0.0.1 presenting a self-signed certificate for `cn`
async fn start_tls_server(cn: &str) -> SocketAddr {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec![cn.to_string()]).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    let cert = params.self_signed(&key).unwrap();

    let identity =
        native_tls::Identity::from_pkcs8(cert.pem().as_bytes(), key.serialize_pem().as_bytes())
            .unwrap();
    let acceptor =
        tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(identity).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let _ = tls.shutdown().await;
                }
            });
        }
    });

    addr
}

fn host_file(lines: &[&str]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(temp_file, "{}", line).unwrap();
    }
    temp_file.flush().unwrap();
    temp_file
}

/// Run a full scan of `target` against `port`, returning the report, probe counts and CSV text
async fn run_scan(
    target: ScanTarget,
    port: u16,
    threads: usize,
    quota: usize,
) -> (ScanReport, StatsSnapshot, String) {
    let stats = ProbeStats::new();
    let out = NamedTempFile::new().unwrap();
    let sink = OutputSink::spawn(Box::new(CsvOutput::to_file(out.path()).unwrap()));

    let prober = TlsProber::new(
        port,
        Duration::from_secs(1),
        sink.handle(),
        Arc::new(NoGeo),
        stats.clone(),
    )
    .unwrap();

    let engine = ScanEngine::new(
        Arc::new(prober),
        DomainFilter::new(),
        EngineConfig {
            threads,
            idle_wait: Duration::from_secs(10),
            quota,
        },
    );

    let hosts = enumerate(&target, false).await.unwrap();
    let report = engine.run(hosts).await;
    sink.close().await;

    let csv = std::fs::read_to_string(out.path()).unwrap();
    (report, stats.snapshot(), csv)
}

#[tokio::test]
async fn test_rows_match_handshakes_for_any_worker_count() {
    let server = start_tls_server("front.example.com").await;
    let input = host_file(&["127.0.0.1", "127.0.0.2", "127.0.0.1", "", "127.0.0.3", "127.0.0.1"]);

    for threads in [1, 3] {
        let (report, stats, csv) = run_scan(
            ScanTarget::File(input.path().to_path_buf()),
            server.port(),
            threads,
            0,
        )
        .await;

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "IP,ORIGIN,CERT_DOMAIN,CERT_ISSUER,GEO_CODE");
        assert_eq!(lines.len() - 1, 3, "one row per handshake with {} threads", threads);
        assert_eq!(report.results.len(), 3);
        assert!(lines[1..]
            .iter()
            .all(|l| *l == "127.0.0.1,127.0.0.1,front.example.com,front.example.com,"));
        assert_eq!(report.count_exits(WorkerExit::Drained), threads);
        assert_eq!(stats.handshakes, 3);
        assert_eq!(stats.connect_failed, 2);
        assert_eq!(stats.probed(), 5);
    }
}

#[tokio::test]
async fn test_quota_stops_real_scan() {
    let server = start_tls_server("quota.example.com").await;
    let lines: Vec<&str> = std::iter::repeat("127.0.0.1").take(50).collect();
    let input = host_file(&lines);

    let (report, stats, csv) = run_scan(
        ScanTarget::File(input.path().to_path_buf()),
        server.port(),
        2,
        3,
    )
    .await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.count_exits(WorkerExit::QuotaReached), 1);
    // Rows may exceed the quota by handshakes already in flight
    assert!(csv.lines().count() - 1 >= 3);
    assert!(csv.lines().count() - 1 < 50);
    assert_eq!((csv.lines().count() - 1) as u64, stats.handshakes);
    assert_eq!(report.results.len() + report.rejected, stats.handshakes as usize);
}

#[tokio::test]
async fn test_crawl_feeds_scan() {
    let server = start_tls_server("crawled.example.com").await;
    let web = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mirrors"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html>
                <a href="https://127.0.0.1/ubuntu/">mirror one</a>
                <a href="http://127.0.0.1/debian/">same host</a>
                <a href="https://127.0.0.2/">mirror two</a>
            </html>"#,
        ))
        .mount(&web)
        .await;

    let (report, _, csv) = run_scan(
        ScanTarget::Url(format!("{}/mirrors", web.uri())),
        server.port(),
        2,
        0,
    )
    .await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].domain, "crawled.example.com");
    assert_eq!(csv.lines().count(), 2);
}

#[tokio::test]
async fn test_crawl_failure_is_reported_before_scanning() {
    let web = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&web)
        .await;

    let result = enumerate(&ScanTarget::Url(format!("{}/missing", web.uri())), false).await;
    assert!(result.is_err());
}
