use anyhow::Result;
use httpmock::prelude::*;
use rack_doku::config::DcimSettings;
use rack_doku::domain::model::{OutputFormat, RackSelector};
use rack_doku::{DcimClient, LocalStorage, RackPipeline, ReportEngine, ReportError, ReportSettings};
use serde_json::json;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

const TOKEN: &str = "0123456789abcdef";
const FRONT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" id="front" width="230" height="400"><rect x="10" y="10" width="210" height="22" fill="#1f77b4"/></svg>"##;
const REAR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" id="rear" width="230" height="400"><rect x="10" y="40" width="210" height="44" fill="#ff7f0e"/></svg>"##;

fn settings(server: &MockServer, rack: RackSelector, output: &Path) -> ReportSettings {
    ReportSettings {
        dcim: DcimSettings {
            url: server.url("/api"),
            token: TOKEN.to_string(),
            insecure_tls: false,
            timeout_seconds: 5,
            page_limit: None,
        },
        rack,
        output_path: output.to_str().unwrap().to_string(),
        formats: vec![OutputFormat::Html],
        default_name: "rack".to_string(),
        template_path: None,
        monitor: false,
    }
}

async fn run(settings: ReportSettings) -> rack_doku::Result<Vec<String>> {
    let client = DcimClient::new(&settings.dcim)?;
    let storage = LocalStorage::new(settings.output_path.clone());
    let pipeline = RackPipeline::new(client, storage, settings);
    ReportEngine::new(pipeline).run().await
}

fn port(name: &str, cable: Option<&str>, peer: Option<(&str, &str)>) -> serde_json::Value {
    json!({
        "id": 100,
        "name": name,
        "cable": cable.map(|label| json!({"id": 7, "label": label})),
        "link_peers": peer.map(|(port, device)| vec![json!({
            "id": 200,
            "name": port,
            "display": port,
            "device": {"id": 2, "name": device}
        })]).unwrap_or_default(),
    })
}

/// Rack 42 "R1" with D1 (eth0 patched to D2/eth1 via C1, eth1 unpatched) and D2.
fn mock_rack_r1(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/dcim/racks/")
            .query_param("name", "R1")
            .header("Authorization", format!("Token {}", TOKEN));
        then.status(200)
            .json_body(json!({"count": 1, "results": [{"id": 42, "name": "R1"}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/racks/42/");
        then.status(200).json_body(json!({"id": 42, "name": "R1", "u_height": 42}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/dcim/racks/42/elevation/")
            .query_param("face", "front");
        then.status(200)
            .header("Content-Type", "image/svg+xml")
            .body(FRONT_SVG);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/dcim/racks/42/elevation/")
            .query_param("face", "rear");
        then.status(200)
            .header("Content-Type", "image/svg+xml")
            .body(REAR_SVG);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/dcim/devices/")
            .query_param("rack_id", "42");
        then.status(200).json_body(json!({
            "count": 2,
            "results": [
                {"id": 1, "name": "D1", "config_template": {"id": 3, "name": "leaf"}},
                {"id": 2, "name": "D2", "config_template": null}
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/dcim/interfaces/")
            .query_param("device_id", "1");
        then.status(200).json_body(json!({
            "count": 2,
            "results": [
                port("eth0", Some("C1"), Some(("eth1", "D2"))),
                port("eth1", None, None)
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/dcim/interfaces/")
            .query_param("device_id", "2");
        then.status(200).json_body(json!({"count": 0, "results": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/front-ports/");
        then.status(200).json_body(json!({"count": 0, "results": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/devices/1/render-config/");
        then.status(200).body("hostname D1\n");
    });
}

#[tokio::test]
async fn test_rack_report_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_rack_r1(&server);

    let written = run(settings(&server, RackSelector::Id(42), temp_dir.path())).await?;

    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("R1_doku.html"));

    let html = std::fs::read_to_string(temp_dir.path().join("R1_doku.html"))?;
    assert!(html.contains("<title>Rack R1</title>"));
    assert!(html.contains(FRONT_SVG));
    assert!(html.contains(REAR_SVG));
    assert!(html.contains("<td>eth0</td>"));
    assert!(html.contains("<td>C1</td>"));
    assert!(html.contains("<td>D2</td>"));
    assert!(html.contains("<td>eth1</td>"));
    assert!(html.contains("<td class=\"unpatched\" colspan=\"3\">unpatched</td>"));

    // No temp files left behind.
    let names: Vec<String> = std::fs::read_dir(temp_dir.path())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    assert_eq!(names, vec!["R1_doku.html"]);

    Ok(())
}

#[tokio::test]
async fn test_rack_name_and_id_produce_identical_html() -> Result<()> {
    let by_id = TempDir::new()?;
    let by_name = TempDir::new()?;
    let server = MockServer::start();
    mock_rack_r1(&server);

    run(settings(&server, RackSelector::Id(42), by_id.path())).await?;
    run(settings(
        &server,
        RackSelector::Name("R1".to_string()),
        by_name.path(),
    ))
    .await?;

    let a = std::fs::read(by_id.path().join("R1_doku.html"))?;
    let b = std::fs::read(by_name.path().join("R1_doku.html"))?;
    assert_eq!(a, b);

    Ok(())
}

#[tokio::test]
async fn test_rerun_overwrites_with_identical_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_rack_r1(&server);
    let mut config = settings(&server, RackSelector::Id(42), temp_dir.path());
    config.formats = vec![OutputFormat::Html, OutputFormat::Csv];

    run(config.clone()).await?;
    let first_html = std::fs::read(temp_dir.path().join("R1_doku.html"))?;
    let first_csv = std::fs::read(temp_dir.path().join("R1_cabling.csv"))?;

    run(config).await?;
    assert_eq!(first_html, std::fs::read(temp_dir.path().join("R1_doku.html"))?);
    assert_eq!(first_csv, std::fs::read(temp_dir.path().join("R1_cabling.csv"))?);

    Ok(())
}

#[tokio::test]
async fn test_all_formats_are_written() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_rack_r1(&server);
    let mut config = settings(&server, RackSelector::Id(42), temp_dir.path());
    config.formats = OutputFormat::ALL.to_vec();

    let written = run(config).await?;
    assert_eq!(written.len(), 4);

    let pdf = std::fs::read(temp_dir.path().join("R1_doku.pdf"))?;
    assert_eq!(&pdf[0..5], b"%PDF-");
    // Front and rear elevation, each embedded as a form XObject.
    assert_eq!(pdf.windows(5).filter(|w| w == b"/Form").count(), 2);

    let csv = std::fs::read_to_string(temp_dir.path().join("R1_cabling.csv"))?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "device,device_id,kind,port,cable,peer,peer_device",
            "D1,1,interface,eth0,C1,eth1,D2",
            "D1,1,interface,eth1,,,",
        ]
    );

    let zip_data = std::fs::read(temp_dir.path().join("R1_configs.zip"))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;
    assert_eq!(archive.len(), 1);
    let mut content = String::new();
    archive.by_name("D1.conf")?.read_to_string(&mut content)?;
    assert_eq!(content, "hostname D1\n");

    Ok(())
}

#[tokio::test]
async fn test_failed_move_into_place_rolls_back_the_set() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    mock_rack_r1(&server);
    let mut config = settings(&server, RackSelector::Id(42), temp_dir.path());
    config.formats = vec![OutputFormat::Html, OutputFormat::Csv, OutputFormat::Pdf];
    // The PDF target is taken by a directory, so only the last rename fails.
    std::fs::create_dir(temp_dir.path().join("R1_doku.pdf"))?;

    let err = run(config).await.unwrap_err();
    assert!(matches!(err, ReportError::Io(_)));

    let names: Vec<String> = std::fs::read_dir(temp_dir.path())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    assert_eq!(names, vec!["R1_doku.pdf"]);
    assert!(temp_dir.path().join("R1_doku.pdf").is_dir());

    Ok(())
}

#[tokio::test]
async fn test_unknown_rack_name_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = temp_dir.path().join("outputs");
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/racks/");
        then.status(200).json_body(json!({"count": 0, "results": []}));
    });

    let err = run(settings(
        &server,
        RackSelector::Name("R404".to_string()),
        &output,
    ))
    .await
    .unwrap_err();

    assert!(matches!(err, ReportError::RackNotFound { ref name } if name == "R404"));
    assert!(!output.exists());

    Ok(())
}

#[tokio::test]
async fn test_missing_elevation_is_omitted() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/racks/7/");
        then.status(200).json_body(json!({"id": 7, "name": "Empty"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/racks/7/elevation/");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/devices/");
        then.status(200).json_body(json!({"count": 0, "results": []}));
    });

    run(settings(&server, RackSelector::Id(7), temp_dir.path())).await?;

    let html = std::fs::read_to_string(temp_dir.path().join("Empty_doku.html"))?;
    assert!(html.contains("<title>Rack Empty</title>"));
    assert!(!html.contains("<svg"));
    assert!(!html.contains("<section class=\"elevations\">"));

    Ok(())
}

#[tokio::test]
async fn test_failed_interface_fetch_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = temp_dir.path().join("outputs");
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/racks/42/");
        then.status(200).json_body(json!({"id": 42, "name": "R1"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/racks/42/elevation/");
        then.status(200).body("<svg/>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/devices/");
        then.status(200)
            .json_body(json!({"count": 1, "results": [{"id": 1, "name": "D1"}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/dcim/interfaces/");
        then.status(503);
    });

    let err = run(settings(&server, RackSelector::Id(42), &output))
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::MissingData { .. }));
    assert!(!output.exists());

    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = settings(&MockServer::start(), RackSelector::Id(1), temp_dir.path());
    // Nothing listens on the discard port.
    config.dcim.url = "http://127.0.0.1:9/api".to_string();

    let err = run(config).await.unwrap_err();
    assert!(matches!(err, ReportError::Transport { .. }));

    Ok(())
}
