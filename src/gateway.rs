use crate::error::LabError;
use crate::model::LabImage;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use tracing::{debug, warn};

pub const DEFAULT_CATALOG_URL: &str = "http://localhost:5000/api/images";

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CatalogSource {
    Remote(String),
    File(PathBuf),
}

impl Display for CatalogSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read-only access to the lab image catalog service.
#[derive(Debug, Clone)]
pub struct CatalogGateway {
    client: reqwest::Client,
    source: CatalogSource,
}

impl CatalogGateway {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            client: reqwest::Client::new(),
            source,
        }
    }

    pub async fn fetch_images(&self) -> Result<Vec<LabImage>, LabError> {
        let raw = match &self.source {
            CatalogSource::Remote(url) => self.fetch_remote(url).await?,
            CatalogSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|error| {
                    LabError::CatalogLoad(format!("failed to read {}: {error}", path.display()))
                })?,
        };

        let images = parse_catalog(&raw)?;
        debug!("fetched {} lab images from {}", images.len(), self.source);
        Ok(images)
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, LabError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(LabError::catalog_load)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LabError::CatalogLoad(format!(
                "catalog service answered {status}"
            )));
        }

        response.text().await.map_err(LabError::catalog_load)
    }
}

/// Parses a catalog payload. The payload must be a JSON array; a record that
/// does not fit `LabImage` is skipped with a warning instead of failing the
/// whole load.
pub fn parse_catalog(raw: &str) -> Result<Vec<LabImage>, LabError> {
    let records = serde_json::from_str::<Vec<serde_json::Value>>(raw)
        .map_err(|error| LabError::CatalogLoad(format!("malformed catalog: {error}")))?;

    let mut images = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<LabImage>(record) {
            Ok(image) => images.push(image),
            Err(error) => warn!("skipping catalog record {index}: {error}"),
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::{CatalogGateway, CatalogSource, parse_catalog};
    use crate::error::LabError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a loopback port and returns the URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let address = listener.local_addr().expect("listener address");

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut request = Vec::new();
            let mut buffer = [0_u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut buffer).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend_from_slice(&buffer[..read]),
                }
            }
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });

        format!("http://{address}/api/images")
    }

    #[test]
    fn parses_array_of_records() {
        let raw = r#"[
            {"_id": "a", "subject": "OS Labs", "semester": "Sem 3"},
            {"_id": "b", "subject": "Networks", "windowsRunCommand": "docker run net"}
        ]"#;
        let images = parse_catalog(raw).expect("catalog should parse");
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].windows_run_command.as_deref(), Some("docker run net"));
    }

    #[test]
    fn malformed_payload_is_a_catalog_load_error() {
        let error = parse_catalog(r#"{"images": []}"#).expect_err("object is not a catalog");
        assert!(matches!(error, LabError::CatalogLoad(message) if message.starts_with("malformed")));
    }

    #[test]
    fn record_with_wrong_field_type_is_skipped() {
        let raw = r#"[
            {"_id": "a", "subject": "OS Labs", "semester": 4},
            {"_id": "b", "subject": "Networks"}
        ]"#;
        let images = parse_catalog(raw).expect("catalog should parse");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "b");
    }

    #[test]
    fn record_with_both_ids_is_kept() {
        let images = parse_catalog(r#"[{"_id":"665f1c","id":"665f1c","subject":"OS Labs"}]"#)
            .expect("catalog should parse");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "665f1c");
    }

    #[tokio::test]
    async fn remote_source_parses_successful_response() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"[{"_id": "a", "subject": "OS Labs"}, {"_id": "b", "subject": "Networks"}]"#,
        )
        .await;

        let gateway = CatalogGateway::new(CatalogSource::Remote(url));
        let images = gateway.fetch_images().await.expect("remote catalog should load");
        let ids = images.iter().map(|image| image.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn remote_error_status_is_a_catalog_load_error() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"message": "boom"}"#,
        )
        .await;

        let gateway = CatalogGateway::new(CatalogSource::Remote(url));
        let error = gateway.fetch_images().await.expect_err("500 is a failure");
        assert!(matches!(error, LabError::CatalogLoad(message) if message.contains("500")));
    }

    #[tokio::test]
    async fn refused_connection_is_a_catalog_load_error() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let address = listener.local_addr().expect("listener address");
        drop(listener);

        let gateway =
            CatalogGateway::new(CatalogSource::Remote(format!("http://{address}/api/images")));
        let error = gateway.fetch_images().await.expect_err("nothing is listening");
        assert!(matches!(error, LabError::CatalogLoad(_)));
    }

    #[tokio::test]
    async fn file_source_reads_local_catalog() {
        let path = std::env::temp_dir().join(format!(
            "labdeck-catalog-{}.json",
            std::process::id()
        ));
        tokio::fs::write(&path, r#"[{"id": "a", "subject": "OS Labs"}]"#)
            .await
            .expect("write temp catalog");

        let gateway = CatalogGateway::new(CatalogSource::File(path.clone()));
        let images = gateway.fetch_images().await;
        let _ = tokio::fs::remove_file(&path).await;

        let images = images.expect("file catalog should load");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].subject(), "OS Labs");
    }

    #[tokio::test]
    async fn missing_file_is_a_catalog_load_error() {
        let gateway = CatalogGateway::new(CatalogSource::File(
            std::env::temp_dir().join("labdeck-does-not-exist.json"),
        ));
        let error = gateway.fetch_images().await.expect_err("file is missing");
        assert!(matches!(error, LabError::CatalogLoad(_)));
    }
}
