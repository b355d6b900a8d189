use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::artifacts::CSV_COLUMNS;
use crate::error::{HarvestError, Result};
use crate::models::artifact::ArtifactName;
use crate::models::post::{self, CsvRow, MediaResponse, PostRecord};

/// Files written for one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub json: PathBuf,
    /// `None` when the response held no posts.
    pub csv: Option<PathBuf>,
    pub posts: usize,
}

/// Writes API responses to `data_dir` as JSON and projects them to CSV.
#[derive(Debug, Clone)]
pub struct ResponsePersister {
    data_dir: PathBuf,
}

impl ResponsePersister {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Persist, reload, count and (when there are posts) project to CSV.
    ///
    /// The CSV is always built from the reloaded file, never from `response`
    /// directly.
    pub async fn save(&self, name: &ArtifactName, response: &MediaResponse) -> Result<Artifacts> {
        let json = self.persist(name, response).await?;
        let reloaded = self.reload(name).await?;

        let posts = Self::count_posts(&reloaded);
        let csv = if posts > 0 {
            Some(self.project_csv(name, &reloaded).await?)
        } else {
            None
        };

        Ok(Artifacts { json, csv, posts })
    }

    /// Writes `response` as 4-space indented JSON with every non-ASCII
    /// character escaped as `\uXXXX`.
    pub async fn persist(&self, name: &ArtifactName, response: &MediaResponse) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(HarvestError::filesystem(&self.data_dir))?;

        let path = name.json_path(&self.data_dir);

        let buf = to_ascii_json(response)?;

        tokio::fs::write(&path, buf)
            .await
            .map_err(HarvestError::filesystem(&path))?;

        info!("Saved JSON: {}", path.display());
        Ok(path)
    }

    pub async fn reload(&self, name: &ArtifactName) -> Result<MediaResponse> {
        let path = name.json_path(&self.data_dir);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(HarvestError::filesystem(&path))?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Number of posts in `response`; 0 for an empty payload or one
    /// without a `data` list.
    #[must_use]
    pub fn count_posts(response: &MediaResponse) -> usize {
        if post::is_empty_response(response) {
            info!("No posts");
            return 0;
        }

        let Some(items) = post::posts(response) else {
            warn!("Response has no data list; treating as no posts");
            return 0;
        };

        info!(count = items.len(), "Post count");
        items.len()
    }

    /// Writes the CSV projection of `response["data"]`: header line, then
    /// one unquoted line per post.
    pub async fn project_csv(&self, name: &ArtifactName, response: &MediaResponse) -> Result<PathBuf> {
        let path = name.csv_path(&self.data_dir);
        info!("Saving CSV: {}", path.display());

        let rows = post::posts(response)
            .map(|items| {
                items
                    .iter()
                    .map(|item| PostRecord::deserialize(item).map(CsvRow::from))
                    .collect::<serde_json::Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        let bytes = render_csv(&rows).map_err(|err| match err {
            RenderError::Csv(e) => HarvestError::Csv(e),
            RenderError::Io(source) => HarvestError::Filesystem {
                path: path.clone(),
                source,
            },
        })?;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(HarvestError::filesystem(&self.data_dir))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(HarvestError::filesystem(&path))?;

        info!(rows = rows.len(), "Saved CSV: {}", path.display());
        Ok(path)
    }
}

fn to_ascii_json(response: &MediaResponse) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = AsciiFormatter(PrettyFormatter::with_indent(b"    "));
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    response.serialize(&mut serializer)?;
    Ok(buf)
}

/// Pretty printing with non-ASCII string content written as `\uXXXX`
/// (UTF-16 surrogate pairs above the BMP).
struct AsciiFormatter<'a>(PrettyFormatter<'a>);

impl Formatter for AsciiFormatter<'_> {
    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..i])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

enum RenderError {
    Csv(csv::Error),
    Io(std::io::Error),
}

fn render_csv(rows: &[CsvRow]) -> std::result::Result<Vec<u8>, RenderError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());

    writer.write_record(CSV_COLUMNS).map_err(RenderError::Csv)?;
    for row in rows {
        writer.serialize(row).map_err(RenderError::Csv)?;
    }

    writer
        .into_inner()
        .map_err(|e| RenderError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::RunStamp;
    use chrono::NaiveDate;
    use serde_json::json;

    fn temp_persister() -> ResponsePersister {
        ResponsePersister::new(
            std::env::temp_dir()
                .join(format!("harvest-persist-{}", uuid::Uuid::new_v4()))
                .join("instagram"),
        )
    }

    fn name(key: &str) -> ArtifactName {
        let stamp = RunStamp::from_naive(
            NaiveDate::from_ymd_opt(2026, 10, 17)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        ArtifactName::new(key, 50, stamp)
    }

    fn cleanup(persister: &ResponsePersister) {
        if let Some(parent) = persister.data_dir().parent() {
            std::fs::remove_dir_all(parent).ok();
        }
    }

    #[test]
    fn test_count_posts() {
        assert_eq!(ResponsePersister::count_posts(&json!({})), 0);
        assert_eq!(ResponsePersister::count_posts(&json!(null)), 0);
        assert_eq!(ResponsePersister::count_posts(&json!({"data": []})), 0);
        assert_eq!(ResponsePersister::count_posts(&json!({"paging": {}})), 0);
        assert_eq!(
            ResponsePersister::count_posts(&json!({"data": [{"id": "1"}, {"id": "2"}]})),
            2
        );
    }

    #[tokio::test]
    async fn test_reload_returns_what_was_persisted() {
        let persister = temp_persister();
        let name = name("bluebottle");
        let response = json!({
            "data": [{"id": "1", "caption": "ünïcode ☕, kept", "children": {"data": []}}],
            "paging": {"cursors": {"after": "QVFI"}},
            "zeta": 1.5,
            "alpha": [null, true, "x"]
        });

        let path = persister.persist(&name, &response).await.unwrap();
        assert!(path.ends_with("response_bluebottle_limit50_20261017120000.json"));
        assert_eq!(persister.reload(&name).await.unwrap(), response);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"data\": ["));
        assert!(text.contains("\\u00fcn\\u00efcode \\u2615, kept"));

        cleanup(&persister);
    }

    #[test]
    fn test_json_escapes_non_ascii() {
        let response = json!({
            "caption": "caf\u{e9} \u{2615} \u{1f600}",
            "tag": ["\u{30b3}\u{30fc}\u{30d2}\u{30fc}"],
            "empty": []
        });
        let text = String::from_utf8(to_ascii_json(&response).unwrap()).unwrap();

        assert!(text.is_ascii());
        assert_eq!(
            text,
            "{\n    \"caption\": \"caf\\u00e9 \\u2615 \\ud83d\\ude00\",\n    \"tag\": [\n        \"\\u30b3\\u30fc\\u30d2\\u30fc\"\n    ],\n    \"empty\": []\n}"
        );
        assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap(), response);
    }

    #[tokio::test]
    async fn test_save_writes_csv_with_defaults() {
        let persister = temp_persister();
        let name = name("bluebottle");
        let response = json!({
            "data": [
                {
                    "id": "18000000000000001",
                    "media_type": "IMAGE",
                    "comments_count": 2,
                    "like_count": 31,
                    "caption": "Cold brew,\nsummer ☕",
                    "timestamp": "2026-10-16T08:00:00+0000",
                    "media_url": "https://cdn.example.com/1.jpg",
                    "permalink": "https://www.instagram.com/p/one/"
                },
                {
                    "id": "18000000000000002",
                    "comments_count": 0,
                    "timestamp": "2026-10-16T09:00:00+0000",
                    "permalink": "https://www.instagram.com/p/two/"
                }
            ]
        });

        let artifacts = persister.save(&name, &response).await.unwrap();
        assert_eq!(artifacts.posts, 2);

        let csv_path = artifacts.csv.expect("csv should be written");
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "id,media_type,comments_count,like_count,caption,timestamp,media_url,permalink",
                "18000000000000001,IMAGE,2,31,Cold brewsummer ,2026-10-16T08:00:00+0000,https://cdn.example.com/1.jpg,https://www.instagram.com/p/one/",
                "18000000000000002,,0,0,,2026-10-16T09:00:00+0000,,https://www.instagram.com/p/two/",
            ]
        );

        cleanup(&persister);
    }

    #[tokio::test]
    async fn test_save_skips_csv_without_posts() {
        let persister = temp_persister();
        let name = name("empty");

        let artifacts = persister.save(&name, &json!({"data": []})).await.unwrap();
        assert_eq!(artifacts.posts, 0);
        assert!(artifacts.csv.is_none());
        assert!(artifacts.json.exists());
        assert!(!name.csv_path(persister.data_dir()).exists());

        cleanup(&persister);
    }

    #[tokio::test]
    async fn test_project_rejects_post_without_permalink() {
        let persister = temp_persister();
        let name = name("broken");
        let response = json!({
            "data": [{"id": "1", "comments_count": 0, "timestamp": "2026-10-16T09:00:00+0000"}]
        });

        let err = persister.save(&name, &response).await.unwrap_err();
        assert!(matches!(err, HarvestError::Json(_)), "unexpected error: {err}");

        cleanup(&persister);
    }
}
