//! Posts multipart uploads to an echo server and prints what came back.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use partwise::prelude::*;
use tracing::{info, warn};

const TEXT_FILE: &str = "temp.txt";
const IMAGE_FILE: &str = "image.jpg";
const ZIP_FILE: &str = "zipFile.zip";
const MESSAGE: &str = "This is a multipart post";

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay multipart uploads against an echo server", long_about = None)]
struct Args {
    /// Server receiving the uploads
    #[arg(short, long, default_value = "http://localhost:8080/")]
    server: String,

    /// Scenario to run (all by default)
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Part framing
    #[arg(short, long, value_enum, default_value_t = FramingMode::Browser)]
    mode: FramingMode,

    /// Directory holding temp.txt, image.jpg and zipFile.zip.
    /// Generated in a temporary directory when omitted.
    #[arg(short, long)]
    fixtures: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// File part plus two string parts
    AddPart,
    /// File as binary body plus a text body
    BinaryText,
    /// File, input stream and text
    FileStreamText,
    /// Byte array plus text
    BytesText,
    /// Every scenario in order
    All,
}

impl Scenario {
    const EACH: [Self; 4] = [
        Self::AddPart,
        Self::BinaryText,
        Self::FileStreamText,
        Self::BytesText,
    ];

    fn selected(self) -> Vec<Self> {
        match self {
            Self::All => Self::EACH.to_vec(),
            one => vec![one],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FramingMode {
    Strict,
    Browser,
}

impl From<FramingMode> for Mode {
    fn from(mode: FramingMode) -> Self {
        match mode {
            FramingMode::Strict => Self::Strict,
            FramingMode::Browser => Self::BrowserCompatible,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Keeps generated fixtures alive until the uploads are done
    let mut generated = None;
    let fixtures = match args.fixtures {
        Some(dir) => dir,
        None => {
            let dir = tempfile::tempdir().context("creating fixture directory")?;
            write_fixtures(dir.path())?;
            let path = dir.path().to_path_buf();
            generated = Some(dir);
            path
        }
    };
    info!(fixtures = %fixtures.display(), server = %args.server, "starting uploads");

    let client = HyperClient::builder()
        .timeout(Duration::from_secs(args.timeout))
        .with_logging()
        .build();

    let mut failures = 0usize;
    for scenario in args.scenario.selected() {
        let body = scenario_body(scenario, args.mode.into(), &fixtures)
            .with_context(|| format!("building {scenario:?} body"))?;
        info!(?scenario, parts = body.part_count(), "uploading");

        match client.post_multipart(&args.server, body).await {
            Ok(response) => report(scenario, &response)?,
            Err(err) => {
                failures += 1;
                warn!(?scenario, error = %err, "upload failed");
            }
        }
    }

    drop(generated);
    anyhow::ensure!(failures == 0, "{failures} upload(s) failed");
    Ok(())
}

fn scenario_body(scenario: Scenario, mode: Mode, fixtures: &Path) -> Result<MultipartBody> {
    let mut encoder = MultipartEncoder::with_mode(mode);
    let text_file = fixtures.join(TEXT_FILE);

    match scenario {
        Scenario::AddPart => {
            encoder
                .add_part(
                    Part::path("upfile", &text_file).with_content_type(ContentType::octet_stream()),
                )?
                .add_text_body(
                    "text1",
                    "This is message 1",
                    Some(ContentType::multipart_form_data()),
                )?
                .add_text_body(
                    "text2",
                    "This is message 2",
                    Some(ContentType::multipart_form_data()),
                )?;
        }
        Scenario::BinaryText => {
            encoder
                .add_binary_body(
                    "upfile",
                    PartSource::file(&text_file),
                    ContentType::octet_stream(),
                    TEXT_FILE,
                )?
                .add_text_body("text", MESSAGE, Some(ContentType::octet_stream()))?;
        }
        Scenario::FileStreamText => {
            let zip = File::open(fixtures.join(ZIP_FILE))
                .with_context(|| format!("opening {ZIP_FILE}"))?;
            encoder
                .add_binary_body(
                    "upfile",
                    PartSource::file(fixtures.join(IMAGE_FILE)),
                    ContentType::octet_stream(),
                    IMAGE_FILE,
                )?
                .add_binary_body(
                    "upstream",
                    PartSource::reader(zip),
                    ContentType::parse("application/zip")?,
                    ZIP_FILE,
                )?
                .add_text_body("text", MESSAGE, Some(ContentType::text_plain()))?;
        }
        Scenario::BytesText => {
            encoder
                .add_binary_body(
                    "upfile",
                    b"binary code".to_vec(),
                    ContentType::octet_stream(),
                    TEXT_FILE,
                )?
                .add_text_body("text", MESSAGE, Some(ContentType::text_plain()))?;
        }
        Scenario::All => anyhow::bail!("`all` is expanded before building bodies"),
    }

    Ok(encoder.build()?)
}

fn report(scenario: Scenario, response: &Response) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "== {scenario:?}: {}", response.status())?;
    writeln!(out, "{}", response.text().unwrap_or_default().trim())?;
    writeln!(out, "-- {} headers", response.header_count())?;
    for (name, value) in response.headers() {
        writeln!(out, "{name}:{value}")?;
    }
    Ok(())
}

fn write_fixtures(dir: &Path) -> Result<()> {
    fs::write(dir.join(TEXT_FILE), "file content\n")?;

    // JPEG markers around filler, enough for several upload chunks
    let mut image = vec![0xFF, 0xD8, 0xFF, 0xE0];
    image.extend((0..150_000u32).map(|i| u8::try_from(i % 251).unwrap_or_default()));
    image.extend([0xFF, 0xD9]);
    fs::write(dir.join(IMAGE_FILE), image)?;

    // Empty zip archive: end-of-central-directory record only
    let mut zip = vec![0x50, 0x4B, 0x05, 0x06];
    zip.extend([0u8; 18]);
    fs::write(dir.join(ZIP_FILE), zip)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn all_expands_in_order() {
        check!(Scenario::All.selected() == Scenario::EACH.to_vec());
        check!(Scenario::BytesText.selected() == [Scenario::BytesText]);
    }

    #[test]
    fn every_scenario_builds() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_fixtures(dir.path()).expect("fixtures");

        let expected = [
            (Scenario::AddPart, 3),
            (Scenario::BinaryText, 2),
            (Scenario::FileStreamText, 3),
            (Scenario::BytesText, 2),
        ];
        for (scenario, parts) in expected {
            let body = scenario_body(scenario, Mode::BrowserCompatible, dir.path()).expect("body");
            check!(body.part_count() == parts);
        }
    }

    #[test]
    fn cli_defaults() {
        let args = Args::parse_from(["echo-upload"]);
        check!(args.scenario == Scenario::All);
        check!(args.mode == FramingMode::Browser);
        check!(!args.verbose);
    }
}
