//! CLI parsing and orchestration. Builds a session from flags and config, runs one
//! navigation flow, renders the result as text or JSON, and maps errors to exit codes.

use std::io::Write;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

use crate::config::{self, Config};
use crate::model::{ChapterRecord, ImageRecord, TitleRecord};
use crate::scraper::{HtmlClient, ScraperError, DEFAULT_ORIGIN, DEFAULT_RELAY_PREFIX};
use crate::session::{FlowState, Session};

const NO_TITLES: &str = "No results found. Try a different search term.";
const NO_CHAPTERS: &str = "No chapters found for this manga.";
const NO_IMAGES: &str = "No images found for this chapter.";

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scraper(#[from] ScraperError),

    /// A flow ended `Failed`. The user already saw the "nothing found" message.
    #[error("Could not load {flow}: {reason}")]
    FlowFailed { flow: &'static str, reason: String },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scraper(_) | CliRunError::FlowFailed { .. } => 2,
            CliRunError::Output(_) | CliRunError::Json(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mangascrape")]
#[command(about = "Search manga titles and list their chapters and page images")]
#[command(
    after_help = "Config file keys (origin, relay_prefix, relay, user_agent, timeout_secs, accept_error_status, [selectors]) are read from ./mangascrape.toml or the user config dir. CLI flags override config."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Site origin (default https://www.mgeko.cc).
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Relay prefix for title and chapter pages; the encoded page URL is appended.
    #[arg(long, global = true)]
    pub relay: Option<String>,

    /// Fetch title and chapter pages directly instead of through the relay.
    #[arg(long, global = true, conflicts_with = "relay")]
    pub no_relay: bool,

    /// HTTP User-Agent (overrides config).
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Parse the body of non-2xx responses instead of treating them as failures.
    #[arg(long, global = true)]
    pub accept_error_status: bool,

    /// Print records as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress the loading spinner.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log progress and print the error cause chain.
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search titles by name.
    Search { query: String },

    /// List a title's chapters, newest first. LINK may be relative (/manga/<id>/) or absolute.
    Chapters { link: String },

    /// List the page images of a chapter reader URL.
    Images { chapter_url: String },

    /// Search, pick a title, pick a chapter and list its images.
    Read {
        query: String,

        /// 1-based position in the search results.
        #[arg(long, default_value_t = 1)]
        title: usize,

        /// 1-based position in the chapter list (newest first).
        #[arg(long, default_value_t = 1)]
        chapter: usize,
    },
}

/// Connection settings after merging flags, config and defaults.
#[derive(Debug, PartialEq, Eq)]
struct Settings {
    origin: String,
    relay_prefix: Option<String>,
    user_agent: Option<String>,
    timeout_secs: u64,
    accept_error_status: bool,
}

fn resolve_settings(args: &Args, config: Option<&Config>) -> Settings {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    let origin = args
        .origin
        .clone()
        .or_else(|| config.and_then(|c| c.origin.clone()))
        .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
    let relay_enabled = !args.no_relay && config.and_then(|c| c.relay).unwrap_or(true);
    let relay_prefix = if args.relay.is_some() {
        args.relay.clone()
    } else if relay_enabled {
        Some(
            config
                .and_then(|c| c.relay_prefix.clone())
                .unwrap_or_else(|| DEFAULT_RELAY_PREFIX.to_string()),
        )
    } else {
        None
    };
    Settings {
        origin,
        relay_prefix,
        user_agent: args
            .user_agent
            .clone()
            .or_else(|| config.and_then(|c| c.user_agent.clone())),
        timeout_secs: args
            .timeout
            .or_else(|| config.and_then(|c| c.timeout_secs))
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
        accept_error_status: args.accept_error_status
            || config.and_then(|c| c.accept_error_status).unwrap_or(false),
    }
}

fn build_session(
    settings: Settings,
    config: Option<&Config>,
) -> Result<Session<HtmlClient>, CliRunError> {
    Url::parse(&settings.origin).map_err(|e| {
        CliRunError::InvalidInput(format!("Invalid origin {}: {}", settings.origin, e))
    })?;
    let selectors = config
        .and_then(|c| c.selectors.clone())
        .unwrap_or_default()
        .compile()
        .map_err(|e| CliRunError::InvalidInput(format!("Invalid selector config: {}", e)))?;
    let mut builder = HtmlClient::builder()
        .timeout_secs(settings.timeout_secs)
        .relay_prefix(settings.relay_prefix)
        .accept_error_status(settings.accept_error_status);
    if let Some(ua) = settings.user_agent {
        builder = builder.user_agent(ua);
    }
    let client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;
    tracing::debug!(version = %selectors.version, "selector rules");
    Ok(Session::new(client, settings.origin, selectors))
}

/// Run `load` behind a spinner unless quiet.
fn with_spinner<T>(quiet: bool, message: &str, load: impl FnOnce() -> T) -> T {
    if quiet {
        return load();
    }
    let spinner = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = load();
    spinner.finish_and_clear();
    result
}

/// Records of a finished flow, or the flow's failure as an error.
fn finished<'a, T>(
    state: &'a FlowState<T>,
    flow: &'static str,
) -> Result<&'a [T], CliRunError> {
    match state {
        FlowState::Failed(reason) => Err(CliRunError::FlowFailed {
            flow,
            reason: reason.clone(),
        }),
        other => Ok(other.records()),
    }
}

/// 1-based pick from a list.
fn pick<'a, T>(items: &'a [T], position: usize, what: &str) -> Result<&'a T, CliRunError> {
    position
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or_else(|| {
            CliRunError::InvalidInput(format!(
                "No {} at position {} (found {}).",
                what,
                position,
                items.len()
            ))
        })
}

fn write_titles(out: &mut dyn Write, titles: &[TitleRecord]) -> std::io::Result<()> {
    if titles.is_empty() {
        return writeln!(out, "{}", NO_TITLES);
    }
    for (i, t) in titles.iter().enumerate() {
        writeln!(out, "{}. {} ({})", i + 1, t.title, t.author)?;
        writeln!(out, "   {}", t.link)?;
        writeln!(out, "   {}", t.summary)?;
    }
    Ok(())
}

fn write_chapters(out: &mut dyn Write, chapters: &[ChapterRecord]) -> std::io::Result<()> {
    if chapters.is_empty() {
        return writeln!(out, "{}", NO_CHAPTERS);
    }
    writeln!(out, "Found {} chapters (newest first)", chapters.len())?;
    for (i, c) in chapters.iter().enumerate() {
        write!(out, "{}. Chapter {}: {}", i + 1, c.chapter_number, c.chapter_title)?;
        if !c.chapter_read_time.is_empty() {
            write!(out, " [{}]", c.chapter_read_time)?;
        }
        writeln!(out)?;
        writeln!(out, "   {}", c.chapter_link)?;
    }
    Ok(())
}

fn write_images(out: &mut dyn Write, images: &[ImageRecord]) -> std::io::Result<()> {
    if images.is_empty() {
        return writeln!(out, "{}", NO_IMAGES);
    }
    for image in images {
        writeln!(out, "{}", image.src)?;
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<(), CliRunError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[derive(Serialize)]
struct ReadOutput<'a> {
    title: &'a TitleRecord,
    chapter: &'a ChapterRecord,
    images: &'a [ImageRecord],
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let settings = resolve_settings(args, config.as_ref());
    let mut session = build_session(settings, config.as_ref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_command(args, &mut session, &mut out)
}

fn run_command(
    args: &Args,
    session: &mut Session<HtmlClient>,
    out: &mut impl Write,
) -> Result<(), CliRunError> {
    match &args.command {
        Command::Search { query } => {
            let state = with_spinner(args.quiet, "Searching", || session.search(query).clone());
            emit(out, args.json, &state, "titles", write_titles)
        }
        Command::Chapters { link } => {
            let title = TitleRecord::from_link(link.as_str());
            let state = with_spinner(args.quiet, "Loading chapters", || {
                session.select_title(&title).map(Clone::clone)
            })
            .map_err(|e| match e {
                ScraperError::MissingTitleId { link } => CliRunError::InvalidInput(format!(
                    "Expected a title link like /manga/<id>/, got '{}'.",
                    link
                )),
                other => CliRunError::Scraper(other),
            })?;
            emit(out, args.json, &state, "chapters", write_chapters)
        }
        Command::Images { chapter_url } => {
            Url::parse(chapter_url).map_err(|e| {
                CliRunError::InvalidInput(format!(
                    "Expected an absolute chapter URL, got '{}': {}",
                    chapter_url, e
                ))
            })?;
            let chapter = ChapterRecord::from_link(chapter_url.as_str());
            let state = with_spinner(args.quiet, "Loading images", || {
                session.select_chapter(&chapter).clone()
            });
            emit(out, args.json, &state, "images", write_images)
        }
        Command::Read {
            query,
            title,
            chapter,
        } => read(args, session, out, query, *title, *chapter),
    }
}

/// Render a finished flow. Empty and failed flows print the same "nothing found" output.
fn emit<T: Serialize>(
    out: &mut impl Write,
    json: bool,
    state: &FlowState<T>,
    flow: &'static str,
    write_text: fn(&mut dyn Write, &[T]) -> std::io::Result<()>,
) -> Result<(), CliRunError> {
    let records = state.records();
    if json {
        write_json(out, records)?;
    } else {
        write_text(out, records)?;
    }
    finished(state, flow).map(|_| ())
}

fn read(
    args: &Args,
    session: &mut Session<HtmlClient>,
    out: &mut impl Write,
    query: &str,
    title_pos: usize,
    chapter_pos: usize,
) -> Result<(), CliRunError> {
    let titles = with_spinner(args.quiet, "Searching", || session.search(query).clone());
    if titles.records().is_empty() {
        return emit(out, args.json, &titles, "titles", write_titles);
    }
    let title = pick(titles.records(), title_pos, "title")?.clone();

    let chapters = with_spinner(args.quiet, "Loading chapters", || {
        session.select_title(&title).map(Clone::clone)
    })?;
    if chapters.records().is_empty() {
        return emit(out, args.json, &chapters, "chapters", write_chapters);
    }
    let chapter = pick(chapters.records(), chapter_pos, "chapter")?.clone();

    let images = with_spinner(args.quiet, "Loading images", || {
        session.select_chapter(&chapter).clone()
    });
    let selected = session.selected_title().cloned().unwrap_or(title);
    if args.json {
        write_json(
            out,
            &ReadOutput {
                title: &selected,
                chapter: &chapter,
                images: images.records(),
            },
        )?;
    } else {
        writeln!(out, "{} ({})", selected.title, selected.link)?;
        writeln!(
            out,
            "Chapter {}: {} ({})",
            chapter.chapter_number, chapter.chapter_title, chapter.chapter_link
        )?;
        write_images(out, images.records())?;
    }
    finished(&images, "images").map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("mangascrape").chain(argv.iter().copied()))
    }

    fn render<T>(
        write: fn(&mut dyn Write, &[T]) -> std::io::Result<()>,
        records: &[T],
    ) -> String {
        let mut buf: Vec<u8> = Vec::new();
        write(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn parse_subcommands() {
        match args(&["search", "solo leveling"]).command {
            Command::Search { query } => assert_eq!(query, "solo leveling"),
            other => panic!("unexpected {:?}", other),
        }
        match args(&["read", "x", "--title", "2", "--chapter", "3", "--json"]).command {
            Command::Read {
                query,
                title,
                chapter,
            } => {
                assert_eq!(query, "x");
                assert_eq!((title, chapter), (2, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn relay_and_no_relay_conflict() {
        let result = Args::try_parse_from([
            "mangascrape",
            "--relay",
            "http://r/?u=",
            "--no-relay",
            "search",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn settings_defaults() {
        let s = resolve_settings(&args(&["search", "x"]), None);
        assert_eq!(
            s,
            Settings {
                origin: DEFAULT_ORIGIN.to_string(),
                relay_prefix: Some(DEFAULT_RELAY_PREFIX.to_string()),
                user_agent: None,
                timeout_secs: 30,
                accept_error_status: false,
            }
        );
    }

    #[test]
    fn settings_flags_override_config() {
        let config: Config = toml::from_str(
            r#"
            origin = "https://config.example"
            relay_prefix = "https://config-relay/?u="
            user_agent = "Config/1.0"
            timeout_secs = 60
            "#,
        )
        .unwrap();
        let a = args(&[
            "--origin",
            "http://127.0.0.1:9",
            "--timeout",
            "5",
            "search",
            "x",
        ]);
        let s = resolve_settings(&a, Some(&config));
        assert_eq!(s.origin, "http://127.0.0.1:9");
        assert_eq!(s.timeout_secs, 5);
        assert_eq!(s.relay_prefix.as_deref(), Some("https://config-relay/?u="));
        assert_eq!(s.user_agent.as_deref(), Some("Config/1.0"));
    }

    #[test]
    fn settings_relay_disabled_by_flag_or_config() {
        let s = resolve_settings(&args(&["--no-relay", "search", "x"]), None);
        assert_eq!(s.relay_prefix, None);
        let config: Config = toml::from_str("relay = false").unwrap();
        let s = resolve_settings(&args(&["search", "x"]), Some(&config));
        assert_eq!(s.relay_prefix, None);
        let s = resolve_settings(&args(&["--relay", "http://r/?u=", "search", "x"]), Some(&config));
        assert_eq!(s.relay_prefix.as_deref(), Some("http://r/?u="));
    }

    #[test]
    fn invalid_origin_is_invalid_input() {
        let mut s = resolve_settings(&args(&["search", "x"]), None);
        s.origin = "not a url".to_string();
        match build_session(s, None) {
            Err(CliRunError::InvalidInput(msg)) => assert!(msg.contains("Invalid origin")),
            Err(other) => panic!("unexpected {:?}", other),
            Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn text_rendering() {
        let titles = render(write_titles, &[TitleRecord::from_link("/manga/x/")]);
        assert!(titles.starts_with("1. Unknown Title (Unknown Author)"));
        assert!(titles.contains("   /manga/x/"));

        let mut chapter = ChapterRecord::from_link("https://www.mgeko.cc/reader/en/x-chapter-4/");
        chapter.chapter_number = "4".to_string();
        chapter.chapter_read_time = "1 day ago".to_string();
        let chapters = render(write_chapters, &[chapter]);
        assert!(chapters.contains("Found 1 chapters"));
        assert!(chapters.contains("1. Chapter 4: Chapter [1 day ago]"));

        let images = render(
            write_images,
            &[ImageRecord {
                src: "a.jpg".to_string(),
            }],
        );
        assert_eq!(images, "a.jpg\n");
    }

    #[test]
    fn empty_rendering_uses_nothing_found_messages() {
        assert_eq!(render::<TitleRecord>(write_titles, &[]), format!("{}\n", NO_TITLES));
        assert_eq!(
            render::<ChapterRecord>(write_chapters, &[]),
            format!("{}\n", NO_CHAPTERS)
        );
        assert_eq!(render::<ImageRecord>(write_images, &[]), format!("{}\n", NO_IMAGES));
    }

    #[test]
    fn failed_flow_renders_empty_and_errors() {
        let mut buf: Vec<u8> = Vec::new();
        let state: FlowState<ImageRecord> = FlowState::Failed("HTTP 500".to_string());
        let result = emit(&mut buf, false, &state, "images", write_images);
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{}\n", NO_IMAGES));
        match result {
            Err(e @ CliRunError::FlowFailed { .. }) => assert_eq!(e.exit_code(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_flow_renders_json_array_and_succeeds() {
        let mut buf: Vec<u8> = Vec::new();
        let state: FlowState<TitleRecord> = FlowState::Empty;
        emit(&mut buf, true, &state, "titles", write_titles).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[]\n");
    }

    #[test]
    fn pick_is_one_based() {
        let items = ["a", "b"];
        assert_eq!(*pick(&items, 1, "title").unwrap(), "a");
        assert_eq!(*pick(&items, 2, "title").unwrap(), "b");
        assert!(pick(&items, 0, "title").is_err());
        assert!(pick(&items, 3, "title").is_err());
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(
            CliRunError::Scraper(ScraperError::MissingTitleId { link: "#".into() }).exit_code(),
            2
        );
        assert_eq!(
            CliRunError::FlowFailed {
                flow: "titles",
                reason: "x".into()
            }
            .exit_code(),
            2
        );
        assert_eq!(
            CliRunError::Output(std::io::Error::new(std::io::ErrorKind::Other, "x")).exit_code(),
            3
        );
    }
}
