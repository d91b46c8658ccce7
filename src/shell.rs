//! Interactive line-oriented front end for an edit session.
//!
//! Reads one command per line from stdin and writes a reply per command to
//! stdout. Status transitions (working, error banner) are reported on stderr
//! as the session publishes them.

use crate::comparison::{ComparisonSlider, ContainerBounds, PointerEvent, PRIMARY_BUTTON};
use crate::error::{EditError, Result};
use crate::image::{ImageEditor, ImagePayload, DOWNLOAD_FILE_NAME};
use crate::presets::QuickAction;
use crate::session::{EditOutcome, EditSession, ProcessingStatus, RecordId, SessionSnapshot};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Default file written by the `compare` command.
pub const COMPARISON_FILE_NAME: &str = "comparison.png";

const HELP: &str = "\
commands:
  open <path>                 load a product photo (starts a new session)
  prompt <text>               set the pending instruction
  edit [text]                 edit with <text>, or the pending instruction
  quick <action>              run a preset: remove-background, studio-lighting, polish, lifestyle
  again                       discard the current result and edit again
  history                     list recent edits
  select <id>                 restore a history entry
  press <x> <left> <width>    click in the comparison view
  slide <x> <left> <width>    drag the comparison divider
  save [path]                 download the edited image (default edited-product.png)
  compare [path]              write a before/after composite PNG
  reset                       clear the session (history is kept)
  status                      show the current state
  help                        show this help
  quit                        exit";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load a photo as the new original.
    Open(PathBuf),
    /// Set the pending instruction.
    Prompt(String),
    /// Run an edit with the given or pending instruction.
    Edit(Option<String>),
    /// Run a preset.
    Quick(QuickAction),
    /// Drop the current result.
    Again,
    /// List history entries.
    History,
    /// Restore a history entry.
    Select(RecordId),
    /// Press in the comparison view.
    Press { x: f64, bounds: ContainerBounds },
    /// Drag in the comparison view.
    Slide { x: f64, bounds: ContainerBounds },
    /// Write the edited image.
    Save(Option<PathBuf>),
    /// Write a before/after composite.
    Compare(Option<PathBuf>),
    /// Clear the session, keeping history.
    Reset,
    /// Show the current state.
    Status,
    /// Show usage.
    Help,
    /// Stop the shell.
    Quit,
}

impl Command {
    /// Parses one input line. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());

        let command = match word.to_lowercase().as_str() {
            "open" => Self::Open(PathBuf::from(required(rest, "open <path>")?)),
            "prompt" => Self::Prompt(rest.to_string()),
            "edit" => Self::Edit(optional(rest)),
            "quick" => Self::Quick(required(rest, "quick <action>")?.parse()?),
            "again" => Self::Again,
            "history" => Self::History,
            "select" => Self::Select(required(rest, "select <id>")?.parse()?),
            "press" => {
                let (x, bounds) = parse_pointer(rest, "press <x> <left> <width>")?;
                Self::Press { x, bounds }
            }
            "slide" => {
                let (x, bounds) = parse_pointer(rest, "slide <x> <left> <width>")?;
                Self::Slide { x, bounds }
            }
            "save" => Self::Save(optional(rest).map(PathBuf::from)),
            "compare" => Self::Compare(optional(rest).map(PathBuf::from)),
            "reset" | "clear" => Self::Reset,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => {
                return Err(EditError::InvalidRequest(format!(
                    "unknown command `{other}` (try `help`)"
                )))
            }
        };
        Ok(Some(command))
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(EditError::InvalidRequest(format!("usage: {usage}")))
    } else {
        Ok(rest)
    }
}

fn parse_pointer(rest: &str, usage: &str) -> Result<(f64, ContainerBounds)> {
    let numbers: Vec<f64> = rest
        .split_whitespace()
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| EditError::InvalidRequest(format!("usage: {usage}")))?;
    match numbers.as_slice() {
        [x, left, width] => Ok((*x, ContainerBounds::new(*left, *width))),
        _ => Err(EditError::InvalidRequest(format!("usage: {usage}"))),
    }
}

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Print the reply (if non-empty) and read the next line.
    Continue(String),
    /// Stop reading input.
    Quit,
}

/// Reports status transitions on stderr.
#[derive(Default)]
struct StatusBanner {
    last: ProcessingStatus,
}

impl crate::session::SessionObserver for StatusBanner {
    fn on_change(&mut self, snapshot: &SessionSnapshot<'_>) {
        if *snapshot.status == self.last {
            return;
        }
        match snapshot.status {
            ProcessingStatus::InProgress(message) => {
                eprintln!("{message} This usually takes about 10-15 seconds.")
            }
            ProcessingStatus::Failed(message) => eprintln!("error: {message}"),
            ProcessingStatus::Idle => {}
        }
        self.last = snapshot.status.clone();
    }
}

/// Interactive edit session bound to an editor.
pub struct Shell<E> {
    editor: E,
    session: EditSession,
    slider: ComparisonSlider,
    compare_size: (u32, u32),
}

impl<E: ImageEditor> Shell<E> {
    /// Creates a shell with a fresh session.
    pub fn new(editor: E) -> Self {
        let mut session = EditSession::new();
        session.subscribe(StatusBanner::default());
        Self {
            editor,
            session,
            slider: ComparisonSlider::new(),
            compare_size: (1280, 720),
        }
    }

    /// Sets the pixel size used by the `compare` command.
    pub fn with_compare_size(mut self, width: u32, height: u32) -> Self {
        self.compare_size = (width, height);
        self
    }

    /// The underlying session.
    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// The comparison slider for the current pair.
    pub fn slider(&self) -> &ComparisonSlider {
        &self.slider
    }

    /// Runs the shell, reading from stdin and writing to stdout.
    pub async fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        writeln!(stdout, "productclean shell, editing via {} (type `help`)", self.editor.name())?;
        stdout.flush()?;

        for line in stdin.lock().lines() {
            let line = line?;
            match self.handle_line(&line).await {
                Step::Quit => break,
                Step::Continue(reply) if reply.is_empty() => {}
                Step::Continue(reply) => writeln!(stdout, "{reply}")?,
            }
            stdout.flush()?;
        }

        Ok(())
    }

    /// Parses and executes one line. Errors become replies, never panics.
    pub async fn handle_line(&mut self, line: &str) -> Step {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Step::Continue(String::new()),
            Err(e) => return Step::Continue(format!("error: {e}")),
        };
        if command == Command::Quit {
            return Step::Quit;
        }
        match self.execute(command).await {
            Ok(reply) => Step::Continue(reply),
            Err(e) => Step::Continue(format!("error: {e}")),
        }
    }

    async fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Open(path) => {
                let image = ImagePayload::from_path(&path)?;
                let reply = format!(
                    "loaded {} ({} bytes, {})",
                    path.display(),
                    image.size(),
                    image.mime_type()
                );
                self.session.set_original(image);
                self.slider = ComparisonSlider::new();
                Ok(reply)
            }
            Command::Prompt(text) => {
                self.session.set_prompt(text);
                Ok(String::new())
            }
            Command::Edit(text) => {
                let outcome = self.session.request_edit(&self.editor, text.as_deref()).await;
                Ok(self.describe_outcome(outcome))
            }
            Command::Quick(action) => {
                let outcome = self
                    .session
                    .request_quick_action(&self.editor, action)
                    .await;
                Ok(self.describe_outcome(outcome))
            }
            Command::Again => {
                self.session.clear_edited();
                Ok(String::new())
            }
            Command::History => Ok(render_history(&self.session.snapshot())),
            Command::Select(id) => {
                if self.session.select_history_entry(id) {
                    self.slider = ComparisonSlider::new();
                    Ok(format!("restored edit {id}: {}", self.session.prompt()))
                } else {
                    Ok(String::new())
                }
            }
            Command::Press { x, bounds } => self.pointer(PointerEvent::MouseDown { x }, bounds),
            Command::Slide { x, bounds } => self.pointer(
                PointerEvent::MouseMove {
                    x,
                    buttons: PRIMARY_BUTTON,
                },
                bounds,
            ),
            Command::Save(path) => {
                let Some(edited) = self.session.edited() else {
                    return Ok("no edited image to save".into());
                };
                let path = path.unwrap_or_else(|| PathBuf::from(DOWNLOAD_FILE_NAME));
                edited.save(&path)?;
                Ok(format!("saved {} ({} bytes)", path.display(), edited.size()))
            }
            Command::Compare(path) => {
                let (Some(before), Some(after)) = (self.session.original(), self.session.edited())
                else {
                    return Ok("no comparison to show".into());
                };
                let (width, height) = self.compare_size;
                let composite = self.slider.compose(before, after, width, height)?;
                let path = path.unwrap_or_else(|| PathBuf::from(COMPARISON_FILE_NAME));
                composite.save(&path)?;
                Ok(format!(
                    "wrote {} ({}x{}, divider at {}%)",
                    path.display(),
                    width,
                    height,
                    format_position(self.slider.position())
                ))
            }
            Command::Reset => {
                self.session.reset();
                self.slider = ComparisonSlider::new();
                Ok(String::new())
            }
            Command::Status => Ok(render_status(&self.session.snapshot(), &self.slider)),
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    fn pointer(&mut self, event: PointerEvent, bounds: ContainerBounds) -> Result<String> {
        if self.session.edited().is_none() {
            return Ok("no comparison to show".into());
        }
        self.slider.handle(event, bounds);
        Ok(format!(
            "divider at {}%",
            format_position(self.slider.position())
        ))
    }

    fn describe_outcome(&mut self, outcome: EditOutcome) -> String {
        match outcome {
            EditOutcome::Completed(id) => {
                self.slider = ComparisonSlider::new();
                let size = self.session.edited().map(|e| e.size()).unwrap_or_default();
                format!("edit {id} complete ({size} bytes)")
            }
            // the status banner already reported it
            EditOutcome::Failed(_) => String::new(),
            EditOutcome::Skipped | EditOutcome::Stale => String::new(),
        }
    }
}

fn format_position(position: f64) -> String {
    let formatted = format!("{position:.1}");
    formatted.trim_end_matches(".0").to_string()
}

fn render_history(snapshot: &SessionSnapshot<'_>) -> String {
    if snapshot.history.is_empty() {
        return "no history yet".into();
    }
    snapshot
        .history
        .iter()
        .map(|record| {
            format!(
                "{}  {}  {}",
                record.id(),
                record.created_at().format("%H:%M:%S"),
                record.instruction()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_status(snapshot: &SessionSnapshot<'_>, slider: &ComparisonSlider) -> String {
    let describe = |image: Option<&ImagePayload>| match image {
        Some(image) => format!("{} ({} bytes)", image.mime_type(), image.size()),
        None => "none".to_string(),
    };
    let mut lines = vec![
        format!("original: {}", describe(snapshot.original)),
        format!("edited:   {}", describe(snapshot.edited)),
        format!("prompt:   {}", snapshot.prompt),
        format!("status:   {}", snapshot.status),
        format!("history:  {} of {}", snapshot.history.len(), crate::session::MAX_HISTORY),
    ];
    if snapshot.edited.is_some() {
        lines.push(format!("divider:  {}%", format_position(slider.position())));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Editor that returns a solid blue PNG, or fails every call.
    struct FakeEditor {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeEditor {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    fn png(color: [u8; 4]) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba(color)));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[async_trait]
    impl ImageEditor for FakeEditor {
        async fn submit_edit(&self, _image: &ImagePayload, _instruction: &str) -> Result<ImagePayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(EditError::Auth("API Key not found".into()))
            } else {
                Ok(ImagePayload::new(png([0, 0, 255, 255]), "image/png"))
            }
        }

        fn name(&self) -> &str {
            "fake"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn write_product(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("product.png");
        std::fs::write(&path, png([255, 0, 0, 255])).unwrap();
        path
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("open ./shoe.png").unwrap(),
            Some(Command::Open(PathBuf::from("./shoe.png")))
        );
        assert_eq!(
            Command::parse("edit   Place on marble ").unwrap(),
            Some(Command::Edit(Some("Place on marble".into())))
        );
        assert_eq!(Command::parse("edit").unwrap(), Some(Command::Edit(None)));
        assert_eq!(
            Command::parse("quick polish").unwrap(),
            Some(Command::Quick(QuickAction::Polish))
        );
        assert_eq!(
            Command::parse("slide 150 100 400").unwrap(),
            Some(Command::Slide {
                x: 150.0,
                bounds: ContainerBounds::new(100.0, 400.0)
            })
        );
        assert_eq!(Command::parse("EXIT").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("open").is_err());
        assert!(Command::parse("select abc").is_err());
        assert!(Command::parse("slide 1 2").is_err());
        assert!(Command::parse("slide a b c").is_err());
        assert!(Command::parse("quick sharpen").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(50.0), "50");
        assert_eq!(format_position(12.26), "12.3");
        assert_eq!(format_position(100.0), "100");
    }

    #[tokio::test]
    async fn test_full_edit_flow() {
        let dir = tempfile::tempdir().unwrap();
        let product = write_product(dir.path());
        let mut shell = Shell::new(FakeEditor::ok()).with_compare_size(40, 20);

        let reply = shell.handle_line(&format!("open {}", product.display())).await;
        assert!(matches!(reply, Step::Continue(ref r) if r.starts_with("loaded")));

        let reply = shell.handle_line("quick remove-background").await;
        assert!(matches!(reply, Step::Continue(ref r) if r.contains("complete")));
        assert_eq!(shell.session().history().len(), 1);

        let reply = shell.handle_line("slide 25 0 100").await;
        assert_eq!(reply, Step::Continue("divider at 25%".into()));
        assert_eq!(shell.slider().position(), 25.0);

        let out = dir.path().join("out.png");
        shell.handle_line(&format!("save {}", out.display())).await;
        assert!(ImagePayload::from_path(&out).is_ok());

        let composite = dir.path().join("cmp.png");
        let reply = shell
            .handle_line(&format!("compare {}", composite.display()))
            .await;
        assert!(matches!(reply, Step::Continue(ref r) if r.contains("40x20")));
        let written = image::open(&composite).unwrap();
        assert_eq!((written.width(), written.height()), (40, 20));
    }

    #[tokio::test]
    async fn test_blank_edit_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let product = write_product(dir.path());
        let editor = FakeEditor::ok();
        let mut shell = Shell::new(editor);

        shell.handle_line(&format!("open {}", product.display())).await;
        assert_eq!(shell.handle_line("edit").await, Step::Continue(String::new()));
        assert_eq!(shell.editor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_reported_in_status() {
        let dir = tempfile::tempdir().unwrap();
        let product = write_product(dir.path());
        let mut shell = Shell::new(FakeEditor::failing());

        shell.handle_line(&format!("open {}", product.display())).await;
        shell.handle_line("edit Polish").await;

        let Step::Continue(status) = shell.handle_line("status").await else {
            panic!("status should not quit");
        };
        assert!(status.contains("status:   error: API Key not found"));
        assert!(shell.session().history().is_empty());
    }

    #[tokio::test]
    async fn test_slider_requires_result() {
        let mut shell = Shell::new(FakeEditor::ok());
        assert_eq!(
            shell.handle_line("press 10 0 100").await,
            Step::Continue("no comparison to show".into())
        );
        assert_eq!(shell.slider().position(), 50.0);
    }

    #[tokio::test]
    async fn test_reset_then_history() {
        let dir = tempfile::tempdir().unwrap();
        let product = write_product(dir.path());
        let mut shell = Shell::new(FakeEditor::ok());

        shell.handle_line(&format!("open {}", product.display())).await;
        shell.handle_line("edit Add soft studio lighting").await;
        shell.handle_line("reset").await;

        assert!(shell.session().original().is_none());
        let Step::Continue(history) = shell.handle_line("history").await else {
            panic!("history should not quit");
        };
        assert!(history.ends_with("Add soft studio lighting"));

        let id = shell.session().history().newest().unwrap().id();
        let reply = shell.handle_line(&format!("select {id}")).await;
        assert!(matches!(reply, Step::Continue(ref r) if r.starts_with("restored")));
        assert!(shell.session().original().is_some());
    }

    #[tokio::test]
    async fn test_errors_do_not_quit() {
        let mut shell = Shell::new(FakeEditor::ok());
        let reply = shell.handle_line("open /definitely/not/here.png").await;
        assert!(matches!(reply, Step::Continue(ref r) if r.starts_with("error:")));
        assert_eq!(shell.handle_line("quit").await, Step::Quit);
    }
}
