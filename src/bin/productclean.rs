//! CLI for ProductClean - AI product photo editing.

use clap::{Args, Parser, Subcommand, ValueEnum};
use productclean::shell::Shell;
use productclean::{
    ComparisonSlider, ContainerBounds, EditOutcome, EditSession, GeminiEditor, GeminiModel,
    ImageEditor, ImagePayload, QuickAction, DOWNLOAD_FILE_NAME,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "productclean")]
#[command(about = "Edit product photos with natural-language instructions (Gemini)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit a product photo
    Edit(EditArgs),

    /// Write a before/after comparison of two images
    Compare(CompareArgs),

    /// List quick-action presets
    Presets,

    /// Interactive editing session
    Shell(ShellArgs),

    /// Check that the editing service is reachable with the configured key
    Check(ShellArgs),
}

#[derive(Args)]
struct EditorArgs {
    /// Gemini model (defaults to PRODUCTCLEAN_MODEL, then flash)
    #[arg(short, long, value_enum)]
    model: Option<ModelArg>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args)]
struct EditArgs {
    /// Product photo to edit
    input: PathBuf,

    /// Editing instruction
    #[arg(short, long, conflicts_with = "preset", required_unless_present = "preset")]
    prompt: Option<String>,

    /// Quick-action preset
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,

    /// Output file path
    #[arg(short, long, default_value = DOWNLOAD_FILE_NAME)]
    output: PathBuf,

    #[command(flatten)]
    editor: EditorArgs,
}

#[derive(Args)]
struct CompareArgs {
    /// Original image
    before: PathBuf,

    /// Edited image
    after: PathBuf,

    /// Divider position in percent of the width
    #[arg(long, default_value_t = productclean::INITIAL_POSITION)]
    position: f64,

    /// Output file path (defaults to comparison.png, or comparison.html with --html)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Composite width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Composite height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Write an HTML fragment instead of a PNG
    #[arg(long)]
    html: bool,
}

#[derive(Args)]
struct ShellArgs {
    #[command(flatten)]
    editor: EditorArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Flash,
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    RemoveBackground,
    StudioLighting,
    Polish,
    Lifestyle,
}

impl From<PresetArg> for QuickAction {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::RemoveBackground => QuickAction::RemoveBackground,
            PresetArg::StudioLighting => QuickAction::StudioLighting,
            PresetArg::Polish => QuickAction::Polish,
            PresetArg::Lifestyle => QuickAction::Lifestyle,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Edit(args) => {
            edit_image(args, cli.json).await?;
        }
        Commands::Compare(args) => {
            compare_images(args, cli.json)?;
        }
        Commands::Presets => {
            list_presets(cli.json)?;
        }
        Commands::Shell(args) => {
            let editor = build_editor(&args.editor)?;
            Shell::new(editor).run().await?;
        }
        Commands::Check(args) => {
            check_editor(args, cli.json).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "productclean=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_editor(args: &EditorArgs) -> anyhow::Result<GeminiEditor> {
    let mut builder = GeminiEditor::builder();
    if let Some(model) = args.model {
        builder = builder.model(model.into());
    }
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

async fn edit_image(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let editor = build_editor(&args.editor)?;
    let mut session = EditSession::new();
    session.set_original(ImagePayload::from_path(&args.input)?);

    let outcome = match (args.preset, args.prompt.as_deref()) {
        (Some(preset), _) => session.request_quick_action(&editor, preset.into()).await,
        (None, prompt) => session.request_edit(&editor, prompt).await,
    };

    let record_id = match outcome {
        EditOutcome::Completed(id) => id,
        EditOutcome::Failed(message) => anyhow::bail!(message),
        EditOutcome::Skipped | EditOutcome::Stale => {
            anyhow::bail!("nothing to do: the instruction is empty")
        }
    };

    let Some(edited) = session.edited() else {
        anyhow::bail!("edit completed without a result");
    };
    edited.save(&args.output)?;

    if json_output {
        let record = session.history().get(record_id);
        let result = serde_json::json!({
            "success": true,
            "id": record_id,
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "size_bytes": edited.size(),
            "mime_type": edited.mime_type(),
            "instruction": record.map(|r| r.instruction()),
            "model": editor.model().as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Edited image: {} ({} bytes, {}) via {}",
            args.output.display(),
            edited.size(),
            edited.mime_type(),
            editor.model().as_str()
        );
    }

    Ok(())
}

fn compare_images(args: CompareArgs, json_output: bool) -> anyhow::Result<()> {
    let before = ImagePayload::from_path(&args.before)?;
    let after = ImagePayload::from_path(&args.after)?;

    // A 100-wide container maps the requested percentage straight through the clamp.
    let mut slider = ComparisonSlider::new();
    slider.update_position(args.position, ContainerBounds::new(0.0, 100.0));

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from(if args.html {
            "comparison.html"
        } else {
            productclean::shell::COMPARISON_FILE_NAME
        })
    });

    if args.html {
        std::fs::write(&output, slider.render_html(&before, &after))?;
    } else {
        slider
            .compose(&before, &after, args.width, args.height)?
            .save(&output)?;
    }

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "output": output.display().to_string(),
            "position": slider.position(),
            "format": if args.html { "html" } else { "png" },
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Comparison: {} (divider at {}%)",
            output.display(),
            slider.position()
        );
    }

    Ok(())
}

async fn check_editor(args: ShellArgs, json_output: bool) -> anyhow::Result<()> {
    let editor = build_editor(&args.editor)?;
    let result = editor.health_check().await;

    if json_output {
        let status = serde_json::json!({
            "editor": editor.name(),
            "model": editor.model().as_str(),
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.user_message()),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        match &result {
            Ok(()) => println!("{} ({}): ok", editor.name(), editor.model().as_str()),
            Err(e) => println!("{} ({}): {}", editor.name(), editor.model().as_str(), e),
        }
    }

    result.map_err(Into::into)
}

fn list_presets(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct PresetInfo {
        name: &'static str,
        label: String,
        instruction: &'static str,
    }

    let presets: Vec<PresetInfo> = QuickAction::ALL
        .iter()
        .map(|action| PresetInfo {
            name: action.name(),
            label: action.label(),
            instruction: action.instruction(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&presets)?);
    } else {
        println!("Quick actions:\n");
        for p in &presets {
            println!("  {} ({})", p.name, p.label);
            println!("    {}", p.instruction);
        }
    }

    Ok(())
}
