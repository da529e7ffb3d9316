//! Dictum application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Initialize tracing
//! 3. Spawn a dictation surface on its own task
//! 4. Replay a script of fragments and directives against it
//! 5. Print the resulting document and caret

mod cli;
mod script;

use std::io::Read;
use std::path::Path;

use clap::Parser;
use dictum_core::config::DictumConfig;
use dictum_editor::{spawn_surface, DictationSurface, SurfaceHandle};
use serde_json::json;

use cli::CliArgs;
use script::Step;

fn read_script(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

async fn run_step(handle: &SurfaceHandle, step: Step) -> dictum_core::Result<()> {
    match step {
        Step::Fragment(fragment) => {
            let insertion = handle.insert_fragment(fragment).await?;
            tracing::debug!(
                caret = insertion.caret,
                command = ?insertion.command,
                degraded = ?insertion.degraded,
                "Fragment applied"
            );
        }
        Step::Select(range) => handle.select(range)?,
        Step::Blur => handle.blur()?,
        Step::Capture => {
            let captured = handle.focus_and_capture_position().await?;
            tracing::info!(captured = ?captured, "Position captured");
        }
        Step::Replace(content) => handle.replace_content(content)?,
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = DictumConfig::load_or_default(&config_file);

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Dictum v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Surface.
    let initial = args.initial.as_deref().map(script::unescape).unwrap_or_default();
    let surface = DictationSurface::with_content(&config, initial);
    let (handle, task) = spawn_surface(surface);
    let mut events = handle.subscribe();

    // Script.
    let source = read_script(args.script.as_deref())?;
    for (index, line) in source.lines().enumerate() {
        match script::parse_line(line) {
            Ok(Some(step)) => run_step(&handle, step).await?,
            Ok(None) => {}
            Err(e) => tracing::warn!(line = index + 1, error = %e, "Skipping script line"),
        }
    }

    // Output.
    let tracked = handle.tracked_selection().await?;
    handle.shutdown()?;
    let surface = task.await?;

    while let Ok(event) = events.try_recv() {
        tracing::debug!(event = event.event_name(), "Editor event");
    }

    let caret = tracked.map(|t| t.range);
    if args.json {
        let output = json!({
            "document_id": surface.id(),
            "text": surface.get_plain_text(),
            "content": surface.get_structured_content(),
            "selection": caret,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", surface.get_plain_text());
        if let Some(range) = caret {
            println!("selection: {}", range);
        }
    }

    Ok(())
}
