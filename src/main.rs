//! Pose Explorer command line driver.
//!
//! Loads the saved scene (or builds the default one), runs a single command
//! against it and saves the result.
//!
//! `POSE_EXPLORER_CONFIG` points at an optional JSON config file and
//! `POSE_EXPLORER_STORE` at the storage directory (default `.pose-explorer`).

use clap::{Parser, Subcommand};
use pose_explorer::{
    EditorConfig, FileStore, GltfModelLoader, HeadlessViewport, ObjectId, SceneEditor,
};
use std::path::PathBuf;

type Editor = SceneEditor<HeadlessViewport, FileStore>;

#[derive(Parser)]
#[command(name = "pose-explorer")]
#[command(about = "Edit a saved shape and character scene")]
struct Cli {
    /// Storage directory for the scene and pose libraries
    #[arg(long, env = "POSE_EXPLORER_STORE", default_value = ".pose-explorer")]
    store: PathBuf,
    /// Optional JSON editor config
    #[arg(long, env = "POSE_EXPLORER_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List objects in the scene (default)
    List,
    /// List the shape catalog keys
    Shapes,
    /// Create an object from a shape key or model path
    Add { source: String },
    /// Delete an object
    Delete {
        #[arg(value_parser = parse_id)]
        id: ObjectId,
    },
    /// Apply a stored pose to an object; an empty name restores the default pose
    Pose {
        #[arg(value_parser = parse_id)]
        id: ObjectId,
        name: String,
    },
    /// Store an object's current bone transforms as a named pose
    Capture {
        #[arg(value_parser = parse_id)]
        id: ObjectId,
        name: String,
    },
    /// Clear the scene and start over with one random primitive
    Reset,
}

/// Accepts `3` or `#3`.
fn parse_id(arg: &str) -> Result<ObjectId, String> {
    arg.trim_start_matches('#')
        .parse()
        .map(ObjectId)
        .map_err(|err| format!("invalid object id '{arg}': {err}"))
}

fn load_config(path: Option<&PathBuf>) -> EditorConfig {
    let Some(path) = path else {
        return EditorConfig::default();
    };
    match EditorConfig::from_file(path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(err) => {
            log::warn!("Failed to read config {}: {}; using defaults", path.display(), err);
            EditorConfig::default()
        }
    }
}

fn print_objects(editor: &Editor) {
    for record in editor.objects() {
        let marker = if editor.selected_id() == Some(record.id) { "*" } else { " " };
        let t = record.node.transform.translation;
        println!(
            "{marker} {:<6} {:<32} pos=({:.2}, {:.2}, {:.2}) scale={:.2} pose={}",
            record.id.to_string(),
            record.source_type,
            t.x,
            t.y,
            t.z,
            record.relative_scale,
            if record.applied_pose_name.is_empty() {
                "-"
            } else {
                &record.applied_pose_name
            }
        );
    }
}

fn run(editor: &mut Editor, command: Command) {
    match command {
        Command::List => print_objects(editor),
        Command::Shapes => {
            for key in editor.shape_keys() {
                println!("{key}");
            }
        }
        Command::Add { source } => {
            let id = futures::executor::block_on(editor.create_object(&source));
            println!("created {id}");
        }
        Command::Delete { id } => {
            editor.delete_object(id);
        }
        Command::Pose { id, name } => {
            editor.select_object(Some(id));
            if let Some(report) = editor.apply_pose(&name) {
                println!("{} bones applied, {} not found", report.applied, report.not_found);
            }
        }
        Command::Capture { id, name } => {
            editor.select_object(Some(id));
            if editor.capture_pose(&name).is_ok() {
                println!("captured '{}'", name.trim());
            }
        }
        Command::Reset => {
            editor.reset_to_defaults();
        }
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    let store = match FileStore::open(&cli.store) {
        Ok(store) => store,
        Err(err) => {
            log::error!("Failed to open store: {}", err);
            std::process::exit(1);
        }
    };

    let mut editor = SceneEditor::new(
        config,
        HeadlessViewport::new(),
        store,
        Box::new(GltfModelLoader::new(".")),
    );
    let outcome = futures::executor::block_on(editor.initialize());
    log::info!("Startup: {:?}", outcome);

    run(&mut editor, cli.command.unwrap_or(Command::List));
    if editor.save_scene().is_err() {
        std::process::exit(1);
    }
}
