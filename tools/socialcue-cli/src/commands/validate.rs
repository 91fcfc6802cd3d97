//! Validate a scene file and lint the configuration.

use std::path::PathBuf;

use socialcue_common::config::AppConfig;
use socialcue_host_sim::load_scene;
use socialcue_scene_model::participant::Role;

pub fn run(config: &AppConfig, path: PathBuf) -> anyhow::Result<()> {
    println!("Validating scene at: {}", path.display());

    let scene = load_scene(&path)?;

    println!("  Name: {}", scene.name);
    println!("  Participants: {}", scene.participants.len());
    for p in &scene.participants {
        let role = match p.role {
            Role::LocalOwner => "local owner",
            Role::RemoteProxy => "remote proxy",
        };
        println!(
            "    - {} ({role}, {} keyframes, joins at {:.2}s)",
            p.name,
            p.keyframes.len(),
            p.joins_at_secs
        );
    }
    println!(
        "  Duration: {:.2}s",
        scene
            .duration_secs
            .unwrap_or_else(|| scene.natural_duration_secs())
    );
    if !scene.participants.iter().any(|p| p.role == Role::LocalOwner) {
        println!("  Note: no local owner; no feedback will be produced");
    }

    let warnings = config.lint();
    if warnings.is_empty() {
        println!("\nScene is valid.");
    } else {
        println!("\nConfiguration issues:");
        for warning in &warnings {
            println!("  - {warning}");
        }
        println!("\n{} issue(s) found.", warnings.len());
    }

    Ok(())
}
