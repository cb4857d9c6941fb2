//! Rename execution.
//!
//! Actions run in a fixed order: texture files, datablocks, then the save
//! file and its folder. A failing action is logged and recorded; the rest
//! still run. Nothing is rolled back.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use super::{FailedAction, RenameAction, RenameOutcome, RenamePlan};
use crate::core::errors::{HatError, Result};
use crate::scene::paths::{host_basename, normalize_lexically, resolve_host_path, rewrite_file_name};
use crate::scene::SceneHost;

/// Apply `plan` to the host and the file system.
pub fn execute_plan(host: &mut dyn SceneHost, plan: &RenamePlan) -> RenameOutcome {
    let mut outcome = RenameOutcome::default();

    for action in &plan.actions {
        if let RenameAction::TextureFile {
            old_path, new_path, ..
        } = action
        {
            let result = rename_texture(host, old_path, new_path);
            record(&mut outcome, action, result);
        }
    }

    for action in &plan.actions {
        if let RenameAction::Datablock {
            container,
            old_name,
            new_name,
            ..
        } = action
        {
            let result = host.rename_datablock(container, old_name, new_name);
            if result.is_ok() {
                debug!("Renamed datablock {}.{} -> {}", container, old_name, new_name);
            }
            record(&mut outcome, action, result);
        }
    }

    let save = plan
        .actions
        .iter()
        .find(|action| matches!(action, RenameAction::SaveFile { .. }));
    let folder = plan
        .actions
        .iter()
        .find(|action| matches!(action, RenameAction::ParentFolder { .. }));

    let mut target_name = host
        .file_path()
        .and_then(Path::file_name)
        .map(|name| name.to_owned());

    // A save file action waiting for the folder step to save it.
    let mut save_in_folder = None;
    if let Some(
        action @ RenameAction::SaveFile {
            old_path,
            new_path,
            backup_path,
            ..
        },
    ) = save
    {
        match back_up(old_path, backup_path) {
            Err(e) => record(&mut outcome, action, Err(e)),
            Ok(()) => {
                target_name = new_path.file_name().map(|name| name.to_owned());
                match folder {
                    Some(_) => save_in_folder = Some(action),
                    None => record(&mut outcome, action, host.save_as(new_path)),
                }
            }
        }
    }

    if let Some(
        action @ RenameAction::ParentFolder {
            old_path, new_path, ..
        },
    ) = folder
    {
        let Some(file_name) = target_name else {
            record(
                &mut outcome,
                action,
                Err(HatError::precondition("Scene has never been saved")),
            );
            if let Some(save_action) = save_in_folder {
                record(
                    &mut outcome,
                    save_action,
                    Err(HatError::precondition("Save file has no name")),
                );
            }
            return outcome;
        };

        match fs::rename(old_path, new_path) {
            Ok(()) => {
                debug!(
                    "Renamed folder {} -> {}",
                    old_path.display(),
                    new_path.display()
                );
                let saved = host.save_as(&new_path.join(&file_name));
                match save_in_folder {
                    Some(save_action) => {
                        record(&mut outcome, save_action, saved);
                        record(&mut outcome, action, Ok(()));
                    }
                    None => record(&mut outcome, action, saved),
                }
            }
            Err(e) => {
                record(
                    &mut outcome,
                    action,
                    Err(HatError::io_at("rename folder", old_path, e)),
                );
                // The backup already moved the scene aside: keep it under the
                // new name in the original folder.
                if let Some(save_action) = save_in_folder {
                    let saved = host.save_as(&old_path.join(&file_name));
                    record(&mut outcome, save_action, saved);
                }
            }
        }
    }

    outcome
}

fn record(outcome: &mut RenameOutcome, action: &RenameAction, result: Result<()>) {
    match result {
        Ok(()) => outcome.applied.push(action.clone()),
        Err(e) => {
            error!("Failed to execute '{}': {}", action, e);
            outcome.failed.push(FailedAction {
                action: action.clone(),
                error: e.to_string(),
            });
        }
    }
}

fn back_up(old_path: &Path, backup_path: &Path) -> Result<()> {
    fs::rename(old_path, backup_path).map_err(|e| HatError::io_at("back up", old_path, e))?;
    debug!("Created backup {}", backup_path.display());
    Ok(())
}

/// Rename a texture file and repoint every image that used it.
fn rename_texture(host: &mut dyn SceneHost, old_path: &Path, new_path: &Path) -> Result<()> {
    fs::rename(old_path, new_path).map_err(|e| HatError::io_at("rename", old_path, e))?;
    debug!(
        "Renamed texture {} -> {}",
        old_path.display(),
        new_path.display()
    );

    let new_name = new_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target = normalize_lexically(old_path);
    let save_dir: Option<PathBuf> = host.save_dir().map(Path::to_path_buf);

    let updates: Vec<(String, String)> = host
        .images()
        .iter()
        .filter(|image| !image.filepath.is_empty())
        .filter(|image| resolve_host_path(&image.filepath, save_dir.as_deref()) == target)
        .map(|image| {
            (
                image.name.clone(),
                rewrite_file_name(&image.filepath, &new_name),
            )
        })
        .collect();

    for (image, filepath) in updates {
        host.set_image_filepath(&image, &filepath)?;
        debug!(
            "Updated image {} -> {}",
            image,
            host_basename(&filepath)
        );
    }
    Ok(())
}
