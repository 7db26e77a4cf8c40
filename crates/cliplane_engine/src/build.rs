// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track building from action descriptors.

use crate::action::{Action, ActionId, ActionInput};
use crate::controller::{ControllerRegistry, PreloadParams};
use crate::engine::Engine;
use crate::error::BuildError;
use crate::media_file::{file_name, resolve_src, MediaFile};
use crate::track::Track;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{error, info};

impl Engine {
    /// Build one track per descriptor, loading every action's media.
    ///
    /// All or nothing: on any failure the error is logged and no tracks
    /// are returned.
    pub async fn build_tracks(&self, controllers: &ControllerRegistry, inputs: Vec<ActionInput>) -> Vec<Track> {
        match self.try_build_tracks(controllers, inputs).await {
            Ok(tracks) => tracks,
            Err(e) => {
                error!("build_tracks: {e}");
                Vec::new()
            }
        }
    }

    /// Build one track per descriptor, returning the first failure
    pub async fn try_build_tracks(
        &self,
        controllers: &ControllerRegistry,
        inputs: Vec<ActionInput>,
    ) -> Result<Vec<Track>, BuildError> {
        let base_url = self.settings().base_url.as_deref();
        let actions = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| prepare(index, input, base_url, controllers))
            .collect::<Result<Vec<_>, _>>()?;

        let files = try_join_all(actions.iter().map(MediaFile::from_action)).await?;
        let files: Vec<Arc<MediaFile>> = files.into_iter().map(Arc::new).collect();

        let (render_width, render_height) = self.render_size();
        let loaded = try_join_all(actions.into_iter().zip(&files).map(|(action, file)| async move {
            let Some(controller) = action.controller.clone() else {
                return Ok::<_, BuildError>(action);
            };
            let params = PreloadParams { action, file: file.as_ref(), render_width, render_height };
            let mut action = controller.preload(params).await?;
            action.file = Some(Arc::clone(file));
            Ok(action)
        }))
        .await?;

        info!("Built {} tracks", loaded.len());
        Ok(loaded.into_iter().map(Track::single).collect())
    }
}

fn prepare(
    index: usize,
    input: ActionInput,
    base_url: Option<&str>,
    controllers: &ControllerRegistry,
) -> Result<Action, BuildError> {
    if input.src.trim().is_empty() {
        return Err(BuildError::MissingSource { index });
    }
    let src = resolve_src(&input.src, base_url);
    let named = input.name.as_deref().unwrap_or(&src);
    let (name, full_name) = (file_name(named, false), file_name(named, true));
    if name.is_empty() || full_name.is_empty() {
        return Err(BuildError::MissingName { index });
    }
    let controller = controllers
        .get(&input.controller_name)
        .cloned()
        .ok_or_else(|| BuildError::UnknownController(input.controller_name.clone()))?;

    let id = input.id.unwrap_or_else(ActionId::generate);
    let mut action = Action::new(id, input.start, input.end, input.controller_name)
        .with_src(src)
        .with_controller(controller);
    action.name = name;
    action.full_name = full_name;
    match input.z {
        Some(z) => action = action.with_z(z),
        None => action.z = i32::try_from(index).unwrap_or(i32::MAX),
    }
    action.layer = input.layer.unwrap_or_default();
    action.duration = input.duration;
    action.state = input.state;
    action.volume = input.volume;
    Ok(action)
}
