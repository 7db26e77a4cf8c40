// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation controller. Players are held at the frame matching the
//! timeline rather than running on their own clock.

use crate::backend::{AnimationBackend, SharedPlayer};
use cliplane_engine::{wrap_offset_ms, Action, ActionId, Controller, ControllerError, ControllerParams, PreloadParams};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Controller for Lottie-style animation actions
pub struct AnimationController {
    backend: Arc<dyn AnimationBackend>,
    players: Mutex<HashMap<ActionId, SharedPlayer>>,
}

impl AnimationController {
    /// Create a controller on `backend`
    pub fn new(backend: Arc<dyn AnimationBackend>) -> Self {
        Self { backend, players: Mutex::new(HashMap::new()) }
    }

    /// Player for an action
    pub fn player(&self, id: &ActionId) -> Option<SharedPlayer> {
        self.players.lock().get(id).cloned()
    }

    fn go_to_and_stop(&self, params: &ControllerParams<'_>) {
        let Some(player) = self.player(&params.action.id) else {
            return;
        };
        let mut player = player.lock();
        let offset = params.time - params.action.start;
        if let Some(ms) = wrap_offset_ms(offset, player.duration()) {
            player.go_to_and_stop(ms);
        }
    }
}

fn outside(params: &ControllerParams<'_>) -> bool {
    params.time < params.action.start || params.time > params.action.end
}

impl Controller for AnimationController {
    fn id(&self) -> &str {
        "animation"
    }

    fn name(&self) -> &str {
        "Animation"
    }

    fn color(&self) -> &str {
        "#cc7299"
    }

    fn color_secondary(&self) -> &str {
        "#cc7299"
    }

    fn preload<'a>(&'a self, params: PreloadParams<'a>) -> BoxFuture<'a, Result<Action, ControllerError>> {
        async move {
            let PreloadParams { mut action, file, .. } = params;
            let player = self.backend.load(file).await?;
            let duration = player.duration();
            if duration > 0.0 {
                action.duration = Some(duration);
            }
            self.players.lock().insert(action.id.clone(), Arc::new(Mutex::new(player)));
            Ok::<_, ControllerError>(action)
        }
        .boxed()
    }

    fn enter(&self, params: &mut ControllerParams<'_>) {
        if self.player(&params.action.id).is_none() {
            warn!("Animation action {} was not preloaded", params.action.id);
            return;
        }
        self.go_to_and_stop(params);
    }

    fn update(&self, params: &mut ControllerParams<'_>) {
        if outside(params) {
            return;
        }
        self.go_to_and_stop(params);
    }

    fn leave(&self, params: &mut ControllerParams<'_>) {
        if outside(params) {
            return;
        }
        self.go_to_and_stop(params);
    }

    fn destroy(&self) {
        self.players.lock().clear();
    }
}
