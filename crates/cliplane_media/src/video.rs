// SPDX-License-Identifier: MIT OR Apache-2.0
//! Video controller.
//!
//! Synced elements draw their current frame into the render surface on
//! every render pass.

use crate::backend::{SharedVideo, VideoBackend};
use cliplane_engine::{Action, ActionId, Controller, ControllerError, ControllerParams, PreloadParams};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest element/timeline mismatch tolerated while playing, in seconds
const DRIFT_TOLERANCE: f64 = 0.1;

/// Controller for video actions
pub struct VideoController {
    backend: Arc<dyn VideoBackend>,
    elements: Mutex<HashMap<ActionId, SharedVideo>>,
    synced: Mutex<HashSet<ActionId>>,
}

impl VideoController {
    /// Create a controller on `backend`
    pub fn new(backend: Arc<dyn VideoBackend>) -> Self {
        Self {
            backend,
            elements: Mutex::new(HashMap::new()),
            synced: Mutex::new(HashSet::new()),
        }
    }

    /// Element for an action
    pub fn element(&self, id: &ActionId) -> Option<SharedVideo> {
        self.elements.lock().get(id).cloned()
    }

    /// Whether an action's element is drawing into the surface
    pub fn is_synced(&self, id: &ActionId) -> bool {
        self.synced.lock().contains(id)
    }
}

impl Controller for VideoController {
    fn id(&self) -> &str {
        "video"
    }

    fn name(&self) -> &str {
        "Video"
    }

    fn color(&self) -> &str {
        "#7299cc"
    }

    fn color_secondary(&self) -> &str {
        "#7299cc"
    }

    fn preload<'a>(&'a self, params: PreloadParams<'a>) -> BoxFuture<'a, Result<Action, ControllerError>> {
        async move {
            let PreloadParams { mut action, file, render_width, render_height } = params;
            let element = self.backend.load(file, render_width, render_height).await?;
            let duration = element.duration();
            if duration > 0.0 {
                action.duration = Some(duration);
            }
            self.elements.lock().insert(action.id.clone(), Arc::new(Mutex::new(element)));
            Ok::<_, ControllerError>(action)
        }
        .boxed()
    }

    fn enter(&self, params: &mut ControllerParams<'_>) {
        let Some(element) = self.element(&params.action.id) else {
            warn!("Video action {} was not preloaded", params.action.id);
            return;
        };
        self.synced.lock().insert(params.action.id.clone());
        let mut e = element.lock();
        e.seek(params.action_time());
        if params.is_playing() {
            e.play();
        }
        debug!("Video {} entered at {:.3}s", params.action.id, params.action_time());
    }

    fn start(&self, params: &mut ControllerParams<'_>) {
        if let Some(element) = self.element(&params.action.id) {
            if params.is_playing() {
                element.lock().play();
            }
        }
    }

    fn stop(&self, params: &mut ControllerParams<'_>) {
        if let Some(element) = self.element(&params.action.id) {
            element.lock().pause();
        }
    }

    fn update(&self, params: &mut ControllerParams<'_>) {
        if params.is_hidden() || !self.is_synced(&params.action.id) {
            return;
        }
        let Some(element) = self.element(&params.action.id) else {
            return;
        };
        let Some(surface) = params.surface.clone() else {
            return;
        };
        let expected = params.action_time();
        let frame = {
            let mut e = element.lock();
            if !params.is_playing() || (e.current_time() - expected).abs() > DRIFT_TOLERANCE {
                e.seek(expected);
            }
            e.frame(params.render_width, params.render_height)
        };
        surface
            .lock()
            .draw_image(&frame, 0, 0, params.render_width, params.render_height);
    }

    fn leave(&self, params: &mut ControllerParams<'_>) {
        self.synced.lock().remove(&params.action.id);
        if let Some(surface) = &params.surface {
            surface.lock().clear();
        }
        self.stop(params);
    }

    fn destroy(&self) {
        self.synced.lock().clear();
        self.elements.lock().clear();
    }
}
