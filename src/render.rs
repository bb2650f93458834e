//! Live-rendering handles.
//!
//! A [`Renderer`] hands out at most one [`RenderingHandle`] per run. The
//! engine wraps it in a [`RenderSession`], which releases the handle when it
//! goes out of scope, so every exit path of a run (early return, plugin
//! failure, panic) gives the handle back.
//!
//! Failing to acquire a handle ([`RenderError::Unavailable`]) only downgrades
//! the run to static analysis. A handle that breaks while in use reports
//! [`RenderError::Script`] instead.

use std::ops::Deref;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use crate::js_engine::JsEngine;

/// Rendering failures.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No handle could be acquired.
    #[error("rendering unavailable: {0}")]
    Unavailable(String),

    /// A script failed on a live handle.
    #[error("script evaluation failed: {0}")]
    Script(String),
}

/// A session able to evaluate scripts against a rendered page.
pub trait RenderingHandle: Send + Sync {
    /// Evaluate `script` and return its result as JSON.
    fn evaluate(&self, script: &str) -> Result<serde_json::Value, RenderError>;

    /// Free the underlying resources. Called exactly once by [`RenderSession`].
    fn release(&mut self) {}
}

/// Source of live-rendering handles.
pub trait Renderer: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn RenderingHandle>, RenderError>;
}

/// Scope guard that releases its handle on drop.
pub struct RenderSession {
    handle: Box<dyn RenderingHandle>,
}

impl RenderSession {
    pub fn new(handle: Box<dyn RenderingHandle>) -> Self {
        Self { handle }
    }

    /// Acquire a session, logging and returning `None` if rendering is
    /// unavailable.
    pub fn open(renderer: &dyn Renderer) -> Option<Self> {
        match renderer.acquire() {
            Ok(handle) => Some(Self::new(handle)),
            Err(e) => {
                warn!("{e}. Falling back to static extraction only.");
                None
            }
        }
    }

    pub fn handle(&self) -> &dyn RenderingHandle {
        self.handle.as_ref()
    }
}

impl Deref for RenderSession {
    type Target = dyn RenderingHandle;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref()
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        debug!("Releasing rendering handle");
        self.handle.release();
    }
}

/// Renderer that never produces a handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRenderer;

impl Renderer for DisabledRenderer {
    fn acquire(&self) -> Result<Box<dyn RenderingHandle>, RenderError> {
        Err(RenderError::Unavailable("rendering disabled".into()))
    }
}

/// Renderer backed by an embedded QuickJS context.
///
/// There is no layout engine behind it; scripts run against a DOM shim and
/// style queries come back empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuickJsRenderer;

impl Renderer for QuickJsRenderer {
    fn acquire(&self) -> Result<Box<dyn RenderingHandle>, RenderError> {
        let engine = JsEngine::with_dom().map_err(|e| RenderError::Unavailable(format!("{e:#}")))?;
        Ok(Box::new(QuickJsHandle {
            engine: Mutex::new(Some(engine)),
        }))
    }
}

struct QuickJsHandle {
    engine: Mutex<Option<JsEngine>>,
}

impl RenderingHandle for QuickJsHandle {
    fn evaluate(&self, script: &str) -> Result<serde_json::Value, RenderError> {
        let guard = self
            .engine
            .lock()
            .map_err(|_| RenderError::Script("rendering handle poisoned".into()))?;
        let engine = guard
            .as_ref()
            .ok_or_else(|| RenderError::Script("rendering handle already released".into()))?;
        engine
            .eval_json(script)
            .map_err(|e| RenderError::Script(format!("{e:#}")))
    }

    fn release(&mut self) {
        let engine = match self.engine.get_mut() {
            Ok(engine) => engine,
            Err(poisoned) => poisoned.into_inner(),
        };
        engine.take();
    }
}
