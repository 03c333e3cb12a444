//! Shared state every router hangs off.
//!
//! The state is assembled once at startup: configuration, the opened capture
//! snapshot, and the type-erased registry of initialized feature slices.
//! Handlers clone the outer [`ApiState`] cheaply (one `Arc`).

use axum::extract::FromRef;
use fxhash::FxHashMap;
use std::any::TypeId;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;
use wm_archive::Archive;
use wm_domain::config::MirrorConfig;
use wm_domain::registry::{FeatureSlice, InitializedSlice};

#[derive(Debug, Error)]
pub enum ApiStateError {
    /// The builder was finalized without a mandatory component.
    #[error("State is missing a required component: {0}")]
    Incomplete(&'static str),
    /// A handler asked for a slice that was never registered.
    #[error("No feature slice registered for {0}")]
    MissingSlice(&'static str),
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: MirrorConfig,
    pub archive: Archive,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    /// The registered slice of type `T`, if any.
    #[must_use]
    pub fn get_slice<T: FeatureSlice>(&self) -> Option<&T> {
        let entry = self.inner.slices.get(&TypeId::of::<T>())?;
        entry.state.as_any().downcast_ref::<T>()
    }

    /// Like [`ApiState::get_slice`], but an unregistered slice is an error.
    ///
    /// # Errors
    /// Returns [`ApiStateError::MissingSlice`] naming the requested type.
    pub fn try_get_slice<T: FeatureSlice>(&self) -> Result<&T, ApiStateError> {
        self.get_slice::<T>()
            .ok_or_else(|| ApiStateError::MissingSlice(std::any::type_name::<T>()))
    }

    /// Number of registered feature slices (for diagnostics).
    #[must_use]
    pub fn slice_count(&self) -> usize {
        self.inner.slices.len()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for MirrorConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for Archive {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.archive.clone()
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<MirrorConfig>,
    archive: Option<Archive>,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

impl ApiStateBuilder {
    pub fn config(mut self, config: MirrorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn archive(mut self, archive: Archive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn register_slice(mut self, slice: InitializedSlice) -> Self {
        self.slices.insert(slice.id, slice);
        self
    }

    /// Registers multiple slices at once.
    pub fn register_slices<I>(mut self, slices: I) -> Self
    where
        I: IntoIterator<Item = InitializedSlice>,
    {
        for slice in slices {
            self.slices.insert(slice.id, slice);
        }
        self
    }

    /// Finalizes the state; config and archive are mandatory.
    ///
    /// # Errors
    /// Returns [`ApiStateError::Incomplete`] naming the missing component.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.ok_or(ApiStateError::Incomplete("MirrorConfig"))?;
        let archive = self.archive.ok_or(ApiStateError::Incomplete("Archive"))?;

        Ok(ApiState { inner: Arc::new(ApiStateInner { config, archive, slices: self.slices }) })
    }
}
