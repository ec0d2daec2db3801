use parking_lot::RwLock;

/// Observable state of a data-fetching feature.
#[derive(Debug, Clone)]
pub struct FeatureState<T> {
    pub data: Option<T>,
    pub error_message: Option<String>,
    pub loading: bool,
}

impl<T> Default for FeatureState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error_message: None,
            loading: false,
        }
    }
}

/// Holds a `FeatureState` and discards results of superseded fetches.
///
/// The generation lives under the same lock as the state, so a check and the
/// write it guards cannot interleave with a newer `begin`.
pub(crate) struct Loader<T> {
    inner: RwLock<Tracked<T>>,
}

struct Tracked<T> {
    state: FeatureState<T>,
    generation: u64,
}

impl<T: Clone> Loader<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(Tracked {
                state: FeatureState::default(),
                generation: 0,
            }),
        }
    }

    /// Enter the loading state. The returned generation must be handed to
    /// `finish` or `cancel`.
    pub(crate) fn begin(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.generation += 1;
        inner.state.loading = true;
        inner.state.error_message = None;
        inner.generation
    }

    /// Apply a fetch result. Returns false if a newer fetch has started since.
    ///
    /// A failure keeps the previous data and only sets the error message.
    pub(crate) fn finish(&self, generation: u64, result: Result<T, String>) -> bool {
        let mut inner = self.inner.write();
        if inner.generation != generation {
            tracing::debug!("Discarding result of superseded fetch {}", generation);
            return false;
        }

        match result {
            Ok(data) => inner.state.data = Some(data),
            Err(message) => inner.state.error_message = Some(message),
        }
        inner.state.loading = false;
        true
    }

    /// Leave the loading state without a result, for a fetch that was abandoned.
    pub(crate) fn cancel(&self, generation: u64) -> bool {
        let mut inner = self.inner.write();
        if inner.generation != generation {
            return false;
        }
        inner.state.loading = false;
        true
    }

    pub(crate) fn snapshot(&self) -> FeatureState<T> {
        self.inner.read().state.clone()
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&FeatureState<T>) -> R) -> R {
        f(&self.inner.read().state)
    }
}
