//! Request-scoped batching and caching of keyed loads
//!
//! Every `load(key)` issued while a batch is open joins that batch. The first
//! waiter yields once to the executor so sibling resolvers polled in the same
//! pass can enqueue their keys, then closes the batch and issues a single
//! storage call for the deduplicated key list. Results are re-associated by
//! key, so storage may return rows in any order.
//!
//! The requested shape is the union of every projection handed in before the
//! first dispatch and stays fixed from then on. A later load asking for
//! columns outside that shape goes through a second lane that fetches full
//! rows, so a cached row never stands in for columns it was not loaded with.
//!
//! Outcomes are cached per key and lane for the lifetime of the loader,
//! failures included. A loader lives for exactly one request.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::error::{AppError, AppResult};
use crate::graphql::projection::Projection;

/// A batch function for one relation edge.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    type Key: Copy + Eq + Hash + Debug + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;

    /// Name used in logs and in `BatchDispatch` errors.
    const NAME: &'static str;

    /// Fetch every key in one storage call. `None` asks for full rows. Keys
    /// absent from the returned map are resolved through
    /// [`Loader::on_missing`].
    async fn load(
        &self,
        keys: &[Self::Key],
        shape: Option<&Projection>,
    ) -> AppResult<HashMap<Self::Key, Self::Value>>;

    /// Result for a key the batch did not return.
    fn on_missing(&self, key: Self::Key) -> AppResult<Self::Value>;
}

type Outcome<L> = AppResult<Arc<HashMap<<L as Loader>::Key, <L as Loader>::Value>>>;

struct Batch<L: Loader> {
    keys: Mutex<Vec<L::Key>>,
    outcome: OnceCell<Outcome<L>>,
}

impl<L: Loader> Batch<L> {
    fn new() -> Self {
        Self {
            keys: Mutex::new(Vec::new()),
            outcome: OnceCell::new(),
        }
    }
}

struct Lane<L: Loader> {
    /// Every key seen so far, pointing at the batch that carries it.
    cache: HashMap<L::Key, Arc<Batch<L>>>,
    /// The batch still accepting keys, if any.
    open: Option<Arc<Batch<L>>>,
    /// Columns this lane fetches; `None` means full rows.
    shape: Option<Projection>,
    /// Set by the first dispatch. The shape no longer changes after that.
    frozen: bool,
}

impl<L: Loader> Lane<L> {
    fn new() -> Self {
        Self {
            cache: HashMap::new(),
            open: None,
            shape: None,
            frozen: false,
        }
    }
}

/// Coalescing, caching front for a [`Loader`].
pub struct BatchLoader<L: Loader> {
    loader: L,
    /// Loads with the request's shape.
    shaped: Mutex<Lane<L>>,
    /// Full-row loads for selections the frozen shape does not cover.
    full: Mutex<Lane<L>>,
    dispatches: AtomicUsize,
}

impl<L: Loader> BatchLoader<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            shaped: Mutex::new(Lane::new()),
            full: Mutex::new(Lane::new()),
            dispatches: AtomicUsize::new(0),
        }
    }

    /// Add the columns a caller wants to the shape. Ignored once the first
    /// batch has gone out.
    pub fn set_shape(&self, projection: &Projection) {
        let mut lane = self.shaped.lock();
        if lane.frozen {
            tracing::trace!(loader = L::NAME, "Shape already fixed, ignoring");
            return;
        }
        match &mut lane.shape {
            Some(shape) => shape.merge_columns(projection),
            None => lane.shape = Some(projection.clone()),
        }
    }

    /// Storage calls issued so far.
    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }

    /// Resolve one key with whatever shape the loader has.
    #[cfg(test)]
    pub async fn load(&self, key: L::Key) -> AppResult<L::Value> {
        self.load_in(&self.shaped, key).await
    }

    /// Resolve one key, guaranteeing the columns of `projection` were
    /// fetched.
    pub async fn load_with(&self, key: L::Key, projection: &Projection) -> AppResult<L::Value> {
        self.set_shape(projection);
        let covered = {
            let lane = self.shaped.lock();
            lane.shape.as_ref().is_none_or(|shape| shape.covers(projection))
        };

        if covered {
            self.load_in(&self.shaped, key).await
        } else {
            tracing::debug!(
                loader = L::NAME,
                key = ?key,
                "Selection outside the fixed shape, loading full row"
            );
            self.load_in(&self.full, key).await
        }
    }

    async fn load_in(&self, lane: &Mutex<Lane<L>>, key: L::Key) -> AppResult<L::Value> {
        let batch = Self::enqueue(lane, key);
        let outcome = batch
            .outcome
            .get_or_init(|| self.dispatch(lane, &batch))
            .await;

        match outcome {
            Ok(values) => match values.get(&key) {
                Some(value) => Ok(value.clone()),
                None => self.loader.on_missing(key),
            },
            Err(err) => Err(AppError::batch(L::NAME, err.clone())),
        }
    }

    fn enqueue(lane: &Mutex<Lane<L>>, key: L::Key) -> Arc<Batch<L>> {
        let mut state = lane.lock();
        if let Some(batch) = state.cache.get(&key) {
            return Arc::clone(batch);
        }

        let batch = match &state.open {
            Some(open) => Arc::clone(open),
            None => {
                let open = Arc::new(Batch::new());
                state.open = Some(Arc::clone(&open));
                open
            }
        };
        batch.keys.lock().push(key);
        state.cache.insert(key, Arc::clone(&batch));
        batch
    }

    async fn dispatch(&self, lane: &Mutex<Lane<L>>, batch: &Arc<Batch<L>>) -> Outcome<L> {
        tokio::task::yield_now().await;

        let shape = {
            let mut state = lane.lock();
            if state
                .open
                .as_ref()
                .is_some_and(|open| Arc::ptr_eq(open, batch))
            {
                state.open = None;
            }
            state.frozen = true;
            state.shape.clone()
        };

        let keys = batch.keys.lock().clone();
        let dispatch = self.dispatches.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            loader = L::NAME,
            dispatch,
            key_count = keys.len(),
            "Dispatching batch load"
        );

        match self.loader.load(&keys, shape.as_ref()).await {
            Ok(values) => Ok(Arc::new(values)),
            Err(err) => {
                tracing::warn!(loader = L::NAME, error = %err, "Batch load failed");
                Err(err)
            }
        }
    }
}
