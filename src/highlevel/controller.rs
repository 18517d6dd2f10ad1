//! ResourceStateController: the state machine in front of the core.
//!
//! Construction runs the initialisation sequence once:
//!
//! 1. diagnostics pick `Full`, `Constrained` or `Offline` from the probe;
//! 2. the personality vector is derived from the configured prompt
//!    (failure or timeout moves to `Fallback`);
//! 3. memory sync runs when `Full`, is skipped as local mode when `Offline`
//!    (failure moves to `Fallback`, timeout to `Offline`);
//! 4. the feature set is chosen, lightweight when `Constrained`.
//!
//! After that, [`ResourceStateController::process`] is the entry point:
//! bind with the personality, route, evaluate.

use crate::cognition::{
    CognitiveRouter, FeedbackTrainer, PerformanceInsights, ProcessContext,
};
use crate::collab::{
    EmbeddingProvider, ListFilter, ManualProbe, MemoryPersistence, ResourceProbe,
};
use crate::config::HolomemConfig;
use crate::error::{HolomemError, Result};
use crate::kernel::{ComputeScopeOptimizer, PromptDeriver, ScopeStats, Vector, VectorEncoder};
use crate::memory::{MemoryRecord, MemoryStore};
use crate::state::{FeatureSet, StateCell, SystemState};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handles to the outside world, constructed by the caller.
#[derive(Clone)]
pub struct Collaborators {
    pub probe: Arc<dyn ResourceProbe>,
    /// Personality prompt source. A [`PromptDeriver`] is used when absent.
    pub embedding: Option<Arc<dyn EmbeddingProvider>>,
    /// Sync target. Without one, sync is a no-op.
    pub persistence: Option<Arc<dyn MemoryPersistence>>,
}

impl Collaborators {
    pub fn with_probe(mut self, probe: Arc<dyn ResourceProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_embedding(mut self, embedding: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn MemoryPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            probe: Arc::new(ManualProbe::default()),
            embedding: None,
            persistence: None,
        }
    }
}

pub struct ResourceStateController {
    config: HolomemConfig,
    state: StateCell,
    optimizer: ComputeScopeOptimizer,
    encoder: Arc<VectorEncoder>,
    router: Arc<CognitiveRouter>,
    trainer: Mutex<FeedbackTrainer>,
    memory: Arc<MemoryStore>,
    personality: RwLock<Option<Vector>>,
    features: RwLock<FeatureSet>,
    probe: Arc<dyn ResourceProbe>,
    embedding: Arc<dyn EmbeddingProvider>,
    persistence: Option<Arc<dyn MemoryPersistence>>,
}

impl ResourceStateController {
    /// Build every component from `config` and run the initialisation
    /// sequence. Only configuration and probe errors are returned; the
    /// recoverable failures are absorbed into state transitions.
    pub async fn initialize(config: HolomemConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let optimizer = ComputeScopeOptimizer::from_config(&config);
        let encoder = Arc::new(VectorEncoder::new(&config, optimizer.clone()));
        let router = Arc::new(CognitiveRouter::new(&config, optimizer.clone()));
        let trainer = FeedbackTrainer::new(&config, Arc::clone(&router));
        let state = StateCell::new(SystemState::Full);
        let memory = Arc::new(
            MemoryStore::new(&config, Arc::clone(&encoder), state.view())
                .with_sync_tracking(collaborators.persistence.is_some()),
        );
        let embedding = collaborators.embedding.unwrap_or_else(|| {
            let deriver = match config.seed {
                Some(seed) => PromptDeriver::with_seed(config.dimensions, seed),
                None => PromptDeriver::new(config.dimensions),
            };
            Arc::new(deriver)
        });

        let controller = Self {
            config,
            state,
            optimizer,
            encoder,
            router,
            trainer: Mutex::new(trainer),
            memory,
            personality: RwLock::new(None),
            features: RwLock::new(FeatureSet::Full),
            probe: collaborators.probe,
            embedding,
            persistence: collaborators.persistence,
        };

        controller.run_diagnostics()?;
        let prompt = controller.config.personality_prompt.clone();
        controller.apply_personality(&prompt).await;
        controller.setup_memory_sync().await;
        controller.activate_features();

        info!(
            state = %controller.get_system_state(),
            features = ?controller.features(),
            personality = controller.has_personality(),
            "controller initialized"
        );
        Ok(controller)
    }

    fn run_diagnostics(&self) -> Result<SystemState> {
        let resources = self.probe.sample()?;
        let diagnosed = resources.diagnose();
        debug!(
            cpu = resources.cpu,
            memory = resources.memory,
            bandwidth = resources.bandwidth,
            diagnosed = %diagnosed,
            "diagnostics"
        );
        self.state.transition(diagnosed, "diagnostics");
        Ok(diagnosed)
    }

    async fn derive_personality(&self, prompt: &str) -> Result<Vector> {
        let data = bounded(
            "personality initialization",
            self.config.personality_timeout_ms,
            self.embedding.embed(prompt),
        )
        .await?;
        if data.len() != self.encoder.dimensions() {
            return Err(HolomemError::Initialization(format!(
                "personality embedding has {} values, expected {}",
                data.len(),
                self.encoder.dimensions()
            )));
        }
        self.encoder
            .create_pattern_vector(&data)
            .map_err(|e| HolomemError::Initialization(e.to_string()))
    }

    /// Returns whether a personality vector is in place afterwards.
    async fn apply_personality(&self, prompt: &str) -> bool {
        match self.derive_personality(prompt).await {
            Ok(vector) => {
                *self.personality.write() = Some(vector);
                true
            }
            Err(e) => {
                warn!(error = %e, "personality initialization failed, continuing without it");
                *self.personality.write() = None;
                self.state
                    .transition(SystemState::Fallback, "personality initialization failed");
                false
            }
        }
    }

    async fn setup_memory_sync(&self) {
        if self.get_system_state() == SystemState::Offline {
            info!("offline local mode, memory sync disabled");
            return;
        }
        if let Err(e) = self.sync_memories().await {
            debug!(error = %e, "initial memory sync did not complete");
        }
    }

    fn activate_features(&self) {
        let features = match self.get_system_state() {
            SystemState::Constrained => FeatureSet::Lightweight,
            _ => FeatureSet::Full,
        };
        *self.features.write() = features;
        self.trainer
            .lock()
            .set_telemetry_enabled(features.telemetry_enabled());
    }

    /// Bind with the personality (when present), route, then evaluate.
    pub fn process(&self, input: &Vector, context: &ProcessContext) -> Result<Vector> {
        let personality = self.personality.read().clone();
        let input = match personality {
            Some(p) => self.encoder.multi_dimensional_bind(&[input, &p])?,
            None => input.clone(),
        };

        let output = self.router.process(&input, context)?;
        self.trainer.lock().evaluate_performance(&input, &output)?;
        Ok(output)
    }

    pub fn get_system_state(&self) -> SystemState {
        self.state.get()
    }

    /// Re-derive the personality vector from `prompt`. Failure clears the
    /// personality and moves to `Fallback`, exactly like initialisation.
    pub async fn update_system_prompt(&self, prompt: &str) -> bool {
        info!(chars = prompt.len(), "updating system prompt");
        self.apply_personality(prompt).await
    }

    /// Push queued memories and buffered pattern telemetry to the persistence
    /// collaborator. Runs only in `Full`; returns the number of memories sent.
    ///
    /// On failure the memories are queued again and the controller moves to
    /// `Fallback` (`Offline` on timeout). There is no automatic retry.
    pub async fn sync_memories(&self) -> Result<usize> {
        let state = self.get_system_state();
        if state != SystemState::Full {
            debug!(state = %state, "memory sync skipped");
            return Ok(0);
        }
        let Some(persistence) = self.persistence.clone() else {
            return Ok(0);
        };

        let memories = self.memory.drain_pending_sync();
        let telemetry = self.trainer.lock().drain_telemetry();
        let push = async {
            persistence.list(&ListFilter::default().limit(1)).await?;
            for memory in &memories {
                persistence.insert(MemoryRecord::from(memory.as_ref())).await?;
            }
            for row in &telemetry {
                persistence.record_pattern(*row).await?;
            }
            Ok::<(), HolomemError>(())
        };

        match bounded("memory sync", self.config.sync_timeout_ms, push).await {
            Ok(()) => {
                info!(
                    memories = memories.len(),
                    patterns = telemetry.len(),
                    "memory sync complete"
                );
                Ok(memories.len())
            }
            Err(e) => {
                warn!(error = %e, requeued = memories.len(), "memory sync failed");
                self.memory.requeue_pending_sync(memories);
                match e {
                    timeout @ HolomemError::Timeout { .. } => {
                        self.state
                            .transition(SystemState::Offline, "memory sync timed out");
                        Err(timeout)
                    }
                    other => {
                        self.state
                            .transition(SystemState::Fallback, "memory sync failed");
                        Err(HolomemError::Sync(other.to_string()))
                    }
                }
            }
        }
    }

    /// Sample resources again and apply the diagnostics transition. The
    /// feature set follows the new state.
    pub fn reassess_resources(&self) -> Result<SystemState> {
        let state = self.run_diagnostics()?;
        self.activate_features();
        Ok(state)
    }

    pub fn features(&self) -> FeatureSet {
        *self.features.read()
    }

    pub fn has_personality(&self) -> bool {
        self.personality.read().is_some()
    }

    pub fn personality(&self) -> Option<Vector> {
        self.personality.read().clone()
    }

    pub fn memory_store(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    pub fn router(&self) -> &Arc<CognitiveRouter> {
        &self.router
    }

    pub fn encoder(&self) -> &Arc<VectorEncoder> {
        &self.encoder
    }

    pub fn insights(&self) -> PerformanceInsights {
        self.trainer.lock().performance_insights()
    }

    pub fn learning_rate(&self) -> f64 {
        self.trainer.lock().learning_rate()
    }

    pub fn history_len(&self) -> usize {
        self.trainer.lock().history().len()
    }

    pub fn scope_stats(&self) -> ScopeStats {
        self.optimizer.stats()
    }

    pub fn config(&self) -> &HolomemConfig {
        &self.config
    }
}

impl fmt::Debug for ResourceStateController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStateController")
            .field("state", &self.get_system_state())
            .field("features", &self.features())
            .field("personality", &self.has_personality())
            .field("memory", &self.memory)
            .field("router", &self.router)
            .finish()
    }
}

async fn bounded<T, F>(operation: &str, timeout_ms: u64, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => result,
        Err(_) => Err(HolomemError::Timeout {
            operation: operation.to_string(),
            timeout_ms,
        }),
    }
}
