//! Per-request generation stages
//!
//! ```text
//! Start → BuildingBase → GeneratingSections → Assembled → Rendering → Done
//!              │                │                 │           │
//!              └────────────────┴─────────────────┴───────────┴→ FallbackBuilding
//!                                                                     │
//!                                              FallbackRendering ←────┤
//!                                                     │               │
//!                                                FallbackDone     Failed
//! ```
//!
//! The machine runs once per request and never revisits a stage.

use crate::error::StageError;
use serde::Serialize;

/// Stage of one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Start,
    BuildingBase,
    GeneratingSections,
    Assembled,
    Rendering,
    Done,
    FallbackBuilding,
    FallbackRendering,
    /// Finished with a degraded document
    FallbackDone,
    /// Both paths failed
    Failed,
}

impl GenerationStage {
    /// Whether the request has finished
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::FallbackDone | Self::Failed)
    }
}

/// Stages reachable from `from`
#[must_use]
pub fn allowed_transitions(from: GenerationStage) -> Vec<GenerationStage> {
    use GenerationStage::*;
    match from {
        Start => vec![BuildingBase],
        BuildingBase => vec![GeneratingSections, FallbackBuilding],
        GeneratingSections => vec![Assembled, FallbackBuilding],
        Assembled => vec![Rendering, FallbackBuilding],
        Rendering => vec![Done, FallbackBuilding],
        FallbackBuilding => vec![FallbackRendering, Failed],
        FallbackRendering => vec![FallbackDone, Failed],
        Done | FallbackDone | Failed => vec![],
    }
}

/// Validates a stage transition.
///
/// # Errors
/// `StageError::IllegalTransition` if `to` is not reachable from `from`.
pub fn validate_transition(from: GenerationStage, to: GenerationStage) -> Result<(), StageError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StageError::IllegalTransition { from, to })
    }
}

/// Records the stages one request passes through
#[derive(Debug, Clone)]
pub struct StageTracker {
    generation_id: String,
    history: Vec<GenerationStage>,
}

impl StageTracker {
    /// Start tracking a request
    #[must_use]
    pub fn new(generation_id: impl Into<String>) -> Self {
        Self {
            generation_id: generation_id.into(),
            history: vec![GenerationStage::Start],
        }
    }

    /// Current stage
    #[must_use]
    pub fn current(&self) -> GenerationStage {
        self.history
            .last()
            .copied()
            .unwrap_or(GenerationStage::Start)
    }

    /// Every stage visited, in order
    #[must_use]
    pub fn history(&self) -> &[GenerationStage] {
        &self.history
    }

    /// Consume the tracker, returning the history
    #[must_use]
    pub fn into_history(self) -> Vec<GenerationStage> {
        self.history
    }

    /// Move to `to`
    ///
    /// # Errors
    /// `IllegalTransition` or `Revisit`; the tracker is unchanged on error.
    pub fn advance(&mut self, to: GenerationStage) -> Result<(), StageError> {
        let from = self.current();
        validate_transition(from, to)?;
        if self.history.contains(&to) {
            return Err(StageError::Revisit(to));
        }
        tracing::debug!(generation_id = %self.generation_id, ?from, ?to, "stage transition");
        self.history.push(to);
        Ok(())
    }
}
