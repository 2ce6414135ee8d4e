use crate::store::StoreError;

#[derive(Debug)]
pub enum RebuildError {
    /// Selections could not be read or the fact set could not be replaced.
    /// Previous facts are still in place.
    Storage(StoreError),
    /// Events or categories needed for aggregation could not be loaded
    Context(StoreError),
    /// Reading or writing one player's data failed
    PlayerAggregation { player_id: String, source: StoreError },
    /// Cancelled before any work was done
    Cancelled,
}

impl std::fmt::Display for RebuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebuildError::Storage(e) => write!(f, "Fact storage failure: {}", e),
            RebuildError::Context(e) => write!(f, "Failed to load aggregation context: {}", e),
            RebuildError::PlayerAggregation { player_id, source } => {
                write!(f, "Aggregation failed for player {}: {}", player_id, source)
            }
            RebuildError::Cancelled => write!(f, "Rebuild cancelled"),
        }
    }
}

impl std::error::Error for RebuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RebuildError::Storage(e) | RebuildError::Context(e) => Some(e),
            RebuildError::PlayerAggregation { source, .. } => Some(source),
            RebuildError::Cancelled => None,
        }
    }
}
