//! Ownership checks for mutations on owned resources

use crate::error::{AppError, AppResult};

/// Something the acting user wants to do to an owned resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Update { entity: &'static str, owner_id: i64 },
    Remove { entity: &'static str, owner_id: i64 },
}

impl Capability {
    fn owner_id(self) -> i64 {
        match self {
            Capability::Update { owner_id, .. } | Capability::Remove { owner_id, .. } => owner_id,
        }
    }

    fn denied(self) -> AppError {
        match self {
            Capability::Update { entity, .. } => AppError::Unauthorized {
                action: "update",
                entity,
            },
            Capability::Remove { entity, .. } => AppError::Unauthorized {
                action: "delete",
                entity,
            },
        }
    }
}

/// Allow the capability only when `actor_id` owns the resource.
pub fn authorize(actor_id: i64, capability: Capability) -> AppResult<()> {
    if capability.owner_id() == actor_id {
        return Ok(());
    }
    tracing::debug!(actor_id, ?capability, "Ownership check failed");
    Err(capability.denied())
}
