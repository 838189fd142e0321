//! Rating denormalization service.
//!
//! Copies a computed poll rating onto other entities for fast reads,
//! routed by the `[dependents]` configuration table. Unconfigured
//! requests are ignored on purpose: callers may always ask for
//! denormalization, whether or not this deployment routes it anywhere.

use std::collections::BTreeMap;

use ballot_common::{AppError, AppResult, DependentsConfig};
use ballot_db::repositories::DependentRepository;

/// Rating denormalizer.
#[derive(Clone)]
pub struct RatingService {
    dependent_repo: DependentRepository,
    dependents: DependentsConfig,
}

impl RatingService {
    /// Create a new rating service with a validated routing table.
    #[must_use]
    pub const fn new(dependent_repo: DependentRepository, dependents: DependentsConfig) -> Self {
        Self {
            dependent_repo,
            dependents,
        }
    }

    /// Write `rating` onto each requested entity the routing table
    /// lists for (vote_kind, vote_code).
    ///
    /// Entities not listed in the routing are skipped silently. A
    /// listed entity that does not exist fails the call with not-found;
    /// entities already written in the same call stay written — there
    /// is no transaction spanning the loop.
    pub async fn denormalize(
        &self,
        rating: i64,
        entities: &BTreeMap<String, String>,
        vote_kind: &str,
        vote_code: &str,
    ) -> AppResult<()> {
        let Some(totals) = self
            .dependents
            .get(vote_kind)
            .and_then(|codes| codes.get(vote_code))
            .map(|routing| &routing.totals)
        else {
            return Ok(());
        };

        for (entity_name, entity_id) in entities {
            let Some(target) = totals.get(entity_name) else {
                continue;
            };

            if !self.dependent_repo.exists(entity_name, entity_id).await? {
                return Err(AppError::NotFound(entity_name.clone()));
            }

            self.dependent_repo
                .write_rating(entity_name, &target.field, entity_id, rating)
                .await?;

            tracing::debug!(
                entity = %entity_name,
                id = %entity_id,
                field = %target.field,
                rating,
                "Denormalized poll rating"
            );
        }

        Ok(())
    }
}
