//! Fluent builder for seeding raw sorted sets.

use leaders_infrastructure::{OrderedSetStore, Result};

use crate::fixtures::player_scores;

/// Builder for writing members straight into one store key, bypassing the
/// engine's key derivation and score encoding.
#[derive(Debug, Clone)]
pub struct BoardSeeder {
    key: String,
    members: Vec<(String, f64)>,
}

impl BoardSeeder {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: impl Into<String>, score: f64) -> Self {
        self.members.push((member.into(), score));
        self
    }

    /// Add `player1..=playerN` scored `1.0..=N`.
    pub fn with_players(mut self, n: u32) -> Self {
        self.members.extend(player_scores(n));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn seed(self, store: &dyn OrderedSetStore) -> Result<String> {
        for (member, score) in &self.members {
            store.add_or_update_score(&self.key, member, *score).await?;
        }
        Ok(self.key)
    }
}
