//! crates/skill_swap_core/src/matcher.rs
//!
//! Finds users whose skills overlap with the caller's in either direction.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{MatchCandidate, UserId, UserProfile};
use crate::ports::{DatabaseService, PortResult};

/// Skills in `wanted` that also appear in `offered`, in `wanted` order and without repeats.
pub fn shared_skills(wanted: &[String], offered: &[String]) -> Vec<String> {
    let mut shared: Vec<String> = Vec::new();
    for skill in wanted {
        if offered.contains(skill) && !shared.contains(skill) {
            shared.push(skill.clone());
        }
    }
    shared
}

/// Returns every profile in `all_profiles` (other than `user`) that teaches something
/// `user` wants to learn, or wants to learn something `user` teaches.
///
/// Candidates keep the order of `all_profiles`. No scoring is applied.
pub fn find_matches(user: &UserProfile, all_profiles: &[UserProfile]) -> Vec<MatchCandidate> {
    all_profiles
        .iter()
        .filter(|candidate| candidate.id != user.id)
        .filter_map(|candidate| {
            let shared_teach = shared_skills(&user.learn_skills, &candidate.teach_skills);
            let shared_learn = shared_skills(&user.teach_skills, &candidate.learn_skills);
            if shared_teach.is_empty() && shared_learn.is_empty() {
                return None;
            }
            Some(MatchCandidate {
                profile: candidate.clone(),
                shared_teach,
                shared_learn,
            })
        })
        .collect()
}

/// Reads profiles from the store and runs [`find_matches`] for a user.
#[derive(Clone)]
pub struct Matcher {
    db: Arc<dyn DatabaseService>,
}

impl Matcher {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn matches_for(&self, user_id: UserId) -> PortResult<Vec<MatchCandidate>> {
        let user = self.db.get_profile(user_id).await?;
        let profiles = self.db.list_profiles().await?;
        let matches = find_matches(&user, &profiles);
        debug!(%user_id, candidates = matches.len(), "computed matches");
        Ok(matches)
    }
}
