/// Reaction toggle engine
///
/// A post's reactions are two disjoint sets of user ids: likers and
/// dislikers. Every vote goes through [`ReactionState::apply`]:
///
/// 1. If the user is already in the target set, the vote is retracted.
/// 2. Otherwise the user is added to the target set.
/// 3. The user is always removed from the opposite set.
///
/// The engine is pure. Persisting the result and guarding against lost
/// updates is the caller's job (see `services::reactions`).
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactionError {
    #[error("invalid vote kind '{0}', expected 'like' or 'dislike'")]
    InvalidVoteKind(String),

    #[error("user {0} is present in both likes and dislikes")]
    ConflictingMembership(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Like => "like",
            VoteKind::Dislike => "dislike",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            VoteKind::Like => VoteKind::Dislike,
            VoteKind::Dislike => VoteKind::Like,
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteKind {
    type Err = ReactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(VoteKind::Like),
            "dislike" => Ok(VoteKind::Dislike),
            other => Err(ReactionError::InvalidVoteKind(other.to_string())),
        }
    }
}

/// Likers and dislikers of a single post.
///
/// Fields are private so the sets can only change through [`apply`](Self::apply).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReactionState {
    #[schema(value_type = Vec<Uuid>)]
    likes: BTreeSet<Uuid>,
    #[schema(value_type = Vec<Uuid>)]
    dislikes: BTreeSet<Uuid>,
}

impl ReactionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a state from persisted sets, rejecting a user found in both.
    pub fn from_parts<L, D>(likes: L, dislikes: D) -> Result<Self, ReactionError>
    where
        L: IntoIterator<Item = Uuid>,
        D: IntoIterator<Item = Uuid>,
    {
        let likes: BTreeSet<Uuid> = likes.into_iter().collect();
        let dislikes: BTreeSet<Uuid> = dislikes.into_iter().collect();

        if let Some(user_id) = likes.intersection(&dislikes).next() {
            return Err(ReactionError::ConflictingMembership(*user_id));
        }

        Ok(Self { likes, dislikes })
    }

    pub fn likes(&self) -> &BTreeSet<Uuid> {
        &self.likes
    }

    pub fn dislikes(&self) -> &BTreeSet<Uuid> {
        &self.dislikes
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn dislike_count(&self) -> usize {
        self.dislikes.len()
    }

    /// The vote `user_id` currently holds, if any
    pub fn reaction_of(&self, user_id: Uuid) -> Option<VoteKind> {
        if self.likes.contains(&user_id) {
            Some(VoteKind::Like)
        } else if self.dislikes.contains(&user_id) {
            Some(VoteKind::Dislike)
        } else {
            None
        }
    }

    /// Compute the state after `user_id` votes `kind`.
    ///
    /// `self` is left untouched. Casting, switching and retracting are all
    /// the same call: the outcome depends only on where the user stood.
    pub fn apply(&self, user_id: Uuid, kind: VoteKind) -> ReactionState {
        let mut next = self.clone();
        let (target, other) = next.sets_mut(kind);

        if !target.remove(&user_id) {
            target.insert(user_id);
        }
        other.remove(&user_id);

        next
    }

    fn sets_mut(&mut self, kind: VoteKind) -> (&mut BTreeSet<Uuid>, &mut BTreeSet<Uuid>) {
        match kind {
            VoteKind::Like => (&mut self.likes, &mut self.dislikes),
            VoteKind::Dislike => (&mut self.dislikes, &mut self.likes),
        }
    }
}

/// String-accepting form of [`ReactionState::apply`] for unparsed input
pub fn apply_reaction(
    state: &ReactionState,
    user_id: Uuid,
    vote_kind: &str,
) -> Result<ReactionState, ReactionError> {
    let kind: VoteKind = vote_kind.parse()?;
    Ok(state.apply(user_id, kind))
}

/// Reaction state of a post as seen by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReactionSummary {
    pub post_id: Uuid,
    pub likes: Vec<Uuid>,
    pub dislikes: Vec<Uuid>,
    pub like_count: usize,
    pub dislike_count: usize,
    /// The viewer's current vote; `null` when they have none
    pub viewer_reaction: Option<VoteKind>,
}

impl ReactionSummary {
    pub fn for_viewer(post_id: Uuid, state: &ReactionState, viewer: Uuid) -> Self {
        Self {
            post_id,
            likes: state.likes.iter().copied().collect(),
            dislikes: state.dislikes.iter().copied().collect(),
            like_count: state.like_count(),
            dislike_count: state.dislike_count(),
            viewer_reaction: state.reaction_of(viewer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn state(likes: &[Uuid], dislikes: &[Uuid]) -> ReactionState {
        ReactionState::from_parts(likes.iter().copied(), dislikes.iter().copied()).unwrap()
    }

    #[test]
    fn test_like_on_empty_state_casts_vote() {
        let u1 = user(1);
        let next = ReactionState::new().apply(u1, VoteKind::Like);

        assert_eq!(next, state(&[u1], &[]));
        assert_eq!(next.reaction_of(u1), Some(VoteKind::Like));
    }

    #[test]
    fn test_repeat_like_retracts() {
        let u1 = user(1);
        let next = state(&[u1], &[]).apply(u1, VoteKind::Like);

        assert_eq!(next, ReactionState::new());
        assert_eq!(next.reaction_of(u1), None);
    }

    #[test]
    fn test_dislike_switches_existing_like() {
        let u1 = user(1);
        let next = state(&[u1], &[]).apply(u1, VoteKind::Dislike);

        assert_eq!(next, state(&[], &[u1]));
    }

    #[test]
    fn test_like_leaves_other_users_alone() {
        let (u1, u2, u3) = (user(1), user(2), user(3));
        let next = state(&[u2], &[u3]).apply(u1, VoteKind::Like);

        assert_eq!(next, state(&[u1, u2], &[u3]));
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let u1 = user(1);
        let before = state(&[], &[u1]);
        let _ = before.apply(u1, VoteKind::Like);

        assert_eq!(before, state(&[], &[u1]));
    }

    #[test]
    fn test_scenario_like_like_dislike_like() {
        let u1 = user(1);

        let s1 = apply_reaction(&ReactionState::new(), u1, "like").unwrap();
        assert_eq!(s1, state(&[u1], &[]));

        let s2 = apply_reaction(&s1, u1, "like").unwrap();
        assert_eq!(s2, state(&[], &[]));

        let s3 = apply_reaction(&s2, u1, "dislike").unwrap();
        assert_eq!(s3, state(&[], &[u1]));

        let s4 = apply_reaction(&s3, u1, "like").unwrap();
        assert_eq!(s4, state(&[u1], &[]));
    }

    #[test]
    fn test_invalid_vote_kind_is_rejected() {
        let u1 = user(1);
        let before = state(&[u1], &[]);

        let err = apply_reaction(&before, u1, "neutral").unwrap_err();
        assert_eq!(err, ReactionError::InvalidVoteKind("neutral".to_string()));
        assert_eq!(before, state(&[u1], &[]));
    }

    #[test]
    fn test_vote_kind_parse_is_case_sensitive() {
        assert_eq!("like".parse::<VoteKind>(), Ok(VoteKind::Like));
        assert_eq!("dislike".parse::<VoteKind>(), Ok(VoteKind::Dislike));
        assert!("Like".parse::<VoteKind>().is_err());
        assert!("".parse::<VoteKind>().is_err());
    }

    #[test]
    fn test_vote_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&VoteKind::Dislike).unwrap(), "\"dislike\"");
        let kind: VoteKind = serde_json::from_str("\"like\"").unwrap();
        assert_eq!(kind, VoteKind::Like);
        assert_eq!(VoteKind::Like.opposite(), VoteKind::Dislike);
    }

    #[test]
    fn test_from_parts_rejects_overlap() {
        let u1 = user(1);
        let err = ReactionState::from_parts([u1], [u1]).unwrap_err();
        assert_eq!(err, ReactionError::ConflictingMembership(u1));
    }

    #[test]
    fn test_from_parts_deduplicates() {
        let u1 = user(1);
        let s = ReactionState::from_parts([u1, u1], []).unwrap();
        assert_eq!(s.like_count(), 1);
    }

    #[test]
    fn test_summary_reports_viewer_vote() {
        let (u1, u2) = (user(1), user(2));
        let post_id = user(99);
        let s = state(&[u2, u1], &[]);

        let summary = ReactionSummary::for_viewer(post_id, &s, u1);
        assert_eq!(summary.likes, vec![u1, u2]);
        assert_eq!(summary.like_count, 2);
        assert_eq!(summary.dislike_count, 0);
        assert_eq!(summary.viewer_reaction, Some(VoteKind::Like));

        let other = ReactionSummary::for_viewer(post_id, &s, user(3));
        assert_eq!(other.viewer_reaction, None);
    }

    #[test]
    fn test_state_serializes_sorted_arrays() {
        let (u1, u2) = (user(1), user(2));
        let json = serde_json::to_value(state(&[u2, u1], &[])).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "likes": [u1.to_string(), u2.to_string()],
                "dislikes": [],
            })
        );
    }
}
