//! Reward actions, their point values, and ledger entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action that earns a user reward points.
///
/// Unknown action names survive decoding as [`RewardAction::Other`] so a
/// newer producer cannot poison an older worker; they score zero.
///
/// # Examples
/// ```
/// use engagement::domain::RewardAction;
///
/// assert_eq!(RewardAction::from("createPost").points(), 5);
/// assert_eq!(RewardAction::from("shareStory").points(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RewardAction {
    CreatePost,
    CreateGroup,
    CreateComment,
    PostLiked,
    CommentLiked,
    Other(String),
}

impl RewardAction {
    /// Wire name of the action.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreatePost => "createPost",
            Self::CreateGroup => "createGroup",
            Self::CreateComment => "createComment",
            Self::PostLiked => "postLiked",
            Self::CommentLiked => "commentLiked",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Fixed point value for the action.
    pub fn points(&self) -> u32 {
        match self {
            Self::CreatePost => 5,
            Self::CreateGroup => 3,
            Self::CreateComment => 2,
            Self::PostLiked | Self::CommentLiked => 1,
            Self::Other(_) => 0,
        }
    }
}

impl From<&str> for RewardAction {
    fn from(value: &str) -> Self {
        match value {
            "createPost" => Self::CreatePost,
            "createGroup" => Self::CreateGroup,
            "createComment" => Self::CreateComment,
            "postLiked" => Self::PostLiked,
            "commentLiked" => Self::CommentLiked,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for RewardAction {
    fn from(value: String) -> Self {
        match Self::from(value.as_str()) {
            Self::Other(_) => Self::Other(value),
            known => known,
        }
    }
}

impl From<RewardAction> for String {
    fn from(value: RewardAction) -> Self {
        match value {
            RewardAction::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for RewardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only row in a user's points ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardLedgerEntry {
    pub action: String,
    pub amount: u32,
    pub issued_at: DateTime<Utc>,
}

impl RewardLedgerEntry {
    pub fn for_action(action: &RewardAction, issued_at: DateTime<Utc>) -> Self {
        Self {
            action: action.as_str().to_owned(),
            amount: action.points(),
            issued_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("createPost", 5)]
    #[case("createGroup", 3)]
    #[case("createComment", 2)]
    #[case("postLiked", 1)]
    #[case("commentLiked", 1)]
    #[case("CREATEPOST", 0)]
    #[case("", 0)]
    fn point_table(#[case] action: &str, #[case] points: u32) {
        assert_eq!(RewardAction::from(action).points(), points);
    }

    #[rstest]
    fn unknown_actions_keep_their_name_on_the_wire() {
        let action: RewardAction = serde_json::from_str("\"joinedGroup\"").expect("decode");
        assert_eq!(action, RewardAction::Other("joinedGroup".to_owned()));
        assert_eq!(
            serde_json::to_string(&action).expect("encode"),
            "\"joinedGroup\""
        );
    }

    #[rstest]
    fn ledger_entry_records_action_name_and_amount() {
        let now = Utc::now();
        let entry = RewardLedgerEntry::for_action(&RewardAction::CreateComment, now);
        assert_eq!(entry.action, "createComment");
        assert_eq!(entry.amount, 2);
        assert_eq!(entry.issued_at, now);
    }
}
