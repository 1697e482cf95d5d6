use std::collections::HashSet;
use uuid::Uuid;

/// The signed-in account as the client sees it
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    account: Option<Uuid>,
    following: HashSet<Uuid>,
}

impl SessionState {
    pub fn signed_in(account: Uuid, following: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            account: Some(account),
            following: following.into_iter().collect(),
        }
    }

    pub fn account(&self) -> Option<Uuid> {
        self.account
    }

    pub fn is_authenticated(&self) -> bool {
        self.account.is_some()
    }

    pub fn is_following(&self, target: Uuid) -> bool {
        self.following.contains(&target)
    }

    /// Record the server's `following` answer. Not applied optimistically.
    pub fn apply_follow_result(&mut self, target: Uuid, following: bool) {
        if following {
            self.following.insert(target);
        } else {
            self.following.remove(&target);
        }
    }

    pub fn sign_out(&mut self) {
        self.account = None;
        self.following.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_result_updates_following_set() {
        let me = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut session = SessionState::signed_in(me, Vec::new());

        session.apply_follow_result(bob, true);
        assert!(session.is_following(bob));
        session.apply_follow_result(bob, true);
        session.apply_follow_result(bob, false);
        assert!(!session.is_following(bob));

        session.sign_out();
        assert!(!session.is_authenticated());
    }
}
