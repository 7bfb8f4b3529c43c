//! Allow-list based authorization for privileged commands.

use alloc::sync::Arc;

/// Usernames permitted to run privileged commands, in configuration order.
///
/// Cloning is cheap; the list is shared between all chat workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    users: Arc<[String]>,
}

impl AllowList {
    /// Parses a comma-separated list such as `"alice,bob"`.
    ///
    /// Empty entries are dropped, so an empty string yields an empty list.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split(',').collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            users: iter
                .into_iter()
                .map(Into::into)
                .filter(|user: &String| !user.is_empty())
                .collect(),
        }
    }
}

/// Returns `true` iff `sender` appears in `allow_list`.
///
/// Comparison is exact: no trimming, no case folding, no leading `@` handling.
#[must_use]
pub fn is_authorized(sender: &str, allow_list: &AllowList) -> bool {
    allow_list.iter().any(|user| user == sender)
}
