//! Repository configuration item domains.
//!
//! The reconciliation engine is written once against the [`Item`] trait.
//! Each domain (webhooks, required-build conditions, reviewer groups)
//! supplies its identifier and its notion of configuration equality.

mod matcher;
mod required_build;
mod reviewer_group;
mod webhook;

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use matcher::{MatcherKind, RefMatcher};
pub use required_build::RequiredBuild;
pub use reviewer_group::ReviewerGroup;
pub use webhook::Webhook;

/// Capability contract every reconciled item domain implements.
pub trait Item: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
  /// Singular domain name used in logs and error messages.
  const KIND: &'static str;

  /// Remote-assigned identifier. `None` means the remote has never seen the item.
  fn id(&self) -> Option<u64>;

  fn set_id(&mut self, id: Option<u64>);

  /// Configuration equality.
  ///
  /// Ignores the identifier and any write-only field the remote never
  /// returns (secrets, tokens).
  fn same_config(&self, other: &Self) -> bool;

  /// Human-readable label; also the tiebreak when sorting items with equal ids.
  fn sort_label(&self) -> String;
}

/// `kind 'label' (id N)` for log lines and failure reports.
pub fn describe<T: Item>(item: &T) -> String {
  match item.id() {
    Some(id) => format!("{} '{}' (id {})", T::KIND, item.sort_label(), id),
    None => format!("{} '{}'", T::KIND, item.sort_label()),
  }
}
