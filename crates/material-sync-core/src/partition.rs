use crate::payload::{CommitPayload, PushPayload};

/// Maps a commit to the opaque partition token its file records are grouped under.
pub trait PartitionResolver {
    fn resolve(&self, push: &PushPayload, commit: &CommitPayload) -> Option<String>;
}

/// Same token for every commit.
#[derive(Debug, Clone)]
pub struct FixedPartition(pub String);

impl PartitionResolver for FixedPartition {
    fn resolve(&self, _push: &PushPayload, _commit: &CommitPayload) -> Option<String> {
        Some(self.0.clone())
    }
}

impl<F> PartitionResolver for F
where
    F: Fn(&PushPayload, &CommitPayload) -> Option<String>,
{
    fn resolve(&self, push: &PushPayload, commit: &CommitPayload) -> Option<String> {
        self(push, commit)
    }
}
