use domain::EntryId;
use fleet_control::CommandError;

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("no entry is being edited")]
    NotEditing,
    #[error("entry {requested} is not the one being edited ({editing})")]
    EntryMismatch { editing: EntryId, requested: EntryId },
    /// 条目已不在当前名册中（例如已被批量删除），草稿作废。
    #[error("entry {0} is no longer in the roster")]
    EntryGone(EntryId),
    #[error(transparent)]
    Command(#[from] CommandError),
}
