use super::EntityMetadata;

/// Behaviour shared by every stored aggregate.
pub trait AggregateRoot {
    type Id;

    fn id(&self) -> Self::Id;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Aggregate index, e.g. "a001".
    fn aggregate_index() -> &'static str;

    /// Collection name used for the table, e.g. "product".
    fn collection_name() -> &'static str;

    /// Human readable element name for messages.
    fn element_name() -> &'static str;

    /// Storage table: `<index>_<collection>`.
    fn table_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
