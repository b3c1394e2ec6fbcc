// Primitive types shared across bounded contexts.

/// Per-subject stream version. Committed streams start at 1 and never skip.
pub type Version = u64;

/// Global commit sequence number in the event log. The first commit is 1;
/// 0 means "nothing committed yet" and is a valid starting cursor.
pub type Position = u64;
