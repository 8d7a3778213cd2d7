// ── Client-side list storage ──
//
// Each manager owns one ordered collection: a concurrent index plus a
// sorted snapshot pushed to subscribers.

mod collection;

pub(crate) use collection::OrderedCollection;
