//! The read, diff, conditional-write loop.

use tracing::{debug, warn};

use super::{UpsertError, UpsertOptions};
use crate::document::{Document, Revision, REV_FIELD};
use crate::store::{DocumentStore, WriteOutcome};

/// What resolving the current state and running the diff produced.
enum Resolved {
    /// The diff asked for no change; nothing is written.
    Unchanged(WriteOutcome),
    /// A candidate ready for a conditional write.
    Candidate(Document),
}

/// What a single conditional write produced.
enum Attempt {
    Written(WriteOutcome),
    Conflicted,
}

/// Read the document under `id`, run `diff` against it, and write the result,
/// re-reading and re-running `diff` whenever the write loses a conflict.
///
/// A missing document is handed to `diff` as an empty one. `Ok(None)` from
/// `diff` skips the write and yields `ok: false` with the current revision.
/// `_id` and `_rev` on the candidate are always reset from the read, so the
/// diff can neither redirect nor forge them.
///
/// Gives up with [`UpsertError::RetryExhausted`] once `max_attempts` writes
/// have all conflicted. Errors from `diff` and store errors other than
/// not-found on read and conflict on write are returned unchanged.
pub fn upsert_with<S, F>(
    store: &S,
    id: &str,
    mut diff: F,
    options: &UpsertOptions,
) -> Result<WriteOutcome, UpsertError>
where
    S: DocumentStore + ?Sized,
    F: FnMut(Document) -> Result<Option<Document>, UpsertError>,
{
    if id.is_empty() {
        return Err(UpsertError::InvalidArgument("doc id is required".into()));
    }

    let budget = options.attempt_budget();
    let mut attempts_left = budget;

    loop {
        let candidate = match resolve_and_diff(store, id, &mut diff, options)? {
            Resolved::Unchanged(outcome) => {
                debug!(id, "diff requested no change, skipping write");
                return Ok(outcome);
            }
            Resolved::Candidate(candidate) => candidate,
        };

        debug!(id, attempt = budget - attempts_left + 1, "writing document");
        match attempt_write(store, &candidate, options)? {
            Attempt::Written(outcome) => return Ok(outcome),
            Attempt::Conflicted => {
                attempts_left -= 1;
                if attempts_left == 0 {
                    warn!(id, attempts = budget, "write conflict, retry budget exhausted");
                    return Err(UpsertError::RetryExhausted {
                        id: id.to_string(),
                        attempts: budget,
                    });
                }
                debug!(id, remaining = attempts_left, "write conflict, re-reading");
            }
        }
    }
}

fn resolve_and_diff<S, F>(
    store: &S,
    id: &str,
    diff: &mut F,
    options: &UpsertOptions,
) -> Result<Resolved, UpsertError>
where
    S: DocumentStore + ?Sized,
    F: FnMut(Document) -> Result<Option<Document>, UpsertError>,
{
    let current = match store.get(id) {
        Ok(doc) => Some(doc),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err.into()),
    };
    let existed = current.is_some();
    let current_rev: Option<Revision> = current.as_ref().and_then(Document::revision);
    // The `_rev` exactly as the store returned it, whatever its shape.
    let stored_rev = current.as_ref().and_then(|doc| doc.get(REV_FIELD).cloned());

    let Some(mut candidate) = diff(current.unwrap_or_default())? else {
        return Ok(Resolved::Unchanged(WriteOutcome {
            ok: false,
            id: id.to_string(),
            rev: current_rev,
        }));
    };

    candidate.set_id(id);
    match stored_rev {
        Some(raw) => {
            candidate.insert(REV_FIELD, raw);
        }
        // Replicated writes bring their own revision.
        None if options.put.new_edits => {
            candidate.remove_revision();
        }
        None => {}
    }

    if !existed && options.put.new_edits {
        candidate.remove_revision_history();
    }

    Ok(Resolved::Candidate(candidate))
}

fn attempt_write<S>(
    store: &S,
    candidate: &Document,
    options: &UpsertOptions,
) -> Result<Attempt, UpsertError>
where
    S: DocumentStore + ?Sized,
{
    match store.put(candidate, &options.put) {
        Ok(outcome) => Ok(Attempt::Written(outcome)),
        Err(err) if err.is_conflict() => Ok(Attempt::Conflicted),
        Err(err) => Err(err.into()),
    }
}
