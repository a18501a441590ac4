use geovcs_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::listener::BulkOpListener;
use crate::object::{ObjectKind, RevFeature, RevFeatureType, RevObject, RevTree};

/// Content-addressed object store.
///
/// Implementations must allow concurrent reads from many threads: the diff
/// walk fetches bucket trees in parallel batches. Objects are immutable once
/// written.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id. Returns `Ok(None)` if it does not exist.
    fn get_if_present(&self, id: &ObjectId) -> StoreResult<Option<RevObject>>;

    /// Write an object and return its id. Writing an existing object is a
    /// no-op.
    fn put(&self, object: RevObject) -> StoreResult<ObjectId>;

    /// Delete an object by id. Returns `true` if the object existed.
    fn delete(&self, id: &ObjectId) -> StoreResult<bool>;

    /// `false` once the store has been closed.
    fn is_open(&self) -> bool;

    /// Close the store. Later reads fail with [`StoreError::Closed`].
    fn close(&self);

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.get_if_present(id)?.is_some())
    }

    /// Read an object that must exist.
    fn get(&self, id: &ObjectId) -> StoreResult<RevObject> {
        self.get_if_present(id)?.ok_or(StoreError::NotFound(*id))
    }

    fn get_tree(&self, id: &ObjectId) -> StoreResult<RevTree> {
        match self.get(id)? {
            RevObject::Tree(tree) => Ok(tree),
            other => Err(unexpected(id, ObjectKind::Tree, &other)),
        }
    }

    fn get_feature(&self, id: &ObjectId) -> StoreResult<RevFeature> {
        match self.get(id)? {
            RevObject::Feature(feature) => Ok(feature),
            other => Err(unexpected(id, ObjectKind::Feature, &other)),
        }
    }

    fn get_feature_type(&self, id: &ObjectId) -> StoreResult<RevFeatureType> {
        match self.get(id)? {
            RevObject::FeatureType(feature_type) => Ok(feature_type),
            other => Err(unexpected(id, ObjectKind::FeatureType, &other)),
        }
    }

    /// Bulk read. Missing ids are reported to `listener` and skipped; the
    /// result order is not guaranteed to follow `ids`.
    fn get_all(
        &self,
        ids: &[ObjectId],
        listener: &dyn BulkOpListener,
    ) -> StoreResult<Vec<RevObject>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_if_present(id)? {
                Some(object) => {
                    listener.found(id);
                    found.push(object);
                }
                None => listener.not_found(id),
            }
        }
        Ok(found)
    }

    /// Bulk read restricted to trees; any other kind is an error.
    fn get_all_trees(
        &self,
        ids: &[ObjectId],
        listener: &dyn BulkOpListener,
    ) -> StoreResult<Vec<RevTree>> {
        self.get_all(ids, listener)?
            .into_iter()
            .map(|object| match object {
                RevObject::Tree(tree) => Ok(tree),
                other => Err(unexpected(&other.id(), ObjectKind::Tree, &other)),
            })
            .collect()
    }

    /// Write many objects, reporting each new id to `listener`.
    fn put_all(
        &self,
        objects: Vec<RevObject>,
        listener: &dyn BulkOpListener,
    ) -> StoreResult<usize> {
        let mut inserted = 0;
        for object in objects {
            let id = object.id();
            if !self.exists(&id)? {
                self.put(object)?;
                listener.inserted(&id);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Delete many objects, reporting each deleted id to `listener`.
    fn delete_all(&self, ids: &[ObjectId], listener: &dyn BulkOpListener) -> StoreResult<u64> {
        let mut deleted = 0;
        for id in ids {
            if self.delete(id)? {
                listener.deleted(id);
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

fn unexpected(id: &ObjectId, expected: ObjectKind, actual: &RevObject) -> StoreError {
    StoreError::UnexpectedKind {
        id: *id,
        expected,
        actual: actual.kind(),
    }
}
