//! Staged photo changes committed together by [`ClassifiedAdsStore::save_all`].
//!
//! [`ClassifiedAdsStore::save_all`]: super::ClassifiedAdsStore::save_all

use free_ads_core::{NewPhoto, Photo, PhotoId};

/// Photo changes waiting to be committed as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    added: Vec<NewPhoto>,
    main_flags: Vec<(PhotoId, bool)>,
    deleted: Vec<PhotoId>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a new photo.
    pub fn add(&mut self, photo: NewPhoto) {
        self.added.push(photo);
    }

    /// Stage a change of a photo's main flag.
    pub fn set_main(&mut self, photo_id: PhotoId, is_main: bool) {
        self.main_flags.push((photo_id, is_main));
    }

    /// Stage a deletion.
    pub fn delete(&mut self, photo_id: PhotoId) {
        self.deleted.push(photo_id);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.main_flags.is_empty() && self.deleted.is_empty()
    }

    #[must_use]
    pub fn added(&self) -> &[NewPhoto] {
        &self.added
    }

    #[must_use]
    pub fn deleted(&self) -> &[PhotoId] {
        &self.deleted
    }

    /// Photos losing their main flag. Stores apply these first.
    pub fn demotions(&self) -> impl Iterator<Item = PhotoId> + '_ {
        self.main_flags
            .iter()
            .filter(|(_, is_main)| !is_main)
            .map(|(id, _)| *id)
    }

    /// Photos gaining the main flag. Stores apply these last.
    pub fn promotions(&self) -> impl Iterator<Item = PhotoId> + '_ {
        self.main_flags
            .iter()
            .filter(|(_, is_main)| *is_main)
            .map(|(id, _)| *id)
    }
}

/// Outcome of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedChanges {
    /// Inserted photos with their assigned IDs, in staging order.
    pub inserted: Vec<Photo>,
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
}

impl SavedChanges {
    /// Whether the commit wrote anything.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.rows_affected > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_change_set() {
        assert!(ChangeSet::new().is_empty());
        assert!(!SavedChanges::default().any());
    }

    #[test]
    fn test_demotions_and_promotions_are_split() {
        let mut changes = ChangeSet::new();
        changes.set_main(PhotoId::new(1), false);
        changes.set_main(PhotoId::new(2), true);

        assert!(!changes.is_empty());
        assert_eq!(changes.demotions().collect::<Vec<_>>(), vec![PhotoId::new(1)]);
        assert_eq!(changes.promotions().collect::<Vec<_>>(), vec![PhotoId::new(2)]);
    }

    #[test]
    fn test_delete_is_staged() {
        let mut changes = ChangeSet::new();
        changes.delete(PhotoId::new(5));
        assert_eq!(changes.deleted(), &[PhotoId::new(5)]);
        assert!(changes.added().is_empty());
    }
}
