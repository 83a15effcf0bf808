//! Gestión de los 8 slots fotográficos de una inspección
//!
//! Los borradores aceptan cualquier subconjunto de slots (upsert, gana la
//! última escritura). El cierre exige exactamente los slots 1..=8.

use std::collections::BTreeMap;

use crate::dto::PhotoInput;
use crate::models::{PhotoSlot, PHOTO_SLOT_COUNT};
use crate::utils::errors::{validation_error, AppError, AppResult};

fn check_slot(photo: &PhotoInput) -> AppResult<()> {
    if !(1..=PHOTO_SLOT_COUNT).contains(&photo.slot_index) {
        return Err(AppError::Validation(format!(
            "Photo slot {} is out of range (1-{})",
            photo.slot_index, PHOTO_SLOT_COUNT
        )));
    }
    if photo.media_url.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Photo slot {} is missing a media URL",
            photo.slot_index
        )));
    }
    Ok(())
}

/// Slots de un borrador, deduplicados por índice (gana el último)
pub fn draft_slots(photos: &[PhotoInput]) -> AppResult<Vec<PhotoSlot>> {
    let mut by_slot = BTreeMap::new();
    for photo in photos {
        check_slot(photo)?;
        by_slot.insert(photo.slot_index, PhotoSlot::from(photo));
    }
    Ok(by_slot.into_values().collect())
}

/// Slots de un cierre: exactamente 8 fotos cuyo conjunto de índices es {1..8}
pub fn completion_slots(photos: &[PhotoInput]) -> AppResult<Vec<PhotoSlot>> {
    if photos.len() != PHOTO_SLOT_COUNT as usize {
        return Err(validation_error("Exactly 8 photos are required"));
    }

    let mut by_slot = BTreeMap::new();
    for photo in photos {
        check_slot(photo)?;
        if by_slot.insert(photo.slot_index, PhotoSlot::from(photo)).is_some() {
            return Err(validation_error(
                "Photo slots must be exactly 1 through 8 with no repeats",
            ));
        }
    }

    Ok(by_slot.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> Vec<PhotoInput> {
        (1..=8)
            .map(|slot| PhotoInput::new(slot, format!("/uploads/photo-{}.jpg", slot)))
            .collect()
    }

    #[test]
    fn test_completion_accepts_full_set_in_any_order() {
        let mut photos = full_set();
        photos.reverse();
        let slots = completion_slots(&photos).unwrap();
        let indices: Vec<i16> = slots.iter().map(|s| s.slot_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_completion_rejects_seven_photos() {
        let mut photos = full_set();
        photos.pop();
        let err = completion_slots(&photos).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Exactly 8 photos are required"));
    }

    #[test]
    fn test_completion_rejects_repeated_slot() {
        let mut photos = full_set();
        photos[7] = PhotoInput::new(3, "/uploads/again.jpg");
        let err = completion_slots(&photos).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("no repeats")));
    }

    #[test]
    fn test_completion_rejects_out_of_range_slot() {
        let mut photos = full_set();
        photos[0] = PhotoInput::new(9, "/uploads/extra.jpg");
        assert!(matches!(completion_slots(&photos), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_draft_keeps_last_write_per_slot() {
        let photos = vec![
            PhotoInput::new(3, "/uploads/first.jpg"),
            PhotoInput::new(1, "/uploads/front.jpg"),
            PhotoInput::new(3, "/uploads/second.jpg"),
        ];
        let slots = draft_slots(&photos).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].slot_index, 3);
        assert_eq!(slots[1].media_url, "/uploads/second.jpg");
    }

    #[test]
    fn test_draft_rejects_blank_url() {
        let photos = vec![PhotoInput::new(2, "   ")];
        assert!(matches!(draft_slots(&photos), Err(AppError::Validation(_))));
    }
}
