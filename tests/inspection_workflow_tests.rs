mod common;

use common::{completion, full_photo_set, photo_url, Harness};
use fleet_inspection::dto::{PhotoInput, SaveDraftRequest};
use fleet_inspection::models::{
    InspectionStatus, InspectionType, Reservation, ReservationKind, WarningType,
};
use fleet_inspection::repositories::{CompletionFault, InspectionStore};
use fleet_inspection::services::InspectionEvent;
use fleet_inspection::utils::AppError;
use uuid::Uuid;

async fn complete_pickup(h: &Harness, odometer_km: i64, fuel: &str) {
    h.state
        .inspections
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Pickup,
            h.user_id,
            completion(odometer_km, fuel, "pickup"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn draft_slot_upsert_keeps_one_row_per_slot() {
    let h = Harness::new();
    let workflow = &h.state.inspections;

    let first = SaveDraftRequest {
        odometer_km: Some(1000),
        photos: vec![PhotoInput::new(3, "/uploads/a.jpg")],
        ..Default::default()
    };
    workflow
        .save_draft(h.tenant_id, h.reservation_id, InspectionType::Pickup, h.user_id, first)
        .await
        .unwrap();

    let second = SaveDraftRequest {
        fuel_level: Some("full".to_string()),
        photos: vec![PhotoInput::new(3, "/uploads/b.jpg")],
        ..Default::default()
    };
    let response = workflow
        .save_draft(h.tenant_id, h.reservation_id, InspectionType::Pickup, h.user_id, second)
        .await
        .unwrap();

    assert_eq!(response.record.status, InspectionStatus::Draft);
    assert_eq!(response.record.odometer_km, Some(1000));
    assert_eq!(response.record.fuel_level.as_deref(), Some("full"));
    assert_eq!(response.photos.len(), 1);
    assert_eq!(response.photos[0].slot_index, 3);
    assert_eq!(response.photos[0].media_url, "/uploads/b.jpg");
}

#[tokio::test]
async fn completion_with_seven_photos_is_rejected_without_changes() {
    let h = Harness::new();
    let mut request = completion(1000, "full", "pickup");
    request.photos.pop();

    let err = h
        .state
        .inspections
        .complete(h.tenant_id, h.reservation_id, InspectionType::Pickup, h.user_id, request)
        .await
        .unwrap_err();

    match err {
        AppError::Validation(message) => assert_eq!(message, "Exactly 8 photos are required"),
        other => panic!("unexpected error: {:?}", other),
    }
    let record = h
        .inspections
        .find_record(h.tenant_id, h.reservation_id, InspectionType::Pickup)
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn repeated_slot_is_rejected() {
    let h = Harness::new();
    let mut request = completion(1000, "full", "pickup");
    request.photos[7] = PhotoInput::new(1, photo_url("pickup", 9));

    let err = h
        .state
        .inspections
        .complete(h.tenant_id, h.reservation_id, InspectionType::Pickup, h.user_id, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn failed_completion_leaves_draft_untouched() {
    let h = Harness::new();
    let workflow = &h.state.inspections;

    let draft = SaveDraftRequest {
        odometer_km: Some(500),
        photos: vec![PhotoInput::new(1, "/uploads/draft-1.jpg")],
        ..Default::default()
    };
    workflow
        .save_draft(h.tenant_id, h.reservation_id, InspectionType::Pickup, h.user_id, draft)
        .await
        .unwrap();

    for fault in [
        CompletionFault::AfterRecordUpdate,
        CompletionFault::AfterPhotoDelete,
        CompletionFault::AfterPhotoInsert,
        CompletionFault::AfterWarningAcknowledge,
    ] {
        h.inspections.inject_completion_fault(fault).unwrap();
        let result = workflow
            .complete(
                h.tenant_id,
                h.reservation_id,
                InspectionType::Pickup,
                h.user_id,
                completion(1000, "full", "pickup"),
            )
            .await;
        assert!(result.is_err(), "{:?} should abort the completion", fault);

        let current = workflow
            .get_inspection(h.tenant_id, h.reservation_id, InspectionType::Pickup)
            .await
            .unwrap();
        assert_eq!(current.record.status, InspectionStatus::Draft);
        assert_eq!(current.record.odometer_km, Some(500));
        assert_eq!(current.photos.len(), 1);
        assert_eq!(current.photos[0].media_url, "/uploads/draft-1.jpg");
    }

    let done = workflow
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Pickup,
            h.user_id,
            completion(1000, "full", "pickup"),
        )
        .await
        .unwrap();
    assert_eq!(done.record.status, InspectionStatus::Completed);
    assert_eq!(done.photos.len(), 8);
}

#[tokio::test]
async fn km_over_limit_blocks_and_reuses_the_same_warning() {
    let h = Harness::new();
    complete_pickup(&h, 1000, "full").await;
    let workflow = &h.state.inspections;

    let first = workflow
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Return,
            h.user_id,
            completion(1450, "full", "return"),
        )
        .await
        .unwrap_err();
    let pending = match first {
        AppError::WarningsPending(pending) => pending,
        other => panic!("unexpected error: {:?}", other),
    };
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].warning_type, WarningType::KmOverLimit);
    assert_eq!(pending[0].payload["kmDiff"], 450);

    let retry = workflow
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Return,
            h.user_id,
            completion(1450, "full", "return"),
        )
        .await
        .unwrap_err();
    match retry {
        AppError::WarningsPending(again) => assert_eq!(again[0].id, pending[0].id),
        other => panic!("unexpected error: {:?}", other),
    }

    let warnings = workflow.list_warnings(h.tenant_id, h.reservation_id).await.unwrap();
    assert_eq!(warnings.len(), 1);

    let record = h
        .inspections
        .find_record(h.tenant_id, h.reservation_id, InspectionType::Return)
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn acknowledged_warning_lets_the_return_complete() {
    let mut h = Harness::new();
    complete_pickup(&h, 1000, "full").await;
    let workflow = h.state.inspections.clone();

    let pending = match workflow
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Return,
            h.user_id,
            completion(1450, "half", "return"),
        )
        .await
    {
        Err(AppError::WarningsPending(pending)) => pending,
        other => panic!("unexpected result: {:?}", other.map(|r| r.record.id)),
    };
    assert_eq!(pending.len(), 2);

    let mut request = completion(1450, "half", "return");
    request.acknowledged_warnings = pending.iter().map(|w| w.id).collect();
    let done = workflow
        .complete(h.tenant_id, h.reservation_id, InspectionType::Return, h.user_id, request)
        .await
        .unwrap();
    assert_eq!(done.record.status, InspectionStatus::Completed);

    let warnings = workflow.list_warnings(h.tenant_id, h.reservation_id).await.unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.acknowledged_by == Some(h.user_id)));
    assert!(warnings.iter().all(|w| w.acknowledged_at.is_some()));

    let mut completed_types = Vec::new();
    while let Ok(InspectionEvent::Completed {
        inspection_type,
        completed_by,
        ..
    }) = h.events.try_recv()
    {
        assert_eq!(completed_by, h.user_id);
        completed_types.push(inspection_type);
    }
    assert_eq!(completed_types, vec![InspectionType::Pickup, InspectionType::Return]);
}

#[tokio::test]
async fn fuel_mismatch_is_exact_text_comparison() {
    let h = Harness::new();
    complete_pickup(&h, 1000, "full").await;

    let err = h
        .state
        .inspections
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Return,
            h.user_id,
            completion(1100, "3/4", "return"),
        )
        .await
        .unwrap_err();
    match err {
        AppError::WarningsPending(pending) => {
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].warning_type, WarningType::FuelMismatch);
            assert_eq!(pending[0].payload["pickupFuel"], "full");
            assert_eq!(pending[0].payload["returnFuel"], "3/4");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn fuel_level_is_stored_and_compared_untrimmed() {
    let h = Harness::new();
    complete_pickup(&h, 1000, "full").await;

    let draft = SaveDraftRequest { fuel_level: Some(" full".to_string()), ..Default::default() };
    let saved = h
        .state
        .inspections
        .save_draft(h.tenant_id, h.reservation_id, InspectionType::Return, h.user_id, draft)
        .await
        .unwrap();
    assert_eq!(saved.record.fuel_level.as_deref(), Some(" full"));

    let err = h
        .state
        .inspections
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Return,
            h.user_id,
            completion(1100, "full ", "return"),
        )
        .await
        .unwrap_err();
    match err {
        AppError::WarningsPending(pending) => {
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].warning_type, WarningType::FuelMismatch);
            assert_eq!(pending[0].payload["returnFuel"], "full ");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn return_within_limits_completes_directly() {
    let h = Harness::new();
    complete_pickup(&h, 50000, "full").await;

    let done = h
        .state
        .inspections
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Return,
            h.user_id,
            completion(50200, "full", "return"),
        )
        .await
        .unwrap();
    assert_eq!(done.record.status, InspectionStatus::Completed);
    assert_eq!(done.record.odometer_km, Some(50200));

    let warnings = h.state.inspections.list_warnings(h.tenant_id, h.reservation_id).await.unwrap();
    assert!(warnings.is_empty());
}

#[tokio::test]
async fn return_without_completed_pickup_is_not_found() {
    let h = Harness::new();
    let err = h
        .state
        .inspections
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Return,
            h.user_id,
            completion(1000, "full", "return"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn completed_inspection_cannot_be_edited() {
    let h = Harness::new();
    complete_pickup(&h, 1000, "full").await;

    let draft = SaveDraftRequest { odometer_km: Some(2000), ..Default::default() };
    let err = h
        .state
        .inspections
        .save_draft(h.tenant_id, h.reservation_id, InspectionType::Pickup, h.user_id, draft)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = h
        .state
        .inspections
        .complete(
            h.tenant_id,
            h.reservation_id,
            InspectionType::Pickup,
            h.user_id,
            completion(1000, "full", "pickup"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn other_tenants_and_marketplace_reservations_are_not_found() {
    let h = Harness::new();
    let err = h
        .state
        .inspections
        .complete(
            Uuid::new_v4(),
            h.reservation_id,
            InspectionType::Pickup,
            h.user_id,
            completion(1000, "full", "pickup"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let marketplace = Uuid::new_v4();
    h.fleet
        .add_reservation(Reservation {
            id: marketplace,
            tenant_id: h.tenant_id,
            vehicle_id: h.vehicle_id,
            kind: ReservationKind::Marketplace,
        })
        .unwrap();
    let err = h
        .state
        .inspections
        .complete(
            h.tenant_id,
            marketplace,
            InspectionType::Pickup,
            h.user_id,
            completion(1000, "full", "pickup"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn damage_compare_lists_both_sides_by_slot() {
    let h = Harness::new();
    complete_pickup(&h, 1000, "full").await;
    let draft = SaveDraftRequest { photos: full_photo_set("return"), ..Default::default() };
    h.state
        .inspections
        .save_draft(h.tenant_id, h.reservation_id, InspectionType::Return, h.user_id, draft)
        .await
        .unwrap();

    let compare = h.state.inspections.damage_compare(h.tenant_id, h.reservation_id).await.unwrap();
    assert_eq!(compare.pickup_photos.len(), 8);
    assert_eq!(compare.return_photos.len(), 8);
    let slots: Vec<i16> = compare.pickup_photos.iter().map(|p| p.slot_index).collect();
    assert_eq!(slots, (1..=8).collect::<Vec<i16>>());
    assert_eq!(compare.return_photos[0].media_url, photo_url("return", 1));
}
