//! Backend-independent store scenarios.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

#![allow(dead_code)]

use rotation_core::{Banner, EventType, Group, RotationError, RotationKey, Slot};
use rotation_store::RotationStore;
use uuid::Uuid;

/// Create a fresh banner, slot and group and return their rotation key.
pub async fn seed_entities(store: &dyn RotationStore) -> RotationKey {
    let banner = Banner {
        id: Uuid::new_v4(),
        description: "Spring sale".to_string(),
    };
    let slot = Slot {
        id: Uuid::new_v4(),
        description: "Main page top".to_string(),
    };
    let group = Group {
        id: Uuid::new_v4(),
        description: "Teenagers".to_string(),
    };
    store.add_banner(&banner).await.unwrap();
    store.add_slot(&slot).await.unwrap();
    store.add_group(&group).await.unwrap();
    RotationKey::new(banner.id, slot.id, group.id)
}

pub async fn entity_round_trip(store: &dyn RotationStore) {
    let key = seed_entities(store).await;

    let banner = store.get_banner(key.banner_id).await.unwrap();
    assert_eq!(banner.id, key.banner_id);
    assert_eq!(banner.description, "Spring sale");

    let slot = store.get_slot(key.slot_id).await.unwrap();
    assert_eq!(slot.description, "Main page top");

    let group = store.get_group(key.group_id).await.unwrap();
    assert_eq!(group.description, "Teenagers");

    let rotation = store.add_rotation(key).await.unwrap();
    assert_eq!(rotation.key(), key);
    assert_eq!((rotation.shows, rotation.clicks), (0, 0));

    let fetched = store.get_rotation(key).await.unwrap();
    assert_eq!(fetched, rotation);
}

pub async fn duplicate_rotation_rejected(store: &dyn RotationStore) {
    let key = seed_entities(store).await;
    store.add_rotation(key).await.unwrap();

    let err = store.add_rotation(key).await.unwrap_err();
    assert!(matches!(err, RotationError::AlreadyExists(_)), "{err}");

    // Once deleted, the triple can be linked again.
    store.delete_rotation(key).await.unwrap();
    store.add_rotation(key).await.unwrap();
}

pub async fn rotation_requires_live_entities(store: &dyn RotationStore) {
    let key = seed_entities(store).await;
    let missing = RotationKey::new(Uuid::new_v4(), key.slot_id, key.group_id);
    let err = store.add_rotation(missing).await.unwrap_err();
    assert!(matches!(err, RotationError::NotFound(_)), "{err}");

    store.delete_group(key.group_id).await.unwrap();
    let err = store.add_rotation(key).await.unwrap_err();
    assert!(matches!(err, RotationError::NotFound(_)), "{err}");
}

pub async fn banner_delete_cascades(store: &dyn RotationStore) {
    let key = seed_entities(store).await;
    store.add_rotation(key).await.unwrap();

    store.delete_banner(key.banner_id).await.unwrap();

    assert!(store.get_rotation(key).await.unwrap_err().is_not_found());
    assert!(store.get_banner(key.banner_id).await.unwrap_err().is_not_found());
    // Slot and group are untouched.
    store.get_slot(key.slot_id).await.unwrap();
    store.get_group(key.group_id).await.unwrap();
    assert!(store
        .get_all_rotations()
        .await
        .unwrap()
        .iter()
        .all(|r| r.key() != key));
}

pub async fn slot_and_group_delete_cascade(store: &dyn RotationStore) {
    let by_slot = seed_entities(store).await;
    store.add_rotation(by_slot).await.unwrap();
    store.delete_slot(by_slot.slot_id).await.unwrap();
    assert!(store.get_rotation(by_slot).await.unwrap_err().is_not_found());

    let by_group = seed_entities(store).await;
    store.add_rotation(by_group).await.unwrap();
    store.delete_group(by_group.group_id).await.unwrap();
    assert!(store.get_rotation(by_group).await.unwrap_err().is_not_found());
}

pub async fn delete_without_rotations_succeeds(store: &dyn RotationStore) {
    let key = seed_entities(store).await;
    store.delete_banner(key.banner_id).await.unwrap();
    store.delete_slot(key.slot_id).await.unwrap();
    store.delete_group(key.group_id).await.unwrap();
}

pub async fn delete_missing_entity_fails(store: &dyn RotationStore) {
    let key = seed_entities(store).await;
    store.delete_banner(key.banner_id).await.unwrap();

    let err = store.delete_banner(key.banner_id).await.unwrap_err();
    assert!(matches!(err, RotationError::NotFound(_)), "{err}");

    let err = store.delete_slot(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RotationError::NotFound(_)), "{err}");
}

pub async fn counters_and_events(store: &dyn RotationStore) {
    let key = seed_entities(store).await;
    store.add_rotation(key).await.unwrap();

    let mut last_shows = 0;
    for _ in 0..5 {
        let rotation = store.add_show(key).await.unwrap();
        assert!(rotation.shows > last_shows);
        last_shows = rotation.shows;
    }
    let rotation = store.add_click(key).await.unwrap();
    assert_eq!((rotation.shows, rotation.clicks), (5, 1));

    let events = store.get_rotation_stats(key).await.unwrap();
    assert_eq!(events.len(), 6);
    assert!(events.iter().all(|e| e.rotation_id == rotation.id));
    assert_eq!(events[5].event_type, EventType::Click);
    assert!(events[..5].iter().all(|e| e.event_type == EventType::Show));
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

pub async fn counters_on_missing_rotation(store: &dyn RotationStore) {
    let key = seed_entities(store).await;

    let err = store.add_click(key).await.unwrap_err();
    assert!(matches!(err, RotationError::NoSuchRotation(_)), "{err}");

    store.add_rotation(key).await.unwrap();
    store.delete_rotation(key).await.unwrap();
    let err = store.add_show(key).await.unwrap_err();
    assert!(matches!(err, RotationError::NoSuchRotation(_)), "{err}");

    let err = store.delete_rotation(key).await.unwrap_err();
    assert!(matches!(err, RotationError::NoSuchRotation(_)), "{err}");
}

/// Expects a store that holds no other live rotations.
pub async fn total_shows_tracks_live_rotations(store: &dyn RotationStore) {
    let first = seed_entities(store).await;
    let second = seed_entities(store).await;
    store.add_rotation(first).await.unwrap();
    store.add_rotation(second).await.unwrap();

    for _ in 0..3 {
        store.add_show(first).await.unwrap();
    }
    for _ in 0..4 {
        store.add_show(second).await.unwrap();
    }

    let sum: u64 = store
        .get_all_rotations()
        .await
        .unwrap()
        .iter()
        .map(|r| r.shows)
        .sum();
    assert_eq!(store.get_total_shows().await.unwrap(), sum);
    assert_eq!(sum, 7);

    store.delete_banner(second.banner_id).await.unwrap();
    assert_eq!(store.get_total_shows().await.unwrap(), 3);
}

pub async fn all_rotations_in_creation_order(store: &dyn RotationStore) {
    let keys = [
        seed_entities(store).await,
        seed_entities(store).await,
        seed_entities(store).await,
    ];
    for key in keys {
        store.add_rotation(key).await.unwrap();
    }

    let listed: Vec<_> = store
        .get_all_rotations()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.key())
        .filter(|k| keys.contains(k))
        .collect();
    assert_eq!(listed, keys);
}
