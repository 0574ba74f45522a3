use hotels_api::hotels::validation::HotelCandidate;
use hotels_api::hotels::{HotelRepository, PgHotelRepository, RepositoryError};
use hotels_api::test_support::{TestDatabase, TestDatabaseError};

fn candidate(name: &str) -> HotelCandidate {
    HotelCandidate {
        name: name.to_string(),
        web_link: None,
        country: "Taiwan".into(),
        city: "Yilan".into(),
        address: "Wufeng Rd 69".into(),
        email: "front-desk@example.com".into(),
        is_open: true,
        longitude: "121.776".into(),
        latitude: "24.671".into(),
    }
}

async fn database(test: &str) -> Option<TestDatabase> {
    match TestDatabase::new_from_env().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping {test}: TEST_DATABASE_URL not set");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

#[tokio::test]
async fn bulk_insert_is_all_or_nothing() {
    let Some(test_db) = database("bulk_insert_is_all_or_nothing").await else {
        return;
    };
    let repository = PgHotelRepository::new(test_db.pool_clone());

    let stored = repository
        .bulk_insert(&[candidate("Royal"), candidate("Ambassador")])
        .await
        .expect("bulk insert");
    assert_eq!(stored, 2);

    let err = repository
        .bulk_insert(&[candidate("Grand"), candidate("Royal")])
        .await
        .expect_err("duplicate name");
    match err {
        RepositoryError::DuplicateKey { constraint } => {
            assert_eq!(constraint.as_deref(), Some("hotels_name_key"));
        }
        other => panic!("expected duplicate key, got {other:?}"),
    }

    let hotels = repository.list(0, 10).await.expect("list");
    let names: Vec<_> = hotels.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["Royal", "Ambassador"]);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn coordinates_are_range_checked_by_the_table() {
    let Some(test_db) = database("coordinates_are_range_checked_by_the_table").await else {
        return;
    };
    let repository = PgHotelRepository::new(test_db.pool_clone());

    let out_of_range = HotelCandidate {
        latitude: "94.671".into(),
        ..candidate("Royal")
    };
    let err = repository.insert(&out_of_range).await.expect_err("check constraint");
    assert!(matches!(err, RepositoryError::Storage(_)));

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn update_overwrites_and_reports_missing_rows() {
    let Some(test_db) = database("update_overwrites_and_reports_missing_rows").await else {
        return;
    };
    let repository = PgHotelRepository::new(test_db.pool_clone());

    let hotel = repository.insert(&candidate("Royal")).await.expect("insert");
    assert_eq!(
        repository.find_by_name("Royal").await.expect("lookup").map(|h| h.id),
        Some(hotel.id)
    );

    let moved = HotelCandidate {
        city: "Taipei".into(),
        is_open: false,
        ..candidate("Royal")
    };
    let updated = repository
        .update(hotel.id, &moved)
        .await
        .expect("update")
        .expect("hotel exists");
    assert_eq!(updated.city, "Taipei");
    assert!(!updated.is_open);

    assert!(repository.update(hotel.id + 1, &moved).await.expect("update").is_none());
    assert!(repository.find_by_id(hotel.id + 1).await.expect("lookup").is_none());

    test_db.close().await.expect("failed to drop test database");
}
