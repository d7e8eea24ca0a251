mod common;

use bson::{Binary, oid::ObjectId, spec::BinarySubtype};
use common::{Person, database, names, seed};
use docquery::{memory::InMemoryBackend, prelude::*};

#[tokio::test]
async fn find_by_id_returns_the_saved_entity() {
    let database = database().await;
    let trevor = Person::new("Trevor", 27);
    seed(&database, &[trevor.clone(), Person::new("Rose", 35)]).await;

    let found: Person = database
        .collection_for::<Person>()
        .find_by_id(trevor.id)
        .await
        .consume()
        .await
        .unwrap();

    assert_eq!(found, trevor);
}

#[tokio::test]
async fn find_by_id_of_unknown_identifier_is_not_found() {
    let database = database().await;

    let err = database
        .collection_for::<Person>()
        .find_by_id(ObjectId::new())
        .await
        .consume::<Person>()
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn lookups_by_a_single_field() {
    let database = database().await;
    seed(
        &database,
        &[Person::new("Trevor", 27), Person::new("Rose", 35), Person::new("Trevor", 52)],
    )
    .await;
    let people = database.collection_for::<Person>();

    let first: Person = people.find_one_by("name", "Trevor").await.consume().await.unwrap();
    let all: Vec<Person> = people.find_by("name", "Trevor").await.consume().await.unwrap();
    let none: Vec<Person> = people.find_by("name", "Nobody").await.consume().await.unwrap();

    assert_eq!(first.age, 27);
    assert_eq!(names(&all), vec!["Trevor", "Trevor"]);
    assert!(none.is_empty());
}

#[tokio::test]
async fn saving_an_entity_twice_keeps_one_document() {
    let database = database().await;
    let people = database.collection_for::<Person>();
    let mut trevor = Person::new("Trevor", 27);

    let created = people.save_entity(&trevor).await.unwrap();
    trevor.age = 28;
    let replaced = people.save_entity(&trevor).await.unwrap();

    assert_eq!(created.upserted_id, Some(trevor.id()));
    assert_eq!(replaced.modified_count, 1);
    assert_eq!(people.query().count().await.unwrap(), 1);

    let stored: Document = people.find_by_id(trevor.id).await.consume().await.unwrap();
    assert_eq!(Person::from_document(stored).unwrap(), trevor);
}

#[tokio::test]
async fn collections_are_independent() {
    let database = database().await;
    seed(&database, &[Person::new("Trevor", 27)]).await;

    assert_eq!(database.collection("people").query().count().await.unwrap(), 1);
    assert_eq!(database.collection("cars").query().count().await.unwrap(), 0);
    assert_eq!(database.collection_for::<Person>().name(), "people");
}

#[tokio::test]
async fn preloaded_documents_are_queryable() {
    let backend = InMemoryBackend::builder()
        .with_documents(
            "people",
            vec![doc! { "name": "Trevor", "age": 27 }, doc! { "name": "Rose", "age": 35 }],
        )
        .build()
        .await
        .unwrap();
    let database = Database::new(backend);

    let rose: Document = database
        .collection("people")
        .query()
        .gt("age", 30)
        .find_one()
        .await
        .consume()
        .await
        .unwrap();

    assert_eq!(rose.get_str("name").unwrap(), "Rose");
    assert!(matches!(rose.get("_id"), Some(Bson::ObjectId(_))));

    database.shutdown().await.unwrap();
}

#[tokio::test]
async fn entity_round_trips_through_a_document() {
    let trevor = Person::new("Trevor", 27);

    let document = trevor.to_document().unwrap();

    assert_eq!(document.get_object_id("_id").unwrap(), trevor.id);
    assert_eq!(Person::from_document(document).unwrap(), trevor);
}

#[tokio::test]
async fn binary_identifiers_address_distinct_documents() {
    let database = database().await;
    let things = database.collection("things");
    let first = Binary {
        subtype: BinarySubtype::Generic,
        bytes: vec![1, 2, 3],
    };
    let second = Binary {
        subtype: BinarySubtype::Generic,
        bytes: vec![9, 9, 9],
    };

    things.save(first.clone(), &doc! { "name": "A" }).await.unwrap();
    let created = things.save(second.clone(), &doc! { "name": "B" }).await.unwrap();

    assert_eq!(created.upserted_id, Some(Bson::Binary(second.clone())));
    assert_eq!(things.query().count().await.unwrap(), 2);

    let a: Document = things.find_by_id(first.clone()).await.consume().await.unwrap();
    let b: Document = things.find_by_id(second.clone()).await.consume().await.unwrap();
    assert_eq!(a, doc! { "_id": first, "name": "A" });
    assert_eq!(b, doc! { "_id": second, "name": "B" });
}
