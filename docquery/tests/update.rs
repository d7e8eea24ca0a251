mod common;

use bson::oid::ObjectId;
use common::{Car, Person, database, seed};
use docquery::prelude::*;

fn trevor() -> Person {
    Person {
        car: Car {
            color: "red".to_string(),
            speed: 120,
        },
        score: vec![10, 20],
        alias: vec!["trev".to_string()],
        ..Person::new("Trevor", 27)
    }
}

#[tokio::test]
async fn trevor_scenario() {
    let database = database().await;
    let person = Person::new("Trevor", 27);
    seed(&database, &[person.clone()]).await;
    let people = database.collection("people");

    let found: Vec<Person> = people
        .query()
        .eq("name", "Trevor")
        .desc("age")
        .limit(1)
        .find()
        .await
        .consume()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, person.id);

    people.query().inc("age", 1).update().await.unwrap();
    let aged: Person = people.query().find_one().await.consume().await.unwrap();
    assert_eq!(aged.age, 28);

    let err = people
        .query()
        .eq("name", "Nobody")
        .find_one()
        .await
        .consume::<Person>()
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn set_top_level_and_nested_fields() {
    let database = database().await;
    seed(&database, &[trevor()]).await;
    let people = database.collection("people");

    people
        .query()
        .set("name", "Ali")
        .set("car.color", "blue")
        .update()
        .await
        .unwrap();

    let updated: Person = people.query().find_one().await.consume().await.unwrap();
    assert_eq!(updated.name, "Ali");
    assert_eq!(updated.car.color, "blue");
    assert_eq!(updated.car.speed, 120);
    assert_eq!(updated.age, 27);
}

#[tokio::test]
async fn set_is_idempotent() {
    let database = database().await;
    seed(&database, &[trevor()]).await;
    let people = database.collection("people");
    let rename = people.query().eq("name", "Trevor").set("alias", vec!["t"]);

    let first = rename.update().await.unwrap();
    let once: Person = people.query().find_one().await.consume().await.unwrap();

    let second = rename.update().await.unwrap();
    let twice: Person = people.query().find_one().await.consume().await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(first.modified_count, 1);
    assert_eq!(second.matched_count, 1);
    assert!(second.is_noop());
}

#[tokio::test]
async fn repeated_set_on_one_field_keeps_the_last_value() {
    let database = database().await;
    seed(&database, &[trevor()]).await;
    let people = database.collection("people");

    people.query().set("age", 30).set("age", 31).update().await.unwrap();

    let updated: Person = people.query().find_one().await.consume().await.unwrap();
    assert_eq!(updated.age, 31);
}

#[tokio::test]
async fn push_then_pull_restores_the_array() {
    let database = database().await;
    seed(&database, &[trevor()]).await;
    let people = database.collection("people");

    people.query().push("score", [30, 40]).push("alias", ["tt"]).update().await.unwrap();
    let pushed: Person = people.query().find_one().await.consume().await.unwrap();
    assert_eq!(pushed.score, vec![10, 20, 30, 40]);
    assert_eq!(pushed.alias, vec!["trev", "tt"]);

    people.query().pull("score", [30, 40]).pull("alias", ["tt"]).update().await.unwrap();
    let pulled: Person = people.query().find_one().await.consume().await.unwrap();
    assert_eq!(pulled, trevor_with_id(pulled.id));
}

fn trevor_with_id(id: ObjectId) -> Person {
    Person { id, ..trevor() }
}

#[tokio::test]
async fn unset_removes_the_field() {
    let database = database().await;
    let people = database.collection("people");
    people.save(1, &doc! { "name": "Trevor", "nickname": "trev" }).await.unwrap();

    people.query().unset("nickname").update().await.unwrap();

    let stored: Document = people.find_by_id(1).await.consume().await.unwrap();
    assert_eq!(stored, doc! { "_id": 1, "name": "Trevor" });
}

#[tokio::test]
async fn update_one_changes_only_the_first_match() {
    let database = database().await;
    seed(&database, &[Person::new("Trevor", 27), Person::new("Trevor", 52)]).await;
    let people = database.collection("people");

    let summary = people.query().eq("name", "Trevor").inc("age", 1).update_one().await.unwrap();
    assert_eq!(summary.matched_count, 1);

    let ages: Vec<Person> = people.query().asc("age").find().await.consume().await.unwrap();
    assert_eq!(ages.iter().map(|p| p.age).collect::<Vec<_>>(), vec![28, 52]);
}

#[tokio::test]
async fn update_reports_counts() {
    let database = database().await;
    seed(&database, &[Person::new("Trevor", 27), Person::new("Rose", 35), Person::new("Ann", 35)]).await;
    let people = database.collection("people");

    let summary = people.query().eq("age", 35).set("age", 36).update().await.unwrap();
    assert_eq!(summary.matched_count, 2);
    assert_eq!(summary.modified_count, 2);

    let nothing = people.query().eq("name", "Nobody").set("age", 1).update().await.unwrap();
    assert_eq!(nothing.matched_count, 0);
    assert!(nothing.is_noop());
}

#[tokio::test]
async fn update_without_operations_is_rejected() {
    let database = database().await;
    let people = database.collection("people");

    let err = people.query().eq("name", "Trevor").update().await.unwrap_err();

    assert!(matches!(err, DocQueryError::InvalidUpdate(_)));
}

#[tokio::test]
async fn save_creates_then_partially_replaces() {
    let database = database().await;
    let people = database.collection("people");
    let id = ObjectId::new();

    let created = people.save(id, &doc! { "name": "Trevor", "age": 27 }).await.unwrap();
    assert_eq!(created.upserted_id, Some(Bson::ObjectId(id)));

    let replaced = people.save(id, &doc! { "age": 28 }).await.unwrap();
    assert_eq!(replaced.matched_count, 1);
    assert_eq!(replaced.upserted_id, None);

    let stored: Document = people.find_by_id(id).await.consume().await.unwrap();
    assert_eq!(stored, doc! { "_id": id, "name": "Trevor", "age": 28 });
    assert_eq!(people.query().count().await.unwrap(), 1);
}

#[tokio::test]
async fn query_save_upserts_against_the_predicate() {
    let database = database().await;
    let people = database.collection("people");

    people.query().eq("name", "Trevor").save(&doc! { "age": 27 }).await.unwrap();
    people.query().eq("name", "Trevor").save(&doc! { "age": 28 }).await.unwrap();

    let stored: Vec<Document> = people.query().find().await.consume().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get_str("name").unwrap(), "Trevor");
    assert_eq!(stored[0].get_i32("age").unwrap(), 28);
}

#[tokio::test]
async fn saving_an_empty_document_is_rejected() {
    let database = database().await;
    let people = database.collection("people");

    let err = people.save(1, &doc! {}).await.unwrap_err();

    assert!(matches!(err, DocQueryError::InvalidUpdate(_)));
}

#[tokio::test]
async fn delete_one_and_many() {
    let database = database().await;
    seed(&database, &[Person::new("Trevor", 27), Person::new("Trevor", 52), Person::new("Rose", 35)]).await;
    let people = database.collection("people");

    let one = people.query().eq("name", "Trevor").delete_one().await.unwrap();
    assert_eq!(one.deleted_count, 1);

    let rest = people.query().delete_many().await.unwrap();
    assert_eq!(rest.deleted_count, 2);
    assert_eq!(people.query().count().await.unwrap(), 0);
}

#[tokio::test]
async fn updates_cannot_change_the_identifier() {
    let database = database().await;
    let people = database.collection("people");
    people.save(1, &doc! { "name": "Trevor", "age": 3 }).await.unwrap();

    let set = people.query().set("_id", 5).update().await.unwrap_err();
    let save = people.query().eq("name", "Trevor").save(&doc! { "_id": 6, "age": 4 }).await.unwrap_err();

    assert!(matches!(set, DocQueryError::Execution(_)));
    assert!(matches!(save, DocQueryError::Execution(_)));

    let stored: Document = people.find_by_id(1).await.consume().await.unwrap();
    assert_eq!(stored, doc! { "_id": 1, "name": "Trevor", "age": 3 });
}
