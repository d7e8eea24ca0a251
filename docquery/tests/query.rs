mod common;

use common::{Person, database, names, seed};
use docquery::{memory::InMemoryBackend, prelude::*};

async fn count(query: Query<'_, InMemoryBackend>) -> u64 {
    query.count().await.unwrap()
}

fn family() -> Vec<Person> {
    vec![
        Person::new("Trevor", 27),
        Person::new("Rose", 35),
        Person::new("Ann", 35),
        Person::new("Trevor", 52),
        Person::new("Zed", 16),
    ]
}

#[tokio::test]
async fn empty_query_matches_every_document() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    let everyone: Vec<Person> = people.query().find().await.consume().await.unwrap();

    assert_eq!(everyone.len(), 5);
    assert_eq!(people.query().count().await.unwrap(), 5);
    assert_eq!(people.query().filter_document(), doc! {});
}

#[tokio::test]
async fn terms_are_conjunctive() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    let by_name: Vec<Person> = people.query().eq("name", "Trevor").find().await.consume().await.unwrap();
    let by_age: Vec<Person> = people.query().gte("age", 30).find().await.consume().await.unwrap();
    let both: Vec<Person> = people
        .query()
        .eq("name", "Trevor")
        .gte("age", 30)
        .find()
        .await
        .consume()
        .await
        .unwrap();

    let intersection = by_name
        .iter()
        .filter(|p| by_age.contains(p))
        .cloned()
        .collect::<Vec<_>>();

    assert_eq!(both, intersection);
    assert_eq!(names(&both), vec!["Trevor"]);
    assert_eq!(both[0].age, 52);
}

#[tokio::test]
async fn every_predicate_operator() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    assert_eq!(count(people.query().ne("name", "Trevor")).await, 3);
    assert_eq!(count(people.query().gt("age", 35)).await, 1);
    assert_eq!(count(people.query().gte("age", 35)).await, 3);
    assert_eq!(count(people.query().lt("age", 27)).await, 1);
    assert_eq!(count(people.query().lte("age", 27)).await, 2);
    assert_eq!(count(people.query().any_of("name", ["Rose", "Zed"])).await, 2);
    assert_eq!(count(people.query().none_of("name", ["Rose", "Zed"])).await, 3);
    assert_eq!(count(people.query().regex("name", "^[RZ]")).await, 2);
}

#[tokio::test]
async fn compound_sort_orders_by_each_key_in_turn() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    let sorted: Vec<Person> = people
        .query()
        .desc("age")
        .asc("name")
        .find()
        .await
        .consume()
        .await
        .unwrap();

    assert_eq!(names(&sorted), vec!["Trevor", "Ann", "Rose", "Trevor", "Zed"]);
    assert_eq!(sorted[0].age, 52);
}

#[tokio::test]
async fn offset_and_limit_slice_the_sorted_matches() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");
    let by_age = people.query().asc("age");

    let full: Vec<Person> = by_age.find().await.consume().await.unwrap();
    let slice: Vec<Person> = by_age.clone().offset(1).limit(2).find().await.consume().await.unwrap();

    assert_eq!(slice, full[1..3].to_vec());
    assert_eq!(by_age.clone().offset(1).limit(2).count().await.unwrap(), 2);
}

#[tokio::test]
async fn zero_limit_is_unbounded() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    let limited: Vec<Person> = people.query().limit(3).limit(0).find().await.consume().await.unwrap();

    assert_eq!(limited.len(), 5);
}

#[tokio::test]
async fn find_one_without_match_is_not_found() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

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
async fn find_without_match_is_an_empty_sequence() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    let nobody: Vec<Person> = people
        .query()
        .eq("name", "Nobody")
        .find()
        .await
        .consume()
        .await
        .unwrap();

    assert!(nobody.is_empty());
}

#[tokio::test]
async fn find_one_honours_sort_and_offset() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    let second_youngest: Person = people
        .query()
        .asc("age")
        .offset(1)
        .find_one()
        .await
        .consume()
        .await
        .unwrap();

    assert_eq!(second_youngest.age, 27);
}

#[tokio::test]
async fn decode_failure_is_reported_as_decode_error() {
    let database = database().await;
    let people = database.collection("people");
    people.save(1, &doc! { "name": "Trevor", "age": "old" }).await.unwrap();

    let err = people.find_by_id(1).await.consume::<Person>().await.unwrap_err();

    assert!(matches!(err, DocQueryError::Decode(_)));
}

#[tokio::test]
async fn malformed_filter_surfaces_as_execution_error() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");

    let err = people
        .query()
        .regex("name", "(unclosed")
        .find()
        .await
        .consume::<Vec<Person>>()
        .await
        .unwrap_err();

    assert!(matches!(err, DocQueryError::Execution(_)));
}

#[tokio::test]
async fn derived_queries_do_not_affect_their_base() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");
    let adults = people.query().gte("age", 18);

    let (trevors, roses) = tokio::join!(
        async {
            adults.clone().eq("name", "Trevor").count().await.unwrap()
        },
        async {
            adults.clone().eq("name", "Rose").count().await.unwrap()
        },
    );

    assert_eq!(trevors, 2);
    assert_eq!(roses, 1);
    assert_eq!(adults.terms().len(), 1);
    assert_eq!(adults.count().await.unwrap(), 4);
}

#[tokio::test]
async fn separately_built_filter_is_appended() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");
    let teenagers = Filter::new().gte("age", 13).lt("age", 20);

    let found: Vec<Person> = people.query().filter(teenagers).find().await.consume().await.unwrap();

    assert_eq!(names(&found), vec!["Zed"]);
}

#[tokio::test]
async fn paging_reports_totals_and_neighbours() {
    let database = database().await;
    seed(&database, &family()).await;
    let people = database.collection("people");
    let by_age = people.query().asc("age");

    let first: Page<Person> = by_age.page(PageRequest::new(1, 2)).await.unwrap();
    let last: Page<Person> = by_age.page(PageRequest::new(3, 2)).await.unwrap();

    assert_eq!(first.count, 5);
    assert_eq!(names(&first.items), vec!["Zed", "Trevor"]);
    assert_eq!(first.next_page, Some(2));
    assert_eq!(first.previous_page, None);

    assert_eq!(names(&last.items), vec!["Trevor"]);
    assert_eq!(last.next_page, None);
    assert_eq!(last.previous_page, Some(2));
}
