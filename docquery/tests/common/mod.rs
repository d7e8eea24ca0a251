#![allow(dead_code)]

use docquery::{memory::InMemoryBackend, prelude::*};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Car {
    pub color: String,
    pub speed: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub age: i32,
    #[serde(default)]
    pub car: Car,
    #[serde(default)]
    pub score: Vec<i32>,
    #[serde(default)]
    pub alias: Vec<String>,
}

impl Person {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.to_string(),
            age,
            car: Car::default(),
            score: Vec::new(),
            alias: Vec::new(),
        }
    }
}

impl Entity for Person {
    fn id(&self) -> Bson {
        self.id.into()
    }

    fn collection_name() -> &'static str {
        "people"
    }
}

pub async fn database() -> Database<InMemoryBackend> {
    Database::connect(InMemoryBackend::builder()).await.unwrap()
}

/// Saves every person into the `people` collection, in order.
pub async fn seed(database: &Database<InMemoryBackend>, people: &[Person]) {
    let collection = database.collection_for::<Person>();

    for person in people {
        collection.save_entity(person).await.unwrap();
    }
}

pub fn names(people: &[Person]) -> Vec<&str> {
    people.iter().map(|p| p.name.as_str()).collect()
}
