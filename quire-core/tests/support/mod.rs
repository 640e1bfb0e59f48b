#![allow(dead_code)]

use quire_common::model::{
    group::{CreateGroup, Group, Slug},
    post::Post,
    user::{CreateUser, User, Username},
};
use quire_core::{FeedSettings, Services, authoring::PostDraft};
use quire_db::{EntityStore, MemoryStore};
use std::{num::NonZeroU32, sync::Arc};

pub fn services() -> Services {
    let settings = FeedSettings {
        page_size: NonZeroU32::new(10).unwrap(),
        home_cache_ttl_seconds: NonZeroU32::new(20).unwrap(),
    };
    Services::new(Arc::new(MemoryStore::default()), settings)
}

pub fn username(name: &str) -> Username {
    Username::new(name.to_owned()).unwrap()
}

pub fn slug(slug: &str) -> Slug {
    Slug::new(slug.to_owned()).unwrap()
}

pub async fn user(services: &Services, name: &str) -> User {
    services
        .store()
        .create_user(&CreateUser {
            username: username(name),
        })
        .await
        .unwrap()
}

pub async fn group(services: &Services, name: &str) -> Group {
    services
        .store()
        .create_group(&CreateGroup {
            title: format!("Group {name}"),
            slug: slug(name),
            description: "A test group".to_owned(),
        })
        .await
        .unwrap()
}

pub async fn publish(services: &Services, author: &User, text: &str) -> Post {
    services
        .authoring()
        .create_post(
            author.id,
            PostDraft {
                text: text.to_owned(),
                ..PostDraft::default()
            },
        )
        .await
        .unwrap()
}
