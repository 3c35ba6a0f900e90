#![cfg(feature = "migration")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::prelude::Json;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use session_profile_gate::entity::profile;
use session_profile_gate::migration::{Migrator, MigratorTrait};
use session_profile_gate::{
    AuthChange, AuthProvider, CompleteProfileForm, Error, GateConfig, GatePhase,
    ProfileCompletionSource, ProfileGate, ProfileStore, ProfileUpdate, Result, Router, Session,
    UserId,
};
use tokio::sync::broadcast;

async fn setup() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn form() -> CompleteProfileForm {
    CompleteProfileForm {
        email: Some("asha@example.com".into()),
        full_name: " Asha Rao ".into(),
        company: "Acme".into(),
        job_title: "Engineer".into(),
        location: "Pune".into(),
        dob: "20/05/2004".into(),
        job_start_date: "2020".into(),
        tags: vec!["rust".into(), " ".into(), "golf".into()],
        ..Default::default()
    }
}

#[tokio::test]
async fn missing_row_has_no_completion() {
    let store = ProfileStore::new(setup().await);
    let user = UserId::new("nobody");

    assert_eq!(store.fetch_profile_completion(&user).await.unwrap(), None);
    assert!(!store.profile_exists(&user).await.unwrap());
    assert!(store.get_profile(&user).await.unwrap().is_none());
}

#[tokio::test]
async fn completing_a_new_profile_inserts_a_complete_row() {
    let store = ProfileStore::new(setup().await);
    let user = UserId::new("u1");

    let saved = store.complete_profile(&user, &form()).await.unwrap();
    assert_eq!(saved.id, "u1");
    assert!(saved.is_complete());

    let completion = store.fetch_profile_completion(&user).await.unwrap().unwrap();
    assert!(completion.is_complete());

    let row = store.get_profile(&user).await.unwrap().unwrap();
    assert_eq!(row.full_name.as_deref(), Some("Asha Rao"));
    assert_eq!(row.email.as_deref(), Some("asha@example.com"));
    assert_eq!(row.industry, None);
    assert_eq!(row.dob, NaiveDate::from_ymd_opt(2004, 5, 20));
    assert_eq!(row.job_start_date, None);
    assert_eq!(row.tags, Some(Json::from(vec!["rust", "golf"])));
    assert!(row.updated_at.is_some());
}

#[tokio::test]
async fn row_without_flag_is_not_complete_until_saved() {
    let db = setup().await;
    profile::ActiveModel {
        id: Set("u2".into()),
        full_name: Set(Some("Old Name".into())),
        bio: Set(Some("kept".into())),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let store = ProfileStore::new(db);
    let user = UserId::new("u2");

    let before = store.fetch_profile_completion(&user).await.unwrap().unwrap();
    assert_eq!(before.is_profile_complete, None);
    assert!(!before.is_complete());

    store.complete_profile(&user, &form()).await.unwrap();

    let row = store.get_profile(&user).await.unwrap().unwrap();
    assert!(row.is_complete());
    assert_eq!(row.full_name.as_deref(), Some("Asha Rao"));
    assert_eq!(row.bio, None);
}

#[tokio::test]
async fn invalid_form_writes_nothing() {
    let store = ProfileStore::new(setup().await);
    let user = UserId::new("u3");
    let incomplete = CompleteProfileForm {
        job_title: "".into(),
        ..form()
    };

    let err = store.complete_profile(&user, &incomplete).await.unwrap_err();
    assert!(matches!(err, Error::MissingField("job_title")));
    assert!(!store.profile_exists(&user).await.unwrap());
}

#[tokio::test]
async fn deleting_profiles() {
    let store = ProfileStore::new(setup().await);
    let user = UserId::new("u4");

    store.complete_profile(&user, &form()).await.unwrap();
    assert!(store.profile_exists(&user).await.unwrap());

    store.delete_profile(&user).await.unwrap();
    assert!(!store.profile_exists(&user).await.unwrap());

    store.delete_profile(&user).await.unwrap();
}

// Stands in for the signup trigger that creates a bare row per new account.
async fn seed_bare_row(db: &DatabaseConnection, user: &str) {
    profile::ActiveModel {
        id: Set(user.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

#[tokio::test]
async fn updating_a_missing_row_writes_nothing() {
    let store = ProfileStore::new(setup().await);
    let user = UserId::new("ghost");
    let update = ProfileUpdate {
        full_name: Some("Nobody".into()),
        ..Default::default()
    };

    assert!(!store.update_profile(&user, &update).await.unwrap());
    assert!(!store.profile_exists(&user).await.unwrap());
}

#[tokio::test]
async fn partial_update_keeps_completion_flag() {
    let db = setup().await;
    seed_bare_row(&db, "u6").await;
    let store = ProfileStore::new(db);
    let user = UserId::new("u6");

    let signup = ProfileUpdate {
        full_name: Some(" Ravi Menon ".into()),
        location: Some("Kochi".into()),
        ..Default::default()
    };
    assert!(store.update_profile(&user, &signup).await.unwrap());

    let row = store.get_profile(&user).await.unwrap().unwrap();
    assert_eq!(row.full_name.as_deref(), Some("Ravi Menon"));
    assert_eq!(row.location.as_deref(), Some("Kochi"));
    assert_eq!(row.is_profile_complete, None);
    assert!(row.updated_at.is_some());

    store.complete_profile(&user, &form()).await.unwrap();
    let onboarding = ProfileUpdate {
        industry: Some("Fintech".into()),
        ..Default::default()
    };
    assert!(store.update_profile(&user, &onboarding).await.unwrap());

    let row = store.get_profile(&user).await.unwrap().unwrap();
    assert!(row.is_complete());
    assert_eq!(row.industry.as_deref(), Some("Fintech"));
    assert_eq!(row.company.as_deref(), Some("Acme"));
}

struct SignedInAs(Session);

#[async_trait]
impl AuthProvider for SignedInAs {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(Some(self.0.clone()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        broadcast::channel(1).1
    }
}

#[derive(Default)]
struct RecordingRouter {
    replaced: Mutex<Vec<String>>,
}

impl Router for RecordingRouter {
    fn current_path(&self) -> String {
        self.replaced
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| "/login".to_string())
    }

    fn replace(&self, path: &str) {
        self.replaced.lock().unwrap().push(path.to_string());
    }
}

#[tokio::test]
async fn gate_reads_completion_from_store() {
    let store = Arc::new(ProfileStore::new(setup().await));
    let router = Arc::new(RecordingRouter::default());
    let user = UserId::new("u5");
    let mut gate = ProfileGate::new(
        Arc::new(SignedInAs(Session::new("u5", "token"))),
        store.clone(),
        router.clone(),
        GateConfig::new(),
    );
    let handle = gate.handle();

    gate.start().await;
    assert!(gate.process_next().await);
    assert_eq!(gate.view().phase, GatePhase::NeedsProfile);

    store.complete_profile(&user, &form()).await.unwrap();
    handle.profile_saved(user);
    assert!(gate.process_next().await);

    assert!(gate.view().shows_app());
    assert_eq!(
        *router.replaced.lock().unwrap(),
        vec!["/complete-profile".to_string()]
    );
}

#[tokio::test]
async fn gate_keeps_updated_but_incomplete_profile_on_completion_screen() {
    let db = setup().await;
    seed_bare_row(&db, "u7").await;
    let store = Arc::new(ProfileStore::new(db));
    let user = UserId::new("u7");
    let update = ProfileUpdate {
        job_title: Some("Engineer".into()),
        company: Some("Acme".into()),
        industry: Some("".into()),
        ..Default::default()
    };
    assert!(store.update_profile(&user, &update).await.unwrap());

    let router = Arc::new(RecordingRouter::default());
    let mut gate = ProfileGate::new(
        Arc::new(SignedInAs(Session::new("u7", "token"))),
        store,
        router.clone(),
        GateConfig::new(),
    );

    gate.start().await;
    assert!(gate.process_next().await);

    assert_eq!(gate.view().phase, GatePhase::NeedsProfile);
    assert_eq!(
        *router.replaced.lock().unwrap(),
        vec!["/complete-profile".to_string()]
    );
}
