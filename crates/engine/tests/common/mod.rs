#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection};
use serde_json::json;
use uuid::Uuid;

use engine::{
    Engine, EngineError, GroupRole, ResultEngine, SlipStorage, SlipVerifier, StoredFile, Verdict,
    users,
};
use migration::MigratorTrait;

/// Keeps uploads in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    pub files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStorage {
    pub fn stored_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl SlipStorage for MemoryStorage {
    async fn store(&self, bytes: &[u8], suggested_name: &str) -> ResultEngine<StoredFile> {
        let reference = format!("mem://{}_{suggested_name}", Uuid::new_v4().simple());
        self.files
            .lock()
            .unwrap()
            .push((reference.clone(), bytes.to_vec()));
        Ok(StoredFile {
            reference,
            path: PathBuf::from(suggested_name),
            size: bytes.len() as i64,
        })
    }
}

#[derive(Debug)]
pub struct FailingStorage;

#[async_trait]
impl SlipStorage for FailingStorage {
    async fn store(&self, _bytes: &[u8], _suggested_name: &str) -> ResultEngine<StoredFile> {
        Err(EngineError::Storage("disk full".to_string()))
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Script {
    Accept,
    Reject,
    Unreachable,
}

/// Answers every verification the same way and counts the calls.
#[derive(Debug)]
pub struct ScriptedVerifier {
    script: Script,
    pub calls: AtomicUsize,
}

impl ScriptedVerifier {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlipVerifier for ScriptedVerifier {
    async fn verify(&self, file: &StoredFile) -> ResultEngine<Verdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Accept => Ok(Verdict {
                accepted: true,
                payload: json!({"success": true, "transRef": file.reference, "amount": 100}),
            }),
            Script::Reject => Ok(Verdict {
                accepted: false,
                payload: json!({"success": false, "message": "not a slip"}),
            }),
            Script::Unreachable => Err(EngineError::UpstreamDegraded("timeout".to_string())),
        }
    }
}

pub struct Harness {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub storage: Arc<MemoryStorage>,
    pub verifier: Arc<ScriptedVerifier>,
}

pub async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    for name in ["alice", "bob", "carol", "dave"] {
        add_user(&db, name).await;
    }
    db
}

pub async fn add_user(db: &DatabaseConnection, username: &str) {
    users::ActiveModel {
        username: ActiveValue::Set(username.to_string()),
        password: ActiveValue::Set("password".to_string()),
        full_name: ActiveValue::Set(format!("{username} full")),
        wallet_balance: ActiveValue::Set(0),
        created_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn harness(script: Script) -> Harness {
    let db = migrated_db().await;
    let storage = Arc::new(MemoryStorage::default());
    let verifier = Arc::new(ScriptedVerifier::new(script));
    let engine = Engine::builder()
        .database(db.clone())
        .storage(storage.clone())
        .verifier(verifier.clone())
        .build()
        .await
        .unwrap();
    Harness {
        engine,
        db,
        storage,
        verifier,
    }
}

/// Group "Trip" administered by alice, with bob and carol as approvers and
/// dave as a plain requester.
pub async fn trip_group(engine: &Engine) -> Uuid {
    let group = engine.create_group("alice", "Trip", None).await.unwrap();
    for name in ["bob", "carol", "dave"] {
        engine.join_group(name, &group.invite_code).await.unwrap();
    }
    for name in ["bob", "carol"] {
        engine
            .set_member_role("alice", group.id, name, GroupRole::Approver)
            .await
            .unwrap();
    }
    group.id
}
