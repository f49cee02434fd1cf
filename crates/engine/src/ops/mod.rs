use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    DbMembershipOracle, DisabledVerifier, LocalDiskStorage, MembershipOracle, ResultEngine,
    SlipStorage, SlipVerifier,
};

mod access;
mod approvals;
mod dashboard;
mod expenses;
mod groups;
mod wallets;

pub use access::authorize_decision;
pub use approvals::ApprovalOutcome;
pub use dashboard::{CategoryStats, DashboardStats, MonthStats, StatusStats};
pub use expenses::ExpenseDetail;
pub use wallets::{Reconciliation, WalletSnapshot};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of every operation.
///
/// Holds the store handle and the collaborators; there is no cached state,
/// every call re-reads what it needs.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    oracle: Arc<dyn MembershipOracle>,
    storage: Arc<dyn SlipStorage>,
    verifier: Arc<dyn SlipVerifier>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    oracle: Option<Arc<dyn MembershipOracle>>,
    storage: Option<Arc<dyn SlipStorage>>,
    verifier: Option<Arc<dyn SlipVerifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Membership lookups. Defaults to the group tables of the same database.
    pub fn oracle(mut self, oracle: Arc<dyn MembershipOracle>) -> EngineBuilder {
        self.oracle = Some(oracle);
        self
    }

    /// Where slips and receipts are written. Defaults to `./uploads`.
    pub fn storage(mut self, storage: Arc<dyn SlipStorage>) -> EngineBuilder {
        self.storage = Some(storage);
        self
    }

    /// Slip verifier. Defaults to [`DisabledVerifier`].
    pub fn verifier(mut self, verifier: Arc<dyn SlipVerifier>) -> EngineBuilder {
        self.verifier = Some(verifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let oracle = self
            .oracle
            .unwrap_or_else(|| Arc::new(DbMembershipOracle::new(self.database.clone())));
        Ok(Engine {
            database: self.database,
            oracle,
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(LocalDiskStorage::default())),
            verifier: self.verifier.unwrap_or_else(|| Arc::new(DisabledVerifier)),
        })
    }
}
