//! InMemory 資格情報ストア実装
//!
//! アカウント表を `HashMap` で保持し、ドメイン層の CredentialStore trait を実装します。
//! ファイルパスを指定した場合は、アカウント作成のたびに表全体を JSON で書き出し、
//! 起動時に読み込みます。
//!
//! - ユーザー名の重複チェックと登録は 1 つのロックの内側で行う
//!   → 同じユーザー名での同時サインアップは 1 つだけ成功する
//! - パスワードは bcrypt でハッシュ化してから保持する（`hasher` を参照）
//! - `UserId` は書き出しの await より前に確保する
//!   → 作成途中で future が drop されても、同じ ID が二度払い出されることはない

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use kakiba_shared::time::get_jst_timestamp;

use super::hasher::{DEFAULT_COST, PasswordHash, hash_password, verify_password};
use crate::domain::{CredentialError, CredentialStore, UserId, Username};

/// 管理者アカウントのユーザー名
pub const ADMIN_USERNAME: &str = "admin";

/// 保存されるアカウント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: i64,
    pub username: String,
    pub password: PasswordHash,
    #[serde(default)]
    pub is_admin: bool,
    /// Unix timestamp in JST (milliseconds)
    pub created_at: i64,
}

#[derive(Debug, Default)]
struct Accounts {
    by_name: HashMap<String, AccountRecord>,
    next_id: i64,
}

impl Accounts {
    fn from_records(records: Vec<AccountRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let by_name = records
            .into_iter()
            .map(|record| (record.username.clone(), record))
            .collect();
        Self { by_name, next_id }
    }

    fn records(&self) -> Vec<&AccountRecord> {
        let mut records: Vec<&AccountRecord> = self.by_name.values().collect();
        records.sort_by_key(|record| record.id);
        records
    }
}

/// インメモリ資格情報ストア
pub struct InMemoryCredentialStore {
    accounts: Mutex<Accounts>,
    /// 書き出し先（`None` ならメモリのみ）
    path: Option<PathBuf>,
    /// bcrypt のコスト
    cost: u32,
}

impl InMemoryCredentialStore {
    /// メモリのみのストアを作成
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Accounts {
                by_name: HashMap::new(),
                next_id: 1,
            }),
            path: None,
            cost: DEFAULT_COST,
        }
    }

    /// bcrypt のコストを変更する
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// JSON ファイルと同期するストアを開く（ファイルが無ければ空で始める）
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref().to_path_buf();
        let accounts = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let records: Vec<AccountRecord> = serde_json::from_slice(&bytes)
                    .map_err(|e| CredentialError::Backend(e.to_string()))?;
                tracing::info!(
                    "Loaded {} account(s) from {}",
                    records.len(),
                    path.display()
                );
                Accounts::from_records(records)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No account file at {}, starting empty", path.display());
                Accounts::from_records(Vec::new())
            }
            Err(e) => return Err(CredentialError::Backend(e.to_string())),
        };

        Ok(Self {
            accounts: Mutex::new(accounts),
            path: Some(path),
            cost: DEFAULT_COST,
        })
    }

    /// 管理者アカウントが無ければ作成する。作成した場合は `true`
    pub async fn seed_admin(&self, password: &str) -> Result<bool, CredentialError> {
        let admin = Username::new(ADMIN_USERNAME.to_string())
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        match self.insert(&admin, password, true).await {
            Ok(_) => {
                tracing::info!("Seeded '{}' account", ADMIN_USERNAME);
                Ok(true)
            }
            Err(CredentialError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 登録済みアカウント数
    pub async fn count(&self) -> usize {
        self.accounts.lock().await.by_name.len()
    }

    async fn insert(
        &self,
        username: &Username,
        password: &str,
        is_admin: bool,
    ) -> Result<UserId, CredentialError> {
        let password = hash_in_background(password.to_string(), self.cost).await?;

        let mut accounts = self.accounts.lock().await;
        if accounts.by_name.contains_key(username.as_str()) {
            return Err(CredentialError::AlreadyExists(username.to_string()));
        }

        let id = accounts.next_id;
        accounts.next_id += 1;
        let record = AccountRecord {
            id,
            username: username.to_string(),
            password,
            is_admin,
            created_at: get_jst_timestamp(),
        };
        accounts.by_name.insert(record.username.clone(), record);

        if let Err(e) = self.flush(&accounts).await {
            accounts.by_name.remove(username.as_str());
            return Err(e);
        }

        Ok(UserId::new(id))
    }

    async fn flush(&self, accounts: &Accounts) -> Result<(), CredentialError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(&accounts.records())
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CredentialError::Backend(e.to_string()))?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| CredentialError::Backend(e.to_string()))?;
        Ok(())
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn hash_in_background(password: String, cost: u32) -> Result<PasswordHash, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| CredentialError::Backend(e.to_string()))?
        .map_err(|e| CredentialError::Backend(e.to_string()))
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create_account(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<UserId, CredentialError> {
        let id = self.insert(username, password, false).await?;
        tracing::info!("Account '{}' created with id {}", username, id.value());
        Ok(id)
    }

    async fn verify_credentials(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<Option<UserId>, CredentialError> {
        let record = {
            let accounts = self.accounts.lock().await;
            accounts.by_name.get(username.as_str()).cloned()
        };
        let Some(record) = record else {
            return Ok(None);
        };

        let password = password.to_string();
        let stored = record.password.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| CredentialError::Backend(e.to_string()))?
            .map_err(|e| CredentialError::Backend(e.to_string()))?;

        Ok(matches.then(|| UserId::new(record.id)))
    }
}
