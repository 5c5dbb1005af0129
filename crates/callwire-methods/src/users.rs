//! In-memory user CRUD.
//!
//! The table lives behind a single mutex; id allocation happens inside the
//! same critical section as the insert, so concurrent creates can never
//! observe or reuse an id.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use callwire_json_rpc::{MethodError, RequestParams, RpcMethod, decode_params};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User with ID {0} not found")]
    NotFound(u64),

    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Name and email are required")]
    MissingField,
}

impl From<UserError> for MethodError {
    fn from(err: UserError) -> Self {
        // Business-rule violations surface as internal errors on the wire.
        MethodError::failed(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub age: Option<u32>,
    pub created_at: String,
    pub updated_at: String,
}

/// Updatable fields. Anything outside this allow-list is ignored; absent
/// fields leave the record untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<u32>,
}

#[derive(Default)]
struct UserTable {
    users: BTreeMap<u64, User>,
    next_id: u64,
}

/// Synchronized user storage with atomic create/read/update/delete.
pub struct UserStore {
    inner: Mutex<UserTable>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(UserTable {
                users: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn create(
        &self,
        name: String,
        email: String,
        age: Option<u32>,
    ) -> Result<User, UserError> {
        if name.is_empty() || email.is_empty() {
            return Err(UserError::MissingField);
        }

        let mut table = self.inner.lock();

        if table.users.values().any(|user| user.email == email) {
            return Err(UserError::DuplicateEmail(email));
        }

        let id = table.next_id;
        table.next_id += 1;

        let now = Utc::now().to_rfc3339();
        let user = User {
            id,
            name,
            email,
            age,
            created_at: now.clone(),
            updated_at: now,
        };
        table.users.insert(id, user.clone());
        debug!("Created user {} ({})", id, user.email);
        Ok(user)
    }

    pub fn get(&self, id: u64) -> Result<User, UserError> {
        self.inner
            .lock()
            .users
            .get(&id)
            .cloned()
            .ok_or(UserError::NotFound(id))
    }

    pub fn update(&self, id: u64, patch: UserPatch) -> Result<User, UserError> {
        let mut table = self.inner.lock();
        let user = table.users.get_mut(&id).ok_or(UserError::NotFound(id))?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(age) = patch.age {
            user.age = Some(age);
        }
        user.updated_at = Utc::now().to_rfc3339();

        Ok(user.clone())
    }

    pub fn delete(&self, id: u64) -> Result<(), UserError> {
        self.inner
            .lock()
            .users
            .remove(&id)
            .map(|_| debug!("Deleted user {}", id))
            .ok_or(UserError::NotFound(id))
    }

    pub fn list(&self) -> Vec<User> {
        self.inner.lock().users.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json(value: impl Serialize) -> Result<Value, MethodError> {
    serde_json::to_value(value).map_err(|err| MethodError::failed(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct CreateUserParams {
    name: String,
    email: String,
    age: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UserIdParams {
    user_id: u64,
}

#[derive(Debug, Deserialize)]
struct UpdateUserParams {
    user_id: u64,
    #[serde(flatten)]
    patch: UserPatch,
}

/// Handler exposing the user store as JSON-RPC methods.
pub struct UserService {
    store: UserStore,
}

impl UserService {
    pub fn new() -> Self {
        Self {
            store: UserStore::new(),
        }
    }

    pub fn with_store(store: UserStore) -> Self {
        Self { store }
    }
}

impl Default for UserService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcMethod for UserService {
    async fn call(
        &self,
        method: &str,
        params: Option<RequestParams>,
    ) -> Result<Value, MethodError> {
        match method {
            "create_user" => {
                let p: CreateUserParams = decode_params(params, &["name", "email", "age"])?;
                let user = self.store.create(p.name, p.email, p.age)?;
                to_json(user)
            }
            "get_user_by_id" => {
                let p: UserIdParams = decode_params(params, &["user_id"])?;
                let user = self.store.get(p.user_id)?;
                to_json(user)
            }
            "update_user" => {
                let p: UpdateUserParams = decode_params(params, &["user_id"])?;
                let user = self.store.update(p.user_id, p.patch)?;
                to_json(user)
            }
            "delete_user" => {
                let p: UserIdParams = decode_params(params, &["user_id"])?;
                self.store.delete(p.user_id)?;
                Ok(json!({
                    "message": format!("User {} deleted successfully", p.user_id)
                }))
            }
            "list_users" => to_json(self.store.list()),
            other => Err(MethodError::failed(format!(
                "UserService does not handle '{other}'"
            ))),
        }
    }

    fn method_names(&self) -> Vec<String> {
        [
            "create_user",
            "get_user_by_id",
            "update_user",
            "delete_user",
            "list_users",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}
