//! In-memory user CRUD API built from a [`Controller`].
//!
//! The store is constructed in `main` and injected into the controller, so
//! the same instance could back several controllers or be swapped for a real
//! database without touching the handlers.
//!
//! Run with:
//! ```sh
//! cargo run --example user_api
//! curl http://127.0.0.1:8080/users
//! curl -X POST http://127.0.0.1:8080/users \
//!   -d '{"name":"Jane","email":"jane@example.com"}'
//! curl http://127.0.0.1:8080/users/1
//! curl -X DELETE http://127.0.0.1:8080/users/1
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use routekit::{
    Context, Controller, Fault, ResponseSink, Router, Server, StatusCode, TemplateError,
    router::HandlerResult,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct UserInput {
    name: String,
    email: String,
}

/// Thread-safe in-memory user storage.
#[derive(Default)]
struct UserStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<u64, User>,
    next_id: u64,
}

impl UserStore {
    fn list(&self) -> Vec<User> {
        let inner = self.inner.lock().unwrap();
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        users
    }

    fn get(&self, id: u64) -> Option<User> {
        self.inner.lock().unwrap().users.get(&id).cloned()
    }

    fn create(&self, input: UserInput) -> User {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            name: input.name,
            email: input.email,
        };
        inner.users.insert(user.id, user.clone());
        user
    }

    fn update(&self, id: u64, input: UserInput) -> Option<User> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.users.get_mut(&id)?;
        user.name = input.name;
        user.email = input.email;
        Some(user.clone())
    }

    fn delete(&self, id: u64) -> bool {
        self.inner.lock().unwrap().users.remove(&id).is_some()
    }
}

struct UserController {
    store: Arc<UserStore>,
}

impl UserController {
    fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    fn parse_id(ctx: &Context) -> Result<u64, Fault> {
        ctx.param("id")
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| Fault::bad_input("user id must be a positive integer"))
    }

    fn list(&self, _ctx: &Context, _res: &mut ResponseSink) -> HandlerResult {
        Ok(Some(json!(self.store.list())))
    }

    fn get(&self, ctx: &Context, _res: &mut ResponseSink) -> HandlerResult {
        let id = Self::parse_id(ctx)?;
        match self.store.get(id) {
            Some(user) => Ok(Some(json!(user))),
            None => Err(Fault::failure(format!("user {id} not found"))),
        }
    }

    fn create(&self, ctx: &Context, res: &mut ResponseSink) -> HandlerResult {
        let input: UserInput = ctx.json()?;
        if input.name.trim().is_empty() {
            return Err(Fault::bad_input("name must not be empty"));
        }
        let user = self.store.create(input);
        res.json(StatusCode::Created, &user)?;
        Ok(None)
    }

    fn update(&self, ctx: &Context, _res: &mut ResponseSink) -> HandlerResult {
        let id = Self::parse_id(ctx)?;
        let input: UserInput = ctx.json()?;
        match self.store.update(id, input) {
            Some(user) => Ok(Some(json!(user))),
            None => Err(Fault::failure(format!("user {id} not found"))),
        }
    }

    fn delete(&self, ctx: &Context, res: &mut ResponseSink) -> HandlerResult {
        let id = Self::parse_id(ctx)?;
        if !self.store.delete(id) {
            return Err(Fault::failure(format!("user {id} not found")));
        }
        res.text(StatusCode::NoContent, "")?;
        Ok(None)
    }
}

impl Controller for UserController {
    fn mount(self: Arc<Self>, router: &mut Router) -> Result<(), TemplateError> {
        let this = Arc::clone(&self);
        router.get("/users", move |ctx, res| this.list(ctx, res))?;
        let this = Arc::clone(&self);
        router.get("/users/{id}", move |ctx, res| this.get(ctx, res))?;
        let this = Arc::clone(&self);
        router.post("/users", move |ctx, res| this.create(ctx, res))?;
        let this = Arc::clone(&self);
        router.put("/users/{id}", move |ctx, res| this.update(ctx, res))?;
        let this = Arc::clone(&self);
        router.delete("/users/{id}", move |ctx, res| this.delete(ctx, res))?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let store = Arc::new(UserStore::default());

    let server = Server::new("127.0.0.1:8080").mount(UserController::new(store))?;
    server.serve().await?;
    Ok(())
}
