//! In-memory file store served through a [`Controller`].
//!
//! Files are plain text keyed by name; the store is injected into the
//! controller the same way as in `user_api.rs`.
//!
//! Run with:
//! ```sh
//! cargo run --example file_api
//! curl -X POST http://127.0.0.1:8080/files/notes.txt -d 'remember the milk'
//! curl http://127.0.0.1:8080/files
//! curl http://127.0.0.1:8080/files/notes.txt
//! curl -X DELETE http://127.0.0.1:8080/files/notes.txt
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use routekit::{
    Context, Controller, Fault, ResponseSink, Router, Server, StatusCode, TemplateError,
    router::HandlerResult,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Thread-safe in-memory file storage, name to text content.
#[derive(Default)]
struct FileStore {
    files: Mutex<HashMap<String, String>>,
}

impl FileStore {
    fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    fn read(&self, name: &str) -> Option<String> {
        self.files.lock().unwrap().get(name).cloned()
    }

    fn write(&self, name: String, content: String) -> bool {
        self.files.lock().unwrap().insert(name, content).is_none()
    }

    fn remove(&self, name: &str) -> bool {
        self.files.lock().unwrap().remove(name).is_some()
    }
}

struct FileController {
    store: Arc<FileStore>,
}

impl FileController {
    fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }

    fn name(ctx: &Context) -> Result<&str, Fault> {
        ctx.param("name")
            .ok_or_else(|| Fault::bad_input("missing file name"))
    }

    fn list(&self, _ctx: &Context, _res: &mut ResponseSink) -> HandlerResult {
        Ok(Some(json!({ "files": self.store.list() })))
    }

    fn download(&self, ctx: &Context, res: &mut ResponseSink) -> HandlerResult {
        let name = Self::name(ctx)?;
        match self.store.read(name) {
            Some(content) => {
                res.text(StatusCode::Ok, content)?;
                Ok(None)
            }
            None => Err(Fault::failure(format!("file {name} not found"))),
        }
    }

    fn upload(&self, ctx: &Context, res: &mut ResponseSink) -> HandlerResult {
        let name = Self::name(ctx)?;
        let content = std::str::from_utf8(ctx.request().body())
            .map_err(|_| Fault::bad_input("file content must be UTF-8 text"))?;
        if content.is_empty() {
            return Err(Fault::bad_input("file content must not be empty"));
        }
        let created = self.store.write(name.to_owned(), content.to_owned());
        let status = if created {
            StatusCode::Created
        } else {
            StatusCode::Ok
        };
        res.json(status, &json!({ "name": name, "bytes": content.len() }))?;
        Ok(None)
    }

    fn delete(&self, ctx: &Context, res: &mut ResponseSink) -> HandlerResult {
        let name = Self::name(ctx)?;
        if !self.store.remove(name) {
            return Err(Fault::failure(format!("file {name} not found")));
        }
        res.text(StatusCode::NoContent, "")?;
        Ok(None)
    }
}

impl Controller for FileController {
    fn mount(self: Arc<Self>, router: &mut Router) -> Result<(), TemplateError> {
        let this = Arc::clone(&self);
        router.get("/files", move |ctx, res| this.list(ctx, res))?;
        let this = Arc::clone(&self);
        router.get("/files/{name}", move |ctx, res| this.download(ctx, res))?;
        let this = Arc::clone(&self);
        router.post("/files/{name}", move |ctx, res| this.upload(ctx, res))?;
        let this = Arc::clone(&self);
        router.delete("/files/{name}", move |ctx, res| this.delete(ctx, res))?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let store = Arc::new(FileStore::default());

    let server = Server::new("127.0.0.1:8080").mount(FileController::new(store))?;
    server.serve().await?;
    Ok(())
}
