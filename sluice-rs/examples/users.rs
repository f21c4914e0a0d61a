//! Example: a users module with a sync command, an async query, and both dispatch entry points.
//!
//! Run with `RUST_LOG=sluice_core=debug cargo run --example users` to see each resolution step.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sluice_rs::{
    async_trait, Application, AsyncQueryHandler, CancellationToken, Command, CommandHandler, HandlerError,
    HandlerModule, Query,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct UserModel {
    id: u32,
    name: String,
}

#[derive(Debug, Command)]
struct CreateUser {
    id: u32,
    name: String,
}

#[derive(Debug, Query)]
#[query(result = UserModel)]
struct GetUser {
    id: u32,
}

type Store = Arc<RwLock<HashMap<u32, UserModel>>>;

struct CreateUserHandler {
    store: Store,
}

impl CommandHandler<CreateUser> for CreateUserHandler {
    fn handle(&self, command: CreateUser) -> Result<(), HandlerError> {
        let mut users = self.store.write().map_err(|_| "user store poisoned")?;
        users.insert(
            command.id,
            UserModel {
                id: command.id,
                name: command.name,
            },
        );
        Ok(())
    }
}

struct GetUserHandler {
    store: Store,
}

#[async_trait]
impl AsyncQueryHandler<GetUser, UserModel> for GetUserHandler {
    async fn handle(&self, query: GetUser, _cancel: CancellationToken) -> Result<UserModel, HandlerError> {
        let users = self.store.read().map_err(|_| "user store poisoned")?;
        users
            .get(&query.id)
            .cloned()
            .ok_or_else(|| format!("user {} not found", query.id).into())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store: Store = Arc::default();
    let mut users = HandlerModule::new("users")
        .command(CreateUserHandler { store: store.clone() })
        .async_query(GetUserHandler { store });

    let mut app = Application::new();
    app.register(&mut users)?;

    // No async command handler: dispatch_async runs the sync one and hands back a finished future.
    app.commands()
        .dispatch_async(CreateUser {
            id: 1,
            name: "ada".to_string(),
        })
        .await?;

    let user = app.queries().for_result::<UserModel>().dispatch_async(GetUser { id: 1 }).await?;
    println!("async query: {} -> {}", user.id, user.name);

    // No sync query handler: dispatch blocks on the async one.
    let queries = app.queries().clone();
    let user: UserModel = tokio::task::spawn_blocking(move || queries.dispatch(GetUser { id: 1 })).await??;
    println!("blocking query: {} -> {}", user.id, user.name);

    if let Err(err) = app.queries().dispatch::<UserModel>(GetUser { id: 2 }) {
        println!("expected failure: {err}");
    }
    Ok(())
}
