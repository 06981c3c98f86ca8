//! Autowiring walkthrough for the rabt container.
//!
//! Run with `RABT_LOG=rabt_container=trace` to watch each resolution step.

use std::time::Duration;

use rabt::prelude::*;
use tracing::info;

// === Describe your types ===

struct ConsoleLogger;

struct Config {
    database_url: String,
}

struct Database {
    url: String,
    logger: Instance,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        format!("[{}] {sql} on {}", self.logger.class_name(), self.url)
    }
}

struct UserRepository {
    db: Instance,
}

impl UserRepository {
    fn find_user(&self, id: i64) -> Result<String> {
        let db = self.db.get::<Database>()?;
        Ok(db.query(&format!("SELECT * FROM users WHERE id = {id}")))
    }
}

fn describe_types() -> ContainerBuilder {
    Container::builder()
        .cache_ttl(Duration::from_secs(600))
        .register_type(TypeDescriptor::capability("Logger").finish())
        .register_type(
            TypeDescriptor::concrete("ConsoleLogger")
                .implements("Logger")
                .instantiate(|_| Ok(ConsoleLogger)),
        )
        .register_type(
            TypeDescriptor::concrete("Database")
                .constructor([
                    Param::new("url", "string"),
                    Param::new("logger", "Logger"),
                ])
                .instantiate(|args| {
                    Ok(Database {
                        url: args.string(0)?,
                        logger: args.instance(1)?,
                    })
                }),
        )
        .register_type(
            TypeDescriptor::concrete("UserRepository")
                .constructor([Param::new("db", "Database")])
                .method::<UserRepository, _>("find", [Param::new("id", "int")], |repo, args| {
                    Ok(Value::from(repo.find_user(args.int(0)?)?))
                })
                .instantiate(|args| Ok(UserRepository { db: args.instance(0)? })),
        )
}

fn main() -> Result<()> {
    rabt::init_logging("rabt_container=debug,autowiring=info");

    let container = describe_types().build()?;

    // Config: a ready-made value.
    container.instance(
        "config",
        Instance::new(
            "Config",
            Config {
                database_url: "postgres://localhost/app".to_string(),
            },
        ),
    )?;

    // Logger: interface bound to an implementation, shared.
    container.singleton("Logger", "ConsoleLogger")?;

    // Database: factory pulling the url out of the config.
    container.singleton_factory("Database", |c, _| {
        let config = c.make_as::<Config>("config")?;
        c.build_with("Database", &params([("url", config.database_url.as_str())]))
    })?;

    info!(?container, "Container ready");

    // UserRepository is never bound: it is autowired.
    let users = container.call(
        &Callable::method("UserRepository", "find"),
        &params([("id", 42)]),
    )?;
    info!(result = ?users, "Query done");

    // A request scope: its own values, everything else from the parent.
    container.scope("request", |scope| -> Result<()> {
        scope.instance("request_id", Value::from("req-1"))?;
        let id = scope.make("request_id")?;
        let logger = scope.make("Logger")?;
        info!(?id, ?logger, "Inside request scope");
        Ok(())
    })?;

    println!("{}", container.generate_dependency_graph()?);
    Ok(())
}
