//! Command execution.

use crate::Command;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::process::ExitCode;
use tally_auth::{Decision, RoleCatalog};
use tally_runtime::config::TallyConfig;
use tally_runtime::roles::RoleCatalogWatcher;
use tally_runtime::Backoffice;
use tally_types::{CollectionName, CounterName, RoleName};

/// Runs one command against the configured data file.
pub(crate) async fn run(command: Command, mut config: TallyConfig) -> Result<ExitCode> {
    if matches!(command, Command::SeedRoles) {
        // Seeded explicitly below so the outcome can be reported.
        config.auth.seed_default_roles = false;
    }

    let office = Backoffice::open(config)
        .await
        .context("failed to open datastore")?;

    match command {
        Command::SeedRoles => seed_roles(&office).await,
        Command::Can {
            role,
            action,
            module,
        } => can(&office, role.as_deref(), &action, &module),
        Command::NextId {
            counter,
            start,
            prefix,
            scope,
            daily,
        } => {
            next_id(&office, &counter, start, &prefix, scope, daily).await?;
            save(&office).await
        }
        Command::List { collection } => {
            let collection = collection_name(&collection)?;
            let records = office.store().list(&collection).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Get { collection, id } => {
            let collection = collection_name(&collection)?;
            let Some(record) = office.store().get(&collection, &id).await? else {
                bail!("no record {id} in {collection}");
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Create { collection, json } => {
            let collection = collection_name(&collection)?;
            let id = office.store().create(&collection, payload(&json)?).await?;
            println!("{id}");
            save(&office).await
        }
        Command::Update {
            collection,
            id,
            json,
        } => {
            let collection = collection_name(&collection)?;
            office
                .store()
                .update(&collection, &id, payload(&json)?)
                .await
                .with_context(|| format!("failed to update {collection}/{id}"))?;
            save(&office).await
        }
        Command::Remove { collection, id } => {
            let collection = collection_name(&collection)?;
            office.store().remove(&collection, id.as_str()).await?;
            save(&office).await
        }
    }
}

async fn seed_roles(office: &Backoffice) -> Result<ExitCode> {
    let evaluator = office.evaluator();
    let seed = RoleCatalog::default_seed(evaluator.modules());
    let count = seed.len();

    let watcher = RoleCatalogWatcher::new(office.datastore().clone(), evaluator.catalog().clone())
        .with_seed(seed);
    if watcher.seed_if_absent().await? {
        println!("seeded {count} roles");
        save(office).await
    } else {
        println!("roles already present");
        Ok(ExitCode::SUCCESS)
    }
}

fn can(office: &Backoffice, role: Option<&str>, action: &str, module: &str) -> Result<ExitCode> {
    let role = role
        .map(RoleName::parse)
        .transpose()
        .context("invalid role name")?;
    let decision = office.scope(role).explain(action, module);

    match decision {
        Decision::Granted | Decision::Privileged => {
            println!("{}", decision.status_str());
            Ok(ExitCode::SUCCESS)
        }
        Decision::Denied(reason) => {
            println!("denied: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn next_id(
    office: &Backoffice,
    counter: &str,
    start: Option<i64>,
    prefix: &str,
    mut scope: Vec<String>,
    daily: bool,
) -> Result<()> {
    if daily {
        scope.insert(0, chrono::Local::now().format("%Y-%m-%d").to_string());
    }
    let parts: Vec<&str> = scope.iter().map(String::as_str).collect();
    let counter = CounterName::scoped(counter, &parts).context("invalid counter name")?;

    let number = office.next_document_number(&counter, start, prefix).await?;
    println!("{number}");
    Ok(())
}

async fn save(office: &Backoffice) -> Result<ExitCode> {
    office
        .save()
        .await
        .with_context(|| format!("failed to save {}", office.data_path().display()))?;
    Ok(ExitCode::SUCCESS)
}

fn collection_name(name: &str) -> Result<CollectionName> {
    CollectionName::parse(name).with_context(|| format!("invalid collection name {name:?}"))
}

fn payload(json: &str) -> Result<Value> {
    serde_json::from_str(json).context("payload is not valid JSON")
}
