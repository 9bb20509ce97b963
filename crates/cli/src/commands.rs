//! Command dispatch

use std::{io, sync::Arc};

use thiserror::Error;
use tracing::{info, warn};

use range_cart::{
    cart::QuantityUpdate,
    checkout::{CheckoutError, Customer, HttpOrderSubmitter, NewOrder},
    items::{CartItem, InvalidItemError, LineIdMinter},
    persist::Persister,
    pricing::service_price,
    settings::{ApiConfig, ConfigError, default_api_url},
    snapshot::CART_STORAGE_KEY,
    storage::{JsonFileStore, KeyValueStore, StorageError},
    store::CartStore,
};

use crate::{
    config::{AddProductArgs, AddServiceArgs, ApiUrlCommand, CheckoutArgs, Cli, Command},
    view,
};

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    /// The storage file could not be opened.
    #[error("failed to open storage: {0}")]
    Storage(#[from] StorageError),

    /// The item was rejected.
    #[error(transparent)]
    InvalidItem(#[from] InvalidItemError),

    /// The backend URL could not be changed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The order could not be placed.
    #[error("checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    /// Writing output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    /// The last cart change could not be saved.
    #[error("failed to save cart: {0}")]
    NotSaved(String),
}

/// Open the storage file, run one command and wait for the cart to be saved.
///
/// # Errors
///
/// Returns a [`CliError`] if the command or the final save fails.
pub async fn run(cli: Cli, out: &mut impl io::Write) -> Result<(), CliError> {
    let storage: Arc<dyn KeyValueStore> =
        Arc::new(JsonFileStore::open(cli.storage_path()).await?);

    let command = match cli.command {
        Command::ApiUrl { command } => return api_url(storage, command, out).await,
        command => command,
    };

    let (mut store, persister) = CartStore::open(Arc::clone(&storage), CART_STORAGE_KEY).await;
    let minter = LineIdMinter::new();

    match command {
        Command::Show | Command::ApiUrl { .. } => {}
        Command::AddProduct(args) => {
            store.add_item(product(&minter, args))?;
        }
        Command::AddService(args) => {
            store.add_item(service(&minter, args))?;
        }
        Command::Remove { id } => {
            if store.remove_item(&id).is_none() {
                warn!(%id, "no such line");
            }
        }
        Command::SetQuantity { id, quantity } => match store.update_quantity(&id, quantity) {
            QuantityUpdate::NotFound => warn!(%id, "no such line"),
            QuantityUpdate::OutOfRange => warn!(%id, quantity, "quantity too large"),
            QuantityUpdate::Set | QuantityUpdate::Removed(_) => {}
        },
        Command::Clear => store.clear_cart(),
        Command::Checkout(args) => checkout(&mut store, storage, args, out).await?,
    }

    view::write_cart(out, &store)?;

    saved(&persister).await
}

fn product(minter: &LineIdMinter, args: AddProductArgs) -> CartItem {
    let item = CartItem::product(minter.product(&args.id), args.name, args.price)
        .with_discount(args.discount)
        .with_quantity(args.quantity)
        .with_catalog_id(args.id);

    match args.image {
        Some(image) => item.with_image(image),
        None => item,
    }
}

fn service(minter: &LineIdMinter, args: AddServiceArgs) -> CartItem {
    let minutes = args.duration.unwrap_or_default();
    let price = service_price(args.price, minutes, args.hourly);

    let mut item = CartItem::service(minter.service(&args.id), args.name, price)
        .with_discount(args.discount)
        .with_catalog_id(args.id);

    if let Some(minutes) = args.duration {
        item = item.with_duration(minutes);
    }

    if let Some(master) = args.master {
        item = item.with_master(master);
    }

    if let Some(at) = args.at {
        item = item.with_schedule(at);
    }

    item
}

async fn checkout(
    store: &mut CartStore,
    storage: Arc<dyn KeyValueStore>,
    args: CheckoutArgs,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    let mut config = ApiConfig::new(storage, default_api_url());
    config.initialize().await;

    let customer = Customer {
        user_id: args.user_id,
        discount_percent: args.discount,
    };

    let summary = NewOrder::from_cart(store.cart(), &customer)?.summary();
    let submitter = HttpOrderSubmitter::new(config.api_url());
    let created = store.checkout(&submitter, &customer).await?;

    view::write_summary(out, &summary)?;
    writeln!(out, "Order {} placed", created.id)?;

    Ok(())
}

async fn api_url(
    storage: Arc<dyn KeyValueStore>,
    command: ApiUrlCommand,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    let mut config = ApiConfig::new(storage, default_api_url());
    config.initialize().await;

    match command {
        ApiUrlCommand::Get => {}
        ApiUrlCommand::Set { url } => config.set_api_url(&url).await?,
        ApiUrlCommand::Reset => config.reset().await?,
    }

    writeln!(out, "{}", config.api_url())?;

    Ok(())
}

async fn saved(persister: &Persister) -> Result<(), CliError> {
    let status = persister.flush().await;

    if let Some(error) = status.last_error {
        return Err(CliError::NotSaved(error.to_string()));
    }

    info!(revision = status.written, "cart saved");

    Ok(())
}
