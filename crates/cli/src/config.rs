//! Command line configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Range Cart command line.
#[derive(Debug, Parser)]
#[command(name = "range-cart", about = "Range Cart CLI", long_about = None)]
pub struct Cli {
    /// Directory holding the local storage file
    #[arg(short, long, env = "RANGE_CART_DATA_DIR", default_value = ".range-cart")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Load `.env` if present, then parse arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments cannot be parsed.
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Path of the JSON storage file.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }
}

/// Cart operations.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the cart
    Show,

    /// Add a product, merging with an existing line
    AddProduct(AddProductArgs),

    /// Book a service as a new line
    AddService(AddServiceArgs),

    /// Remove a line
    Remove {
        /// Line id
        id: String,
    },

    /// Set a line's quantity; zero or below removes it
    SetQuantity {
        /// Line id
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove every line
    Clear,

    /// Inspect or change the backend URL
    ApiUrl {
        #[command(subcommand)]
        command: ApiUrlCommand,
    },

    /// Submit the cart as an order
    Checkout(CheckoutArgs),
}

/// Catalog product to add.
#[derive(Debug, Args)]
pub struct AddProductArgs {
    /// Catalog product id
    #[arg(long)]
    pub id: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Unit price in hryvnias
    #[arg(long)]
    pub price: Decimal,

    /// Discount in percent
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub discount: Decimal,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    pub quantity: u32,

    /// Image reference
    #[arg(long)]
    pub image: Option<String>,
}

/// Catalog service to book.
#[derive(Debug, Args)]
pub struct AddServiceArgs {
    /// Catalog service id
    #[arg(long)]
    pub id: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Base price in hryvnias
    #[arg(long)]
    pub price: Decimal,

    /// Session length in minutes
    #[arg(long)]
    pub duration: Option<u32>,

    /// Treat the price as hourly and scale it by the duration
    #[arg(long, requires = "duration")]
    pub hourly: bool,

    /// Discount in percent
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub discount: Decimal,

    /// Instructor name
    #[arg(long)]
    pub master: Option<String>,

    /// Booked date and time
    #[arg(long)]
    pub at: Option<String>,
}

/// Backend URL operations.
#[derive(Debug, Subcommand)]
pub enum ApiUrlCommand {
    /// Print the current URL
    Get,

    /// Override the URL
    Set {
        /// New base URL
        url: String,
    },

    /// Return to the default URL
    Reset,
}

/// Order placement options.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Backend user id
    #[arg(long, env = "RANGE_CART_USER_ID")]
    pub user_id: String,

    /// Customer discount in percent
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub discount: Decimal,
}
