// SPDX-License-Identifier: AGPL-3.0
// SimCar CLI - Shell command grammar
//
// Every line typed at the prompt is parsed with clap into a ShellCommand.

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use simcar_core::FilterCriteria;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "simcar", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

impl ShellLine {
    /// Split `line` with shell quoting rules, so `--region "Seoul Gangnam"`
    /// is one value and `--model ""` is an empty one, then parse it.
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        let words = shlex::split(line).ok_or_else(|| {
            clap::Error::raw(ErrorKind::InvalidValue, "unterminated quote in input\n")
        })?;
        Self::try_parse_from(words)
    }
}

#[derive(Debug, Subcommand)]
pub enum ShellCommand {
    /// List listings matching the current search
    Cars {
        /// Fetch the listing set again before filtering
        #[arg(long)]
        refresh: bool,
    },
    /// Show one listing with its favorite state
    Car { id: i64 },
    /// Show the reliability diagnosis of a listing
    Diagnose { id: i64 },
    /// Inspect or change the search criteria
    Search {
        #[command(subcommand)]
        action: SearchAction,
    },
    /// Favorite state of a single listing
    Fav {
        #[command(subcommand)]
        action: FavAction,
    },
    /// List your favorite listings
    Favorites,
    Login { email: String, password: String },
    Logout,
    /// Create a member account
    Join {
        email: String,
        password: String,
        name: String,
        phone: String,
    },
    /// Your member profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Listings you registered for sale
    Sales,
    /// Register, edit or delete your listings
    Sell {
        #[command(subcommand)]
        action: SellAction,
    },
    /// Client settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Subcommand)]
pub enum SearchAction {
    Show,
    /// Reset every criterion
    Clear,
    /// Change the given criteria, keeping the others. An empty value clears
    /// a text criterion.
    Set(SearchArgs),
    /// Reset only the named criteria
    Unset {
        #[arg(required = true, value_enum)]
        fields: Vec<SearchField>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchField {
    Manufacturer,
    Model,
    Year,
    Type,
    Region,
    MaxPrice,
    Fuel,
    MaxMileage,
}

impl SearchField {
    /// Put this criterion back to its default
    pub fn clear(self, criteria: &mut FilterCriteria) {
        let defaults = FilterCriteria::default();
        match self {
            Self::Manufacturer => criteria.manufacturer = defaults.manufacturer,
            Self::Model => criteria.model = defaults.model,
            Self::Year => criteria.year = defaults.year,
            Self::Type => criteria.car_type = defaults.car_type,
            Self::Region => criteria.region = defaults.region,
            Self::MaxPrice => criteria.max_price = defaults.max_price,
            Self::Fuel => criteria.fuel_type = defaults.fuel_type,
            Self::MaxMileage => criteria.max_mileage = defaults.max_mileage,
        }
    }
}

#[derive(Debug, Default, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub manufacturer: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
    #[arg(long = "type")]
    pub car_type: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub max_price: Option<i64>,
    /// Fuel type substring
    #[arg(long)]
    pub fuel: Option<String>,
    #[arg(long)]
    pub max_mileage: Option<i64>,
}

impl SearchArgs {
    /// Overwrite the criteria that were given on the command line
    pub fn apply_to(self, criteria: &mut FilterCriteria) {
        if let Some(v) = self.manufacturer {
            criteria.manufacturer = v;
        }
        if let Some(v) = self.model {
            criteria.model = v;
        }
        if let Some(v) = self.year {
            criteria.year = v;
        }
        if let Some(v) = self.car_type {
            criteria.car_type = v;
        }
        if let Some(v) = self.region {
            criteria.region = v;
        }
        if let Some(v) = self.max_price {
            criteria.max_price = v;
        }
        if let Some(v) = self.fuel {
            criteria.fuel_type = v;
        }
        if let Some(v) = self.max_mileage {
            criteria.max_mileage = Some(v);
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum FavAction {
    Show { id: i64 },
    Toggle { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    Show,
    Edit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        /// New password; omit to keep the current one
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete your account
    Delete,
}

#[derive(Debug, Subcommand)]
pub enum SellAction {
    /// Register a listing from a JSON draft file
    Register { draft: PathBuf },
    /// Replace a listing with a JSON draft file
    Edit { id: i64, draft: PathBuf },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    Show,
    /// Store a new API base URL (used from the next start)
    SetUrl { url: String },
    /// Order listings newest first
    NewestFirst {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}
