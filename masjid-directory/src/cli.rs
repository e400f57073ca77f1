//! Command line interface.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Masjid directory reports.")]
pub struct Cli {
    /// Print compact JSON instead of pretty-printed JSON.
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Every tag with its number of occurrences, most frequent first.
    Tags,
    /// Up to ten entries with at least two reviews, highest average first.
    Top,
    /// One entry by slug, with its reviews.
    Show {
        slug: String,
        #[command(flatten)]
        reviews: ReviewFlags,
    },
    /// Full-text search over names and descriptions.
    Search {
        text: String,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        reviews: ReviewFlags,
    },
    /// Entries within a distance of a point, nearest first.
    Near {
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        /// Maximum distance in meters.
        #[arg(long, default_value_t = 5_000.0)]
        max_distance: f64,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        reviews: ReviewFlags,
    },
    /// Entries carrying a tag, newest first.
    Tag {
        tag: String,
        #[command(flatten)]
        reviews: ReviewFlags,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct ReviewFlags {
    /// Leave reviews out of the output.
    #[arg(long)]
    pub no_reviews: bool,
}
