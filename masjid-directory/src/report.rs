//! Runs a command against the directory service and writes the result as JSON.

use std::io::Write;

use masjid_directory_repository::{MasjidService, ReadOptions};
use masjid_directory_shared::GeoPoint;
use serde::Serialize;
use tracing::info;

use crate::cli::{Command, ReviewFlags};
use crate::AppError;

impl From<ReviewFlags> for ReadOptions {
    fn from(flags: ReviewFlags) -> Self {
        if flags.no_reviews {
            ReadOptions::without_reviews()
        } else {
            ReadOptions::with_reviews()
        }
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, compact: bool) -> Result<(), AppError> {
    if compact {
        serde_json::to_writer(&mut *out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Execute `command` and write its JSON output to `out`.
pub async fn run<W: Write>(
    service: &MasjidService,
    command: Command,
    compact: bool,
    out: &mut W,
) -> Result<(), AppError> {
    match command {
        Command::Tags => {
            let tags = service.tags_list().await?;
            info!(count = tags.len(), "Tag report ready");
            write_json(out, &tags, compact)
        }
        Command::Top => {
            let top = service.top_masajid().await?;
            info!(count = top.len(), "Top masajid report ready");
            write_json(out, &top, compact)
        }
        Command::Show { slug, reviews } => {
            let view = service
                .get_by_slug(&slug, reviews.into())
                .await?
                .ok_or_else(|| AppError::not_found(format!("no masjid with slug '{}'", slug)))?;
            write_json(out, &view, compact)
        }
        Command::Search {
            text,
            limit,
            reviews,
        } => {
            let found = service.search(&text, limit, reviews.into()).await?;
            info!(count = found.len(), "Search finished");
            write_json(out, &found, compact)
        }
        Command::Near {
            longitude,
            latitude,
            max_distance,
            limit,
            reviews,
        } => {
            let point = GeoPoint::new(longitude, latitude);
            let found = service
                .near(point, max_distance, limit, reviews.into())
                .await?;
            info!(count = found.len(), "Near query finished");
            write_json(out, &found, compact)
        }
        Command::Tag { tag, reviews } => {
            let found = service.by_tag(&tag, reviews.into()).await?;
            write_json(out, &found, compact)
        }
    }
}
