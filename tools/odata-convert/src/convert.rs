//! Payload conversion: read in one format, write in another.

use std::io::Read;

use anyhow::{Context, Result};
use clap::ValueEnum;
use odata_client::{Reader, Writer};
use odata_common::Format;
use tracing::info;

/// Shapes the converter can carry between formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    Entity,
    EntitySet,
    Property,
}

/// Parse a `--from`/`--to` format argument.
pub fn parse_format(s: &str) -> Result<Format, String> {
    Format::parse(s).ok_or_else(|| format!("unknown format '{}'", s))
}

pub fn convert(
    input: impl Read,
    reader: &Reader,
    writer: &Writer,
    from: Format,
    to: Format,
    shape: Shape,
) -> Result<Vec<u8>> {
    let mut output = match shape {
        Shape::Entity => {
            let entity = reader
                .try_read_entity(input, from)
                .context("Failed to read entity")?
                .into_payload();
            info!(type_name = %entity.type_name, links = entity.links.len(), "Converting entity");
            writer.write_entity(&entity, to)?
        }
        Shape::EntitySet => {
            let set = reader
                .try_read_entity_set(input, from)
                .context("Failed to read entity set")?
                .into_payload();
            info!(entities = set.len(), "Converting entity set");
            writer.write_entity_set(&set, to)?
        }
        Shape::Property => {
            let property = reader
                .try_read_property(input, from)
                .context("Failed to read property")?
                .into_payload();
            info!(name = %property.name, "Converting property");
            writer.write_property(&property, to)?
        }
    };

    let mut bytes = Vec::new();
    output.read_to_end(&mut bytes)?;
    Ok(bytes)
}
