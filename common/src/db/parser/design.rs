//! TOML design description: core geometry, rows, I/O ports, components and
//! nets.
//!
//! ```toml
//! name = "demo"
//!
//! [core]
//! width = 40.0
//! height = 40.0
//! x_offset = 2.0
//! y_offset = 2.0
//!
//! [[ports]]
//! name = "in"
//! x = 0.0
//! y = 20.0
//! side = "left"
//!
//! [[components]]
//! name = "u1"
//! cell_type = "NAND2"
//! x = 10.0
//! y = 10.0
//!
//! [[nets]]
//! name = "n1"
//! source = "in"
//! drains = ["u1"]
//! ```

use crate::db::core::{Core, Design, PinRef, PortSide, Row};
use crate::geom::point::Point;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cell size used when a component entry does not give one.
pub const DEFAULT_COMP_WIDTH: f64 = 1.260;
pub const DEFAULT_COMP_HEIGHT: f64 = 0.576;

#[derive(Debug, Serialize, Deserialize)]
pub struct DesignFile {
    pub name: String,
    pub core: CoreEntry,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub ports: Vec<PortEntry>,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
    #[serde(default)]
    pub nets: Vec<NetEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoreEntry {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub x_offset: f64,
    #[serde(default)]
    pub y_offset: f64,
    #[serde(default)]
    pub utilisation: f64,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PortEntry {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub side: PortSide,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub name: String,
    #[serde(default = "default_cell_type")]
    pub cell_type: String,
    #[serde(default = "default_cell_type")]
    pub timing_type: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_comp_width")]
    pub width: f64,
    #[serde(default = "default_comp_height")]
    pub height: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetEntry {
    pub name: String,
    pub source: String,
    pub drains: Vec<String>,
}

fn default_aspect_ratio() -> f64 {
    1.0
}

fn default_cell_type() -> String {
    "n/a".to_string()
}

fn default_comp_width() -> f64 {
    DEFAULT_COMP_WIDTH
}

fn default_comp_height() -> f64 {
    DEFAULT_COMP_HEIGHT
}

pub fn parse(filename: impl AsRef<Path>) -> Result<Design> {
    let path = filename.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read design file {:?}", path))?;
    parse_str(&text)
}

pub fn parse_str(text: &str) -> Result<Design> {
    let file: DesignFile = toml::from_str(text)?;
    file.into_design()
}

impl DesignFile {
    pub fn into_design(self) -> Result<Design> {
        let core = Core {
            utilisation: self.core.utilisation,
            width: self.core.width,
            height: self.core.height,
            aspect_ratio: self.core.aspect_ratio,
            x_offset: self.core.x_offset,
            y_offset: self.core.y_offset,
        };
        if core.width <= 0.0 || core.height <= 0.0 {
            return Err(anyhow!(
                "Core must have a positive size, got {}x{}",
                core.width,
                core.height
            ));
        }

        let mut design = Design::new(self.name, core);
        for row in self.rows {
            design.add_row(row);
        }
        for port in self.ports {
            design.add_port(port.name, Point::new(port.x, port.y), port.side)?;
        }
        for comp in self.components {
            let id = design.add_component(comp.name, comp.cell_type, comp.width, comp.height)?;
            design.components[id.index()].timing_type = comp.timing_type;
            design.set_component_position(id, Point::new(comp.x, comp.y));
        }
        for net in self.nets {
            let source = resolve(&design, &net.name, &net.source)?;
            let drains = net
                .drains
                .iter()
                .map(|d| resolve(&design, &net.name, d))
                .collect::<Result<Vec<_>>>()?;
            design.add_net(net.name, source, drains)?;
        }

        log::info!(
            "Loaded design '{}': {} rows, {} ports, {} components, {} nets",
            design.name,
            design.rows.len(),
            design.ports.len(),
            design.num_components(),
            design.num_nets()
        );
        Ok(design)
    }

    /// Captures the current geometry of a design, e.g. after placement.
    pub fn from_design(design: &Design) -> Self {
        Self {
            name: design.name.clone(),
            core: CoreEntry {
                width: design.core.width,
                height: design.core.height,
                x_offset: design.core.x_offset,
                y_offset: design.core.y_offset,
                utilisation: design.core.utilisation,
                aspect_ratio: design.core.aspect_ratio,
            },
            rows: design.rows.clone(),
            ports: design
                .ports
                .iter()
                .map(|p| PortEntry {
                    name: p.name.clone(),
                    x: p.position.x,
                    y: p.position.y,
                    side: p.side,
                })
                .collect(),
            components: design
                .components
                .iter()
                .map(|c| ComponentEntry {
                    name: c.name.clone(),
                    cell_type: c.cell_type.clone(),
                    timing_type: c.timing_type.clone(),
                    x: c.position.x,
                    y: c.position.y,
                    width: c.width,
                    height: c.height,
                })
                .collect(),
            nets: design
                .nets
                .iter()
                .map(|n| NetEntry {
                    name: n.name.clone(),
                    source: design.pin_name(n.source).to_string(),
                    drains: n
                        .drains
                        .iter()
                        .map(|&d| design.pin_name(d).to_string())
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn write(&self, filename: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(filename.as_ref(), text)
            .with_context(|| format!("Failed to write design file {:?}", filename.as_ref()))?;
        Ok(())
    }
}

fn resolve(design: &Design, net: &str, name: &str) -> Result<PinRef> {
    design
        .pin_by_name(name)
        .ok_or_else(|| anyhow!("Net '{}' references unknown element '{}'", net, name))
}
