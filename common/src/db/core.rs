use crate::db::indices::*;
use crate::db::tree::{NetPoint, PointKind, RoutingTree};
use crate::geom::coord::BinCoord;
use crate::geom::point::Point;
use crate::grid::{BinConverter, BinGrids, GridError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("duplicate {kind} name '{name}'")]
    Duplicate { kind: &'static str, name: String },
    #[error("unknown {kind} '{name}'")]
    UnknownElement { kind: &'static str, name: String },
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Core {
    pub utilisation: f64,
    pub width: f64,
    pub height: f64,
    pub aspect_ratio: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl Core {
    /// Full layout extent: the core plus the offset on both sides.
    pub fn layout_size(&self) -> (f64, f64) {
        (
            self.width + 2.0 * self.x_offset,
            self.height + 2.0 * self.y_offset,
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Row {
    pub name: String,
    pub site: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Clone, Debug, Serialize)]
pub struct IoPort {
    pub name: String,
    pub position: Point<f64>,
    pub side: PortSide,
    pub bin: Option<BinCoord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Component {
    pub name: String,
    pub cell_type: String,
    pub timing_type: String,
    /// Lower-left corner.
    pub position: Point<f64>,
    pub width: f64,
    pub height: f64,
    pub bin: Option<BinCoord>,
}

impl Component {
    pub fn center(&self) -> Point<f64> {
        Point::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }
}

/// A net endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinRef {
    Port(PortId),
    Component(ComponentId),
}

#[derive(Clone, Debug)]
pub struct Net {
    pub name: String,
    pub source: PinRef,
    pub drains: Vec<PinRef>,
    pub tree: Option<RoutingTree>,
    /// Bins the routed wire passes through, one entry per claim.
    pub claimed_bins: Vec<BinCoord>,
}

impl Net {
    pub fn is_routed(&self) -> bool {
        self.tree.is_some()
    }
}

#[derive(Debug)]
pub struct Design {
    pub name: String,
    pub core: Core,
    pub rows: Vec<Row>,
    pub ports: Vec<IoPort>,
    pub components: Vec<Component>,
    pub nets: Vec<Net>,

    pub port_name_map: HashMap<String, PortId>,
    pub component_name_map: HashMap<String, ComponentId>,
    pub net_name_map: HashMap<String, NetId>,

    pub bins: Option<BinGrids>,
    pub is_routed: bool,
}

impl Design {
    pub fn new(name: impl Into<String>, core: Core) -> Self {
        Self {
            name: name.into(),
            core,
            rows: Vec::new(),
            ports: Vec::with_capacity(64),
            components: Vec::with_capacity(1000),
            nets: Vec::with_capacity(1000),
            port_name_map: HashMap::new(),
            component_name_map: HashMap::new(),
            net_name_map: HashMap::new(),
            bins: None,
            is_routed: false,
        }
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }
    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    pub fn add_row(&mut self, row: Row) -> RowId {
        let id = RowId::new(self.rows.len());
        self.rows.push(row);
        id
    }

    pub fn add_port(
        &mut self,
        name: String,
        position: Point<f64>,
        side: PortSide,
    ) -> Result<PortId, DesignError> {
        if self.port_name_map.contains_key(&name) {
            return Err(DesignError::Duplicate { kind: "port", name });
        }
        let id = PortId::new(self.ports.len());
        self.port_name_map.insert(name.clone(), id);
        self.ports.push(IoPort {
            name,
            position,
            side,
            bin: None,
        });
        Ok(id)
    }

    pub fn add_component(
        &mut self,
        name: String,
        cell_type: String,
        width: f64,
        height: f64,
    ) -> Result<ComponentId, DesignError> {
        if self.component_name_map.contains_key(&name) {
            return Err(DesignError::Duplicate {
                kind: "component",
                name,
            });
        }
        let id = ComponentId::new(self.components.len());
        self.component_name_map.insert(name.clone(), id);
        self.components.push(Component {
            name,
            cell_type,
            timing_type: "n/a".to_string(),
            position: Point::new(0.0, 0.0),
            width,
            height,
            bin: None,
        });
        Ok(id)
    }

    /// Repeated drains are dropped, keeping the first occurrence.
    pub fn add_net(
        &mut self,
        name: String,
        source: PinRef,
        drains: Vec<PinRef>,
    ) -> Result<NetId, DesignError> {
        if self.net_name_map.contains_key(&name) {
            return Err(DesignError::Duplicate { kind: "net", name });
        }
        let mut unique = Vec::with_capacity(drains.len());
        for d in drains {
            if !unique.contains(&d) {
                unique.push(d);
            }
        }
        let id = NetId::new(self.nets.len());
        self.net_name_map.insert(name.clone(), id);
        self.nets.push(Net {
            name,
            source,
            drains: unique,
            tree: None,
            claimed_bins: Vec::new(),
        });
        Ok(id)
    }

    pub fn port_by_name(&self, name: &str) -> Option<PortId> {
        self.port_name_map.get(name).copied()
    }

    pub fn component_by_name(&self, name: &str) -> Option<ComponentId> {
        self.component_name_map.get(name).copied()
    }

    pub fn net_by_name(&self, name: &str) -> Option<NetId> {
        self.net_name_map.get(name).copied()
    }

    /// Resolves an endpoint name: ports shadow components.
    pub fn pin_by_name(&self, name: &str) -> Option<PinRef> {
        self.port_by_name(name)
            .map(PinRef::Port)
            .or_else(|| self.component_by_name(name).map(PinRef::Component))
    }

    pub fn set_component_position(&mut self, id: ComponentId, position: Point<f64>) {
        self.components[id.index()].position = position;
    }

    pub fn pin_name(&self, pin: PinRef) -> &str {
        match pin {
            PinRef::Port(id) => &self.ports[id.index()].name,
            PinRef::Component(id) => &self.components[id.index()].name,
        }
    }

    /// Effective position: port coordinates or component center.
    pub fn pin_position(&self, pin: PinRef) -> Point<f64> {
        match pin {
            PinRef::Port(id) => self.ports[id.index()].position,
            PinRef::Component(id) => self.components[id.index()].center(),
        }
    }

    pub fn pin_bin(&self, pin: PinRef) -> Option<BinCoord> {
        match pin {
            PinRef::Port(id) => self.ports[id.index()].bin,
            PinRef::Component(id) => self.components[id.index()].bin,
        }
    }

    /// Tree point for an endpoint, carrying its current bin.
    pub fn pin_point(&self, pin: PinRef) -> Option<NetPoint> {
        let bin = self.pin_bin(pin)?;
        let point = match pin {
            PinRef::Port(id) => NetPoint {
                kind: PointKind::Port(id),
                position: self.ports[id.index()].position,
                bin,
            },
            PinRef::Component(id) => {
                let comp = &self.components[id.index()];
                NetPoint {
                    kind: PointKind::Component {
                        id,
                        width: comp.width,
                        height: comp.height,
                    },
                    position: comp.position,
                    bin,
                }
            }
        };
        Some(point)
    }

    /// Allocates the three grids as `height` rows by `width` columns and bins
    /// every port and component.
    pub fn create_bins(&mut self, width: u32, height: u32) -> Result<(), DesignError> {
        if self.bins.is_some() {
            return Err(GridError::AlreadyExists.into());
        }
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height }.into());
        }
        let (layout_w, layout_h) = self.core.layout_size();
        let converter = BinConverter::new(layout_w, layout_h, height, width);
        self.bins = Some(BinGrids::new(converter));
        self.update_bins()?;

        log::info!(
            "Created {}x{} bins ({:.3} x {:.3} each)",
            width,
            height,
            converter.bin_width(),
            converter.bin_height()
        );
        Ok(())
    }

    /// Drops the grids, every element bin and all routing results.
    pub fn remove_bins(&mut self) -> Result<(), DesignError> {
        if self.bins.take().is_none() {
            return Err(GridError::Missing.into());
        }
        for port in &mut self.ports {
            port.bin = None;
        }
        for comp in &mut self.components {
            comp.bin = None;
        }
        self.clear_routes();
        Ok(())
    }

    /// Recomputes element bins and the element-occupancy grid after the
    /// geometry has changed.
    pub fn update_bins(&mut self) -> Result<(), DesignError> {
        let grids = self.bins.as_mut().ok_or(GridError::Missing)?;
        grids.clear_elements();

        for port in &mut self.ports {
            let bin = grids.coordinate_to_bin(port.position);
            port.bin = Some(bin);
            grids.place_element(bin);
        }
        for comp in &mut self.components {
            let bin = grids.coordinate_to_bin(comp.center());
            comp.bin = Some(bin);
            grids.place_element(bin);
        }
        Ok(())
    }

    pub fn set_blockage(&mut self, bin: BinCoord, blocked: bool) -> Result<(), DesignError> {
        let grids = self.bins.as_mut().ok_or(GridError::Missing)?;
        grids.set_blockage(bin, blocked)?;
        Ok(())
    }

    pub fn blockage(&self, bin: BinCoord) -> Result<bool, DesignError> {
        let grids = self.bins.as_ref().ok_or(GridError::Missing)?;
        Ok(grids.get_blockage(bin)?)
    }

    /// Discards every routing tree and the net occupancy so the design can be
    /// routed again. Blockages are kept.
    pub fn reset_routing(&mut self) {
        self.clear_routes();
        if let Some(grids) = self.bins.as_mut() {
            grids.clear_occupancy();
        }
    }

    fn clear_routes(&mut self) {
        for net in &mut self.nets {
            net.tree = None;
            net.claimed_bins.clear();
        }
        self.is_routed = false;
    }
}
