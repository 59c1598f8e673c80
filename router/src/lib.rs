pub mod algo;
pub mod connect;
pub mod grid;
pub mod net_router;
pub mod wirelength;

pub use algo::Rotation;
pub use wirelength::{
    calculate_bb_center, calculate_hpwl, calculate_net_hpwl, calculate_net_tree_wirelength,
    calculate_tree_wirelength,
};

use algo::LeeSolver;
use lee_common::db::core::Design;
use lee_common::db::indices::NetId;
use lee_common::util::config::RoutingConfig;
use lee_common::util::profiler::ScopedTimer;
use std::io::Write;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("there are no bins created; create them before routing")]
    NoBins,
    #[error("element '{0}' has no bin; update the bins after changing the design")]
    Unbinned(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoutingOptions {
    /// Grow each net from the center of its bounding box instead of its
    /// declared source.
    pub start_from_center: bool,
    pub rotation: Rotation,
}

impl From<&RoutingConfig> for RoutingOptions {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            start_from_center: config.start_from_center,
            rotation: Rotation::from_clockwise(config.clockwise),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetStatus {
    Routed,
    /// Some endpoints were skipped; the tree holds the rest.
    Partial,
    SourceBlocked,
    AlreadyRouted,
    NoDrains,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Blocked,
    Unreachable,
}

#[derive(Clone, Debug)]
pub struct NetReport {
    pub net: String,
    pub status: NetStatus,
    pub connected: usize,
    pub skipped: Vec<(String, SkipReason)>,
    pub claimed_bins: usize,
}

impl NetReport {
    fn new(net: &str) -> Self {
        Self {
            net: net.to_string(),
            status: NetStatus::Routed,
            connected: 0,
            skipped: Vec::new(),
            claimed_bins: 0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoutingReport {
    pub already_routed: bool,
    pub nets: Vec<NetReport>,
}

impl RoutingReport {
    pub fn count(&self, status: NetStatus) -> usize {
        self.nets.iter().filter(|n| n.status == status).count()
    }
}

/// Routes every net of the design in declaration order. A design that is
/// already routed is left untouched.
pub fn maze_routing(
    design: &mut Design,
    options: &RoutingOptions,
) -> Result<RoutingReport, RouteError> {
    if design.is_routed {
        log::info!("Design is already routed!");
        return Ok(RoutingReport {
            already_routed: true,
            nets: Vec::new(),
        });
    }
    if design.bins.is_none() {
        return Err(RouteError::NoBins);
    }

    let _timer = ScopedTimer::new("Maze Routing");
    let total = design.num_nets();
    log::info!(
        "Starting Maze Routing for {} nets ({:?}{})",
        total,
        options.rotation,
        if options.start_from_center {
            ", from bounding-box centers"
        } else {
            ""
        }
    );

    let start_time = Instant::now();
    let mut solver = LeeSolver::new();
    let mut nets = Vec::with_capacity(total);
    for i in 0..total {
        nets.push(net_router::route_net(
            design,
            NetId::new(i),
            options,
            &mut solver,
        )?);

        let p = i + 1;
        if p.is_multiple_of(50) || p == total {
            eprint!(
                "\r\x1b[36m[Routing] Progress: {:>3.0}% ({}/{}) Time: {:.1}s\x1b[0m",
                p as f64 / total as f64 * 100.0,
                p,
                total,
                start_time.elapsed().as_secs_f32()
            );
            let _ = std::io::stderr().flush();
        }
    }
    eprint!("\r\x1b[2K");

    design.is_routed = true;
    let report = RoutingReport {
        already_routed: false,
        nets,
    };
    log::info!(
        "Routing completed: {} routed, {} partial, {} with blocked source, {} without drains",
        report.count(NetStatus::Routed),
        report.count(NetStatus::Partial),
        report.count(NetStatus::SourceBlocked),
        report.count(NetStatus::NoDrains)
    );
    Ok(report)
}

/// Routes a single net. Nets that already carry a tree are skipped.
pub fn maze_routing_net(
    design: &mut Design,
    net: NetId,
    options: &RoutingOptions,
) -> Result<NetReport, RouteError> {
    if design.is_routed {
        log::info!("Design is already routed!");
        let mut report = NetReport::new(&design.nets[net.index()].name);
        report.status = NetStatus::AlreadyRouted;
        return Ok(report);
    }
    net_router::route_net(design, net, options, &mut LeeSolver::new())
}
