use crate::algo::{ClaimedBins, LeeSolver};
use crate::connect::TreeBuilder;
use crate::wirelength::calculate_bb_center;
use crate::{NetReport, NetStatus, RouteError, RoutingOptions, SkipReason};
use lee_common::db::core::{Design, PinRef};
use lee_common::db::indices::NetId;
use lee_common::db::tree::NetPoint;
use lee_common::util::profiler::ScopedTimer;

fn endpoint_point(design: &Design, pin: PinRef) -> Result<NetPoint, RouteError> {
    design
        .pin_point(pin)
        .ok_or_else(|| RouteError::Unbinned(design.pin_name(pin).to_string()))
}

/// Routes one net endpoint by endpoint, drains nearest to the source first,
/// then records its tree, its claimed bins and their occupancy.
pub(crate) fn route_net(
    design: &mut Design,
    net_id: NetId,
    options: &RoutingOptions,
    solver: &mut LeeSolver,
) -> Result<NetReport, RouteError> {
    let grids = design.bins.as_ref().ok_or(RouteError::NoBins)?;
    let net = &design.nets[net_id.index()];
    let mut report = NetReport::new(&net.name);

    if net.is_routed() {
        log::info!("Net {} is already routed", net.name);
        report.status = NetStatus::AlreadyRouted;
        return Ok(report);
    }

    let _timer = ScopedTimer::debug(format!("Routing net {}", net.name));

    // In center mode the declared source is just another drain.
    let mut pins: Vec<PinRef> = net
        .drains
        .iter()
        .copied()
        .filter(|&d| d != net.source)
        .collect();
    let (root_name, root) = if options.start_from_center {
        pins.push(net.source);
        let center = calculate_bb_center(design, net_id);
        let bin = grids.coordinate_to_bin(center);
        (format!("{}_center", net.name), NetPoint::corner(center, bin))
    } else {
        (
            design.pin_name(net.source).to_string(),
            endpoint_point(design, net.source)?,
        )
    };
    let source_bin = root.bin;

    if grids.is_blocked(source_bin) {
        log::warn!(
            "Net {} cannot be routed: source bin {} is blocked",
            net.name,
            source_bin
        );
        report.status = NetStatus::SourceBlocked;
        return Ok(report);
    }

    let mut endpoints = pins
        .into_iter()
        .map(|pin| endpoint_point(design, pin).map(|point| (pin, point)))
        .collect::<Result<Vec<_>, RouteError>>()?;
    endpoints.sort_by_key(|(_, point)| point.bin.dist_sq(source_bin));

    let mut claimed = ClaimedBins::new(grids);
    claimed.claim(source_bin);
    let mut builder = TreeBuilder::new(
        &net.name,
        root_name,
        root,
        grids.converter(),
        options.rotation,
    );

    for (pin, point) in &endpoints {
        let name = design.pin_name(*pin);
        if grids.is_blocked(point.bin) {
            log::warn!(
                "In net {}: endpoint {} is in a blockage at {}",
                net.name,
                name,
                point.bin
            );
            report.skipped.push((name.to_string(), SkipReason::Blocked));
            continue;
        }

        let Some(trace) = solver.route(grids, &claimed, point.bin, options.rotation) else {
            log::warn!(
                "In net {}: endpoint {} at {} is enclosed by blockages",
                net.name,
                name,
                point.bin
            );
            report.skipped.push((name.to_string(), SkipReason::Unreachable));
            continue;
        };

        claimed.extend(trace.path.iter().copied());
        builder.connect(name, point.clone(), &trace);
        report.connected += 1;
    }

    report.status = if endpoints.is_empty() {
        NetStatus::NoDrains
    } else if report.skipped.is_empty() {
        NetStatus::Routed
    } else {
        NetStatus::Partial
    };

    let tree = builder.into_tree();
    if log::log_enabled!(log::Level::Debug) {
        tree.log_structure();
    }
    let claimed = claimed.into_vec();
    report.claimed_bins = claimed.len();

    let grids = design.bins.as_mut().ok_or(RouteError::NoBins)?;
    for &bin in &claimed {
        grids.increment_occupancy(bin);
    }
    let net = &mut design.nets[net_id.index()];
    net.tree = Some(tree);
    net.claimed_bins = claimed;

    log::debug!(
        "Routing net {} completed: {:?}, {} endpoint(s), {} bin(s)",
        net.name,
        report.status,
        report.connected,
        report.claimed_bins
    );
    Ok(report)
}
